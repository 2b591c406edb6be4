//! Controladores: traducen requests HTTP a operaciones de sesión

pub mod garage_controller;

pub use garage_controller::GarageController;
