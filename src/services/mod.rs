//! Services module
//!
//! Este módulo contiene la lógica de sesión sobre el modelo de garage:
//! escritura inmediata con rollback y el registro de sesiones abiertas.

pub mod garage_registry;
pub mod garage_service;

pub use garage_registry::{GarageRegistry, GarageSession};
pub use garage_service::{GarageError, GarageService};
