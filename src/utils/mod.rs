//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación
//! y formateo.

pub mod errors;
pub mod validation;
