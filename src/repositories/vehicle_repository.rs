//! Contrato del colaborador de persistencia
//!
//! Los registros se intercambian como JSON etiquetado (`{_type, ...}`):
//! la persistencia puede devolver filas legadas o corruptas y es el
//! despachador de reconstrucción quien decide qué se carga.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::record::normalize_id;

/// Errores de persistencia
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage quota exceeded: {size} bytes (quota {quota} bytes)")]
    QuotaExceeded { size: usize, quota: usize },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Key-value store error: {0}")]
    KeyValue(#[from] anyhow::Error),

    #[error("External API error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Operation not supported by this backend: {0}")]
    Unsupported(&'static str),
}

/// Vehículo público de otro dueño, tal como lo devuelve la persistencia
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedRecord {
    pub owner: String,
    pub record: Value,
}

/// Colaborador de persistencia de vehículos
#[async_trait::async_trait]
pub trait VehicleRepository: Send + Sync {
    /// Registros etiquetados del dueño, sin validar
    async fn load_all(&self, owner: &str) -> Result<Vec<Value>, StoreError>;

    /// Insertar o reemplazar un vehículo serializado
    async fn save_vehicle(&self, owner: &str, record: &Value) -> Result<(), StoreError>;

    async fn delete_vehicle(&self, owner: &str, id: &str) -> Result<bool, StoreError>;

    /// Reemplazar la colección completa del dueño
    async fn save_all(&self, owner: &str, records: &[Value]) -> Result<(), StoreError>;

    async fn set_public(&self, owner: &str, id: &str, public: bool) -> Result<(), StoreError>;

    /// Vehículos públicos de otros dueños
    async fn load_public(&self, viewer: &str) -> Result<Vec<SharedRecord>, StoreError>;
}

/// Id de un registro serializado, normalizado igual que en la reconstrucción
pub(crate) fn record_id(record: &Value) -> Option<String> {
    record.get("id").and_then(normalize_id)
}

/// ¿El registro almacenado corresponde a este id?
pub(crate) fn has_id(record: &Value, id: &str) -> bool {
    record_id(record).as_deref() == Some(id)
}

/// Discriminante de un registro serializado
pub(crate) fn record_type(record: &Value) -> &str {
    record.get("_type").and_then(Value::as_str).unwrap_or_default()
}
