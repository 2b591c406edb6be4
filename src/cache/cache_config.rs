//! Configuración del almacenamiento clave-valor
//!
//! Este módulo contiene la configuración y las operaciones comunes del
//! almacenamiento local clave-valor (Redis o memoria).

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Cuota por defecto de un garage en el almacenamiento local (5 MiB)
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Configuración del almacenamiento clave-valor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub redis_url: String,
    pub key_prefix: String,
    pub quota_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            key_prefix: "garage_manager".to_string(),
            quota_bytes: DEFAULT_QUOTA_BYTES,
        }
    }
}

impl CacheConfig {
    /// Generar clave con prefijo
    pub fn make_key(&self, prefix: &str, identifier: &str) -> String {
        format!("{}:{}:{}", self.key_prefix, prefix, identifier)
    }

    /// Clave donde vive el garage completo de un dueño
    pub fn garage_key(&self, owner: &str) -> String {
        self.make_key("garage", owner)
    }
}

/// Operaciones de almacenamiento clave-valor
#[async_trait::async_trait]
pub trait KeyValueOperations: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        let config = CacheConfig::default();
        assert_eq!(config.garage_key("ana"), "garage_manager:garage:ana");
        assert_eq!(config.quota_bytes, DEFAULT_QUOTA_BYTES);
    }
}
