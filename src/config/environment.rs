//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno. Los valores inválidos
//! son errores, nunca pánicos.

use std::env;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::cache::cache_config::DEFAULT_QUOTA_BYTES;

const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

/// Errores de configuración
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a valid number, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },

    #[error("Unknown storage backend '{0}' (expected memory, redis, postgres or api)")]
    UnknownBackend(String),

    #[error("{0} must be set for the selected storage backend")]
    Missing(&'static str),
}

/// Backend de persistencia de los garages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Memory,
    Redis,
    Postgres,
    Api,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "redis" | "local" => Ok(StorageBackend::Redis),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "api" | "http" => Ok(StorageBackend::Api),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Redis => "redis",
            StorageBackend::Postgres => "postgres",
            StorageBackend::Api => "api",
        };
        f.write_str(name)
    }
}

/// Configuración del entorno
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub storage_backend: StorageBackend,
    pub redis_url: String,
    pub database_url: Option<String>,
    pub persistence_api_url: Option<String>,
    pub storage_quota_bytes: usize,
    pub cors_origins: Vec<String>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "debug".to_string(),
            storage_backend: StorageBackend::Memory,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            database_url: None,
            persistence_api_url: None,
            storage_quota_bytes: DEFAULT_QUOTA_BYTES,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl EnvironmentConfig {
    /// Leer la configuración del proceso (cargar `.env` antes)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Leer la configuración desde una función de búsqueda arbitraria
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let storage_backend = match read("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => defaults.storage_backend,
        };

        let config = Self {
            environment: read("ENVIRONMENT").unwrap_or(defaults.environment),
            host: read("HOST").unwrap_or(defaults.host),
            port: parse_number("PORT", read("PORT"), defaults.port)?,
            log_level: read("LOG_LEVEL").unwrap_or(defaults.log_level),
            storage_backend,
            redis_url: read("REDIS_URL").unwrap_or(defaults.redis_url),
            database_url: read("DATABASE_URL"),
            persistence_api_url: read("PERSISTENCE_API_URL"),
            storage_quota_bytes: parse_number(
                "STORAGE_QUOTA_BYTES",
                read("STORAGE_QUOTA_BYTES"),
                defaults.storage_quota_bytes,
            )?,
            cors_origins: read("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
        };

        match config.storage_backend {
            StorageBackend::Postgres if config.database_url.is_none() => {
                Err(ConfigError::Missing("DATABASE_URL"))
            }
            StorageBackend::Api if config.persistence_api_url.is_none() => {
                Err(ConfigError::Missing("PERSISTENCE_API_URL"))
            }
            _ => Ok(config),
        }
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|origin| origin == "*")
    }
}

fn parse_number<T: FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidNumber { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EnvironmentConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EnvironmentConfig::default());
        assert_eq!(config.server_url(), "0.0.0.0:3000");
        assert!(config.is_development());
        assert!(config.allows_any_origin());
    }

    #[test]
    fn test_overrides() {
        let config = EnvironmentConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("STORAGE_BACKEND", "Postgres"),
            ("DATABASE_URL", "postgres://localhost/garage"),
            ("CORS_ORIGINS", "http://a.test, http://b.test"),
            ("STORAGE_QUOTA_BYTES", "1024"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.storage_backend, StorageBackend::Postgres);
        assert_eq!(config.storage_quota_bytes, 1024);
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert!(!config.allows_any_origin());
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert_eq!(
            EnvironmentConfig::from_lookup(lookup(&[("PORT", "abc")])),
            Err(ConfigError::InvalidNumber { name: "PORT", value: "abc".to_string() })
        );
        assert!(matches!(
            EnvironmentConfig::from_lookup(lookup(&[("STORAGE_BACKEND", "floppy")])),
            Err(ConfigError::UnknownBackend(_))
        ));
        assert_eq!(
            EnvironmentConfig::from_lookup(lookup(&[("STORAGE_BACKEND", "api")])),
            Err(ConfigError::Missing("PERSISTENCE_API_URL"))
        );
    }
}
