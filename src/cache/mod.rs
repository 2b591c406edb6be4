//! Cache
//!
//! Este módulo contiene los almacenamientos clave-valor usados por la
//! variante de almacenamiento local del garage.

pub mod cache_config;
pub mod memory_store;
pub mod redis_client;

pub use cache_config::{CacheConfig, KeyValueOperations};
pub use memory_store::MemoryKeyValueStore;
pub use redis_client::RedisClient;
