//! Repositorios
//!
//! Backends de persistencia intercambiables detrás de `VehicleRepository`.

pub mod http_repository;
pub mod local_storage_repository;
pub mod memory_repository;
pub mod postgres_repository;
pub mod vehicle_repository;

pub use http_repository::HttpRepository;
pub use local_storage_repository::LocalStorageRepository;
pub use memory_repository::MemoryRepository;
pub use postgres_repository::PostgresRepository;
pub use vehicle_repository::{SharedRecord, StoreError, VehicleRepository};
