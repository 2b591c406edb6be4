//! Persistencia estilo "local storage"
//!
//! Cada garage se guarda como un único arreglo JSON bajo una clave por dueño.
//! Toda escritura reescribe el arreglo completo y respeta una cuota en bytes.

use std::sync::Arc;

use serde_json::Value;

use super::vehicle_repository::{has_id, record_id, SharedRecord, StoreError, VehicleRepository};
use crate::cache::{CacheConfig, KeyValueOperations};

pub struct LocalStorageRepository<K: KeyValueOperations> {
    store: Arc<K>,
    config: CacheConfig,
}

impl<K: KeyValueOperations> LocalStorageRepository<K> {
    pub fn new(store: Arc<K>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    async fn read_garage(&self, owner: &str) -> Result<Vec<Value>, StoreError> {
        let Some(raw) = self.store.get(&self.config.garage_key(owner)).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Value>(&raw)? {
            Value::Array(records) => Ok(records),
            other => {
                log::warn!(
                    "⚠️ Garage de '{}' no es un arreglo JSON ({}), se ignora",
                    owner,
                    type_name(&other)
                );
                Ok(Vec::new())
            }
        }
    }

    async fn write_garage(&self, owner: &str, records: &[Value]) -> Result<(), StoreError> {
        if records.is_empty() {
            self.store.delete(&self.config.garage_key(owner)).await?;
            log::debug!("🗑️ Garage de '{}' vacío, clave eliminada", owner);
            return Ok(());
        }

        let payload = serde_json::to_string(records)?;
        if payload.len() > self.config.quota_bytes {
            return Err(StoreError::QuotaExceeded {
                size: payload.len(),
                quota: self.config.quota_bytes,
            });
        }
        self.store.set(&self.config.garage_key(owner), &payload).await?;
        log::debug!(
            "💾 Garage de '{}' guardado: {} vehículos, {} bytes",
            owner,
            records.len(),
            payload.len()
        );
        Ok(())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait::async_trait]
impl<K: KeyValueOperations> VehicleRepository for LocalStorageRepository<K> {
    async fn load_all(&self, owner: &str) -> Result<Vec<Value>, StoreError> {
        self.read_garage(owner).await
    }

    async fn save_vehicle(&self, owner: &str, record: &Value) -> Result<(), StoreError> {
        let id = record_id(record)
            .ok_or_else(|| StoreError::InvalidRecord("missing id".to_string()))?;
        let mut records = self.read_garage(owner).await?;
        match records.iter_mut().find(|existing| has_id(existing, &id)) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        self.write_garage(owner, &records).await
    }

    async fn delete_vehicle(&self, owner: &str, id: &str) -> Result<bool, StoreError> {
        let mut records = self.read_garage(owner).await?;
        let before = records.len();
        records.retain(|record| !has_id(record, id));
        if records.len() == before {
            return Ok(false);
        }
        self.write_garage(owner, &records).await?;
        Ok(true)
    }

    async fn save_all(&self, owner: &str, records: &[Value]) -> Result<(), StoreError> {
        self.write_garage(owner, records).await
    }

    async fn set_public(&self, _owner: &str, _id: &str, _public: bool) -> Result<(), StoreError> {
        Err(StoreError::Unsupported("public sharing requires a networked backend"))
    }

    async fn load_public(&self, _viewer: &str) -> Result<Vec<SharedRecord>, StoreError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryKeyValueStore;
    use serde_json::json;

    fn repository(
        quota_bytes: usize,
    ) -> (Arc<MemoryKeyValueStore>, LocalStorageRepository<MemoryKeyValueStore>) {
        let store = Arc::new(MemoryKeyValueStore::new());
        let config = CacheConfig { quota_bytes, ..CacheConfig::default() };
        (store.clone(), LocalStorageRepository::new(store, config))
    }

    #[tokio::test]
    async fn test_round_trip_through_single_key() {
        let (store, repo) = repository(10_000);
        repo.save_vehicle("ana", &json!({ "id": "v1", "_type": "Car" })).await.unwrap();
        repo.save_vehicle("ana", &json!({ "id": "v2", "_type": "Truck" })).await.unwrap();

        assert_eq!(store.len().await, 1);
        let records = repo.load_all("ana").await.unwrap();
        assert_eq!(records.len(), 2);

        assert!(repo.delete_vehicle("ana", "v1").await.unwrap());
        assert!(!repo.delete_vehicle("ana", "v1").await.unwrap());
        assert_eq!(repo.load_all("ana").await.unwrap().len(), 1);

        assert!(repo.delete_vehicle("ana", "v2").await.unwrap());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_numeric_legacy_id_is_replaced_in_place() {
        let (_, repo) = repository(10_000);
        repo.save_all("ana", &[json!({ "id": 1700000000000u64, "status": "off" })]).await.unwrap();

        repo.save_vehicle("ana", &json!({ "id": "1700000000000", "status": "on" })).await.unwrap();
        let records = repo.load_all("ana").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["status"], "on");

        assert!(repo.delete_vehicle("ana", "1700000000000").await.unwrap());
        assert!(repo.load_all("ana").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quota_exceeded_keeps_previous_state() {
        let (_, repo) = repository(60);
        repo.save_vehicle("ana", &json!({ "id": "v1" })).await.unwrap();

        let big = json!({ "id": "v2", "description": "x".repeat(100) });
        let result = repo.save_vehicle("ana", &big).await;
        assert!(matches!(result, Err(StoreError::QuotaExceeded { .. })));
        assert_eq!(repo.load_all("ana").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_payloads() {
        let (store, repo) = repository(10_000);
        let key = CacheConfig::default().garage_key("ana");

        store.set(&key, "{\"not\":\"an array\"}").await.unwrap();
        assert!(repo.load_all("ana").await.unwrap().is_empty());

        store.set(&key, "not json").await.unwrap();
        assert!(matches!(repo.load_all("ana").await, Err(StoreError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_sharing_unsupported() {
        let (_, repo) = repository(10_000);
        assert!(matches!(
            repo.set_public("ana", "v1", true).await,
            Err(StoreError::Unsupported(_))
        ));
        assert!(repo.load_public("ana").await.unwrap().is_empty());
    }
}
