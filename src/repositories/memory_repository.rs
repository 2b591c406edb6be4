//! Persistencia en memoria
//!
//! Backend por defecto en desarrollo. Permite simular fallos de escritura
//! para ejercitar el rollback del servicio.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tokio::sync::RwLock;

use super::vehicle_repository::{has_id, record_id, SharedRecord, StoreError, VehicleRepository};

#[derive(Debug, Clone)]
struct StoredRecord {
    record: Value,
    public: bool,
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    garages: RwLock<HashMap<String, Vec<StoredRecord>>>,
    fail_writes: AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sembrar registros crudos (incluso corruptos) para un dueño
    pub async fn seed(&self, owner: &str, records: Vec<Value>) {
        let stored = records
            .into_iter()
            .map(|record| StoredRecord { record, public: false })
            .collect();
        self.garages.write().await.insert(owner.to_string(), stored);
    }

    /// Hacer fallar todas las escrituras siguientes
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn records(&self, owner: &str) -> Vec<Value> {
        self.garages
            .read()
            .await
            .get(owner)
            .map(|records| records.iter().map(|stored| stored.record.clone()).collect())
            .unwrap_or_default()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl VehicleRepository for MemoryRepository {
    async fn load_all(&self, owner: &str) -> Result<Vec<Value>, StoreError> {
        Ok(self.records(owner).await)
    }

    async fn save_vehicle(&self, owner: &str, record: &Value) -> Result<(), StoreError> {
        self.check_writable()?;
        let id = record_id(record)
            .ok_or_else(|| StoreError::InvalidRecord("missing id".to_string()))?;

        let mut garages = self.garages.write().await;
        let records = garages.entry(owner.to_string()).or_default();
        match records.iter_mut().find(|stored| has_id(&stored.record, &id)) {
            Some(stored) => stored.record = record.clone(),
            None => records.push(StoredRecord { record: record.clone(), public: false }),
        }
        Ok(())
    }

    async fn delete_vehicle(&self, owner: &str, id: &str) -> Result<bool, StoreError> {
        self.check_writable()?;
        let mut garages = self.garages.write().await;
        let Some(records) = garages.get_mut(owner) else {
            return Ok(false);
        };
        let before = records.len();
        records.retain(|stored| !has_id(&stored.record, id));
        Ok(records.len() != before)
    }

    async fn save_all(&self, owner: &str, records: &[Value]) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut garages = self.garages.write().await;
        let previous = garages.remove(owner).unwrap_or_default();
        let stored = records
            .iter()
            .map(|record| StoredRecord {
                record: record.clone(),
                public: previous
                    .iter()
                    .any(|old| old.public && record_id(&old.record) == record_id(record)),
            })
            .collect();
        garages.insert(owner.to_string(), stored);
        Ok(())
    }

    async fn set_public(&self, owner: &str, id: &str, public: bool) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut garages = self.garages.write().await;
        let stored = garages
            .get_mut(owner)
            .and_then(|records| records.iter_mut().find(|stored| has_id(&stored.record, id)))
            .ok_or_else(|| StoreError::InvalidRecord(format!("vehicle '{}' not stored", id)))?;
        stored.public = public;
        Ok(())
    }

    async fn load_public(&self, viewer: &str) -> Result<Vec<SharedRecord>, StoreError> {
        let garages = self.garages.read().await;
        let mut shared: Vec<SharedRecord> = garages
            .iter()
            .filter(|(owner, _)| owner.as_str() != viewer)
            .flat_map(|(owner, records)| {
                records.iter().filter(|stored| stored.public).map(move |stored| SharedRecord {
                    owner: owner.clone(),
                    record: stored.record.clone(),
                })
            })
            .collect();
        shared.sort_by(|a, b| a.owner.cmp(&b.owner));
        Ok(shared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_upsert_and_delete() {
        let repo = MemoryRepository::new();
        repo.save_vehicle("ana", &json!({ "id": "v1", "make": "A" })).await.unwrap();
        repo.save_vehicle("ana", &json!({ "id": "v1", "make": "B" })).await.unwrap();
        let records = repo.load_all("ana").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["make"], "B");

        assert!(repo.delete_vehicle("ana", "v1").await.unwrap());
        assert!(!repo.delete_vehicle("ana", "v1").await.unwrap());
        assert!(repo.save_vehicle("ana", &json!({ "make": "C" })).await.is_err());
    }

    #[tokio::test]
    async fn test_numeric_legacy_id_matches_text_id() {
        let repo = MemoryRepository::new();
        repo.seed("ana", vec![json!({ "id": 1700000000000u64, "make": "A" })]).await;

        repo.save_vehicle("ana", &json!({ "id": "1700000000000", "make": "B" })).await.unwrap();
        let records = repo.load_all("ana").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["make"], "B");

        repo.seed("ana", vec![json!({ "id": 42, "make": "C" })]).await;
        repo.set_public("ana", "42", true).await.unwrap();
        assert!(repo.delete_vehicle("ana", "42").await.unwrap());
        assert!(repo.load_all("ana").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let repo = MemoryRepository::new();
        repo.set_fail_writes(true);
        let result = repo.save_vehicle("ana", &json!({ "id": "v1" })).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert!(repo.load_all("ana").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_public_sharing() {
        let repo = MemoryRepository::new();
        repo.save_vehicle("ana", &json!({ "id": "a1" })).await.unwrap();
        repo.save_vehicle("bruno", &json!({ "id": "b1" })).await.unwrap();
        repo.save_vehicle("bruno", &json!({ "id": "b2" })).await.unwrap();
        repo.set_public("bruno", "b2", true).await.unwrap();
        repo.set_public("ana", "a1", true).await.unwrap();

        let shared = repo.load_public("ana").await.unwrap();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].owner, "bruno");
        assert_eq!(shared[0].record["id"], "b2");

        repo.save_all("bruno", &[json!({ "id": "b2" })]).await.unwrap();
        assert_eq!(repo.load_public("ana").await.unwrap().len(), 1);
        assert!(repo.set_public("bruno", "zz", true).await.is_err());
    }
}
