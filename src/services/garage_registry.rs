//! Registro explícito de sesiones de garage abiertas, por dueño

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use super::garage_service::{GarageError, GarageService};
use crate::repositories::VehicleRepository;

pub type GarageSession = Arc<Mutex<GarageService>>;

pub struct GarageRegistry {
    repository: Arc<dyn VehicleRepository>,
    sessions: RwLock<HashMap<String, GarageSession>>,
}

impl GarageRegistry {
    pub fn new(repository: Arc<dyn VehicleRepository>) -> Self {
        Self {
            repository,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Sesión existente o una nueva cargada desde la persistencia
    ///
    /// La carga ocurre sin tomar el mapa de sesiones; si otra llamada abrió
    /// el mismo dueño mientras tanto, gana la sesión ya registrada.
    pub async fn open_session(&self, owner: &str) -> Result<GarageSession, GarageError> {
        if let Some(session) = self.session(owner).await {
            return Ok(session);
        }

        let (mut service, _) = GarageService::open(owner, self.repository.clone()).await?;
        if let Err(e) = service.refresh_public_vehicles().await {
            log::warn!(
                "⚠️ No se pudieron cargar los vehículos públicos para '{}': {}",
                owner,
                e
            );
        }

        let mut sessions = self.sessions.write().await;
        let session = match sessions.entry(owner.to_string()) {
            Entry::Occupied(existing) => {
                log::debug!("Sesión de '{}' ya abierta por otra petición", owner);
                return Ok(existing.get().clone());
            }
            Entry::Vacant(slot) => slot.insert(Arc::new(Mutex::new(service))).clone(),
        };
        log::info!("📂 Sesión abierta para '{}' ({} activas)", owner, sessions.len());
        Ok(session)
    }

    pub async fn session(&self, owner: &str) -> Option<GarageSession> {
        self.sessions.read().await.get(owner).cloned()
    }

    /// Descartar la sesión en memoria; la próxima apertura recarga desde la persistencia
    pub async fn close_session(&self, owner: &str) -> bool {
        let closed = self.sessions.write().await.remove(owner).is_some();
        if closed {
            log::info!("📁 Sesión cerrada para '{}'", owner);
        }
        closed
    }

    pub async fn open_sessions(&self) -> Vec<String> {
        let mut owners: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        owners.sort();
        owners
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::Value;
    use tokio::sync::Notify;

    use crate::models::Vehicle;
    use crate::repositories::{MemoryRepository, SharedRecord, StoreError};

    /// Backend cuya carga del dueño "lento" espera hasta que se libere
    #[derive(Default)]
    struct GatedRepository {
        inner: MemoryRepository,
        entered: Notify,
        release: Notify,
    }

    #[async_trait::async_trait]
    impl VehicleRepository for GatedRepository {
        async fn load_all(&self, owner: &str) -> Result<Vec<Value>, StoreError> {
            if owner == "lento" {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.inner.load_all(owner).await
        }

        async fn save_vehicle(&self, owner: &str, record: &Value) -> Result<(), StoreError> {
            self.inner.save_vehicle(owner, record).await
        }

        async fn delete_vehicle(&self, owner: &str, id: &str) -> Result<bool, StoreError> {
            self.inner.delete_vehicle(owner, id).await
        }

        async fn save_all(&self, owner: &str, records: &[Value]) -> Result<(), StoreError> {
            self.inner.save_all(owner, records).await
        }

        async fn set_public(&self, owner: &str, id: &str, public: bool) -> Result<(), StoreError> {
            self.inner.set_public(owner, id, public).await
        }

        async fn load_public(&self, viewer: &str) -> Result<Vec<SharedRecord>, StoreError> {
            self.inner.load_public(viewer).await
        }
    }

    #[tokio::test]
    async fn test_sessions_are_shared_per_owner() {
        let registry = GarageRegistry::new(Arc::new(MemoryRepository::new()));
        let first = registry.open_session("ana").await.unwrap();
        first
            .lock()
            .await
            .add_vehicle(Vehicle::car("Fiat", "Uno", 2010).unwrap())
            .await
            .unwrap();

        let second = registry.open_session("ana").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.lock().await.garage().len(), 1);

        registry.open_session("bruno").await.unwrap();
        assert_eq!(registry.open_sessions().await, vec!["ana".to_string(), "bruno".to_string()]);
    }

    #[tokio::test]
    async fn test_closed_session_reloads_from_storage() {
        let registry = GarageRegistry::new(Arc::new(MemoryRepository::new()));
        let session = registry.open_session("ana").await.unwrap();
        session
            .lock()
            .await
            .add_vehicle(Vehicle::car("Fiat", "Uno", 2010).unwrap())
            .await
            .unwrap();

        assert!(registry.close_session("ana").await);
        assert!(!registry.close_session("ana").await);
        assert!(registry.session("ana").await.is_none());

        let reopened = registry.open_session("ana").await.unwrap();
        assert!(!Arc::ptr_eq(&session, &reopened));
        assert_eq!(reopened.lock().await.garage().len(), 1);
    }

    #[tokio::test]
    async fn test_slow_load_does_not_block_other_owners() {
        let repository = Arc::new(GatedRepository::default());
        let registry = Arc::new(GarageRegistry::new(repository.clone()));

        let pending = tokio::spawn({
            let registry = registry.clone();
            async move { registry.open_session("lento").await.is_ok() }
        });
        repository.entered.notified().await;

        let opened =
            tokio::time::timeout(Duration::from_secs(1), registry.open_session("ana")).await;
        assert!(matches!(opened, Ok(Ok(_))));
        assert_eq!(registry.open_sessions().await, vec!["ana".to_string()]);

        repository.release.notify_one();
        assert!(pending.await.unwrap());
        assert_eq!(registry.open_sessions().await, vec!["ana".to_string(), "lento".to_string()]);
    }
}
