//! Persistencia remota vía API HTTP
//!
//! Cliente delgado sobre un servicio REST de persistencia de garages.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;

use super::vehicle_repository::{record_id, SharedRecord, StoreError, VehicleRepository};

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Serialize)]
struct VisibilityPayload {
    public: bool,
}

pub struct HttpRepository {
    base_url: String,
    client: Client,
}

impl HttpRepository {
    pub fn new(base_url: impl Into<String>) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn vehicles_url(&self, owner: &str) -> String {
        format!("{}/garages/{}/vehicles", self.base_url, urlencoding::encode(owner))
    }

    fn vehicle_url(&self, owner: &str, id: &str) -> String {
        format!("{}/{}", self.vehicles_url(owner), urlencoding::encode(id))
    }

    async fn check(response: Response, context: &str) -> Result<Response, StoreError> {
        let status = response.status();
        if !status.is_success() {
            log::error!("❌ API de persistencia respondió {} en {}", status, context);
        }
        Ok(response.error_for_status()?)
    }
}

#[async_trait::async_trait]
impl VehicleRepository for HttpRepository {
    async fn load_all(&self, owner: &str) -> Result<Vec<Value>, StoreError> {
        let url = self.vehicles_url(owner);
        log::debug!("🌐 GET {}", url);
        let response = Self::check(self.client.get(&url).send().await?, "load_all").await?;
        Ok(response.json::<Vec<Value>>().await?)
    }

    async fn save_vehicle(&self, owner: &str, record: &Value) -> Result<(), StoreError> {
        let id = record_id(record)
            .ok_or_else(|| StoreError::InvalidRecord("missing id".to_string()))?;
        let url = self.vehicle_url(owner, &id);
        log::debug!("🌐 PUT {}", url);
        Self::check(self.client.put(&url).json(record).send().await?, "save_vehicle").await?;
        Ok(())
    }

    async fn delete_vehicle(&self, owner: &str, id: &str) -> Result<bool, StoreError> {
        let url = self.vehicle_url(owner, id);
        log::debug!("🌐 DELETE {}", url);
        let response = self.client.delete(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::check(response, "delete_vehicle").await?;
        Ok(true)
    }

    async fn save_all(&self, owner: &str, records: &[Value]) -> Result<(), StoreError> {
        let url = self.vehicles_url(owner);
        log::debug!("🌐 PUT {} ({} registros)", url, records.len());
        Self::check(self.client.put(&url).json(records).send().await?, "save_all").await?;
        Ok(())
    }

    async fn set_public(&self, owner: &str, id: &str, public: bool) -> Result<(), StoreError> {
        let url = format!("{}/visibility", self.vehicle_url(owner, id));
        Self::check(
            self.client.put(&url).json(&VisibilityPayload { public }).send().await?,
            "set_public",
        )
        .await?;
        Ok(())
    }

    async fn load_public(&self, viewer: &str) -> Result<Vec<SharedRecord>, StoreError> {
        let url = format!(
            "{}/public-vehicles?viewer={}",
            self.base_url,
            urlencoding::encode(viewer)
        );
        let response = Self::check(self.client.get(&url).send().await?, "load_public").await?;
        Ok(response.json::<Vec<SharedRecord>>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_are_encoded() {
        let repo = HttpRepository::new("https://api.example.test/v1/").unwrap();
        assert_eq!(repo.base_url(), "https://api.example.test/v1");
        assert_eq!(
            repo.vehicle_url("ana maria", "a/b"),
            "https://api.example.test/v1/garages/ana%20maria/vehicles/a%2Fb"
        );
    }
}
