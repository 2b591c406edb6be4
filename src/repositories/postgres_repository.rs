use chrono::Utc;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use super::vehicle_repository::{
    record_id, record_type, SharedRecord, StoreError, VehicleRepository,
};

/// Repositorio documental sobre PostgreSQL
///
/// Un documento JSONB por vehículo en `garage_vehicles`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn require_id(record: &Value) -> Result<String, StoreError> {
        record_id(record).ok_or_else(|| StoreError::InvalidRecord("missing id".to_string()))
    }
}

#[async_trait::async_trait]
impl VehicleRepository for PostgresRepository {
    async fn load_all(&self, owner: &str) -> Result<Vec<Value>, StoreError> {
        let rows = sqlx::query(
            "SELECT payload FROM garage_vehicles WHERE owner = $1 ORDER BY created_at, id",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                row.try_get::<Json<Value>, _>("payload")
                    .map(|payload| payload.0)
                    .map_err(StoreError::from)
            })
            .collect()
    }

    async fn save_vehicle(&self, owner: &str, record: &Value) -> Result<(), StoreError> {
        let id = Self::require_id(record)?;
        sqlx::query(
            r#"
            INSERT INTO garage_vehicles (owner, id, vehicle_type, payload, is_public, created_at, updated_at)
            VALUES ($1, $2, $3, $4, FALSE, $5, $5)
            ON CONFLICT (owner, id)
            DO UPDATE SET vehicle_type = EXCLUDED.vehicle_type, payload = EXCLUDED.payload, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(owner)
        .bind(id)
        .bind(record_type(record))
        .bind(Json(record))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_vehicle(&self, owner: &str, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM garage_vehicles WHERE owner = $1 AND id = $2")
            .bind(owner)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn save_all(&self, owner: &str, records: &[Value]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let ids = records
            .iter()
            .map(Self::require_id)
            .collect::<Result<Vec<String>, StoreError>>()?;

        sqlx::query("DELETE FROM garage_vehicles WHERE owner = $1 AND NOT (id = ANY($2))")
            .bind(owner)
            .bind(&ids)
            .execute(&mut *tx)
            .await?;

        let now = Utc::now();
        for (record, id) in records.iter().zip(&ids) {
            sqlx::query(
                r#"
                INSERT INTO garage_vehicles (owner, id, vehicle_type, payload, is_public, created_at, updated_at)
                VALUES ($1, $2, $3, $4, FALSE, $5, $5)
                ON CONFLICT (owner, id)
                DO UPDATE SET vehicle_type = EXCLUDED.vehicle_type, payload = EXCLUDED.payload, updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind(owner)
            .bind(id)
            .bind(record_type(record))
            .bind(Json(record))
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn set_public(&self, owner: &str, id: &str, public: bool) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE garage_vehicles SET is_public = $3, updated_at = $4 WHERE owner = $1 AND id = $2",
        )
        .bind(owner)
        .bind(id)
        .bind(public)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::InvalidRecord(format!("vehicle '{}' not stored", id)));
        }
        Ok(())
    }

    async fn load_public(&self, viewer: &str) -> Result<Vec<SharedRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT owner, payload FROM garage_vehicles WHERE is_public AND owner <> $1 ORDER BY owner, created_at",
        )
        .bind(viewer)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(SharedRecord {
                    owner: row.try_get("owner")?,
                    record: row.try_get::<Json<Value>, _>("payload")?.0,
                })
            })
            .collect()
    }
}
