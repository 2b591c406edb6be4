//! Sesión de garage con escritura inmediata
//!
//! Cada mutación se aplica primero en memoria y luego se persiste. Si la
//! persistencia falla, el estado en memoria vuelve a la instantánea previa
//! y el error se propaga al llamador.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::models::analytics::GarageStats;
use crate::models::garage::AppointmentView;
use crate::models::{
    Garage, LoadReport, MaintenanceRecord, OperationResult, Refusal, Vehicle, VehicleError,
};
use crate::repositories::{StoreError, VehicleRepository};

/// Errores de la sesión de garage
#[derive(Error, Debug)]
pub enum GarageError {
    #[error(transparent)]
    Refused(#[from] Refusal),

    #[error("Vehicle not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Invalid(#[from] VehicleError),

    /// Solo se emite después de restaurar el estado en memoria
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<serde_json::Error> for GarageError {
    fn from(error: serde_json::Error) -> Self {
        GarageError::Store(StoreError::Serialization(error))
    }
}

/// Copia de un vehículo antes de mutarlo, con el checksum de su registro
struct VehicleSnapshot {
    vehicle: Vehicle,
    checksum: md5::Digest,
}

impl VehicleSnapshot {
    fn capture(vehicle: &Vehicle) -> Result<Self, serde_json::Error> {
        Ok(Self {
            vehicle: vehicle.clone(),
            checksum: checksum(&vehicle.to_value()?),
        })
    }

    /// Registro a persistir si el vehículo cambió
    fn changed(&self, vehicle: &Vehicle) -> Result<Option<Value>, serde_json::Error> {
        let record = vehicle.to_value()?;
        Ok((checksum(&record) != self.checksum).then_some(record))
    }
}

fn checksum(record: &Value) -> md5::Digest {
    md5::compute(record.to_string())
}

pub struct GarageService {
    garage: Garage,
    repository: Arc<dyn VehicleRepository>,
}

impl GarageService {
    /// Abrir la sesión cargando los registros del dueño
    ///
    /// Los registros inválidos se descartan y se informan en el `LoadReport`;
    /// un fallo de lectura del backend es un error.
    pub async fn open(
        owner: &str,
        repository: Arc<dyn VehicleRepository>,
    ) -> Result<(Self, LoadReport), GarageError> {
        let mut service = Self { garage: Garage::new(owner), repository };
        let report = service.reload().await?;
        Ok((service, report))
    }

    pub fn garage(&self) -> &Garage {
        &self.garage
    }

    pub fn owner(&self) -> &str {
        self.garage.owner()
    }

    pub fn vehicle(&self, id: &str) -> Result<&Vehicle, GarageError> {
        self.garage.find_vehicle(id).ok_or_else(|| GarageError::NotFound(id.to_string()))
    }

    /// Reemplazar el estado en memoria con lo que tiene la persistencia
    pub async fn reload(&mut self) -> Result<LoadReport, GarageError> {
        let records = self.repository.load_all(self.garage.owner()).await?;
        let report = self.garage.load_records(&records);
        log::info!(
            "🚗 Garage de '{}' cargado: {} vehículos, {} descartados",
            self.garage.owner(),
            report.loaded,
            report.dropped.len()
        );
        Ok(report)
    }

    pub async fn add_vehicle(&mut self, vehicle: Vehicle) -> Result<&Vehicle, GarageError> {
        let record = vehicle.to_value()?;
        let id = vehicle.id().to_string();
        self.garage.add_vehicle(vehicle)?;

        if let Err(e) = self.repository.save_vehicle(self.garage.owner(), &record).await {
            log::error!("❌ No se pudo guardar el vehículo {}: {}", id, e);
            self.garage.remove_vehicle(&id);
            return Err(e.into());
        }

        log::info!("✅ Vehículo {} agregado al garage de '{}'", id, self.garage.owner());
        self.vehicle(&id)
    }

    /// Quitar un vehículo con todo su historial
    pub async fn remove_vehicle(&mut self, id: &str) -> Result<Vehicle, GarageError> {
        let (position, vehicle) = self
            .garage
            .take_vehicle(id)
            .ok_or_else(|| GarageError::NotFound(id.to_string()))?;

        match self.repository.delete_vehicle(self.garage.owner(), id).await {
            Ok(existed) => {
                if !existed {
                    log::debug!("Vehículo {} no estaba persistido", id);
                }
                log::info!(
                    "🗑️ Vehículo {} eliminado del garage de '{}'",
                    id,
                    self.garage.owner()
                );
                Ok(vehicle)
            }
            Err(e) => {
                log::error!("❌ No se pudo eliminar el vehículo {}: {}", id, e);
                self.garage.restore_vehicle(position, vehicle);
                Err(e.into())
            }
        }
    }

    /// Aplicar una operación sobre un vehículo con escritura inmediata
    ///
    /// Si el registro serializado no cambió no se escribe nada. Si la
    /// escritura falla, el vehículo vuelve a su instantánea.
    pub async fn mutate_vehicle<F, T>(
        &mut self,
        id: &str,
        op: F,
    ) -> Result<Result<T, Refusal>, GarageError>
    where
        F: FnOnce(&mut Vehicle) -> Result<T, Refusal> + Send,
        T: Send,
    {
        let vehicle = self
            .garage
            .find_vehicle_mut(id)
            .ok_or_else(|| GarageError::NotFound(id.to_string()))?;
        let snapshot = VehicleSnapshot::capture(vehicle)?;
        let outcome = op(vehicle);

        let Some(record) = snapshot.changed(vehicle)? else {
            log::debug!("Vehículo {} sin cambios, se omite la escritura", id);
            return Ok(outcome);
        };

        if let Err(e) = self.repository.save_vehicle(self.garage.owner(), &record).await {
            log::warn!("⚠️ Escritura fallida para {}, restaurando instantánea: {}", id, e);
            if let Some(position) = self.garage.position(id) {
                self.garage.replace_vehicle(position, snapshot.vehicle);
            }
            return Err(e.into());
        }

        Ok(outcome)
    }

    pub async fn start(&mut self, id: &str) -> Result<OperationResult, GarageError> {
        self.mutate_vehicle(id, Vehicle::start).await
    }

    pub async fn stop(&mut self, id: &str) -> Result<OperationResult, GarageError> {
        self.mutate_vehicle(id, Vehicle::stop).await
    }

    pub async fn accelerate(
        &mut self,
        id: &str,
        amount: Option<f64>,
    ) -> Result<OperationResult, GarageError> {
        self.mutate_vehicle(id, |vehicle| vehicle.accelerate(amount)).await
    }

    pub async fn brake(
        &mut self,
        id: &str,
        amount: Option<f64>,
    ) -> Result<OperationResult, GarageError> {
        self.mutate_vehicle(id, |vehicle| vehicle.brake(amount)).await
    }

    pub async fn toggle_turbo(&mut self, id: &str) -> Result<OperationResult, GarageError> {
        self.mutate_vehicle(id, Vehicle::toggle_turbo).await
    }

    pub async fn load_cargo(
        &mut self,
        id: &str,
        amount: i64,
    ) -> Result<OperationResult, GarageError> {
        self.mutate_vehicle(id, |vehicle| vehicle.load_cargo(amount)).await
    }

    pub async fn unload_cargo(
        &mut self,
        id: &str,
        amount: i64,
    ) -> Result<OperationResult, GarageError> {
        self.mutate_vehicle(id, |vehicle| vehicle.unload_cargo(amount)).await
    }

    pub async fn add_maintenance(
        &mut self,
        id: &str,
        record: MaintenanceRecord,
    ) -> Result<OperationResult, GarageError> {
        self.mutate_vehicle(id, |vehicle| vehicle.add_maintenance(record)).await
    }

    pub async fn update_maintenance(
        &mut self,
        id: &str,
        record_id: &str,
        record: MaintenanceRecord,
    ) -> Result<OperationResult, GarageError> {
        self.mutate_vehicle(id, |vehicle| vehicle.update_maintenance(record, record_id)).await
    }

    pub async fn delete_maintenance(
        &mut self,
        id: &str,
        record_id: &str,
    ) -> Result<OperationResult, GarageError> {
        self.mutate_vehicle(id, |vehicle| vehicle.remove_maintenance(record_id)).await
    }

    /// Persistir la colección completa
    pub async fn save_all(&self) -> Result<usize, GarageError> {
        let records = self
            .garage
            .vehicles()
            .iter()
            .map(Vehicle::to_value)
            .collect::<Result<Vec<Value>, _>>()?;
        self.repository.save_all(self.garage.owner(), &records).await?;
        log::info!(
            "💾 Garage de '{}' sincronizado: {} vehículos",
            self.garage.owner(),
            records.len()
        );
        Ok(records.len())
    }

    pub async fn set_public(&self, id: &str, public: bool) -> Result<(), GarageError> {
        self.vehicle(id)?;
        self.repository.set_public(self.garage.owner(), id, public).await?;
        let visibility = if public { "público" } else { "privado" };
        log::info!("🌐 Vehículo {} ahora es {}", id, visibility);
        Ok(())
    }

    /// Recargar el espejo de vehículos públicos de otros dueños
    pub async fn refresh_public_vehicles(&mut self) -> Result<LoadReport, GarageError> {
        let shared = self.repository.load_public(self.garage.owner()).await?;
        let records: Vec<(String, Value)> = shared
            .into_iter()
            .map(|shared| (shared.owner, shared.record))
            .collect();
        Ok(self.garage.load_public_records(&records))
    }

    pub fn stats(&self, now: DateTime<Utc>) -> GarageStats {
        GarageStats::compute(&self.garage, now)
    }

    pub fn future_appointments(&self, now: DateTime<Utc>) -> Vec<AppointmentView> {
        self.garage
            .all_future_appointments(now)
            .iter()
            .map(AppointmentView::from)
            .collect()
    }
}
