//! Modelo de Garage
//!
//! Colección en memoria de los vehículos de un dueño, más el espejo de
//! solo lectura de los vehículos públicos de otros usuarios.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use super::maintenance::MaintenanceRecord;
use super::outcome::Refusal;
use super::record::{reconstruct_vehicle, VehicleRecord};
use super::vehicle::Vehicle;

/// Vehículo compartido por otro usuario
#[derive(Debug, Clone, PartialEq)]
pub struct PublicVehicle {
    pub owner: String,
    pub vehicle: Vehicle,
}

/// Cita futura con la información del vehículo de origen
#[derive(Debug, Clone, PartialEq)]
pub struct Appointment<'a> {
    pub vehicle_id: &'a str,
    pub vehicle_label: String,
    pub record: &'a MaintenanceRecord,
}

/// Forma serializable de una cita para capas superiores
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppointmentView {
    pub vehicle_id: String,
    pub vehicle_label: String,
    pub record_id: String,
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub cost: f64,
    pub description: String,
    pub formatted: String,
}

impl From<&Appointment<'_>> for AppointmentView {
    fn from(appointment: &Appointment<'_>) -> Self {
        let record = appointment.record;
        Self {
            vehicle_id: appointment.vehicle_id.to_string(),
            vehicle_label: appointment.vehicle_label.clone(),
            record_id: record.id.clone(),
            date: record.date.map(|date| date.to_rfc3339_opts(SecondsFormat::Millis, true)),
            kind: record.kind.clone(),
            cost: record.cost,
            description: record.description.clone(),
            formatted: record.format(),
        }
    }
}

/// Registro descartado durante una carga
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedRecord {
    pub index: usize,
    pub id: Option<String>,
    pub reason: String,
}

/// Resultado de una carga masiva
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub loaded: usize,
    pub dropped: Vec<DroppedRecord>,
}

impl LoadReport {
    fn drop_record(&mut self, index: usize, data: &Value, reason: String) {
        let id = data.get("id").map(|id| match id {
            Value::String(id) => id.clone(),
            other => other.to_string(),
        });
        log::warn!("⚠️ Registro {} descartado ({:?}): {}", index, id, reason);
        self.dropped.push(DroppedRecord { index, id, reason });
    }
}

/// Garage de un dueño; ids únicos dentro de `vehicles`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Garage {
    owner: String,
    vehicles: Vec<Vehicle>,
    public_vehicles: Vec<PublicVehicle>,
}

impl Garage {
    pub fn new(owner: impl Into<String>) -> Self {
        Self { owner: owner.into(), ..Default::default() }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.vehicles.iter().any(|vehicle| vehicle.id() == id)
    }

    /// Vehículos ordenados para mostrar: marca, modelo, año
    pub fn sorted_vehicles(&self) -> Vec<&Vehicle> {
        let mut sorted: Vec<&Vehicle> = self.vehicles.iter().collect();
        sorted.sort_by(|a, b| {
            a.make()
                .to_lowercase()
                .cmp(&b.make().to_lowercase())
                .then_with(|| a.model().to_lowercase().cmp(&b.model().to_lowercase()))
                .then_with(|| a.year().cmp(&b.year()))
        });
        sorted
    }

    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> Result<(), Refusal> {
        if self.contains(vehicle.id()) {
            return Err(Refusal::DuplicateId { id: vehicle.id().to_string() });
        }
        self.vehicles.push(vehicle);
        Ok(())
    }

    /// Quitar por id; el historial de mantenimiento se va con el vehículo
    pub fn remove_vehicle(&mut self, id: &str) -> Option<Vehicle> {
        self.take_vehicle(id).map(|(_, vehicle)| vehicle)
    }

    pub(crate) fn take_vehicle(&mut self, id: &str) -> Option<(usize, Vehicle)> {
        let position = self.position(id)?;
        Some((position, self.vehicles.remove(position)))
    }

    pub(crate) fn restore_vehicle(&mut self, position: usize, vehicle: Vehicle) {
        let position = position.min(self.vehicles.len());
        self.vehicles.insert(position, vehicle);
    }

    pub(crate) fn replace_vehicle(&mut self, position: usize, vehicle: Vehicle) {
        self.vehicles[position] = vehicle;
    }

    pub(crate) fn position(&self, id: &str) -> Option<usize> {
        self.vehicles.iter().position(|vehicle| vehicle.id() == id)
    }

    pub fn find_vehicle(&self, id: &str) -> Option<&Vehicle> {
        self.vehicles.iter().find(|vehicle| vehicle.id() == id)
    }

    pub fn find_vehicle_mut(&mut self, id: &str) -> Option<&mut Vehicle> {
        self.vehicles.iter_mut().find(|vehicle| vehicle.id() == id)
    }

    /// Todas las citas futuras ordenadas por fecha
    ///
    /// Los empates conservan el orden de vehículos y luego el de cada historial.
    pub fn all_future_appointments(&self, now: DateTime<Utc>) -> Vec<Appointment<'_>> {
        let mut appointments: Vec<Appointment<'_>> = self
            .vehicles
            .iter()
            .flat_map(|vehicle| {
                let label = vehicle.label();
                vehicle.future_appointments_at(now).map(move |record| Appointment {
                    vehicle_id: vehicle.id(),
                    vehicle_label: label.clone(),
                    record,
                })
            })
            .collect();
        appointments.sort_by_key(|appointment| appointment.record.date);
        appointments
    }

    pub fn serialize_all(&self) -> Vec<VehicleRecord> {
        self.vehicles.iter().map(Vehicle::serialize).collect()
    }

    /// Reemplazar la colección con registros etiquetados
    ///
    /// Los registros que no se reconstruyen o repiten id se descartan.
    pub fn load_records(&mut self, records: &[Value]) -> LoadReport {
        let mut report = LoadReport::default();
        let mut vehicles: Vec<Vehicle> = Vec::with_capacity(records.len());

        for (index, data) in records.iter().enumerate() {
            match reconstruct_vehicle(data) {
                Ok(vehicle) if vehicles.iter().any(|existing| existing.id() == vehicle.id()) => {
                    report.drop_record(index, data, format!("duplicate id '{}'", vehicle.id()));
                }
                Ok(vehicle) => vehicles.push(vehicle),
                Err(e) => report.drop_record(index, data, e.to_string()),
            }
        }

        report.loaded = vehicles.len();
        self.vehicles = vehicles;
        report
    }

    pub fn public_vehicles(&self) -> &[PublicVehicle] {
        &self.public_vehicles
    }

    /// Reemplazar el espejo público; los vehículos del propio dueño se ignoran
    pub fn load_public_records(&mut self, records: &[(String, Value)]) -> LoadReport {
        let mut report = LoadReport::default();
        let mut public_vehicles = Vec::with_capacity(records.len());

        for (index, (owner, data)) in records.iter().enumerate() {
            if *owner == self.owner {
                continue;
            }
            match reconstruct_vehicle(data) {
                Ok(vehicle) => public_vehicles.push(PublicVehicle {
                    owner: owner.clone(),
                    vehicle,
                }),
                Err(e) => report.drop_record(index, data, e.to_string()),
            }
        }

        report.loaded = public_vehicles.len();
        self.public_vehicles = public_vehicles;
        report
    }
}
