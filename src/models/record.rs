//! Registros etiquetados y reconstrucción
//!
//! `Vehicle::serialize` produce el registro plano `{_type, ...}` que consume
//! la persistencia. `reconstruct_vehicle` lee el discriminante una sola vez
//! y despacha con un `match` exhaustivo; un `_type` desconocido o que no
//! coincide nunca se convierte en otro subtipo.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::maintenance::{MaintenanceData, MaintenanceRecord};
use super::variants::{Cargo, UnknownVehicleType, VehicleKind, VehicleType, DEFAULT_MAX_LOAD};
use super::vehicle::{NewVehicle, Vehicle, VehicleError, VehicleStatus};
use crate::utils::validation::{coerce_integer, coerce_number, InputWarning, Sanitized};

/// Registro persistido de un vehículo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    #[serde(rename = "_type")]
    pub vehicle_type: VehicleType,
    pub id: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub status: VehicleStatus,
    pub speed: f64,
    pub maintenance_history: Vec<MaintenanceData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turbo_on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_load: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_load: Option<u32>,
}

/// Motivo por el que un registro no pudo reconstruirse
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconstructError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record has no _type")]
    MissingType,

    #[error("unknown _type '{0}'")]
    UnknownType(String),

    #[error("expected _type '{expected}', found '{found}'")]
    TypeMismatch { expected: VehicleType, found: String },

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid vehicle: {0}")]
    Invalid(#[from] VehicleError),
}

impl Vehicle {
    pub fn serialize(&self) -> VehicleRecord {
        let cargo = self.kind().cargo();
        VehicleRecord {
            vehicle_type: self.vehicle_type(),
            id: self.id().to_string(),
            make: self.make().to_string(),
            model: self.model().to_string(),
            year: self.year(),
            status: self.status(),
            speed: self.speed(),
            maintenance_history: self
                .maintenance_history()
                .iter()
                .map(MaintenanceRecord::serialize)
                .collect(),
            turbo_on: self.kind().turbo_on(),
            max_load: cargo.map(Cargo::max_load),
            current_load: cargo.map(Cargo::current_load),
        }
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self.serialize())
    }

    /// Reconstruir cualquier registro etiquetado; `None` si se descarta
    pub fn reconstruct(data: &Value) -> Option<Self> {
        reconstruct_vehicle(data).ok()
    }
}

/// Despachador de reconstrucción por `_type`
pub fn reconstruct_vehicle(data: &Value) -> Result<Vehicle, ReconstructError> {
    let object = data.as_object().ok_or(ReconstructError::NotAnObject)?;
    let tag = object
        .get("_type")
        .and_then(Value::as_str)
        .ok_or(ReconstructError::MissingType)?;
    let vehicle_type = tag
        .parse::<VehicleType>()
        .map_err(|UnknownVehicleType(tag)| ReconstructError::UnknownType(tag))?;

    vehicle_type.reconstruct(data)
}

impl VehicleType {
    /// Reconstrucción estricta: el `_type` del registro debe ser exactamente este
    pub fn reconstruct(self, data: &Value) -> Result<Vehicle, ReconstructError> {
        let object = data.as_object().ok_or(ReconstructError::NotAnObject)?;
        let found = object.get("_type").and_then(Value::as_str).unwrap_or_default();
        if found != self.as_str() {
            return Err(ReconstructError::TypeMismatch { expected: self, found: found.to_string() });
        }

        let mut warnings = Vec::new();
        let kind = match self {
            VehicleType::Vehicle => VehicleKind::Vehicle,
            VehicleType::Car => VehicleKind::Car,
            VehicleType::SportsCar => VehicleKind::SportsCar {
                turbo_on: object.get("turboOn").and_then(Value::as_bool).unwrap_or(false),
            },
            VehicleType::Truck => {
                let max_load = object
                    .get("maxLoad")
                    .filter(|value| !value.is_null())
                    .ok_or(ReconstructError::MissingField("maxLoad"))?;
                let cargo = cargo_from_record(max_load, object.get("currentLoad"));
                warnings.extend(cargo.warnings);
                VehicleKind::Truck(cargo.value)
            }
        };

        reconstruct_base(object, kind, warnings)
    }
}

fn reconstruct_base(
    object: &serde_json::Map<String, Value>,
    kind: VehicleKind,
    mut warnings: Vec<InputWarning>,
) -> Result<Vehicle, ReconstructError> {
    let make = object
        .get("make")
        .and_then(Value::as_str)
        .ok_or(ReconstructError::MissingField("make"))?;
    let model = object
        .get("model")
        .and_then(Value::as_str)
        .ok_or(ReconstructError::MissingField("model"))?;
    let year = object
        .get("year")
        .and_then(coerce_integer)
        .ok_or(ReconstructError::MissingField("year"))?;

    let built = Vehicle::build(NewVehicle {
        id: object.get("id").and_then(normalize_id),
        make: make.to_string(),
        model: model.to_string(),
        year,
        kind,
    })?;
    warnings.extend(built.warnings);
    let mut vehicle = built.value;

    for warning in &warnings {
        log::warn!("⚠️ Reconstrucción de {}: {}", vehicle.id(), warning);
    }

    let status = object
        .get("status")
        .and_then(Value::as_str)
        .and_then(VehicleStatus::parse)
        .unwrap_or(VehicleStatus::Off);
    let speed = object.get("speed").and_then(coerce_number).unwrap_or(0.0);
    vehicle.restore_motion(status, speed);

    let history = object
        .get("maintenanceHistory")
        .and_then(Value::as_array)
        .map(|records| {
            records
                .iter()
                .filter_map(|data| {
                    let record = MaintenanceRecord::reconstruct(data);
                    if record.is_none() {
                        log::warn!(
                            "⚠️ Mantenimiento descartado en vehículo {}: {}",
                            vehicle.id(),
                            data
                        );
                    }
                    record
                })
                .collect()
        })
        .unwrap_or_default();
    vehicle.restore_history(history);

    Ok(vehicle)
}

/// Carga de un camión leída de un registro; conserva el texto de una capacidad inválida
pub(crate) fn cargo_from_record(
    max_load: &Value,
    current_load: Option<&Value>,
) -> Sanitized<Cargo> {
    let current_load = current_load.and_then(coerce_integer);
    match coerce_integer(max_load) {
        Some(max_load) => Cargo::new(Some(max_load), current_load),
        None => {
            let input = match max_load {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            let mut cargo = Cargo::new(None, current_load);
            let warning = InputWarning::InvalidMaxLoad { input, replacement: DEFAULT_MAX_LOAD };
            cargo.warnings.insert(0, warning);
            cargo
        }
    }
}

/// Id normalizado: los ids numéricos legados se leen como texto
pub(crate) fn normalize_id(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
