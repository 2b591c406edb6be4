use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::models::{
    Capabilities, Cargo, MaintenanceRecord, OperationReport, PublicVehicle, Vehicle, VehicleError,
    VehicleKind, VehicleStatus, VehicleType,
};
use crate::utils::validation::{format_brl, InputWarning, Sanitized};

// Request para crear un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 64))]
    pub id: Option<String>,

    #[serde(default)]
    pub vehicle_type: Option<VehicleType>,

    #[validate(length(min = 1, max = 100))]
    pub make: String,

    #[validate(length(min = 1, max = 100))]
    pub model: String,

    pub year: i64,

    pub turbo_on: Option<bool>,

    pub max_load: Option<i64>,

    pub current_load: Option<i64>,
}

impl CreateVehicleRequest {
    /// Construir el vehículo; sin tipo explícito se crea un `Car`
    pub fn into_vehicle(self) -> Result<Sanitized<Vehicle>, VehicleError> {
        let mut warnings = Vec::new();
        let kind = match self.vehicle_type.unwrap_or(VehicleType::Car) {
            VehicleType::Vehicle => VehicleKind::Vehicle,
            VehicleType::Car => VehicleKind::Car,
            VehicleType::SportsCar => VehicleKind::SportsCar {
                turbo_on: self.turbo_on.unwrap_or(false),
            },
            VehicleType::Truck => {
                let cargo = Cargo::new(self.max_load, self.current_load);
                warnings.extend(cargo.warnings);
                VehicleKind::Truck(cargo.value)
            }
        };

        let mut built = Vehicle::build(crate::models::NewVehicle {
            id: self.id,
            make: self.make,
            model: self.model,
            year: self.year,
            kind,
        })?;
        warnings.append(&mut built.warnings);
        Ok(Sanitized::with_warnings(built.value, warnings))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleAction {
    Start,
    Stop,
    Accelerate,
    Brake,
    ToggleTurbo,
    LoadCargo,
    UnloadCargo,
}

// Request de acción sobre un vehículo
#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: VehicleAction,
    pub amount: Option<f64>,
}

// Request de registro de mantenimiento
#[derive(Debug, Deserialize, Validate)]
pub struct MaintenanceRequest {
    #[validate(length(min = 1, max = 40))]
    pub date: String,

    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 100))]
    pub kind: String,

    #[serde(default)]
    pub cost: Value,

    #[validate(length(max = 500))]
    pub description: Option<String>,
}

impl MaintenanceRequest {
    pub fn to_record(&self) -> Sanitized<MaintenanceRecord> {
        MaintenanceRecord::from_form(
            &self.date,
            &self.kind,
            &self.cost,
            self.description.as_deref(),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub public: bool,
}

#[derive(Debug, Serialize)]
pub struct VisibilityResponse {
    pub id: String,
    pub public: bool,
}

// Response de mantenimiento
#[derive(Debug, Serialize)]
pub struct MaintenanceResponse {
    pub id: String,
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub cost: f64,
    pub cost_label: String,
    pub description: String,
    pub formatted: String,
}

impl From<&MaintenanceRecord> for MaintenanceResponse {
    fn from(record: &MaintenanceRecord) -> Self {
        let data = record.serialize();
        Self {
            id: data.id,
            date: data.date,
            kind: data.kind,
            cost: record.cost,
            cost_label: record.cost_label(),
            description: data.description,
            formatted: record.format(),
        }
    }
}

// Response de vehículo
#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    pub id: String,
    pub vehicle_type: VehicleType,
    pub label: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub status: VehicleStatus,
    pub speed: f64,
    pub capabilities: Capabilities,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turbo_on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_load: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_load: Option<u32>,
    pub maintenance_history: Vec<MaintenanceResponse>,
    pub total_maintenance_cost: f64,
    pub total_maintenance_cost_label: String,
}

impl From<&Vehicle> for VehicleResponse {
    fn from(vehicle: &Vehicle) -> Self {
        let cargo = vehicle.kind().cargo();
        let total = vehicle.total_maintenance_cost();
        Self {
            id: vehicle.id().to_string(),
            vehicle_type: vehicle.vehicle_type(),
            label: vehicle.label(),
            make: vehicle.make().to_string(),
            model: vehicle.model().to_string(),
            year: vehicle.year(),
            status: vehicle.status(),
            speed: vehicle.speed(),
            capabilities: vehicle.kind().capabilities(),
            turbo_on: vehicle.kind().turbo_on(),
            max_load: cargo.map(Cargo::max_load),
            current_load: cargo.map(Cargo::current_load),
            maintenance_history: vehicle
                .maintenance_history()
                .iter()
                .map(MaintenanceResponse::from)
                .collect(),
            total_maintenance_cost: total,
            total_maintenance_cost_label: format_brl(total),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedVehicle {
    pub vehicle: VehicleResponse,
    pub warnings: Vec<InputWarning>,
}

#[derive(Debug, Serialize)]
pub struct PublicVehicleResponse {
    pub owner: String,
    pub vehicle: VehicleResponse,
}

impl From<&PublicVehicle> for PublicVehicleResponse {
    fn from(shared: &PublicVehicle) -> Self {
        Self {
            owner: shared.owner.clone(),
            vehicle: VehicleResponse::from(&shared.vehicle),
        }
    }
}

/// Resultado de una operación: el reporte plano más el estado resultante
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    #[serde(flatten)]
    pub report: OperationReport,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<InputWarning>,
    pub vehicle: VehicleResponse,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub saved: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub owner: String,
    pub closed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_request_builds_truck_with_warnings() {
        let request: CreateVehicleRequest = serde_json::from_value(json!({
            "vehicle_type": "Truck",
            "make": "Volvo",
            "model": "FH",
            "year": 1500,
            "max_load": 100,
            "current_load": 250
        }))
        .unwrap();
        assert!(request.validate().is_ok());

        let built = request.into_vehicle().unwrap();
        assert_eq!(built.value.vehicle_type(), VehicleType::Truck);
        assert_eq!(built.value.kind().cargo().map(Cargo::current_load), Some(100));
        assert_eq!(built.warnings.len(), 2);
    }

    #[test]
    fn test_create_request_validation() {
        let request: CreateVehicleRequest =
            serde_json::from_value(json!({ "make": "", "model": "Uno", "year": 2010 })).unwrap();
        assert!(request.validate().is_err());

        let blank: CreateVehicleRequest =
            serde_json::from_value(json!({ "make": "  ", "model": "Uno", "year": 2010 })).unwrap();
        assert!(matches!(blank.into_vehicle(), Err(VehicleError::MissingField("make"))));
    }

    #[test]
    fn test_vehicle_response_shape() {
        let car = Vehicle::sports_car("Porsche", "911", 2023, true).unwrap();
        let value = serde_json::to_value(VehicleResponse::from(&car)).unwrap();
        assert_eq!(value["vehicle_type"], "SportsCar");
        assert_eq!(value["status"], "off");
        assert_eq!(value["turbo_on"], true);
        assert_eq!(value["capabilities"], json!({ "turbo": true, "cargo": false }));
        assert!(value.get("max_load").is_none());
        assert_eq!(value["total_maintenance_cost_label"], "R$ 0,00");
    }
}
