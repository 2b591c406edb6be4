//! Resultados de operaciones de dominio
//!
//! Las operaciones del vehículo no notifican a la UI: devuelven `Feedback`
//! cuando se aplican o `Refusal` cuando una regla de negocio las rechaza.
//! La capa de presentación decide qué mostrar.

use serde::Serialize;
use thiserror::Error;

/// Resultado de una operación de la máquina de estados
pub type OperationResult = Result<Feedback, Refusal>;

/// Operación aplicada
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Feedback {
    Started,
    Stopped,
    Accelerated { speed: f64 },
    Braked { speed: f64 },
    Halted,
    TurboToggled { turbo_on: bool },
    CargoLoaded { current_load: u32, max_load: u32 },
    CargoUnloaded { current_load: u32 },
    MaintenanceAdded { record_id: String },
    MaintenanceUpdated { record_id: String },
    MaintenanceRemoved { record_id: String },
}

impl Feedback {
    pub fn code(&self) -> &'static str {
        match self {
            Feedback::Started => "started",
            Feedback::Stopped => "stopped",
            Feedback::Accelerated { .. } => "accelerated",
            Feedback::Braked { .. } => "braked",
            Feedback::Halted => "halted",
            Feedback::TurboToggled { .. } => "turbo_toggled",
            Feedback::CargoLoaded { .. } => "cargo_loaded",
            Feedback::CargoUnloaded { .. } => "cargo_unloaded",
            Feedback::MaintenanceAdded { .. } => "maintenance_added",
            Feedback::MaintenanceUpdated { .. } => "maintenance_updated",
            Feedback::MaintenanceRemoved { .. } => "maintenance_removed",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Feedback::Started => "Motor ligado".to_string(),
            Feedback::Stopped => "Motor desligado".to_string(),
            Feedback::Accelerated { speed } => format!("Acelerando: {:.1} km/h", speed),
            Feedback::Braked { speed } => format!("Freando: {:.1} km/h", speed),
            Feedback::Halted => "Veículo parado".to_string(),
            Feedback::TurboToggled { turbo_on: true } => "Turbo ativado".to_string(),
            Feedback::TurboToggled { turbo_on: false } => "Turbo desativado".to_string(),
            Feedback::CargoLoaded { current_load, max_load } => {
                format!("Carga adicionada: {}/{} kg", current_load, max_load)
            }
            Feedback::CargoUnloaded { current_load } => {
                format!("Carga removida, carga atual: {} kg", current_load)
            }
            Feedback::MaintenanceAdded { .. } => "Manutenção registrada".to_string(),
            Feedback::MaintenanceUpdated { .. } => "Manutenção atualizada".to_string(),
            Feedback::MaintenanceRemoved { .. } => "Manutenção removida".to_string(),
        }
    }
}

/// Rechazo por regla de negocio; no es un fallo del sistema
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Refusal {
    #[error("O veículo já está ligado")]
    AlreadyOn,

    #[error("O veículo já está desligado")]
    AlreadyOff,

    #[error("Freie até parar antes de desligar")]
    MustBrakeFirst,

    #[error("Ligue o motor primeiro")]
    EngineOff,

    #[error("O veículo não está em movimento")]
    NotMoving,

    #[error("Valor inválido: {value}")]
    InvalidAmount { value: String },

    #[error("Operação '{operation}' não suportada por {vehicle_type}")]
    Unsupported { operation: &'static str, vehicle_type: &'static str },

    #[error("Carga excede a capacidade. Espaço disponível: {remaining} kg")]
    CapacityExceeded { remaining: u32 },

    #[error("Não há carga suficiente. Carga atual: {current} kg")]
    InsufficientLoad { current: u32 },

    #[error("Registro de manutenção inválido")]
    InvalidMaintenance,

    #[error("Manutenção '{id}' não encontrada")]
    MaintenanceNotFound { id: String },

    #[error("Já existe um veículo com id '{id}'")]
    DuplicateId { id: String },
}

impl Refusal {
    pub fn code(&self) -> &'static str {
        match self {
            Refusal::AlreadyOn => "already_on",
            Refusal::AlreadyOff => "already_off",
            Refusal::MustBrakeFirst => "must_brake_first",
            Refusal::EngineOff => "engine_off",
            Refusal::NotMoving => "not_moving",
            Refusal::InvalidAmount { .. } => "invalid_amount",
            Refusal::Unsupported { .. } => "unsupported",
            Refusal::CapacityExceeded { .. } => "capacity_exceeded",
            Refusal::InsufficientLoad { .. } => "insufficient_load",
            Refusal::InvalidMaintenance => "invalid_maintenance",
            Refusal::MaintenanceNotFound { .. } => "maintenance_not_found",
            Refusal::DuplicateId { .. } => "duplicate_id",
        }
    }

    pub(crate) fn invalid_amount(value: impl std::fmt::Display) -> Self {
        Refusal::InvalidAmount { value: value.to_string() }
    }
}

/// Forma plana que recibe la capa de presentación
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationReport {
    pub success: bool,
    pub code: &'static str,
    pub message: String,
}

impl From<&Feedback> for OperationReport {
    fn from(feedback: &Feedback) -> Self {
        Self { success: true, code: feedback.code(), message: feedback.message() }
    }
}

impl From<&Refusal> for OperationReport {
    fn from(refusal: &Refusal) -> Self {
        Self { success: false, code: refusal.code(), message: refusal.to_string() }
    }
}

impl From<&OperationResult> for OperationReport {
    fn from(result: &OperationResult) -> Self {
        match result {
            Ok(feedback) => feedback.into(),
            Err(refusal) => refusal.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_from_result() {
        let ok: OperationResult = Ok(Feedback::Accelerated { speed: 27.0 });
        let report = OperationReport::from(&ok);
        assert!(report.success);
        assert_eq!(report.code, "accelerated");
        assert_eq!(report.message, "Acelerando: 27.0 km/h");

        let refused: OperationResult = Err(Refusal::CapacityExceeded { remaining: 200 });
        let report = OperationReport::from(&refused);
        assert!(!report.success);
        assert_eq!(report.code, "capacity_exceeded");
        assert!(report.message.contains("200"));
    }

    #[test]
    fn test_refusal_serializes_with_code() {
        let value = serde_json::to_value(Refusal::InsufficientLoad { current: 5 }).unwrap();
        assert_eq!(value["code"], "insufficient_load");
        assert_eq!(value["current"], 5);
    }
}
