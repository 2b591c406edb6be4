use std::sync::Arc;

use validator::Validate;

use crate::dto::{
    ActionRequest, ActionResponse, ApiResponse, CreateVehicleRequest, CreatedVehicle,
    MaintenanceRequest, PublicVehicleResponse, SessionResponse, SyncResponse, VehicleAction,
    VehicleResponse, VisibilityRequest, VisibilityResponse,
};
use crate::models::analytics::GarageStats;
use crate::models::garage::AppointmentView;
use crate::models::OperationReport;
use crate::services::{GarageError, GarageRegistry, GarageService};
use crate::utils::errors::{bad_request_error, AppError};
use crate::utils::validation::{now_millis, InputWarning};

pub struct GarageController {
    registry: Arc<GarageRegistry>,
}

impl GarageController {
    pub fn new(registry: Arc<GarageRegistry>) -> Self {
        Self { registry }
    }

    pub async fn list(&self, owner: &str) -> Result<Vec<VehicleResponse>, AppError> {
        let session = self.registry.open_session(owner).await?;
        let service = session.lock().await;
        Ok(service
            .garage()
            .sorted_vehicles()
            .into_iter()
            .map(VehicleResponse::from)
            .collect())
    }

    pub async fn get(&self, owner: &str, id: &str) -> Result<VehicleResponse, AppError> {
        let session = self.registry.open_session(owner).await?;
        let service = session.lock().await;
        Ok(VehicleResponse::from(service.vehicle(id)?))
    }

    pub async fn create(
        &self,
        owner: &str,
        request: CreateVehicleRequest,
    ) -> Result<ApiResponse<CreatedVehicle>, AppError> {
        request.validate()?;
        let built = request.into_vehicle().map_err(GarageError::Invalid)?;
        for warning in &built.warnings {
            log::warn!("⚠️ Vehículo nuevo en '{}': {}", owner, warning);
        }

        let session = self.registry.open_session(owner).await?;
        let mut service = session.lock().await;
        let vehicle = service.add_vehicle(built.value).await?;

        Ok(ApiResponse::success_with_message(
            CreatedVehicle {
                vehicle: VehicleResponse::from(vehicle),
                warnings: built.warnings,
            },
            "Veículo cadastrado com sucesso",
        ))
    }

    pub async fn delete(
        &self,
        owner: &str,
        id: &str,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        let session = self.registry.open_session(owner).await?;
        let removed = session.lock().await.remove_vehicle(id).await?;
        Ok(ApiResponse::success_with_message(
            VehicleResponse::from(&removed),
            "Veículo removido com sucesso",
        ))
    }

    pub async fn act(
        &self,
        owner: &str,
        id: &str,
        request: ActionRequest,
    ) -> Result<ActionResponse, AppError> {
        let session = self.registry.open_session(owner).await?;
        let mut service = session.lock().await;

        let outcome = match request.action {
            VehicleAction::Start => service.start(id).await?,
            VehicleAction::Stop => service.stop(id).await?,
            VehicleAction::Accelerate => service.accelerate(id, request.amount).await?,
            VehicleAction::Brake => service.brake(id, request.amount).await?,
            VehicleAction::ToggleTurbo => service.toggle_turbo(id).await?,
            VehicleAction::LoadCargo => {
                service.load_cargo(id, whole_amount(request.amount)?).await?
            }
            VehicleAction::UnloadCargo => {
                service.unload_cargo(id, whole_amount(request.amount)?).await?
            }
        };

        respond(&service, id, OperationReport::from(&outcome), Vec::new())
    }

    pub async fn set_visibility(
        &self,
        owner: &str,
        id: &str,
        request: VisibilityRequest,
    ) -> Result<ApiResponse<VisibilityResponse>, AppError> {
        let session = self.registry.open_session(owner).await?;
        session.lock().await.set_public(id, request.public).await?;
        Ok(ApiResponse::success(VisibilityResponse { id: id.to_string(), public: request.public }))
    }

    pub async fn add_maintenance(
        &self,
        owner: &str,
        id: &str,
        request: MaintenanceRequest,
    ) -> Result<ActionResponse, AppError> {
        request.validate()?;
        let record = request.to_record();

        let session = self.registry.open_session(owner).await?;
        let mut service = session.lock().await;
        let outcome = service.add_maintenance(id, record.value).await?;
        respond(&service, id, OperationReport::from(&outcome), record.warnings)
    }

    pub async fn update_maintenance(
        &self,
        owner: &str,
        id: &str,
        record_id: &str,
        request: MaintenanceRequest,
    ) -> Result<ActionResponse, AppError> {
        request.validate()?;
        let record = request.to_record();

        let session = self.registry.open_session(owner).await?;
        let mut service = session.lock().await;
        let outcome = service.update_maintenance(id, record_id, record.value).await?;
        respond(&service, id, OperationReport::from(&outcome), record.warnings)
    }

    pub async fn delete_maintenance(
        &self,
        owner: &str,
        id: &str,
        record_id: &str,
    ) -> Result<ActionResponse, AppError> {
        let session = self.registry.open_session(owner).await?;
        let mut service = session.lock().await;
        let outcome = service.delete_maintenance(id, record_id).await?;
        respond(&service, id, OperationReport::from(&outcome), Vec::new())
    }

    pub async fn stats(&self, owner: &str) -> Result<GarageStats, AppError> {
        let session = self.registry.open_session(owner).await?;
        let stats = session.lock().await.stats(now_millis());
        Ok(stats)
    }

    pub async fn appointments(&self, owner: &str) -> Result<Vec<AppointmentView>, AppError> {
        let session = self.registry.open_session(owner).await?;
        let appointments = session.lock().await.future_appointments(now_millis());
        Ok(appointments)
    }

    pub async fn public_vehicles(
        &self,
        owner: &str,
    ) -> Result<Vec<PublicVehicleResponse>, AppError> {
        let session = self.registry.open_session(owner).await?;
        let mut service = session.lock().await;
        service.refresh_public_vehicles().await?;
        Ok(service
            .garage()
            .public_vehicles()
            .iter()
            .map(PublicVehicleResponse::from)
            .collect())
    }

    pub async fn sync(&self, owner: &str) -> Result<ApiResponse<SyncResponse>, AppError> {
        let session = self.registry.open_session(owner).await?;
        let saved = session.lock().await.save_all().await?;
        Ok(ApiResponse::success_with_message(SyncResponse { saved }, "Garagem sincronizada"))
    }

    /// Liberar la sesión en memoria del dueño
    pub async fn close_session(&self, owner: &str) -> ApiResponse<SessionResponse> {
        let closed = self.registry.close_session(owner).await;
        ApiResponse::success_with_message(
            SessionResponse { owner: owner.to_string(), closed },
            "Sessão encerrada",
        )
    }
}

fn respond(
    service: &GarageService,
    id: &str,
    report: OperationReport,
    warnings: Vec<InputWarning>,
) -> Result<ActionResponse, AppError> {
    Ok(ActionResponse {
        report,
        warnings,
        vehicle: VehicleResponse::from(service.vehicle(id)?),
    })
}

/// Las cantidades de carga son enteras
fn whole_amount(amount: Option<f64>) -> Result<i64, AppError> {
    match amount {
        Some(value) if value.is_finite() && value.fract() == 0.0 => Ok(value as i64),
        Some(value) => Err(bad_request_error(&format!("Quantidade inválida: {}", value))),
        None => Err(bad_request_error("Quantidade obrigatória para esta ação")),
    }
}
