use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};

use crate::controllers::garage_controller::GarageController;
use crate::dto::{
    ActionRequest, ActionResponse, ApiResponse, CreateVehicleRequest, CreatedVehicle,
    MaintenanceRequest, PublicVehicleResponse, SessionResponse, SyncResponse, VehicleResponse,
    VisibilityRequest, VisibilityResponse,
};
use crate::models::analytics::GarageStats;
use crate::models::garage::AppointmentView;
use crate::state::AppState;
use crate::utils::errors::AppResult;

/// Rutas anidadas bajo `/api/garages/:owner`
pub fn create_garage_router() -> Router<AppState> {
    Router::new()
        .route("/vehicles", get(list_vehicles).post(create_vehicle))
        .route("/vehicles/:id", get(get_vehicle).delete(delete_vehicle))
        .route("/vehicles/:id/actions", post(act_on_vehicle))
        .route("/vehicles/:id/visibility", put(set_visibility))
        .route("/vehicles/:id/maintenance", post(add_maintenance))
        .route(
            "/vehicles/:id/maintenance/:record_id",
            put(update_maintenance).delete(delete_maintenance),
        )
        .route("/stats", get(garage_stats))
        .route("/appointments", get(appointments))
        .route("/public-vehicles", get(public_vehicles))
        .route("/sync", post(sync_garage))
        .route("/session", delete(close_session))
}

fn controller(state: &AppState) -> GarageController {
    GarageController::new(state.registry.clone())
}

async fn list_vehicles(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> AppResult<Json<Vec<VehicleResponse>>> {
    Ok(Json(controller(&state).list(&owner).await?))
}

async fn create_vehicle(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    Json(request): Json<CreateVehicleRequest>,
) -> AppResult<Json<ApiResponse<CreatedVehicle>>> {
    Ok(Json(controller(&state).create(&owner, request).await?))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path((owner, id)): Path<(String, String)>,
) -> AppResult<Json<VehicleResponse>> {
    Ok(Json(controller(&state).get(&owner, &id).await?))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Path((owner, id)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<VehicleResponse>>> {
    Ok(Json(controller(&state).delete(&owner, &id).await?))
}

async fn act_on_vehicle(
    State(state): State<AppState>,
    Path((owner, id)): Path<(String, String)>,
    Json(request): Json<ActionRequest>,
) -> AppResult<Json<ActionResponse>> {
    Ok(Json(controller(&state).act(&owner, &id, request).await?))
}

async fn set_visibility(
    State(state): State<AppState>,
    Path((owner, id)): Path<(String, String)>,
    Json(request): Json<VisibilityRequest>,
) -> AppResult<Json<ApiResponse<VisibilityResponse>>> {
    Ok(Json(controller(&state).set_visibility(&owner, &id, request).await?))
}

async fn add_maintenance(
    State(state): State<AppState>,
    Path((owner, id)): Path<(String, String)>,
    Json(request): Json<MaintenanceRequest>,
) -> AppResult<Json<ActionResponse>> {
    Ok(Json(controller(&state).add_maintenance(&owner, &id, request).await?))
}

async fn update_maintenance(
    State(state): State<AppState>,
    Path((owner, id, record_id)): Path<(String, String, String)>,
    Json(request): Json<MaintenanceRequest>,
) -> AppResult<Json<ActionResponse>> {
    Ok(Json(
        controller(&state)
            .update_maintenance(&owner, &id, &record_id, request)
            .await?,
    ))
}

async fn delete_maintenance(
    State(state): State<AppState>,
    Path((owner, id, record_id)): Path<(String, String, String)>,
) -> AppResult<Json<ActionResponse>> {
    Ok(Json(controller(&state).delete_maintenance(&owner, &id, &record_id).await?))
}

async fn garage_stats(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> AppResult<Json<GarageStats>> {
    Ok(Json(controller(&state).stats(&owner).await?))
}

async fn appointments(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> AppResult<Json<Vec<AppointmentView>>> {
    Ok(Json(controller(&state).appointments(&owner).await?))
}

async fn public_vehicles(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> AppResult<Json<Vec<PublicVehicleResponse>>> {
    Ok(Json(controller(&state).public_vehicles(&owner).await?))
}

async fn sync_garage(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> AppResult<Json<ApiResponse<SyncResponse>>> {
    Ok(Json(controller(&state).sync(&owner).await?))
}

async fn close_session(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Json<ApiResponse<SessionResponse>> {
    Json(controller(&state).close_session(&owner).await)
}
