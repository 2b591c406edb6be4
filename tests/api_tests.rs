use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use garage_manager::config::EnvironmentConfig;
use garage_manager::repositories::MemoryRepository;
use garage_manager::routes::create_router;
use garage_manager::state::AppState;

fn create_test_app() -> Router {
    create_router(AppState::new(EnvironmentConfig::default(), Arc::new(MemoryRepository::new())))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_vehicle(app: &Router, owner: &str, body: Value) -> String {
    let uri = format!("/api/garages/{}/vehicles", owner);
    let (status, created) = send(app, Method::POST, &uri, Some(body)).await;
    assert_eq!(status, StatusCode::OK, "{}", created);
    created["data"]["vehicle"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_list_and_get_vehicle() {
    let app = create_test_app();
    let body = json!({ "make": "Toyota", "model": "Corolla", "year": 2022 });
    let id = create_vehicle(&app, "ana", body).await;

    let (status, list) = send(&app, Method::GET, "/api/garages/ana/vehicles", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["vehicle_type"], "Car");
    assert_eq!(list[0]["label"], "Toyota Corolla (2022)");

    let uri = format!("/api/garages/ana/vehicles/{}", id);
    let (status, vehicle) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(vehicle["status"], "off");

    let (status, _) = send(&app, Method::GET, "/api/garages/ana/vehicles/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, other) = send(&app, Method::GET, "/api/garages/bruno/vehicles", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(other.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_vehicle_payloads() {
    let app = create_test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/garages/ana/vehicles",
        Some(json!({ "make": "", "model": "Uno", "year": 2010 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/garages/ana/vehicles",
        Some(json!({ "make": "   ", "model": "Uno", "year": 2010 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = json!({ "id": "fixed-id", "make": "Fiat", "model": "Uno", "year": 2010 });
    create_vehicle(&app, "ana", body.clone()).await;
    let (status, conflict) =
        send(&app, Method::POST, "/api/garages/ana/vehicles", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(conflict["code"], "CONFLICT");
}

#[tokio::test]
async fn test_actions_report_refusals_as_outcomes() {
    let app = create_test_app();
    let id = create_vehicle(
        &app,
        "ana",
        json!({ "vehicle_type": "SportsCar", "make": "Porsche", "model": "911", "year": 2023 }),
    )
    .await;
    let uri = format!("/api/garages/ana/vehicles/{}/actions", id);

    let (status, refused) =
        send(&app, Method::POST, &uri, Some(json!({ "action": "accelerate" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refused["success"], false);
    assert_eq!(refused["code"], "engine_off");
    assert_eq!(refused["vehicle"]["speed"], 0.0);

    for action in ["start", "toggle_turbo"] {
        let (_, done) = send(&app, Method::POST, &uri, Some(json!({ "action": action }))).await;
        assert_eq!(done["success"], true);
    }

    let accelerate = json!({ "action": "accelerate", "amount": 15 });
    let (_, moved) = send(&app, Method::POST, &uri, Some(accelerate)).await;
    assert_eq!(moved["success"], true);
    assert_eq!(moved["vehicle"]["status"], "moving");
    assert!((moved["vehicle"]["speed"].as_f64().unwrap() - 27.0).abs() < 1e-9);

    let load = json!({ "action": "load_cargo", "amount": 10 });
    let (_, unsupported) = send(&app, Method::POST, &uri, Some(load)).await;
    assert_eq!(unsupported["code"], "unsupported");

    let (status, _) = send(&app, Method::POST, &uri, Some(json!({ "action": "load_cargo" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_maintenance_lifecycle_and_stats() {
    let app = create_test_app();
    let body = json!({ "make": "Fiat", "model": "Uno", "year": 2010 });
    let id = create_vehicle(&app, "ana", body).await;
    let uri = format!("/api/garages/ana/vehicles/{}/maintenance", id);

    let (status, added) = send(
        &app,
        Method::POST,
        &uri,
        Some(json!({ "date": "2024-03-15", "type": "Troca de óleo", "cost": -5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(added["success"], true);
    assert_eq!(added["warnings"][0]["warning"], "invalid_cost");
    let record = &added["vehicle"]["maintenance_history"][0];
    assert_eq!(record["cost_label"], "R$ 0,00");
    let record_id = record["id"].as_str().unwrap().to_string();

    let (_, updated) = send(
        &app,
        Method::PUT,
        &format!("{}/{}", uri, record_id),
        Some(json!({ "date": "2024-03-15", "type": "Troca de óleo", "cost": "1234.5" })),
    )
    .await;
    assert_eq!(updated["success"], true);
    assert_eq!(updated["vehicle"]["maintenance_history"][0]["id"], record_id.as_str());

    let (_, stats) = send(&app, Method::GET, "/api/garages/ana/stats", None).await;
    assert_eq!(stats["vehicle_count"], 1);
    assert_eq!(stats["maintenance_count"], 1);
    assert_eq!(stats["total_maintenance_cost_label"], "R$ 1.234,50");

    let (_, appointments) = send(&app, Method::GET, "/api/garages/ana/appointments", None).await;
    assert!(appointments.as_array().unwrap().is_empty());

    let (_, removed) = send(&app, Method::DELETE, &format!("{}/{}", uri, record_id), None).await;
    assert_eq!(removed["success"], true);
    let (_, missing) = send(&app, Method::DELETE, &format!("{}/{}", uri, record_id), None).await;
    assert_eq!(missing["code"], "maintenance_not_found");
}

#[tokio::test]
async fn test_public_vehicles_and_sync() {
    let app = create_test_app();
    let id = create_vehicle(
        &app,
        "bruno",
        json!({
            "vehicle_type": "Truck",
            "make": "Volvo",
            "model": "FH",
            "year": 2019,
            "max_load": 5000
        }),
    )
    .await;

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/garages/bruno/vehicles/{}/visibility", id),
        Some(json!({ "public": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, shared) = send(&app, Method::GET, "/api/garages/ana/public-vehicles", None).await;
    assert_eq!(shared.as_array().unwrap().len(), 1);
    assert_eq!(shared[0]["owner"], "bruno");
    assert_eq!(shared[0]["vehicle"]["max_load"], 5000);

    let (_, own) = send(&app, Method::GET, "/api/garages/bruno/public-vehicles", None).await;
    assert!(own.as_array().unwrap().is_empty());

    let (_, synced) = send(&app, Method::POST, "/api/garages/bruno/sync", None).await;
    assert_eq!(synced["data"]["saved"], 1);

    let uri = format!("/api/garages/bruno/vehicles/{}", id);
    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, shared) = send(&app, Method::GET, "/api/garages/ana/public-vehicles", None).await;
    assert!(shared.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_closing_session_reloads_from_storage() {
    let app = create_test_app();
    let body = json!({ "make": "Fiat", "model": "Uno", "year": 2010 });
    let id = create_vehicle(&app, "ana", body).await;

    let (status, closed) = send(&app, Method::DELETE, "/api/garages/ana/session", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["data"]["closed"], true);

    let (_, again) = send(&app, Method::DELETE, "/api/garages/ana/session", None).await;
    assert_eq!(again["data"]["closed"], false);

    let uri = format!("/api/garages/ana/vehicles/{}", id);
    let (status, vehicle) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(vehicle["make"], "Fiat");
}
