//! Liveness, readiness and metrics — the ambient trio every service in
//! this corpus exposes. Adapted from the teacher's
//! `api/handlers/health.rs`, simplified to match this crate's much
//! smaller `AppState`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

/// `GET /health` — the process is up. Never touches the database.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// `GET /ready` — the database is reachable. There is no dedicated
/// `SELECT 1` seam on `RepositoryProvider`, so readiness rides the
/// cheapest real query any deployment already needs: listing stations.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    match state.repos.stations().list_all().await {
        Ok(_) => (StatusCode::OK, Json(HealthResponse { status: "ready" })).into_response(),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse { status: "not_ready" }),
        )
            .into_response(),
    }
}

/// `GET /metrics` — Prometheus exposition of whatever `metrics` macros
/// the rest of the crate has recorded (spec §ambient: an observability
/// concern, never branched on by domain logic).
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics_handle.render()
}
