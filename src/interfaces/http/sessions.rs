//! `/sessions*` (spec §6): thin wrappers over the remote-start/remote-stop
//! CALL path, plus read-only projections over persisted sessions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::session::Session;
use crate::support::errors::{BridgeError, CommandError, DomainError};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub charge_point_id: i32,
    pub connector_id: i32,
    #[serde(default = "default_id_tag")]
    pub id_tag: String,
}

fn default_id_tag() -> String {
    "ANON".to_string()
}

#[derive(Debug, Deserialize)]
pub struct StopSessionRequest {
    pub charge_point_id: i32,
    pub transaction_id: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: i32,
    pub station_id: i32,
    pub connector_id: Option<i32>,
    pub transaction_id: Option<String>,
    pub email: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub meter_start_wh: Option<f64>,
    pub meter_stop_wh: Option<f64>,
    pub energy_kwh: Option<f64>,
    pub cost_huf: Option<f64>,
    pub is_open: bool,
}

impl From<Session> for SessionResponse {
    fn from(s: Session) -> Self {
        Self {
            id: s.id,
            station_id: s.station_id,
            connector_id: s.connector_id,
            transaction_id: s.transaction_id.clone(),
            email: s.email.clone(),
            started_at: s.started_at,
            finished_at: s.finished_at,
            meter_start_wh: s.meter_start_wh,
            meter_stop_wh: s.meter_stop_wh,
            energy_kwh: s.energy_kwh,
            cost_huf: s.cost_huf,
            is_open: s.is_open(),
        }
    }
}

pub async fn start(State(state): State<AppState>, Json(req): Json<StartSessionRequest>) -> impl IntoResponse {
    let result = state
        .bridge
        .remote_start(state.repos.as_ref(), &state.registry, req.charge_point_id, req.connector_id, &req.id_tag)
        .await;
    bridge_result("remote_start", result)
}

pub async fn stop(State(state): State<AppState>, Json(req): Json<StopSessionRequest>) -> impl IntoResponse {
    let result = state
        .bridge
        .remote_stop(state.repos.as_ref(), &state.registry, req.charge_point_id, &req.transaction_id)
        .await;
    bridge_result("remote_stop", result)
}

pub async fn list(State(state): State<AppState>) -> impl IntoResponse {
    match state.repos.sessions().list_all().await {
        Ok(sessions) => {
            let out: Vec<SessionResponse> = sessions.into_iter().map(SessionResponse::from).collect();
            Json(out).into_response()
        }
        Err(err) => internal_error(&err.to_string()),
    }
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    match state.repos.sessions().find_by_id(id).await {
        Ok(Some(session)) => Json(SessionResponse::from(session)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "session_not_found", "session not found"),
        Err(err) => internal_error(&err.to_string()),
    }
}

pub async fn active_by_charge_point(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    match state.repos.sessions().list_active_by_station(id).await {
        Ok(sessions) => {
            let out: Vec<SessionResponse> = sessions.into_iter().map(SessionResponse::from).collect();
            Json(out).into_response()
        }
        Err(err) => internal_error(&err.to_string()),
    }
}

/// Maps a remote-CALL outcome to the REST response. Outbound-CALL
/// failures (no transport, timeout, station CALLERROR, cancellation) use
/// the `{error, reason}` shape from spec §8 scenario 6
/// (`ocpp_remote_start_failed` / `ocpp_remote_stop_failed`, reason
/// `"timeout"` etc.), all as 502 — the station didn't reject the
/// request at the OCPP level, the remote-CALL protocol itself failed.
fn bridge_result(action: &str, result: Result<Value, BridgeError>) -> axum::response::Response {
    match result {
        Ok(payload) => Json(json!({"ok": true, "result": payload})).into_response(),
        Err(BridgeError::Domain(DomainError::StationNotFound(_))) => {
            error_response(StatusCode::NOT_FOUND, "charge_point_not_found", "charge point not found")
        }
        Err(BridgeError::Command(CommandError::NotConnected(_))) => {
            remote_call_failed(action, "not_connected")
        }
        Err(BridgeError::Command(CommandError::Timeout)) => remote_call_failed(action, "timeout"),
        Err(BridgeError::Command(CommandError::Cancelled)) => remote_call_failed(action, "cancelled"),
        Err(BridgeError::Command(CommandError::SendFailed(_, _))) => remote_call_failed(action, "send_failed"),
        Err(BridgeError::Command(CommandError::CallError { code, description })) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "error": format!("ocpp_{action}_failed"),
                "reason": "call_error",
                "detail": format!("{code}: {description}"),
            })),
        )
            .into_response(),
        Err(other) => internal_error(&other.to_string()),
    }
}

fn remote_call_failed(action: &str, reason: &str) -> axum::response::Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({"error": format!("ocpp_{action}_failed"), "reason": reason})),
    )
        .into_response()
}

fn error_response(status: StatusCode, code: &str, detail: &str) -> axum::response::Response {
    (status, Json(json!({"code": code, "detail": detail}))).into_response()
}

fn internal_error(detail: &str) -> axum::response::Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", detail)
}
