//! `/charge-points*` (spec §6): read-only projections over the Station
//! aggregate, with `offline` derived from `last_seen_at` staleness
//! rather than the stored status (`Station::projected_status`).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::domain::station::Station;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct ChargePointResponse {
    pub id: i32,
    pub identity: String,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub firmware_version: Option<String>,
    pub status: &'static str,
    pub last_seen_at: DateTime<Utc>,
}

impl From<Station> for ChargePointResponse {
    fn from(station: Station) -> Self {
        Self {
            id: station.id,
            identity: station.identity.clone(),
            vendor: station.vendor.clone(),
            model: station.model.clone(),
            serial_number: station.serial_number.clone(),
            firmware_version: station.firmware_version.clone(),
            status: station.projected_status(),
            last_seen_at: station.last_seen_at,
        }
    }
}

pub async fn list(State(state): State<AppState>) -> impl IntoResponse {
    match state.repos.stations().list_all().await {
        Ok(stations) => {
            let out: Vec<ChargePointResponse> = stations.into_iter().map(ChargePointResponse::from).collect();
            Json(out).into_response()
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"code": "internal_error", "detail": err.to_string()})),
        )
            .into_response(),
    }
}

pub async fn get_one(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    match state.repos.stations().find_by_id(id).await {
        Ok(Some(station)) => Json(ChargePointResponse::from(station)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"code": "charge_point_not_found", "detail": "charge point not found"})),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"code": "internal_error", "detail": err.to_string()})),
        )
            .into_response(),
    }
}
