//! `POST /intents` (spec §6 / §4.E step 1): create a pay-first hold and
//! open a Stripe Checkout Session. Grounded on
//! `original_source/app/api/routers/intents.py::create_intent`'s request
//! shape and exact REST error codes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::support::errors::{BridgeError, DomainError};

use super::AppState;

/// `hold_amount_huf` defaults and bounds, per the original's
/// `Field(5000, ge=1000, le=25000)`.
const DEFAULT_HOLD_AMOUNT_HUF: i32 = 5000;
const MIN_HOLD_AMOUNT_HUF: i32 = 1000;
const MAX_HOLD_AMOUNT_HUF: i32 = 25000;

#[derive(Debug, Deserialize)]
pub struct CreateIntentRequest {
    pub charge_point_id: i32,
    pub connector_id: i32,
    pub email: String,
    #[serde(default = "default_hold_amount")]
    pub hold_amount_huf: i32,
}

fn default_hold_amount() -> i32 {
    DEFAULT_HOLD_AMOUNT_HUF
}

#[derive(Debug, Serialize)]
pub struct CreateIntentResponse {
    pub intent_id: i32,
    pub checkout_url: Option<String>,
    pub expires_at: DateTime<Utc>,
}

pub async fn create_intent(
    State(state): State<AppState>,
    Json(req): Json<CreateIntentRequest>,
) -> impl IntoResponse {
    if req.email.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "email_required", "email is required");
    }
    if !(MIN_HOLD_AMOUNT_HUF..=MAX_HOLD_AMOUNT_HUF).contains(&req.hold_amount_huf) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "hold_amount_out_of_range",
            &format!("hold_amount_huf must be between {MIN_HOLD_AMOUNT_HUF} and {MAX_HOLD_AMOUNT_HUF}"),
        );
    }

    let result = state
        .bridge
        .create_intent(
            state.repos.as_ref(),
            req.charge_point_id,
            req.connector_id,
            &req.email,
            req.hold_amount_huf,
        )
        .await;

    match result {
        Ok(created) => (
            StatusCode::CREATED,
            Json(CreateIntentResponse {
                intent_id: created.intent_id,
                checkout_url: created.checkout_url,
                expires_at: created.expires_at,
            }),
        )
            .into_response(),
        Err(BridgeError::Domain(DomainError::StationNotFound(_))) => {
            error_response(StatusCode::NOT_FOUND, "charge_point_not_found", "charge point not found")
        }
        Err(BridgeError::Domain(DomainError::StationNotAvailable(_, _))) => error_response(
            StatusCode::CONFLICT,
            "charge_point_not_available",
            "charge point is not available",
        ),
        Err(BridgeError::PaymentProvider(reason)) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({"code": "stripe_checkout_create_failed", "detail": reason})),
        )
            .into_response(),
        Err(other) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", &other.to_string())
        }
    }
}

fn error_response(status: StatusCode, code: &str, detail: &str) -> axum::response::Response {
    (status, Json(json!({"code": code, "detail": detail}))).into_response()
}
