//! `POST /payments/stripe/webhook` (spec §4.E / §6). Grounded on
//! `original_source/app/api/routers/payments_stripe.py`'s webhook
//! handler: verify `Stripe-Signature`, then process the event. The
//! endpoint always answers `200 {"ok": true}` once the signature is
//! valid, regardless of what `process_webhook` actually did — Stripe
//! retries on anything else.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tracing::{error, info};

use crate::application::services::payment_bridge::WebhookOutcome;

use super::AppState;

pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    if !state.bridge.webhook_configured() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"code": "stripe_webhook_not_configured"})),
        )
            .into_response();
    }

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok());

    if let Err(sig_error) = state.bridge.verify_webhook_signature(&body, signature) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"code": sig_error.code()})),
        )
            .into_response();
    }

    match state.bridge.process_webhook(state.repos.as_ref(), &state.registry, &body).await {
        Ok(WebhookOutcome::SessionCreated { session_id, stop_code }) => {
            info!(session_id, "webhook settled intent into a session");
            // The stop code is returned here, once, for an out-of-band
            // channel (e.g. a confirmation email) to pick up — it is
            // never logged or persisted in plaintext past this point.
            (StatusCode::OK, Json(json!({"ok": true, "session_id": session_id, "stop_code": stop_code}))).into_response()
        }
        Ok(outcome) => (StatusCode::OK, Json(json!({"ok": true, "outcome": format!("{outcome:?}")}))).into_response(),
        Err(err) => {
            // The only failures `process_webhook` propagates (as opposed to
            // answering `Ok(WebhookOutcome::Ignored)`) are infrastructure
            // errors, e.g. a database outage mid-transaction. Per the
            // webhook error policy, those get a non-2xx so the provider
            // retries the delivery instead of treating it as settled.
            error!(error = %err, "failed to process stripe webhook, asking provider to retry");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"code": "webhook_processing_failed"})),
            )
                .into_response()
        }
    }
}
