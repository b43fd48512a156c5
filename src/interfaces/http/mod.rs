//! REST surface (spec §6): a much smaller slice than the teacher's
//! `interfaces/http/router.rs` — only the shapes the web UI and
//! operator tooling consume, plus the ambient `/health`, `/ready`,
//! `/metrics` every service in this corpus exposes. No `utoipa`/Swagger,
//! no JWT auth layer — this spec has no multi-tenant auth surface.

mod charge_points;
mod health;
mod intents;
mod payments;
mod sessions;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::application::registry::ConnectionRegistry;
use crate::application::services::PaymentBridge;
use crate::domain::ports::RepositoryProvider;

#[derive(Clone)]
pub struct AppState {
    pub repos: Arc<dyn RepositoryProvider>,
    pub registry: Arc<ConnectionRegistry>,
    pub bridge: Arc<PaymentBridge>,
    pub metrics_handle: PrometheusHandle,
}

/// Assembles the REST router. CORS and request tracing follow the
/// teacher's top-level-layer pattern (`api/router.rs::create_api_router`).
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/metrics", get(health::metrics))
        .route("/intents", post(intents::create_intent))
        .route("/payments/stripe/webhook", post(payments::stripe_webhook))
        .route("/sessions/start", post(sessions::start))
        .route("/sessions/stop", post(sessions::stop))
        .route("/sessions", get(sessions::list))
        .route("/sessions/{id}", get(sessions::get_one))
        .route("/sessions/active/by-charge-point/{id}", get(sessions::active_by_charge_point))
        .route("/charge-points", get(charge_points::list))
        .route("/charge-points/{id}", get(charge_points::get_one))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
