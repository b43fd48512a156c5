//! Transport Gateway (component A): accepts the WebSocket upgrade at
//! both shapes spec §6 names — `/ws/{station_id}` (identity embedded in
//! the path) and `/ws` (identity inferred from the first
//! `BootNotification`). Each connection runs one logical task that reads
//! frames strictly in arrival order; handler work for that connection is
//! never pipelined (spec §5).
//!
//! Adapted from the teacher's `interfaces/ws/ocpp_server.rs`: split
//! sink/stream plus an `mpsc::unbounded_channel` writer task so outbound
//! writes (dispatcher replies and Payment-Bridge-initiated remote CALLs)
//! are serialized through one sender, never interleaved on the wire.
//! Diverges from the teacher in the two places the spec requires: identity
//! is not assumed known at accept time, and teardown uses
//! `unregister_if_same` rather than an unconditional remove.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::application::dispatcher;
use crate::application::registry::{ConnectionRegistry, Transport};
use crate::domain::ports::RepositoryProvider;
use crate::support::ocpp_frame::OcppFrame;

const SUBPROTOCOL: &str = "ocpp1.6";

#[derive(Clone)]
pub struct GatewayState {
    pub repos: Arc<dyn RepositoryProvider>,
    pub registry: Arc<ConnectionRegistry>,
    /// The flat HUF/kWh rate (spec §6 `OCPP_PRICE_HUF_PER_KWH` / `config.toml`'s
    /// `[payment] price_huf_per_kwh`), forwarded to the StopTransaction and
    /// MeterValues handlers through the dispatcher.
    pub price_huf_per_kwh: Option<f64>,
}

pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/ws/{station_id}", get(upgrade_with_identity))
        .route("/ws", get(upgrade_unknown_identity))
        .with_state(state)
}

async fn upgrade_with_identity(
    State(state): State<GatewayState>,
    Path(station_id): Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.protocols([SUBPROTOCOL])
        .on_upgrade(move |socket| handle_socket(socket, Some(station_id), state))
}

async fn upgrade_unknown_identity(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.protocols([SUBPROTOCOL])
        .on_upgrade(move |socket| handle_socket(socket, None, state))
}

/// The per-connection read loop. Owns the only sender for this
/// connection's outbound writes (wrapped once as `Arc<dyn Transport>` so
/// the Registry and the Payment Bridge can reach it too); the writer
/// task exits once every clone of that `Arc` has dropped.
async fn handle_socket(socket: WebSocket, known_identity: Option<String>, state: GatewayState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let transport: Arc<dyn Transport> = Arc::new(tx);

    let mut identity = known_identity;
    if let Some(id) = &identity {
        state.registry.register(id, transport.clone());
        info!(identity = %id, "station connected");
    }

    let writer_task = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sink.send(Message::text(text)).await.is_err() {
                break;
            }
        }
    });

    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                handle_frame(&text, &mut identity, &transport, &state).await;
            }
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => continue, // binary/ping/pong: not part of the OCPP-J wire format
            Some(Err(err)) => {
                warn!(error = %err, "websocket receive error, tearing down connection");
                break;
            }
        }
    }

    if let Some(id) = &identity {
        state.registry.unregister_if_same(id, &transport);
        info!(identity = %id, "station transport closed");
    }

    drop(transport);
    let _ = writer_task.await;
}

async fn handle_frame(
    text: &str,
    identity: &mut Option<String>,
    transport: &Arc<dyn Transport>,
    state: &GatewayState,
) {
    let frame = match OcppFrame::parse(text) {
        Ok(frame) => frame,
        Err(err) => {
            warn!(error = %err, "malformed OCPP frame, dropping");
            return;
        }
    };

    match frame {
        OcppFrame::Call {
            unique_id,
            action,
            payload,
        } => {
            if identity.is_none() {
                if action != "BootNotification" {
                    warn!(action, "Call received before identity established, dropping");
                    return;
                }
                match extract_boot_identity(&payload) {
                    Some(id) => {
                        state.registry.register(&id, transport.clone());
                        info!(identity = %id, "station identity established via BootNotification");
                        *identity = Some(id);
                    }
                    None => {
                        warn!("BootNotification missing chargeBoxSerialNumber/chargePointSerialNumber, dropping");
                        return;
                    }
                }
            }

            let identity_ref = identity.as_deref().expect("identity established above");
            let result = dispatcher::dispatch(
                state.repos.as_ref(),
                identity_ref,
                &action,
                payload,
                state.price_huf_per_kwh,
            )
            .await;
            let reply = OcppFrame::CallResult { unique_id, payload: result };
            let _ = transport.send_text(reply.serialize());
        }
        OcppFrame::CallResult { unique_id, payload } => {
            if let Some(id) = identity.as_deref() {
                state.registry.complete(id, &unique_id, payload);
            }
        }
        OcppFrame::CallError {
            unique_id,
            error_code,
            error_description,
            error_details,
        } => {
            if let Some(id) = identity.as_deref() {
                state.registry.complete_error(id, &unique_id, error_code, error_description, error_details);
            }
        }
    }
}

/// Spec §4.A step 4: `chargeBoxSerialNumber` or `chargePointSerialNumber`,
/// first non-empty wins.
fn extract_boot_identity(payload: &Value) -> Option<String> {
    payload
        .get("chargeBoxSerialNumber")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            payload
                .get("chargePointSerialNumber")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        })
        .map(str::to_string)
}
