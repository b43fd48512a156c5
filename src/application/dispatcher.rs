//! Action Dispatcher (component C): dispatches an inbound CALL's action
//! name to its Domain Handler and produces the CALLRESULT payload.
//!
//! Grounded on the teacher's `application/handlers/ocpp_v16_handler.rs`
//! match-on-action-name shape, generalized to this spec's six actions.
//! Never rejects at the transport level (spec §4.C): an unknown action, or
//! a handler that returns a domain error, both get the safe `{}` ack —
//! acceptance policy lives in domain state, not the OCPP layer.

use serde_json::{json, Value};
use tracing::warn;

use crate::domain::ports::RepositoryProvider;

/// Dispatches `action` to its handler and returns the CALLRESULT payload.
/// Always succeeds from the transport's point of view — a handler error
/// is logged and downgraded to `{}` per spec §4.A step 3's failure policy.
///
/// `price_huf_per_kwh` is the configured flat rate (spec §6 env var /
/// `config.toml`'s `[payment] price_huf_per_kwh`), forwarded to the two
/// handlers that recompute `cost_huf`.
pub async fn dispatch(
    repos: &dyn RepositoryProvider,
    identity: &str,
    action: &str,
    payload: Value,
    price_huf_per_kwh: Option<f64>,
) -> Value {
    use crate::application::handlers::{
        boot, firmware_status, heartbeat, meter_values, start_transaction, status,
        stop_transaction,
    };

    let result = match action {
        "BootNotification" => boot::handle(repos, identity, payload).await,
        "Heartbeat" => heartbeat::handle(repos, identity, payload).await,
        "StatusNotification" => status::handle(repos, identity, payload).await,
        "FirmwareStatusNotification" => firmware_status::handle(repos, identity, payload).await,
        "StartTransaction" => start_transaction::handle(repos, identity, payload).await,
        "StopTransaction" => stop_transaction::handle(repos, identity, payload, price_huf_per_kwh).await,
        "MeterValues" => meter_values::handle(repos, identity, payload, price_huf_per_kwh).await,
        other => {
            warn!(identity, action = other, "unrecognized OCPP action, safe-acking");
            return json!({});
        }
    };

    result.unwrap_or_else(|err| {
        warn!(identity, action, error = %err, "handler error, safe-acking");
        json!({})
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::boot;
    use crate::support::test_support::test_repos;

    #[tokio::test]
    async fn boot_dispatches_to_its_handler() {
        let repos = test_repos().await;
        let reply = dispatch(
            &repos,
            "CP1",
            "BootNotification",
            json!({"chargePointSerialNumber": "CP1", "chargePointVendor": "V", "chargePointModel": "M"}),
            None,
        )
        .await;
        assert_eq!(reply["status"], "Accepted");
    }

    #[tokio::test]
    async fn unknown_action_gets_safe_ack() {
        let repos = test_repos().await;
        let reply = dispatch(&repos, "CP1", "SomeFutureAction", json!({}), None).await;
        assert_eq!(reply, json!({}));
    }

    #[tokio::test]
    async fn handler_error_is_downgraded_to_safe_ack_not_propagated() {
        let repos = test_repos().await;
        // Heartbeat from a station that was never booted — StationNotFound.
        let reply = dispatch(&repos, "GHOST", "Heartbeat", json!({}), None).await;
        assert_eq!(reply, json!({}));

        // Sanity: boot still works afterwards, confirming no poisoned state.
        boot::handle(
            &repos,
            "GHOST",
            json!({"chargePointSerialNumber": "GHOST", "chargePointVendor": "V", "chargePointModel": "M"}),
        )
        .await
        .unwrap();
    }
}
