//! StopTransaction — finalizes the Session matching the echoed
//! transaction id (dual lookup: by stored `transaction_id` string, falling
//! back to treating it as the Session's own primary key), computes
//! energy/cost, and releases the Station back to `available`. Grounded on
//! `original_source/app/ocpp/handlers/transactions.py::stop_transaction`.

use serde_json::{json, Value};
use tracing::warn;

use crate::domain::ports::RepositoryProvider;
use crate::domain::station::StationStatus;
use crate::support::errors::{DomainError, DomainResult};

use super::{parse_timestamp, resolve_station, value_as_id_string};

fn as_f64(value: &Value) -> Option<f64> {
    value.as_f64().or_else(|| {
        value
            .as_str()
            .and_then(|s| s.trim().parse::<f64>().ok())
    })
}

pub async fn handle(
    repos: &dyn RepositoryProvider,
    identity: &str,
    payload: Value,
    price_huf_per_kwh: Option<f64>,
) -> DomainResult<Value> {
    let station = resolve_station(repos, identity).await?;

    let transaction_id = payload
        .get("transactionId")
        .and_then(value_as_id_string)
        .ok_or(DomainError::MissingField("transactionId"))?;

    let mut session = repos
        .sessions()
        .find_open_by_transaction_id(station.id, &transaction_id)
        .await?
        .ok_or_else(|| DomainError::SessionNotFoundByTransaction(transaction_id.clone()))?;

    let finished_at = parse_timestamp(&payload, "timestamp").unwrap_or_else(chrono::Utc::now);
    let meter_stop = payload.get("meterStop").and_then(as_f64);

    session.finished_at = Some(finished_at);
    session.meter_stop_wh = meter_stop;

    session.recalc_energy_and_cost(price_huf_per_kwh);

    // Fallback: no meter_start_wh means the preferred computation above
    // left energy_kwh untouched. Derive it from the first/last cumulative
    // energy MeterSample attached to this session instead.
    if session.energy_kwh.is_none() && session.meter_start_wh.is_none() {
        let readings = repos.meter_samples().energy_readings_for_session(session.id).await?;
        let first_wh = readings.first().map(|(_, v)| *v);
        let last_wh = readings
            .last()
            .map(|(_, v)| *v)
            .or(meter_stop);

        if let (Some(first), Some(last)) = (first_wh, last_wh) {
            if last >= first {
                session.energy_kwh = Some((last - first) / 1000.0);
                if let Some(price) = price_huf_per_kwh {
                    session.cost_huf = Some(session.energy_kwh.unwrap() * price);
                }
            } else {
                warn!(
                    session_id = session.id,
                    "StopTransaction: meter reading decreased, leaving energy_kwh unset"
                );
            }
        }
    }

    repos.sessions().update(&session).await?;
    repos
        .stations()
        .update_status(station.id, StationStatus::Available)
        .await?;
    repos.stations().touch_last_seen(station.id).await?;

    Ok(json!({ "idTagInfo": { "status": "Accepted" } }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::{boot, start_transaction};
    use crate::support::test_support::test_repos;

    async fn start_session(repos: &impl RepositoryProvider, identity: &str, meter_start: i64) -> i32 {
        boot::handle(
            repos,
            identity,
            json!({"chargePointSerialNumber": identity, "chargePointVendor": "V", "chargePointModel": "M"}),
        )
        .await
        .unwrap();

        let reply = start_transaction::handle(
            repos,
            identity,
            json!({"connectorId": 1, "idTag": "ANON", "meterStart": meter_start}),
        )
        .await
        .unwrap();
        reply["transactionId"].as_i64().unwrap() as i32
    }

    #[tokio::test]
    async fn computes_energy_from_meter_start_and_stop() {
        let repos = test_repos().await;
        let tx = start_session(&repos, "CP1", 1_000_000).await;

        let reply = handle(
            &repos,
            "CP1",
            json!({"transactionId": tx, "timestamp": "2026-03-01T10:30:00Z", "meterStop": 1_010_000, "reason": "Local"}),
            None,
        )
        .await
        .unwrap();
        assert_eq!(reply["idTagInfo"]["status"], "Accepted");

        let session = repos.sessions().find_by_id(tx).await.unwrap().unwrap();
        assert_eq!(session.energy_kwh, Some(10.0));
        assert!(session.finished_at.is_some());

        let station = repos.stations().find_by_identity("CP1").await.unwrap().unwrap();
        assert_eq!(station.status.as_str(), "available");
    }

    #[tokio::test]
    async fn configured_price_fills_cost_huf() {
        let repos = test_repos().await;
        let tx = start_session(&repos, "CP1", 1_000_000).await;

        handle(
            &repos,
            "CP1",
            json!({"transactionId": tx, "meterStop": 1_010_000}),
            Some(80.0),
        )
        .await
        .unwrap();

        let session = repos.sessions().find_by_id(tx).await.unwrap().unwrap();
        assert_eq!(session.energy_kwh, Some(10.0));
        assert_eq!(session.cost_huf, Some(800.0));
    }

    #[tokio::test]
    async fn negative_energy_leaves_energy_kwh_unset() {
        let repos = test_repos().await;
        let tx = start_session(&repos, "CP1", 1_000_000).await;

        handle(
            &repos,
            "CP1",
            json!({"transactionId": tx, "meterStop": 500_000}),
            None,
        )
        .await
        .unwrap();

        let session = repos.sessions().find_by_id(tx).await.unwrap().unwrap();
        assert_eq!(session.energy_kwh, None);
    }

    #[tokio::test]
    async fn accepts_transaction_id_as_session_primary_key_string() {
        let repos = test_repos().await;
        let tx = start_session(&repos, "CP1", 1_000_000).await;

        let reply = handle(
            &repos,
            "CP1",
            json!({"transactionId": tx.to_string(), "meterStop": 1_005_000}),
            None,
        )
        .await
        .unwrap();
        assert_eq!(reply["idTagInfo"]["status"], "Accepted");
    }

    #[tokio::test]
    async fn missing_open_session_is_an_error() {
        let repos = test_repos().await;
        boot::handle(
            &repos,
            "CP1",
            json!({"chargePointSerialNumber": "CP1", "chargePointVendor": "V", "chargePointModel": "M"}),
        )
        .await
        .unwrap();

        assert!(handle(&repos, "CP1", json!({"transactionId": 999}), None).await.is_err());
    }
}
