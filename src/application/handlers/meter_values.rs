//! MeterValues — aggregates per-measurand sampled values, reconciles the
//! batch to an open Session, persists one `MeterSample` per `meterValue`
//! entry, and feeds live progress back onto the Session. Grounded
//! rule-for-rule on `original_source/app/ocpp/handlers/meter.py`.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::meter_sample::MeterSample;
use crate::domain::ports::RepositoryProvider;
use crate::domain::station::StationStatus;
use crate::support::errors::DomainResult;

use super::{resolve_station, value_as_id_string};

const ENERGY_MEASURAND: &str = "Energy.Active.Import.Register";
const POWER_MEASURAND: &str = "Power.Active.Import";
const CURRENT_MEASURAND: &str = "Current.Import";

fn as_i32(value: &Value) -> Option<i32> {
    value
        .as_i64()
        .map(|n| n as i32)
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<i32>().ok()))
}

fn as_f64(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
}

/// Non-phase entry wins outright; otherwise sum every phase entry for the
/// measurand. Returns `None` if the measurand is absent entirely.
fn pick_measurand_sum(sampled_values: &[Value], measurand: &str) -> Option<f64> {
    for sv in sampled_values {
        if sv.get("measurand").and_then(Value::as_str) == Some(measurand)
            && sv.get("phase").is_none()
        {
            return sv.get("value").and_then(as_f64);
        }
    }

    let mut total = 0.0;
    let mut found = false;
    for sv in sampled_values {
        if sv.get("measurand").and_then(Value::as_str) == Some(measurand) {
            if let Some(value) = sv.get("value").and_then(as_f64) {
                total += value;
                found = true;
            }
        }
    }
    found.then_some(total)
}

/// Four-step reconciliation chain (spec §4.D step 1): open session by echoed
/// transaction id, then by (station, connector), then connector-0 retried
/// at connector 1, then any open session on the station.
async fn reconcile_session_id(
    repos: &dyn RepositoryProvider,
    station_id: i32,
    transaction_id: Option<&str>,
    connector_id: Option<i32>,
) -> DomainResult<Option<i32>> {
    if let Some(tx) = transaction_id {
        if let Some(session) = repos
            .sessions()
            .find_open_by_transaction_id(station_id, tx)
            .await?
        {
            return Ok(Some(session.id));
        }
    }

    if let Some(cid) = connector_id {
        if let Some(session) = repos
            .sessions()
            .find_open_by_station_connector(station_id, cid)
            .await?
        {
            return Ok(Some(session.id));
        }

        if cid == 0 {
            if let Some(session) = repos
                .sessions()
                .find_open_by_station_connector(station_id, 1)
                .await?
            {
                return Ok(Some(session.id));
            }
        }
    }

    Ok(repos
        .sessions()
        .find_open_any_on_station(station_id)
        .await?
        .map(|s| s.id))
}

pub async fn handle(
    repos: &dyn RepositoryProvider,
    identity: &str,
    payload: Value,
    price_huf_per_kwh: Option<f64>,
) -> DomainResult<Value> {
    let station = resolve_station(repos, identity).await?;

    let connector_id = payload.get("connectorId").and_then(as_i32);
    let transaction_id = payload.get("transactionId").and_then(value_as_id_string);

    let meter_values = payload
        .get("meterValue")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let session_id = reconcile_session_id(
        repos,
        station.id,
        transaction_id.as_deref(),
        connector_id,
    )
    .await?;

    let mut last_power_w = 0.0;
    let mut last_current_a = 0.0;

    for mv in &meter_values {
        let timestamp = mv
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        let sampled: Vec<Value> = mv
            .get("sampledValue")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let power_w = pick_measurand_sum(&sampled, POWER_MEASURAND);
        let current_a = pick_measurand_sum(&sampled, CURRENT_MEASURAND);
        let energy_wh = pick_measurand_sum(&sampled, ENERGY_MEASURAND);

        last_power_w = power_w.unwrap_or(0.0);
        last_current_a = current_a.unwrap_or(0.0);

        repos
            .meter_samples()
            .create(MeterSample {
                id: 0,
                station_id: station.id,
                session_id,
                connector_id,
                timestamp,
                energy_wh_total: energy_wh,
                power_w,
                current_a,
            })
            .await?;

        if let (Some(session_id), Some(energy_wh)) = (session_id, energy_wh) {
            if let Some(mut session) = repos.sessions().find_by_id(session_id).await? {
                if session.is_open() {
                    session.meter_stop_wh = Some(energy_wh);
                    session.recalc_energy_and_cost(price_huf_per_kwh);
                    repos.sessions().update(&session).await?;
                }
            }
        }
    }

    repos.stations().touch_last_seen(station.id).await?;
    if last_power_w > 10.0 || last_current_a > 0.1 {
        repos
            .stations()
            .update_status(station.id, StationStatus::Charging)
            .await?;
    }

    Ok(serde_json::json!({}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::{boot, start_transaction};
    use crate::support::test_support::test_repos;
    use serde_json::json;

    async fn boot_and_start(repos: &impl RepositoryProvider, identity: &str, connector: i64) -> i64 {
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
            json!({"connectorId": connector, "idTag": "ANON", "meterStart": 1_000_000}),
        )
        .await
        .unwrap();
        reply["transactionId"].as_i64().unwrap()
    }

    #[test]
    fn pick_measurand_sum_prefers_non_phase_entry() {
        let sampled = vec![
            json!({"measurand": "Power.Active.Import", "phase": "L1", "value": "1000"}),
            json!({"measurand": "Power.Active.Import", "phase": "L2", "value": "1000"}),
            json!({"measurand": "Power.Active.Import", "value": "2500"}),
        ];
        assert_eq!(pick_measurand_sum(&sampled, "Power.Active.Import"), Some(2500.0));
    }

    #[test]
    fn pick_measurand_sum_sums_phases_when_no_aggregate_entry() {
        let sampled = vec![
            json!({"measurand": "Current.Import", "phase": "L1", "value": "5"}),
            json!({"measurand": "Current.Import", "phase": "L2", "value": "6"}),
            json!({"measurand": "Current.Import", "phase": "L3", "value": "7"}),
        ];
        assert_eq!(pick_measurand_sum(&sampled, "Current.Import"), Some(18.0));
    }

    #[test]
    fn pick_measurand_sum_is_none_when_measurand_absent() {
        let sampled = vec![json!({"measurand": "Voltage", "value": "230"})];
        assert_eq!(pick_measurand_sum(&sampled, "Power.Active.Import"), None);
    }

    #[tokio::test]
    async fn binds_to_open_session_by_transaction_id_and_updates_live_progress() {
        let repos = test_repos().await;
        let tx = boot_and_start(&repos, "CP1", 1).await;

        handle(
            &repos,
            "CP1",
            json!({
                "connectorId": 0,
                "transactionId": tx,
                "meterValue": [{
                    "timestamp": "2026-03-01T10:15:00Z",
                    "sampledValue": [
                        {"measurand": "Energy.Active.Import.Register", "value": "1003500"},
                        {"measurand": "Power.Active.Import", "value": "11000"},
                        {"measurand": "Current.Import", "value": "16"},
                    ]
                }]
            }),
            None,
        )
        .await
        .unwrap();

        let session = repos.sessions().find_by_id(tx as i32).await.unwrap().unwrap();
        assert_eq!(session.meter_stop_wh, Some(1_003_500.0));
        assert_eq!(session.energy_kwh, Some(3.5));

        let station = repos.stations().find_by_identity("CP1").await.unwrap().unwrap();
        assert_eq!(station.status.as_str(), "charging");
    }

    #[tokio::test]
    async fn configured_price_fills_live_cost() {
        let repos = test_repos().await;
        let tx = boot_and_start(&repos, "CP1", 1).await;

        handle(
            &repos,
            "CP1",
            json!({
                "connectorId": 1,
                "transactionId": tx,
                "meterValue": [{
                    "sampledValue": [
                        {"measurand": "Energy.Active.Import.Register", "value": "1003500"},
                    ]
                }]
            }),
            Some(80.0),
        )
        .await
        .unwrap();

        let session = repos.sessions().find_by_id(tx as i32).await.unwrap().unwrap();
        assert_eq!(session.energy_kwh, Some(3.5));
        assert_eq!(session.cost_huf, Some(280.0));
    }

    #[tokio::test]
    async fn connector_zero_falls_back_to_connector_one() {
        let repos = test_repos().await;
        let tx = boot_and_start(&repos, "CP1", 1).await;

        // No transactionId given; connectorId 0 must retry at connector 1.
        handle(
            &repos,
            "CP1",
            json!({
                "connectorId": 0,
                "meterValue": [{
                    "sampledValue": [
                        {"measurand": "Energy.Active.Import.Register", "value": "1001000"},
                    ]
                }]
            }),
            None,
        )
        .await
        .unwrap();

        let session = repos.sessions().find_by_id(tx as i32).await.unwrap().unwrap();
        assert_eq!(session.meter_stop_wh, Some(1_001_000.0));
    }

    #[tokio::test]
    async fn orphan_sample_persists_without_a_session() {
        let repos = test_repos().await;
        boot::handle(
            &repos,
            "CP1",
            json!({"chargePointSerialNumber": "CP1", "chargePointVendor": "V", "chargePointModel": "M"}),
        )
        .await
        .unwrap();

        // No open session anywhere on the station.
        handle(
            &repos,
            "CP1",
            json!({
                "connectorId": 1,
                "meterValue": [{
                    "sampledValue": [{"measurand": "Energy.Active.Import.Register", "value": "500"}]
                }]
            }),
            None,
        )
        .await
        .unwrap();
        // No panic, no session created as a side effect.
        let station = repos.stations().find_by_identity("CP1").await.unwrap().unwrap();
        assert_eq!(
            repos.sessions().list_active_by_station(station.id).await.unwrap().len(),
            0
        );
    }
}
