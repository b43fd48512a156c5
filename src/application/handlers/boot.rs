//! BootNotification — upserts the Station and grants a 60s heartbeat
//! interval. Grounded on `original_source/app/ocpp/ocpp_ws.py`'s
//! `upsert_charge_point_from_boot`.

use serde_json::{json, Value};

use crate::domain::ports::RepositoryProvider;
use crate::support::errors::DomainResult;

const HEARTBEAT_INTERVAL_SECS: i64 = 60;

pub async fn handle(
    repos: &dyn RepositoryProvider,
    identity: &str,
    payload: Value,
) -> DomainResult<Value> {
    let vendor = payload
        .get("chargePointVendor")
        .and_then(Value::as_str)
        .unwrap_or("");
    let model = payload
        .get("chargePointModel")
        .and_then(Value::as_str)
        .unwrap_or("");
    let serial_number = payload
        .get("chargePointSerialNumber")
        .and_then(Value::as_str);
    let firmware_version = payload.get("firmwareVersion").and_then(Value::as_str);

    repos
        .stations()
        .upsert_on_boot(identity, vendor, model, serial_number, firmware_version)
        .await?;

    Ok(json!({
        "status": "Accepted",
        "currentTime": super::rfc3339_z(chrono::Utc::now()),
        "interval": HEARTBEAT_INTERVAL_SECS,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::support::test_support::test_repos;

    #[tokio::test]
    async fn upserts_station_and_accepts() {
        let repos = test_repos().await;
        let reply = handle(
            &repos,
            "VLTHU_SIM01",
            json!({
                "chargePointSerialNumber": "VLTHU_SIM01",
                "chargePointVendor": "V",
                "chargePointModel": "M",
                "firmwareVersion": "1.0",
            }),
        )
        .await
        .unwrap();

        assert_eq!(reply["status"], "Accepted");
        assert_eq!(reply["interval"], 60);

        let station = repos
            .stations()
            .find_by_identity("VLTHU_SIM01")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(station.vendor.as_deref(), Some("V"));
        assert_eq!(station.status.as_str(), "available");
    }

    #[tokio::test]
    async fn replaying_boot_is_idempotent_on_identity() {
        let repos = test_repos().await;
        let payload = json!({
            "chargePointSerialNumber": "CP1",
            "chargePointVendor": "V",
            "chargePointModel": "M",
        });
        handle(&repos, "CP1", payload.clone()).await.unwrap();
        handle(&repos, "CP1", payload).await.unwrap();

        let stations = repos.stations().list_all().await.unwrap();
        assert_eq!(stations.len(), 1);
    }
}
