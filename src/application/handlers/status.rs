//! StatusNotification — normalizes the station's reported status, with
//! one carve-out: while a Session is open, a reported `Available` is
//! suppressed rather than overwriting the stored status, per spec's
//! resolution of the ambiguity in `original_source/app/ocpp/handlers/status.py`
//! (conditional suppression, not the monolithic draft's unconditional write).

use serde_json::{json, Value};

use crate::domain::ports::RepositoryProvider;
use crate::domain::station::StationStatus;
use crate::support::errors::DomainResult;

use super::resolve_station;

pub async fn handle(
    repos: &dyn RepositoryProvider,
    identity: &str,
    payload: Value,
) -> DomainResult<Value> {
    let station = resolve_station(repos, identity).await?;
    repos.stations().touch_last_seen(station.id).await?;

    let incoming = payload
        .get("status")
        .and_then(Value::as_str)
        .map(StationStatus::from)
        .unwrap_or(StationStatus::Unknown);

    let has_open_session = repos
        .sessions()
        .find_open_any_on_station(station.id)
        .await?
        .is_some();

    if has_open_session && matches!(incoming, StationStatus::Available) {
        return Ok(json!({}));
    }

    repos.stations().update_status(station.id, incoming).await?;
    Ok(json!({}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::{boot, start_transaction};
    use crate::support::test_support::test_repos;

    async fn boot_station(repos: &impl RepositoryProvider, identity: &str) {
        boot::handle(
            repos,
            identity,
            json!({"chargePointSerialNumber": identity, "chargePointVendor": "V", "chargePointModel": "M"}),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn overwrites_status_with_no_open_session() {
        let repos = test_repos().await;
        boot_station(&repos, "CP1").await;

        handle(&repos, "CP1", json!({"connectorId": 1, "status": "Preparing"}))
            .await
            .unwrap();

        let station = repos.stations().find_by_identity("CP1").await.unwrap().unwrap();
        assert_eq!(station.status.as_str(), "preparing");
    }

    #[tokio::test]
    async fn suppresses_available_while_session_open() {
        let repos = test_repos().await;
        boot_station(&repos, "CP1").await;
        start_transaction::handle(
            &repos,
            "CP1",
            json!({"connectorId": 1, "idTag": "ANON", "meterStart": 1000}),
        )
        .await
        .unwrap();

        handle(&repos, "CP1", json!({"connectorId": 1, "status": "Available"}))
            .await
            .unwrap();

        let station = repos.stations().find_by_identity("CP1").await.unwrap().unwrap();
        assert_eq!(station.status.as_str(), "charging");
    }

    #[tokio::test]
    async fn faulted_overwrites_even_with_open_session() {
        let repos = test_repos().await;
        boot_station(&repos, "CP1").await;
        start_transaction::handle(
            &repos,
            "CP1",
            json!({"connectorId": 1, "idTag": "ANON", "meterStart": 1000}),
        )
        .await
        .unwrap();

        handle(&repos, "CP1", json!({"connectorId": 1, "status": "Faulted"}))
            .await
            .unwrap();

        let station = repos.stations().find_by_identity("CP1").await.unwrap().unwrap();
        assert_eq!(station.status.as_str(), "faulted");
    }
}
