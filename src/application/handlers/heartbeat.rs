//! Heartbeat — touches `last_seen_at` and echoes the server clock.
//! Grounded on `original_source/app/ocpp/ocpp_ws.py`'s `touch_last_seen`.

use serde_json::{json, Value};

use crate::support::errors::DomainResult;

use super::resolve_station;
use crate::domain::ports::RepositoryProvider;

pub async fn handle(
    repos: &dyn RepositoryProvider,
    identity: &str,
    _payload: Value,
) -> DomainResult<Value> {
    let station = resolve_station(repos, identity).await?;
    repos.stations().touch_last_seen(station.id).await?;

    Ok(json!({ "currentTime": super::rfc3339_z(chrono::Utc::now()) }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::boot;
    use crate::support::test_support::test_repos;

    #[tokio::test]
    async fn touches_last_seen_and_replies_with_server_time() {
        let repos = test_repos().await;
        boot::handle(
            &repos,
            "CP1",
            json!({"chargePointSerialNumber": "CP1", "chargePointVendor": "V", "chargePointModel": "M"}),
        )
        .await
        .unwrap();

        let before = repos.stations().find_by_identity("CP1").await.unwrap().unwrap();

        let reply = handle(&repos, "CP1", json!({})).await.unwrap();
        assert!(reply.get("currentTime").is_some());

        let after = repos.stations().find_by_identity("CP1").await.unwrap().unwrap();
        assert!(after.last_seen_at >= before.last_seen_at);
    }

    #[tokio::test]
    async fn unknown_station_is_an_error() {
        let repos = test_repos().await;
        assert!(handle(&repos, "GHOST", json!({})).await.is_err());
    }
}
