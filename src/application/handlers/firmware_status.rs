//! FirmwareStatusNotification — safe ack, `last_seen_at` touch only. No
//! firmware-update orchestration beyond acknowledgment (spec Non-goals).

use serde_json::{json, Value};

use crate::domain::ports::RepositoryProvider;
use crate::support::errors::DomainResult;

use super::resolve_station;

pub async fn handle(
    repos: &dyn RepositoryProvider,
    identity: &str,
    _payload: Value,
) -> DomainResult<Value> {
    let station = resolve_station(repos, identity).await?;
    repos.stations().touch_last_seen(station.id).await?;
    Ok(json!({}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::boot;
    use crate::support::test_support::test_repos;

    #[tokio::test]
    async fn acks_with_empty_object() {
        let repos = test_repos().await;
        boot::handle(
            &repos,
            "CP1",
            json!({"chargePointSerialNumber": "CP1", "chargePointVendor": "V", "chargePointModel": "M"}),
        )
        .await
        .unwrap();

        let reply = handle(&repos, "CP1", json!({"status": "Installed"}))
            .await
            .unwrap();
        assert_eq!(reply, json!({}));
    }
}
