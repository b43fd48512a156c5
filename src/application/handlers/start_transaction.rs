//! StartTransaction — reuses an open Session pre-created by the Payment
//! Bridge if one exists on this (station, connector); otherwise opens a
//! new one. Grounded on
//! `original_source/app/ocpp/handlers/transactions.py::start_transaction`,
//! with the reuse rule spec §4.D adds on top of it.

use chrono::Utc;
use serde_json::{json, Value};

use crate::domain::ports::RepositoryProvider;
use crate::domain::session::Session;
use crate::domain::station::StationStatus;
use crate::support::errors::DomainResult;

use super::{parse_timestamp, resolve_station};

fn as_i32(value: &Value) -> Option<i32> {
    value.as_i64().map(|n| n as i32).or_else(|| {
        value
            .as_str()
            .and_then(|s| s.trim().parse::<i32>().ok())
    })
}

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
) -> DomainResult<Value> {
    let station = resolve_station(repos, identity).await?;

    let connector_id = payload.get("connectorId").and_then(as_i32);
    let id_tag = payload
        .get("idTag")
        .and_then(Value::as_str)
        .map(str::to_string);
    let meter_start = payload.get("meterStart").and_then(as_f64);
    let started_at = parse_timestamp(&payload, "timestamp").unwrap_or_else(Utc::now);

    let existing = match connector_id {
        Some(cid) => {
            repos
                .sessions()
                .find_open_by_station_connector(station.id, cid)
                .await?
        }
        None => None,
    };

    let session = match existing {
        Some(mut session) => {
            if session.connector_id.is_none() {
                session.connector_id = connector_id;
            }
            if session.user_tag.is_none() {
                session.user_tag = id_tag;
            }
            if session.meter_start_wh.is_none() {
                session.meter_start_wh = meter_start;
            }
            if session.transaction_id.is_none() {
                session.transaction_id = Some(session.id.to_string());
            }
            repos.sessions().update(&session).await?;
            session
        }
        None => {
            let draft = Session {
                id: 0,
                station_id: station.id,
                connector_id,
                transaction_id: None,
                email: None,
                intent_id: None,
                user_tag: id_tag,
                started_at,
                finished_at: None,
                meter_start_wh: meter_start,
                meter_stop_wh: None,
                energy_kwh: None,
                cost_huf: None,
                stop_code_hash: None,
            };
            let mut session = repos.sessions().create(draft).await?;
            session.transaction_id = Some(session.id.to_string());
            repos.sessions().update(&session).await?;
            session
        }
    };

    repos
        .stations()
        .update_status(station.id, StationStatus::Charging)
        .await?;
    repos.stations().touch_last_seen(station.id).await?;

    Ok(json!({
        "transactionId": session.id as i64,
        "idTagInfo": { "status": "Accepted" },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::boot;
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
    async fn creates_new_session_when_none_open() {
        let repos = test_repos().await;
        boot_station(&repos, "CP1").await;

        let reply = handle(
            &repos,
            "CP1",
            json!({"connectorId": 1, "idTag": "ANON", "meterStart": 1000000}),
        )
        .await
        .unwrap();

        assert!(reply["transactionId"].is_i64());
        assert_eq!(reply["idTagInfo"]["status"], "Accepted");

        let station = repos.stations().find_by_identity("CP1").await.unwrap().unwrap();
        let sessions = repos.sessions().list_active_by_station(station.id).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].meter_start_wh, Some(1000000.0));
    }

    #[tokio::test]
    async fn reuses_preexisting_open_session_instead_of_creating_a_second_one() {
        let repos = test_repos().await;
        boot_station(&repos, "CP1").await;
        let station = repos.stations().find_by_identity("CP1").await.unwrap().unwrap();

        // Simulate the Payment Bridge pre-creating a session at webhook time.
        let pre = Session {
            id: 0,
            station_id: station.id,
            connector_id: Some(1),
            transaction_id: None,
            email: Some("a@b.com".into()),
            intent_id: Some(1),
            user_tag: None,
            started_at: Utc::now(),
            finished_at: None,
            meter_start_wh: None,
            meter_stop_wh: None,
            energy_kwh: None,
            cost_huf: None,
            stop_code_hash: Some("hash".into()),
        };
        let pre = repos.sessions().create(pre).await.unwrap();

        let reply = handle(
            &repos,
            "CP1",
            json!({"connectorId": 1, "idTag": "ANON", "timestamp": "2026-03-01T10:00:00Z", "meterStart": 1000000}),
        )
        .await
        .unwrap();

        assert_eq!(reply["transactionId"], pre.id as i64);

        let sessions = repos.sessions().list_active_by_station(station.id).await.unwrap();
        assert_eq!(sessions.len(), 1, "no second session should be created");
        assert_eq!(sessions[0].email.as_deref(), Some("a@b.com"));
        assert_eq!(sessions[0].meter_start_wh, Some(1_000_000.0));
    }

    #[tokio::test]
    async fn reuse_branch_does_not_overwrite_an_already_set_meter_start() {
        let repos = test_repos().await;
        boot_station(&repos, "CP1").await;
        let station = repos.stations().find_by_identity("CP1").await.unwrap().unwrap();

        let pre = Session {
            id: 0,
            station_id: station.id,
            connector_id: Some(1),
            transaction_id: None,
            email: Some("a@b.com".into()),
            intent_id: Some(1),
            user_tag: None,
            started_at: Utc::now(),
            finished_at: None,
            meter_start_wh: Some(500_000.0),
            meter_stop_wh: None,
            energy_kwh: None,
            cost_huf: None,
            stop_code_hash: Some("hash".into()),
        };
        repos.sessions().create(pre).await.unwrap();

        handle(
            &repos,
            "CP1",
            json!({"connectorId": 1, "idTag": "ANON", "meterStart": 1_000_000}),
        )
        .await
        .unwrap();

        let sessions = repos.sessions().list_active_by_station(station.id).await.unwrap();
        assert_eq!(sessions[0].meter_start_wh, Some(500_000.0));
    }

    #[tokio::test]
    async fn two_consecutive_starts_yield_exactly_one_session() {
        let repos = test_repos().await;
        boot_station(&repos, "CP1").await;
        let station = repos.stations().find_by_identity("CP1").await.unwrap().unwrap();

        handle(&repos, "CP1", json!({"connectorId": 1, "idTag": "ANON"}))
            .await
            .unwrap();
        handle(&repos, "CP1", json!({"connectorId": 1, "idTag": "ANON"}))
            .await
            .unwrap();

        let sessions = repos.sessions().list_active_by_station(station.id).await.unwrap();
        assert_eq!(sessions.len(), 1);
    }
}
