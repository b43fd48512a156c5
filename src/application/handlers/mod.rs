//! Domain Handlers (component D): one stateless function per OCPP 1.6
//! action, operating on the persistent data model through
//! `domain::ports`. Every handler is idempotent on its own fields (spec
//! §5 "Idempotency surfaces").

pub mod boot;
pub mod firmware_status;
pub mod heartbeat;
pub mod meter_values;
pub mod start_transaction;
pub mod status;
pub mod stop_transaction;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::ports::RepositoryProvider;
use crate::domain::station::Station;
use crate::support::errors::{DomainError, DomainResult};

async fn resolve_station(
    repos: &dyn RepositoryProvider,
    identity: &str,
) -> DomainResult<Station> {
    repos
        .stations()
        .find_by_identity(identity)
        .await?
        .ok_or_else(|| DomainError::StationNotFound(identity.to_string()))
}

/// RFC3339 with a literal `Z` offset, the wire format every OCPP 1.6
/// timestamp in a reply uses.
fn rfc3339_z(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Parses an inbound `timestamp` field, tolerating absence or malformed
/// input (stations are bursty and not always well-formed) by falling
/// back to the server clock at the call site.
fn parse_timestamp(payload: &Value, field: &str) -> Option<DateTime<Utc>> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// `transactionId` arrives as either a JSON number or a JSON string
/// depending on the station; normalize to the decimal string our
/// `Session::transaction_id` field and Registry request ids both use.
fn value_as_id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
