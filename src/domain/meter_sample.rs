//! MeterSample entity — append-only telemetry, optionally session-bound.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct MeterSample {
    pub id: i32,
    pub station_id: i32,
    /// May be absent if no open Session could be reconciled at the time
    /// of ingestion (an orphan sample).
    pub session_id: Option<i32>,
    pub connector_id: Option<i32>,
    pub timestamp: DateTime<Utc>,
    pub energy_wh_total: Option<f64>,
    pub power_w: Option<f64>,
    pub current_a: Option<f64>,
}
