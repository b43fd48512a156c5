//! Session entity — one charging transaction, open between StartTransaction
//! and StopTransaction (or pre-created by the Payment Bridge and reused).

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct Session {
    pub id: i32,
    pub station_id: i32,
    pub connector_id: Option<i32>,
    /// The station-facing transaction id, echoed back on StartTransaction
    /// and matched against on StopTransaction/MeterValues. We mint this
    /// from the Session's own primary key so the echo always correlates.
    pub transaction_id: Option<String>,
    pub email: Option<String>,
    pub intent_id: Option<i32>,
    pub user_tag: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub meter_start_wh: Option<f64>,
    pub meter_stop_wh: Option<f64>,
    pub energy_kwh: Option<f64>,
    pub cost_huf: Option<f64>,
    /// SHA-256 hash (hex) of the stop-code. Plaintext is never persisted.
    pub stop_code_hash: Option<String>,
}

impl Session {
    pub fn is_open(&self) -> bool {
        self.finished_at.is_none()
    }

    /// Energy, cost and non-negative guard per spec §4.D StopTransaction.
    /// Called whenever `meter_stop_wh` changes (finalize or live progress).
    pub fn recalc_energy_and_cost(&mut self, price_huf_per_kwh: Option<f64>) {
        if let (Some(start), Some(stop)) = (self.meter_start_wh, self.meter_stop_wh) {
            if stop >= start {
                self.energy_kwh = Some((stop - start) / 1000.0);
            } else {
                // station lied, or the meter rolled over: leave energy_kwh
                // as-is rather than reporting a negative value.
                self.energy_kwh = None;
            }
        }

        if let (Some(price), Some(energy)) = (price_huf_per_kwh, self.energy_kwh) {
            self.cost_huf = Some(energy * price);
        }
    }
}
