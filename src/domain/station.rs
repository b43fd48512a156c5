//! Station entity — a physical charging device.

use chrono::{DateTime, Utc};

/// Coarse operational status reported by the station, normalized to
/// lowercase. `Unknown` is the default for a station that has booted but
/// never sent a `StatusNotification`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationStatus {
    Available,
    Preparing,
    Charging,
    Finishing,
    Faulted,
    Unavailable,
    Unknown,
}

impl StationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Preparing => "preparing",
            Self::Charging => "charging",
            Self::Finishing => "finishing",
            Self::Faulted => "faulted",
            Self::Unavailable => "unavailable",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for StationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for StationStatus {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "available" => Self::Available,
            "preparing" => Self::Preparing,
            "charging" => Self::Charging,
            "finishing" => Self::Finishing,
            "faulted" => Self::Faulted,
            "unavailable" => Self::Unavailable,
            _ => Self::Unknown,
        }
    }
}

/// A physical charging device, identified by its self-declared serial
/// number (the *station identity*). Created on first Boot; never deleted
/// by the core.
#[derive(Debug, Clone)]
pub struct Station {
    pub id: i32,
    /// The opaque stable string the station is addressed by on the wire
    /// and in the Connection Registry.
    pub identity: String,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub firmware_version: Option<String>,
    pub status: StationStatus,
    pub last_seen_at: DateTime<Utc>,
}

impl Station {
    /// A station is considered offline for REST projection purposes when
    /// it has not been heard from in over this many seconds, regardless
    /// of its stored status (spec §6: `GET /charge-points`). This is a
    /// read-side derivation only — it never overwrites `status` itself.
    pub const OFFLINE_AFTER_SECS: i64 = 120;

    pub fn is_stale(&self) -> bool {
        Utc::now().signed_duration_since(self.last_seen_at).num_seconds() > Self::OFFLINE_AFTER_SECS
    }

    /// The status string a REST projection should report: `"offline"`
    /// when stale, the stored status otherwise.
    pub fn projected_status(&self) -> &'static str {
        if self.is_stale() {
            "offline"
        } else {
            self.status.as_str()
        }
    }
}
