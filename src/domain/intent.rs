//! Intent entity — a pre-charge, pay-first hold on a station/connector.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentStatus {
    PendingPayment,
    Paid,
    Expired,
    Cancelled,
    Failed,
}

impl IntentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingPayment => "pending_payment",
            Self::Paid => "paid",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for IntentStatus {
    fn from(s: &str) -> Self {
        match s {
            "paid" => Self::Paid,
            "expired" => Self::Expired,
            "cancelled" => Self::Cancelled,
            "failed" => Self::Failed,
            _ => Self::PendingPayment,
        }
    }
}

/// A record of an anonymous, email-identified user's commitment to pay a
/// refundable hold on a specific station/connector, created by the REST
/// intent endpoint and settled by the payment webhook.
#[derive(Debug, Clone)]
pub struct Intent {
    pub id: i32,
    pub station_id: i32,
    pub connector_id: i32,
    pub email: String,
    pub status: IntentStatus,
    pub hold_amount_huf: i32,
    pub currency: String,
    pub payment_provider: Option<String>,
    pub payment_provider_ref: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Intent {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}
