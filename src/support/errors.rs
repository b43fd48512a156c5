//! Crate-wide error taxonomy.
//!
//! Domain errors never reach the OCPP transport boundary (handlers always
//! return a reply shape there); they surface as HTTP status codes at the
//! REST boundary, and as structured failures to the Payment Bridge's
//! outbound-call caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("station {0} not found")]
    StationNotFound(String),

    #[error("station {0} is not available (status: {1})")]
    StationNotAvailable(String, String),

    #[error("intent {0} not found")]
    IntentNotFound(i32),

    #[error("session {0} not found")]
    SessionNotFound(i32),

    #[error("no open session for transaction id {0}")]
    SessionNotFoundByTransaction(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid stop code")]
    InvalidStopCode,

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

pub type DomainResult<T> = Result<T, DomainError>;

/// Outcome of an outbound remote CALL issued through the Connection Registry.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("no active transport for station {0}")]
    NotConnected(String),

    #[error("failed to send frame to station {0}: {1}")]
    SendFailed(String, String),

    #[error("timeout waiting for station response")]
    Timeout,

    #[error("station returned error {code}: {description}")]
    CallError { code: String, description: String },

    #[error("waiter cancelled")]
    Cancelled,
}

/// Sub-error codes for payment-webhook signature verification, per the
/// webhook error taxonomy. Returned as the HTTP 400 body's `detail`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WebhookSignatureError {
    #[error("missing_stripe_signature_header")]
    MissingHeader,
    #[error("invalid_stripe_signature_header")]
    InvalidHeader,
    #[error("stripe_signature_timestamp_out_of_tolerance")]
    TimestampOutOfTolerance,
    #[error("invalid_stripe_signature")]
    InvalidSignature,
}

impl WebhookSignatureError {
    /// The exact machine-readable sub-code string used in API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingHeader => "missing_stripe_signature_header",
            Self::InvalidHeader => "invalid_stripe_signature_header",
            Self::TimestampOutOfTolerance => "stripe_signature_timestamp_out_of_tolerance",
            Self::InvalidSignature => "invalid_stripe_signature",
        }
    }
}

/// Errors surfaced by the Payment Bridge (component E) to its REST
/// callers — a union of domain-rule failures, outbound-CALL failures,
/// and provider-side failures, each mapped to a distinct HTTP status by
/// `interfaces::http`.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("{0}")]
    PaymentProvider(String),
}
