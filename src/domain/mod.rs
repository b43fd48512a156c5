//! Domain layer: the charging lifecycle state machine and its entities.
//!
//! Entities are plain data — no persistence concerns, no OCPP wire
//! concerns. `infrastructure::database` maps these onto SeaORM entities;
//! `application` operates on them through the `ports` traits.

pub mod intent;
pub mod meter_sample;
pub mod ports;
pub mod session;
pub mod station;

pub use intent::{Intent, IntentStatus};
pub use meter_sample::MeterSample;
pub use ports::RepositoryProvider;
pub use session::Session;
pub use station::{Station, StationStatus};

pub use crate::support::errors::{DomainError, DomainResult};
