//! Repository traits for the domain layer: the seam Domain Handlers and
//! the Payment Bridge operate through, implemented by
//! `infrastructure::database` against SeaORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::intent::Intent;
use super::meter_sample::MeterSample;
use super::session::Session;
use super::station::{Station, StationStatus};
use crate::support::errors::DomainResult;

#[async_trait]
pub trait StationRepository: Send + Sync {
    async fn find_by_identity(&self, identity: &str) -> DomainResult<Option<Station>>;
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Station>>;
    async fn list_all(&self) -> DomainResult<Vec<Station>>;

    /// Upsert on BootNotification: creates the Station if unknown, else
    /// overwrites vendor/model/serial/firmware. Always sets
    /// `status = available` and `last_seen_at = now`.
    async fn upsert_on_boot(
        &self,
        identity: &str,
        vendor: &str,
        model: &str,
        serial_number: Option<&str>,
        firmware_version: Option<&str>,
    ) -> DomainResult<Station>;

    async fn touch_last_seen(&self, id: i32) -> DomainResult<()>;
    async fn update_status(&self, id: i32, status: StationStatus) -> DomainResult<()>;
}

#[async_trait]
pub trait IntentRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Intent>>;

    /// Any intent for this (station, connector) that hasn't reached a
    /// terminal status, used to enforce the "at most one non-terminal
    /// intent per (station, connector)" invariant at creation time.
    async fn find_non_terminal_for_station_connector(
        &self,
        station_id: i32,
        connector_id: i32,
    ) -> DomainResult<Option<Intent>>;

    async fn create(
        &self,
        station_id: i32,
        connector_id: i32,
        email: &str,
        hold_amount_huf: i32,
        expires_at: DateTime<Utc>,
    ) -> DomainResult<Intent>;

    async fn update(&self, intent: &Intent) -> DomainResult<()>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Session>>;
    async fn find_by_intent_id(&self, intent_id: i32) -> DomainResult<Option<Session>>;
    async fn find_open_by_transaction_id(
        &self,
        station_id: i32,
        transaction_id: &str,
    ) -> DomainResult<Option<Session>>;
    async fn find_open_by_station_connector(
        &self,
        station_id: i32,
        connector_id: i32,
    ) -> DomainResult<Option<Session>>;
    async fn find_open_any_on_station(&self, station_id: i32) -> DomainResult<Option<Session>>;
    async fn find_by_email_and_stop_code_hash(
        &self,
        email: &str,
        stop_code_hash: &str,
    ) -> DomainResult<Option<Session>>;
    async fn list_all(&self) -> DomainResult<Vec<Session>>;
    async fn list_active_by_station(&self, station_id: i32) -> DomainResult<Vec<Session>>;

    async fn create(&self, session: Session) -> DomainResult<Session>;
    async fn update(&self, session: &Session) -> DomainResult<()>;
}

#[async_trait]
pub trait MeterSampleRepository: Send + Sync {
    async fn create(&self, sample: MeterSample) -> DomainResult<MeterSample>;

    /// Cumulative-energy readings attached to a session, ordered by
    /// sample timestamp ascending — used by StopTransaction's fallback
    /// energy computation when `meter_start_wh` is absent.
    async fn energy_readings_for_session(
        &self,
        session_id: i32,
    ) -> DomainResult<Vec<(DateTime<Utc>, f64)>>;
}

/// Unified access to all per-aggregate repositories.
pub trait RepositoryProvider: Send + Sync {
    fn stations(&self) -> &dyn StationRepository;
    fn intents(&self) -> &dyn IntentRepository;
    fn sessions(&self) -> &dyn SessionRepository;
    fn meter_samples(&self) -> &dyn MeterSampleRepository;
}
