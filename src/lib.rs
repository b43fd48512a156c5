//! # OCPP 1.6-J Charge Station Management System
//!
//! A pay-first, anonymous EV charging backend: stations speak OCPP 1.6-J
//! over a single WebSocket transport, a web client opens a Stripe
//! Checkout Session for a time-boxed hold, and a settled payment
//! pre-binds a Session and issues a `RemoteStartTransaction` back to the
//! station.
//!
//! ## Layout
//!
//! - **support**: cross-cutting utilities — errors, OCPP-J framing,
//!   graceful shutdown, test fixtures.
//! - **domain**: entities (Station, Intent, Session, MeterSample) and the
//!   `RepositoryProvider` ports they're persisted through.
//! - **application**: the Connection Registry, the Action Dispatcher, the
//!   Domain Handlers (one per OCPP action), and the Session Lifecycle &
//!   Payment Bridge.
//! - **infrastructure**: SeaORM-backed persistence.
//! - **interfaces**: the Axum HTTP+WebSocket delivery layer.
//! - **config**: TOML + environment configuration.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod support;

pub use config::{default_config_path, AppConfig};
pub use infrastructure::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};
