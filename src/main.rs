//! OCPP 1.6-J Charge Station Management System.
//!
//! Reads configuration from an optional TOML file
//! (`~/.config/ocpp-csms/config.toml`, or `$OCPP_CONFIG`) with
//! environment-variable overrides for secrets and deployment-specific
//! values (spec §6).

use std::sync::Arc;

use sea_orm_migration::MigratorTrait;
use tracing::{info, warn};

use ocpp_csms::application::registry::ConnectionRegistry;
use ocpp_csms::application::services::{PaymentBridge, StripeClient};
use ocpp_csms::config::AppConfig;
use ocpp_csms::domain::ports::RepositoryProvider;
use ocpp_csms::infrastructure::database::migrator::Migrator;
use ocpp_csms::interfaces::http::AppState;
use ocpp_csms::interfaces::ws::GatewayState;
use ocpp_csms::support::shutdown::ShutdownCoordinator;
use ocpp_csms::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::var("OCPP_CONFIG").ok().map(std::path::PathBuf::from);
    let app_cfg = AppConfig::load(config_path).unwrap_or_else(|e| {
        eprintln!("failed to load config, using defaults: {e}");
        AppConfig::default()
    });

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&app_cfg.logging.level)),
        )
        .init();

    info!("starting OCPP 1.6-J charge station management system");

    // Prometheus recorder must be installed before any `metrics` macro fires.
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus metrics recorder");

    let db_config = DatabaseConfig {
        url: app_cfg.database.url.clone(),
    };
    info!(url = %db_config.url, "connecting to database");
    let db = init_database(&db_config).await?;

    info!("running database migrations");
    Migrator::up(&db, None).await?;

    let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
    let registry = Arc::new(ConnectionRegistry::new());

    let stripe_client = Arc::new(StripeClient::new(app_cfg.payment.stripe_secret_key.clone()));
    let bridge = Arc::new(PaymentBridge::new(&app_cfg.payment, stripe_client));
    if app_cfg.payment.stripe_webhook_secret.is_empty() {
        warn!("STRIPE_WEBHOOK_SECRET not configured; the webhook endpoint will return 503 until it is set");
    }

    let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout_secs);
    let shutdown_signal = shutdown.signal();
    shutdown.start_signal_listener();

    let http_state = AppState {
        repos: repos.clone(),
        registry: registry.clone(),
        bridge,
        metrics_handle,
    };
    let gateway_state = GatewayState {
        repos: repos.clone(),
        registry: registry.clone(),
        price_huf_per_kwh: app_cfg.payment.price_huf_per_kwh,
    };

    let app = axum::Router::new()
        .merge(ocpp_csms::interfaces::http::router(http_state))
        .merge(ocpp_csms::interfaces::ws::router(gateway_state));

    let addr = app_cfg.server_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "listening for REST and OCPP WebSocket traffic");

    let shutdown_wait = shutdown_signal.clone();
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_wait.wait().await;
            info!("shutdown signal received, draining connections");
        })
        .await?;

    if let Err(e) = db.close().await {
        warn!(error = %e, "error closing database connection");
    }

    info!("shutdown complete");
    Ok(())
}
