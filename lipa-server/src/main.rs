//! Lipa Server
//!
//! Checkout, ride and wallet payments over M-Pesa push prompts, a stored
//! balance wallet and manual bank transfers.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, get_database_url};
use lipa_core::processors::PaymentExpirySweeper;
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Lipa - M-Pesa checkout, wallet and reconciliation server
#[derive(Parser, Debug)]
#[command(name = "lipa-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./lipa-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting lipa-server v{}", env!("CARGO_PKG_VERSION"));

    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!(error = %e, path = ?args.config, "Failed to load configuration");
        e
    })?;

    let listen_addr = loaded_config.server.listen;
    tracing::info!(
        path = ?args.config,
        shortcode = %loaded_config.mpesa.shortcode,
        gateway = %loaded_config.mpesa.base_url,
        "Configuration loaded"
    );

    let shared_config = loaded_config.into_shared();

    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to database");
            e
        })?;
    tracing::info!("Connected to database");

    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    let state = AppState::new(db_pool.clone(), shared_config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = PaymentExpirySweeper::new(
        state.db.clone(),
        state.config.payments.clone(),
        shutdown_rx,
    );
    let sweeper_handle = tokio::spawn(sweeper.run());

    // SIGHUP
    let reload_notify = spawn_config_reload_handler(state.clone(), config_loader);

    let router = build_router(state);

    let result = run_server(router, listen_addr).await;

    reload_notify.notify_one();
    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper_handle.await {
        tracing::error!(error = %e, "Payment expiry sweeper task failed");
    }

    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
