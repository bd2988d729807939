//! feira-od (Order Dispatch) - order panel backend
//!
//! Serves the order panel API, persists payment receipts under the uploads
//! directory, and notifies customers over WhatsApp on status transitions.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use feira_common::config::TomlConfig;
use feira_od::notify::{OutcomeLog, WhatsAppClient};
use feira_od::receipts::ReceiptStore;
use feira_od::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "feira-od", about = "Feira order dispatch service")]
struct Args {
    /// Path to the bootstrap TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured database path
    #[arg(long)]
    database: Option<PathBuf>,

    /// Override the configured HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = TomlConfig::load(args.config.as_deref())?;

    // RUST_LOG wins over the configured level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Log build identification immediately, before database delays
    info!(
        "Starting Feira Order Dispatch (feira-od) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let db_path = args.database.unwrap_or_else(|| config.database_path.clone());
    let port = args.port.unwrap_or(config.port);

    info!("Database path: {}", db_path.display());
    let pool = feira_common::db::init_database(&db_path).await?;

    let receipts = ReceiptStore::new(&config.upload_root);
    let whatsapp = WhatsAppClient::new(
        config.whatsapp.endpoint.clone(),
        config.whatsapp_timeout(),
        OutcomeLog::new(&config.log_dir),
    )?;

    let state = AppState::new(pool, receipts, whatsapp);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("feira-od listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
