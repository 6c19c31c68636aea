//! keymint license server
//!
//! Issues, activates, and validates license keys for the desktop client:
//! 1. Purchase webhooks assign (or mint) a code per buyer
//! 2. Activation calls bind a code to one hardware fingerprint
//!
//! Usage:
//!   keymint-server --port 8080 --database keymint.db
//!
//! The server is stateless; everything lives in the SQLite database.

use std::{path::PathBuf, sync::Arc};
use anyhow::{Context, Result};
use clap::Parser;
use keymint_license::{LicenseService, LogNotifier};
use keymint_server::{build_router, AppState};
use keymint_store::LicenseStore;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "keymint-server")]
#[command(about = "License activation and fulfillment server")]
struct Args {
    /// Port for the HTTP API
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Path to the license database
    #[arg(short, long, default_value = "keymint.db")]
    database: PathBuf,

    /// Shared secret for the admin provisioning endpoint
    /// (falls back to KEYMINT_ADMIN_TOKEN; unset disables the endpoint)
    #[arg(long)]
    admin_token: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("keymint server starting...");
    let store = LicenseStore::open(&args.database)
        .with_context(|| format!("failed to open license store at {:?}", args.database))?;
    info!("License store: {:?}", args.database);

    let admin_token = args
        .admin_token
        .or_else(|| std::env::var("KEYMINT_ADMIN_TOKEN").ok());
    if admin_token.is_none() {
        warn!("no admin token configured; /admin/v1/provision is disabled");
    }

    let state = AppState {
        service: LicenseService::new(store, Arc::new(LogNotifier)),
        admin_token,
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port))
        .await
        .with_context(|| format!("failed to bind port {}", args.port))?;

    println!("\n========================================");
    println!("  keymint License Server Running");
    println!("========================================");
    println!("  HTTP Port: {}", args.port);
    println!("  Database:  {}", args.database.display());
    println!("========================================\n");

    info!("HTTP API listening on port {}", args.port);
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
