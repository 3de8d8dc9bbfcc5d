//! tariffsight-web - Customs classification SaaS backend
//!
//! Serves the JSON API and SSE stream for the TariffSight web
//! application: authentication, product photo analysis via the external
//! classifier, credit/entitlement gating, subscription lifecycle and
//! the admin surface.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tariffsight_common::events::EventBus;
use tariffsight_web::AppState;

#[derive(Parser, Debug)]
#[command(name = "tariffsight-web", version, about = "TariffSight web service")]
struct Args {
    /// Root data folder (overrides TARIFFSIGHT_ROOT and the config file)
    #[arg(long)]
    root_folder: Option<String>,

    /// Listen address
    #[arg(long, env = "TARIFFSIGHT_LISTEN", default_value = "127.0.0.1:5850")]
    listen: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    info!("Starting tariffsight-web");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Resolve root folder: CLI arg > env var > config file > OS default
    let root_folder = tariffsight_common::config::resolve_root_folder(
        args.root_folder.as_deref(),
        "TARIFFSIGHT_ROOT",
    )?;
    let db_path = tariffsight_common::config::prepare_root_folder(&root_folder)?;
    info!("Database: {}", db_path.display());

    // Initialize database connection pool (schema + plan seeding)
    let db_pool = tariffsight_web::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    // Event bus for SSE broadcasting
    let event_bus = EventBus::new(100);

    let state = AppState::new(db_pool, event_bus);
    let app = tariffsight_web::build_router(state);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    info!("Listening on http://{}", args.listen);
    info!("Health check: http://{}/health", args.listen);

    axum::serve(listener, app).await?;

    Ok(())
}
