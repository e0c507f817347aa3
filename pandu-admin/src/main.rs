//! pandu-admin - membership administration service
//!
//! Serves the rank-progression, badge, and top-honor award APIs over the
//! shared membership database.

use anyhow::Result;
use clap::Parser;
use pandu_admin::{build_router, AppState};
use pandu_common::config::{prepare_root_folder, resolve_root_folder};
use pandu_common::db::init_database;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "pandu-admin", about = "Membership administration service")]
struct Args {
    /// Root folder holding the database (falls back to PANDU_ROOT_FOLDER,
    /// then the config file, then the platform data directory)
    #[arg(long)]
    root_folder: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PANDU_ADMIN_PORT", default_value_t = 5780)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting Pandu Administration (pandu-admin) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), "PANDU_ROOT_FOLDER");
    let db_path = prepare_root_folder(&root_folder)?;
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path).await?;
    info!("✓ Database ready");

    let state = AppState::new(pool);
    let app = build_router(state);

    let addr = format!("127.0.0.1:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("pandu-admin listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
