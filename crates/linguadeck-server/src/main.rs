//! Linguadeck Review API Server
//!
//! Serves the spaced-repetition review engine over HTTP: due-card queries,
//! review grading, per-user summaries, and record access. State lives in a
//! local SQLite database; see `linguadeck-core` for the engine itself.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use linguadeck_core::Storage;
use linguadeck_server::routes;
use linguadeck_server::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "linguadeck-server", version, about = "Linguadeck spaced-repetition review API")]
struct Args {
    /// Custom data directory for the review database
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, default_value_t = 8604)]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_target(false)
        .init();

    info!(
        "Linguadeck review API v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let db_path = args.data_dir.map(|dir| dir.join("linguadeck.db"));
    let storage = Storage::new(db_path).context("failed to initialize storage")?;
    info!("Storage initialized");

    let state = AppState::new(Arc::new(storage));
    let router = routes::build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port)
        .parse()
        .context("invalid bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Listening on http://{}", addr);
    axum::serve(listener, router)
        .await
        .context("server error")?;

    Ok(())
}
