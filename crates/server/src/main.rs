// crates/server/src/main.rs
//! Agentdeck server binary.
//!
//! Binds the HTTP server, prints where the dashboard lives, and opens it
//! in a browser. Sessions are re-discovered from the storage tree on
//! every poll; there is nothing to warm up.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use agentdeck_core::Thresholds;
use agentdeck_server::{create_app, AppState};

/// Default port for the server.
const DEFAULT_PORT: u16 = 47621;

#[derive(Debug, Parser)]
#[command(name = "agentdeck", version, about = "Local dashboard for coding-agent sessions")]
struct Cli {
    /// Port to listen on (falls back to AGENTDECK_PORT / PORT).
    #[arg(long)]
    port: Option<u16>,

    /// Storage root containing the session/message/part trees
    /// (falls back to AGENTDECK_STORAGE_DIR, then the local data dir).
    #[arg(long)]
    storage_root: Option<PathBuf>,

    /// Sessions updated within this many minutes count as busy.
    #[arg(long, default_value_t = 5)]
    busy_minutes: i64,

    /// Sessions older than this many minutes count as stale.
    #[arg(long, default_value_t = 60)]
    stale_minutes: i64,

    /// Do not open the dashboard in a browser on startup.
    #[arg(long)]
    no_open: bool,
}

/// Get the server port from CLI, environment, or default.
fn get_port(cli: &Cli) -> u16 {
    cli.port
        .or_else(|| {
            std::env::var("AGENTDECK_PORT")
                .ok()
                .or_else(|| std::env::var("PORT").ok())
                .and_then(|p| p.parse().ok())
        })
        .unwrap_or(DEFAULT_PORT)
}

/// Resolve the storage root: CLI flag, then env, then the platform's
/// local data dir.
fn get_storage_root(cli: &Cli) -> Result<PathBuf> {
    if let Some(root) = &cli.storage_root {
        return Ok(root.clone());
    }
    if let Ok(root) = std::env::var("AGENTDECK_STORAGE_DIR") {
        return Ok(PathBuf::from(root));
    }
    let data = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;
    Ok(data.join("agentdeck").join("storage"))
}

/// Get the static directory for serving frontend files.
///
/// Priority:
/// 1. STATIC_DIR environment variable (explicit override)
/// 2. ./dist directory (if it exists)
/// 3. None (API-only mode)
fn get_static_dir() -> Option<PathBuf> {
    std::env::var("STATIC_DIR")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            let dist = PathBuf::from("dist");
            dist.exists().then_some(dist)
        })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Quiet by default; startup UX uses eprintln.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let storage_root = get_storage_root(&cli)?;
    let thresholds = Thresholds {
        busy_minutes: cli.busy_minutes,
        stale_minutes: cli.stale_minutes,
    };

    let state = AppState::new(storage_root.clone(), thresholds);
    let app = create_app(state, get_static_dir());

    let port = get_port(&cli);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let url = format!("http://localhost:{port}");
    eprintln!("\n\u{1f5c2} agentdeck v{}\n", env!("CARGO_PKG_VERSION"));
    eprintln!("  watching {}", storage_root.display());
    eprintln!("  \u{2192} {url}\n");

    if !cli.no_open {
        if let Err(e) = open::that(&url) {
            tracing::warn!(error = %e, "could not open browser");
        }
    }

    axum::serve(listener, app).await?;

    Ok(())
}
