//! tam-server - Tonie audio match HTTP service
//!
//! Matches a local audiobook and song library against the creative tonies of
//! a Tonie cloud account: lists both sides, uploads albums, removes chapters
//! and prunes local files.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tam_common::config::{resolve_config_path, TomlConfig};
use tam_server::cloud::TonieCloudClient;
use tam_server::services::{DirectoryLibrary, Reconciler};
use tam_server::{build_router, logging, AppState};
use tokio::signal;
use tracing::{info, warn};

/// Command-line arguments for tam-server
#[derive(Parser, Debug)]
#[command(name = "tam-server")]
#[command(about = "Match a local audio library against creative tonies")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "TAM_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind to
    #[arg(long, env = "TAM_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "TAM_PORT")]
    port: Option<u16>,

    /// Tonie cloud account user name
    #[arg(long, env = "TAM_TONIE_USERNAME")]
    tonie_username: Option<String>,

    /// Tonie cloud account password
    #[arg(long, env = "TAM_TONIE_PASSWORD", hide_env_values = true)]
    tonie_password: Option<String>,

    /// Folder holding one sub-folder per audiobook
    #[arg(long, env = "TAM_AUDIOBOOKS_DIR")]
    audiobooks_dir: Option<PathBuf>,

    /// Folder holding loose song files
    #[arg(long, env = "TAM_SONGS_DIR")]
    songs_dir: Option<PathBuf>,
}

impl Args {
    /// Layer command-line and environment values over the file config
    fn apply(self, config: &mut TomlConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(username) = self.tonie_username {
            config.cloud.username = Some(username);
        }
        if let Some(password) = self.tonie_password {
            config.cloud.password = Some(password);
        }
        if let Some(dir) = self.audiobooks_dir {
            config.library.audiobooks_dir = dir;
        }
        if let Some(dir) = self.songs_dir {
            config.library.songs_dir = dir;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_handle = logging::init_tracing();

    info!(
        "Starting tam-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config_path = resolve_config_path(args.config.as_deref());
    let mut config =
        TomlConfig::load(config_path.as_deref()).context("Failed to load configuration")?;
    logging::apply_configured_level(&log_handle, &config.logging.level);
    args.apply(&mut config);

    if config.credentials().is_none() {
        warn!("No Tonie cloud credentials configured; remote calls will fail");
    }
    info!("Audiobooks folder: {}", config.library.audiobooks_dir.display());
    info!("Songs folder: {}", config.library.songs_dir.display());

    let remote = TonieCloudClient::new(&config.cloud).context("Failed to build cloud client")?;
    let library = DirectoryLibrary::new(
        config.library.audiobooks_dir.clone(),
        config.library.songs_dir.clone(),
    );
    let reconciler = Reconciler::new(Arc::new(remote), Arc::new(library))
        .with_local_pruning(config.prune_local_on_delete);

    let app = build_router(AppState::new(reconciler));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("tam-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
