//! plexthumb-agent - main entry point
//!
//! Starts three things:
//! - the session tracker loop (polls Plex for active sessions)
//! - the finish watcher loop (schedules post-finish rating harvests)
//! - the read-only status API

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use plexthumb_common::config::{load_toml_config, AgentConfig, ConfigOverrides};
use plexthumb_common::preferences::NOW_PLAYING_FILE;
use plexthumb_common::PreferenceStore;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use plexthumb_agent::decision::RatingActor;
use plexthumb_agent::harvest::{HarvestScheduler, Harvester};
use plexthumb_agent::library::{LibraryPurger, LidarrClient};
use plexthumb_agent::media_server::PlexClient;
use plexthumb_agent::state::SharedState;
use plexthumb_agent::tracker::SessionTracker;
use plexthumb_agent::{build_router, AppState};

/// Command-line arguments for plexthumb-agent
#[derive(Parser, Debug)]
#[command(name = "plexthumb-agent")]
#[command(about = "Records Plex thumbs up/down and purges disliked tracks via Lidarr")]
#[command(version)]
struct Args {
    /// TOML config file (default: <config dir>/plexthumb/config.toml if present)
    #[arg(short, long, env = "PLEXTHUMB_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for liked.json, disliked.json and now_playing.json
    #[arg(long, env = "PLEXTHUMB_CONFIG_DIR")]
    storage_dir: Option<PathBuf>,

    /// Status API port
    #[arg(short, long, env = "PLEXTHUMB_PORT")]
    port: Option<u16>,

    /// Status API bind address
    #[arg(long, env = "PLEXTHUMB_BIND")]
    bind: Option<String>,

    /// Plex server base URL
    #[arg(long, env = "PLEX_URL")]
    plex_url: Option<String>,

    /// Plex auth token
    #[arg(long, env = "PLEX_TOKEN", hide_env_values = true)]
    plex_token: Option<String>,

    /// Only count sessions on this Plex client (e.g. "Plexamp")
    #[arg(long, env = "PLEX_CLIENT_FILTER")]
    plex_client_filter: Option<String>,

    /// Lidarr base URL
    #[arg(long, env = "LIDARR_URL")]
    lidarr_url: Option<String>,

    /// Lidarr API key
    #[arg(long, env = "LIDARR_API_KEY", hide_env_values = true)]
    lidarr_api_key: Option<String>,

    #[arg(long, env = "LIDARR_ROOT_FOLDER_ID")]
    lidarr_root_folder_id: Option<i64>,

    #[arg(long, env = "LIDARR_QUALITY_PROFILE_ID")]
    lidarr_quality_profile_id: Option<i64>,

    #[arg(long, env = "LIDARR_METADATA_PROFILE_ID")]
    lidarr_metadata_profile_id: Option<i64>,

    /// Seconds between session polls
    #[arg(long, env = "POLL_INTERVAL_SECS")]
    poll_interval_secs: Option<u64>,

    /// Seconds between finish-watcher scans
    #[arg(long, env = "SCAN_INTERVAL_SECS")]
    scan_interval_secs: Option<u64>,

    /// Seconds to wait after a track ends before reading its final rating
    #[arg(long, env = "FINISH_GRACE_SECONDS")]
    finish_grace_secs: Option<u64>,

    /// Timeout in seconds for every Plex and Lidarr request
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    request_timeout_secs: Option<u64>,

    /// Minimum listened fraction (0.0-1.0) for a finished track to be harvested
    #[arg(long, env = "PLAY_THRESHOLD_FRACTION")]
    play_threshold_fraction: Option<f64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "PLEXTHUMB_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            storage_dir: self.storage_dir.clone(),
            port: self.port,
            bind: self.bind.clone(),
            media_server_url: self.plex_url.clone(),
            media_server_token: self.plex_token.clone(),
            client_filter: self.plex_client_filter.clone(),
            library_url: self.lidarr_url.clone(),
            library_api_key: self.lidarr_api_key.clone(),
            root_folder_id: self.lidarr_root_folder_id,
            quality_profile_id: self.lidarr_quality_profile_id,
            metadata_profile_id: self.lidarr_metadata_profile_id,
            poll_interval_secs: self.poll_interval_secs,
            scan_interval_secs: self.scan_interval_secs,
            finish_grace_secs: self.finish_grace_secs,
            request_timeout_secs: self.request_timeout_secs,
            play_threshold_fraction: self.play_threshold_fraction,
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let file_config = load_toml_config(args.config.as_deref()).context("Failed to load config file")?;
    let config = AgentConfig::resolve(&args.overrides(), file_config.as_ref())
        .context("Invalid configuration")?;

    // RUST_LOG wins; otherwise our crates at the configured level, HTTP plumbing quieter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!(
                "plexthumb_agent={level},plexthumb_common={level},tower_http={level},hyper=info,reqwest=info",
                level = config.log_level
            )
            .into()
        }))
        .with(tracing_subscriber::fmt::layer().with_thread_names(true))
        .init();

    info!("Starting plexthumb-agent v{}", env!("CARGO_PKG_VERSION"));

    config
        .ensure_storage_dir()
        .context("Failed to create storage directory")?;
    info!("Storage directory: {}", config.storage_dir.display());
    info!("Plex server: {}", config.media_server.base_url);
    if let Some(client) = &config.media_server.client_filter {
        info!("Only counting sessions on client '{}'", client);
    }

    let media = Arc::new(
        PlexClient::new(&config.media_server, config.request_timeout)
            .context("Failed to build Plex client")?,
    );

    let purger = match &config.library {
        Some(library) => {
            info!(
                "Lidarr: {} (root folder {}, quality profile {}, metadata profile {})",
                library.base_url,
                library.root_folder_id,
                library.quality_profile_id,
                library.metadata_profile_id
            );
            let client = LidarrClient::new(library, config.request_timeout)
                .context("Failed to build Lidarr client")?;
            Some(LibraryPurger::new(Arc::new(client)))
        }
        None => {
            warn!("Missing LIDARR_URL or LIDARR_API_KEY; disliked tracks will not be purged");
            None
        }
    };

    let shared = Arc::new(SharedState::new());
    let store = Arc::new(PreferenceStore::new(&config.storage_dir));

    let tracker = SessionTracker::new(media.clone(), Arc::clone(&shared), config.poll_interval);
    tracker.run();

    let harvester = Harvester::new(
        media,
        RatingActor::new(Arc::clone(&store), purger),
        config.finish_grace,
        config.play_threshold,
    );
    HarvestScheduler::new(Arc::clone(&shared), Arc::new(harvester), config.scan_interval).run();
    info!("All background tasks launched");

    let state = AppState::new(shared, store, config.storage_dir.join(NOW_PLAYING_FILE));
    let app = build_router(state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Status API listening on http://{}", addr);
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
