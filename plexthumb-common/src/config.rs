//! Configuration loading and resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument / environment variable ([`ConfigOverrides`])
//! 2. TOML config file ([`TomlConfig`])
//! 3. Compiled defaults
//!
//! Only the media-server URL is mandatory. The library service is optional;
//! without it dislikes are recorded but nothing is purged.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_PORT: u16 = 7000;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_FINISH_GRACE_SECS: u64 = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PLAY_THRESHOLD: f64 = 0.0;
pub const DEFAULT_LOG_LEVEL: &str = "debug";
pub const DEFAULT_ROOT_FOLDER_ID: i64 = 1;
pub const DEFAULT_QUALITY_PROFILE_ID: i64 = 2;
pub const DEFAULT_METADATA_PROFILE_ID: i64 = 1;

/// Configuration file as written on disk. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Directory holding liked.json, disliked.json and now_playing.json
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub media_server: MediaServerSection,

    #[serde(default)]
    pub library: LibrarySection,

    #[serde(default)]
    pub timing: TimingSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerSection {
    pub port: Option<u16>,
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaServerSection {
    pub url: Option<String>,
    pub token: Option<String>,
    pub client_filter: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibrarySection {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub root_folder_id: Option<i64>,
    pub quality_profile_id: Option<i64>,
    pub metadata_profile_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimingSection {
    pub poll_interval_secs: Option<u64>,
    pub scan_interval_secs: Option<u64>,
    pub finish_grace_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub play_threshold_fraction: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSection {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,
}

/// Highest-priority values, typically from clap (flags or environment)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub storage_dir: Option<PathBuf>,
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub media_server_url: Option<String>,
    pub media_server_token: Option<String>,
    pub client_filter: Option<String>,
    pub library_url: Option<String>,
    pub library_api_key: Option<String>,
    pub root_folder_id: Option<i64>,
    pub quality_profile_id: Option<i64>,
    pub metadata_profile_id: Option<i64>,
    pub poll_interval_secs: Option<u64>,
    pub scan_interval_secs: Option<u64>,
    pub finish_grace_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub play_threshold_fraction: Option<f64>,
    pub log_level: Option<String>,
}

/// Media server connection settings
#[derive(Debug, Clone, PartialEq)]
pub struct MediaServerConfig {
    pub base_url: String,
    pub token: Option<String>,
    /// Only sessions on a player with this title/product count when set
    pub client_filter: Option<String>,
}

/// Library-management service settings
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryConfig {
    pub base_url: String,
    pub api_key: String,
    /// The three ids below are the defaults Lidarr needs when adding an
    /// artist. The agent only searches and deletes, so they are resolved and
    /// logged at startup but never sent. They keep the settings usable by
    /// tools that add artists from the liked collection.
    pub root_folder_id: i64,
    pub quality_profile_id: i64,
    pub metadata_profile_id: i64,
}

/// Fully resolved agent configuration
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub storage_dir: PathBuf,
    pub bind: String,
    pub port: u16,
    pub media_server: MediaServerConfig,
    pub library: Option<LibraryConfig>,
    pub poll_interval: Duration,
    pub scan_interval: Duration,
    pub finish_grace: Duration,
    pub request_timeout: Duration,
    pub play_threshold: f64,
    pub log_level: String,
}

impl AgentConfig {
    /// Merge overrides, file values and defaults, then validate
    pub fn resolve(overrides: &ConfigOverrides, file: Option<&TomlConfig>) -> Result<Self> {
        let fallback = TomlConfig::default();
        let file = file.unwrap_or(&fallback);

        let base_url = non_empty(overrides.media_server_url.clone())
            .or_else(|| non_empty(file.media_server.url.clone()))
            .ok_or_else(|| Error::Config("media server URL is required (PLEX_URL)".to_string()))?;

        let media_server = MediaServerConfig {
            base_url: trim_base_url(&base_url),
            token: non_empty(overrides.media_server_token.clone())
                .or_else(|| non_empty(file.media_server.token.clone())),
            client_filter: non_empty(overrides.client_filter.clone())
                .or_else(|| non_empty(file.media_server.client_filter.clone())),
        };

        let library_url = non_empty(overrides.library_url.clone())
            .or_else(|| non_empty(file.library.url.clone()));
        let library_key = non_empty(overrides.library_api_key.clone())
            .or_else(|| non_empty(file.library.api_key.clone()));

        let library = match (library_url, library_key) {
            (Some(url), Some(api_key)) => Some(LibraryConfig {
                base_url: trim_base_url(&url),
                api_key,
                root_folder_id: overrides
                    .root_folder_id
                    .or(file.library.root_folder_id)
                    .unwrap_or(DEFAULT_ROOT_FOLDER_ID),
                quality_profile_id: overrides
                    .quality_profile_id
                    .or(file.library.quality_profile_id)
                    .unwrap_or(DEFAULT_QUALITY_PROFILE_ID),
                metadata_profile_id: overrides
                    .metadata_profile_id
                    .or(file.library.metadata_profile_id)
                    .unwrap_or(DEFAULT_METADATA_PROFILE_ID),
            }),
            _ => None,
        };

        let poll_secs = overrides
            .poll_interval_secs
            .or(file.timing.poll_interval_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        let scan_secs = overrides
            .scan_interval_secs
            .or(file.timing.scan_interval_secs)
            .unwrap_or(DEFAULT_SCAN_INTERVAL_SECS);
        if poll_secs == 0 || scan_secs == 0 {
            return Err(Error::Config("poll and scan intervals must be at least 1 second".to_string()));
        }

        let timeout_secs = overrides
            .request_timeout_secs
            .or(file.timing.request_timeout_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
            .max(1);

        let play_threshold = overrides
            .play_threshold_fraction
            .or(file.timing.play_threshold_fraction)
            .unwrap_or(DEFAULT_PLAY_THRESHOLD);
        if !(0.0..=1.0).contains(&play_threshold) {
            return Err(Error::Config(format!(
                "play threshold must be between 0.0 and 1.0, got {}",
                play_threshold
            )));
        }

        Ok(Self {
            storage_dir: overrides
                .storage_dir
                .clone()
                .or_else(|| file.storage_dir.clone())
                .unwrap_or_else(default_storage_dir),
            bind: non_empty(overrides.bind.clone())
                .or_else(|| non_empty(file.server.bind.clone()))
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            port: overrides.port.or(file.server.port).unwrap_or(DEFAULT_PORT),
            media_server,
            library,
            poll_interval: Duration::from_secs(poll_secs),
            scan_interval: Duration::from_secs(scan_secs),
            finish_grace: Duration::from_secs(
                overrides
                    .finish_grace_secs
                    .or(file.timing.finish_grace_secs)
                    .unwrap_or(DEFAULT_FINISH_GRACE_SECS),
            ),
            request_timeout: Duration::from_secs(timeout_secs),
            play_threshold,
            log_level: non_empty(overrides.log_level.clone())
                .or_else(|| non_empty(file.logging.level.clone()))
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }

    /// "host:port" for the status API listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// Create the storage directory if missing
    pub fn ensure_storage_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.storage_dir)?;
        Ok(())
    }
}

/// Load the TOML config file.
///
/// An explicit path must exist. Without one, the platform config location is
/// tried and silently skipped when absent.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<Option<TomlConfig>> {
    let path = match explicit {
        Some(path) => {
            if !path.is_file() {
                return Err(Error::Config(format!("Config file not found: {}", path.display())));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.is_file() => path,
            _ => {
                debug!("No config file found, using flags, environment and defaults");
                return Ok(None);
            }
        },
    };

    let content = std::fs::read_to_string(&path)?;
    let config = toml::from_str::<TomlConfig>(&content)?;
    debug!("Loaded config file {}", path.display());
    Ok(Some(config))
}

/// `<config dir>/plexthumb/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("plexthumb").join("config.toml"))
}

/// OS-dependent default storage directory
pub fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("plexthumb"))
        .unwrap_or_else(|| PathBuf::from("./plexthumb_data"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn trim_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
