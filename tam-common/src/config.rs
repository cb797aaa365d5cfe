//! Bootstrap configuration loading
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority, applied by the binary)
//! 2. Environment variable (applied by the binary through clap)
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error: a warning is logged and compiled
//! defaults are used. A config file that exists but cannot be parsed is.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "TAM_CONFIG";

/// Directory name used below the platform config directory
const APP_DIR_NAME: &str = "tonie-audio-match";

pub const DEFAULT_TONIE_API_URL: &str = "https://api.tonie.cloud/v2";
pub const DEFAULT_TONIE_TOKEN_URL: &str =
    "https://login.tonies.com/auth/realms/tonies/protocol/openid-connect/token";
pub const DEFAULT_TONIE_CLIENT_ID: &str = "my-tonies";

/// Bootstrap configuration loaded from TOML
///
/// Cannot change while the server runs; restart to pick up edits.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Remove the local backing file after a track is deleted from a tonie
    #[serde(default = "default_true")]
    pub prune_local_on_delete: bool,

    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub cloud: CloudConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Local media library folders
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryConfig {
    /// One sub-folder per audiobook
    #[serde(default = "default_audiobooks_dir")]
    pub audiobooks_dir: PathBuf,

    /// Loose audio files, one song each
    #[serde(default = "default_songs_dir")]
    pub songs_dir: PathBuf,
}

/// Tonie cloud connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct CloudConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_token_url")]
    pub token_url: String,

    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Account user name (usually overridden by TAM_TONIE_USERNAME)
    #[serde(default)]
    pub username: Option<String>,

    /// Account password (usually overridden by TAM_TONIE_PASSWORD)
    #[serde(default)]
    pub password: Option<String>,

    /// Per-request timeout for remote calls
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    DEFAULT_TONIE_API_URL.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TONIE_TOKEN_URL.to_string()
}

fn default_client_id() -> String {
    DEFAULT_TONIE_CLIENT_ID.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Platform music folder, falling back to the working directory
fn default_media_root() -> PathBuf {
    dirs::audio_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Music")))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_audiobooks_dir() -> PathBuf {
    default_media_root().join("audiobooks")
}

fn default_songs_dir() -> PathBuf {
    default_media_root().join("songs")
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            audiobooks_dir: default_audiobooks_dir(),
            songs_dir: default_songs_dir(),
        }
    }
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_url: default_token_url(),
            client_id: default_client_id(),
            username: None,
            password: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            prune_local_on_delete: true,
            library: LibraryConfig::default(),
            cloud: CloudConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from `path`, or compiled defaults when no file exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            warn!("No config file found, using compiled defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            warn!("Config file {} does not exist, using compiled defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Both cloud credentials, if configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.cloud.username, &self.cloud.password) {
            (Some(user), Some(pass)) if !user.is_empty() => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }
}

/// Locate the config file following the priority order:
/// 1. Command-line argument
/// 2. `TAM_CONFIG` environment variable
/// 3. User config dir (`~/.config/tonie-audio-match/config.toml`)
/// 4. System config (`/etc/tonie-audio-match/config.toml`, Linux only)
///
/// Returns `None` when nothing applies. Explicit paths (1 and 2) are
/// returned even if missing so the loader can warn about them.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(APP_DIR_NAME).join("config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5000);
        assert!(config.prune_local_on_delete);
        assert_eq!(config.cloud.base_url, DEFAULT_TONIE_API_URL);
        assert_eq!(config.cloud.client_id, "my-tonies");
        assert_eq!(config.logging.level, "info");
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
            port = 8080

            [cloud]
            username = "parent@example.com"
            password = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.cloud.timeout_secs, 30);
        assert_eq!(config.credentials(), Some(("parent@example.com", "secret")));
    }

    #[test]
    fn test_empty_username_is_not_a_credential() {
        let config = TomlConfig::from_toml_str(
            r#"
            [cloud]
            username = ""
            password = "secret"
            "#,
        )
        .unwrap();
        assert!(config.credentials().is_none());
    }
}
