//! Shared configuration for Taskboard tools.
//!
//! TOML settings merged with `TASKBOARD_*` environment variables, the
//! persisted bearer-token stores, and translation to
//! `taskboard_core::ClientConfig`.

mod tokens;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use taskboard_api::{MemoryTokenStore, TokenStore};
use taskboard_core::{ClientConfig, TlsVerification};

pub use tokens::{FileTokenStore, KEYRING_SERVICE, KeyringTokenStore};

/// Prefix of every environment variable read by [`load_config`].
pub const ENV_PREFIX: &str = "TASKBOARD_";

/// Accepted values of the `output` setting.
pub const OUTPUT_FORMATS: &[&str] = &["table", "json", "json-compact", "yaml", "plain"];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("token storage unavailable: {0}")]
    TokenStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Where the bearer token is persisted between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    /// JSON file under the platform data directory.
    #[default]
    File,
    /// Operating-system keyring.
    Keyring,
}

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// API base URL, including any path prefix (e.g. `/api`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Default output format, one of [`OUTPUT_FORMATS`].
    #[serde(default = "default_output")]
    pub output: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Skip TLS verification (development backends only).
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default)]
    pub token_storage: TokenStorage,

    /// Override the token file location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,

    /// Bearer token to use instead of the stored one. Never persisted.
    #[serde(default, skip_serializing)]
    pub token: Option<SecretString>,

    /// Quiet window before search input is sent, in milliseconds.
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// How long a form reports "recently successful", in milliseconds.
    #[serde(default = "default_recently_successful_ms")]
    pub recently_successful_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            output: default_output(),
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
            token_storage: TokenStorage::default(),
            token_file: None,
            token: None,
            search_debounce_ms: default_search_debounce_ms(),
            recently_successful_ms: default_recently_successful_ms(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000/api".into()
}
fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_search_debounce_ms() -> u64 {
    300
}
fn default_recently_successful_ms() -> u64 {
    2000
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "taskboard", "taskboard")
}

fn dirs_fallback(kind: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(kind);
    p.push("taskboard");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default location of the persisted token file.
pub fn token_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".local/share").join("session.json"),
        |dirs| dirs.data_dir().join("session.json"),
    )
}

// ── Loading & saving ────────────────────────────────────────────────

/// Load the config from the canonical path and the environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the config from `path`, then the environment. A missing file is
/// not an error; defaults fill every field it would have set.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX))
        .extract()?;
    config.validate()?;
    Ok(config)
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(cfg)?)?;
    Ok(())
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    /// Check values a loaded or edited config must satisfy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parsed_base_url()?;
        if !OUTPUT_FORMATS.contains(&self.output.as_str()) {
            return Err(ConfigError::Validation {
                field: "output".into(),
                reason: format!(
                    "expected one of {}, got '{}'",
                    OUTPUT_FORMATS.join(", "),
                    self.output
                ),
            });
        }
        if self.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        Ok(())
    }

    fn parsed_base_url(&self) -> Result<url::Url, ConfigError> {
        let url: url::Url = self
            .base_url
            .parse()
            .map_err(|e| ConfigError::Validation {
                field: "base_url".into(),
                reason: format!("invalid URL '{}': {e}", self.base_url),
            })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation {
                field: "base_url".into(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        Ok(url)
    }

    /// Runtime client settings for the core.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let tls = if self.insecure {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsVerification::CustomCa(ca_path.clone())
        } else {
            TlsVerification::SystemDefaults
        };

        Ok(ClientConfig {
            tls,
            timeout: Duration::from_secs(self.timeout),
            recently_successful_timeout: Duration::from_millis(self.recently_successful_ms),
            search_debounce: Duration::from_millis(self.search_debounce_ms),
            ..ClientConfig::new(self.parsed_base_url()?)
        })
    }

    /// Open the token store this config selects.
    ///
    /// An explicit `token` wins and is held in memory only.
    pub fn token_store(&self) -> Result<Arc<dyn TokenStore>, ConfigError> {
        if let Some(ref token) = self.token {
            return Ok(Arc::new(MemoryTokenStore::with_token(token.expose_secret())));
        }
        match self.token_storage {
            TokenStorage::File => Ok(Arc::new(FileTokenStore::new(
                self.token_file.clone().unwrap_or_else(token_path),
            ))),
            TokenStorage::Keyring => Ok(Arc::new(KeyringTokenStore::new()?)),
        }
    }
}
