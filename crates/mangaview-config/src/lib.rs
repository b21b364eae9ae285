//! Shared configuration for the mangaview CLI.
//!
//! TOML profiles, session-cookie resolution (env + keyring + plaintext),
//! and translation to `mangaview_core::ReaderConfig`. The CLI layers its
//! `GlobalOpts` overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mangaview_core::{AssetRewriter, ReaderConfig, Site, TlsVerification};

/// Keyring service name for stored session cookies.
pub const KEYRING_SERVICE: &str = "mangaview";

/// Env var consulted when a profile names no `session_cookie_env`.
pub const SESSION_COOKIE_ENV: &str = "MANGAVIEW_SESSION_COOKIE";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile, falling back to `default_profile` and then
    /// `"default"` when `name` is `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, p)| (k.as_str(), p))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// REST request timeout, seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Longest wait for the next page event, seconds.
    #[serde(default = "default_stream_timeout")]
    pub stream_timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            stream_timeout: default_stream_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_stream_timeout() -> u64 {
    60
}

/// A named server profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Application root (e.g. "http://192.168.1.10:8000/ac/").
    pub server: String,

    /// Default search site.
    #[serde(default)]
    pub site: Site,

    /// Public prefix page paths are served from (relative or absolute).
    pub public_prefix: Option<String>,

    /// Storage prefix the backend reports page paths under.
    pub storage_prefix: Option<String>,

    /// Session cookie (plaintext; prefer keyring or env var).
    pub session_cookie: Option<String>,

    /// Environment variable name containing the session cookie.
    pub session_cookie_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    pub insecure: Option<bool>,

    pub timeout: Option<u64>,

    pub stream_timeout: Option<u64>,

    /// Record opened chapters in the reading history (default on).
    pub record_history: Option<bool>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "mangaview", "mangaview").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("mangaview");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. `MANGAVIEW_` env vars override file values;
/// nested keys use `__` (e.g. `MANGAVIEW_DEFAULTS__TIMEOUT`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("MANGAVIEW_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Session cookie ──────────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/session-cookie"),
    )?)
}

/// Resolve the session cookie: env var, then keyring, then plaintext.
/// `None` when the profile has no cookie anywhere.
pub fn resolve_session_cookie(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Env var named by the profile, else the global one
    let env_name = profile
        .session_cookie_env
        .as_deref()
        .unwrap_or(SESSION_COOKIE_ENV);
    if let Ok(val) = std::env::var(env_name) {
        return Some(SecretString::from(val));
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    profile
        .session_cookie
        .as_ref()
        .map(|c| SecretString::from(c.clone()))
}

/// Store a session cookie in the system keyring.
pub fn store_session_cookie(profile_name: &str, cookie: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(cookie)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Parse and validate the profile's server URL.
pub fn server_url(profile: &Profile) -> Result<url::Url, ConfigError> {
    let url: url::Url = profile.server.parse().map_err(|_| ConfigError::Validation {
        field: "server".into(),
        reason: format!("invalid URL: {}", profile.server),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "server".into(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}

/// Build a `ReaderConfig` for `manga_id` from a profile, no CLI overrides.
pub fn profile_to_reader_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    manga_id: i64,
) -> Result<ReaderConfig, ConfigError> {
    let mut config = ReaderConfig::new(server_url(profile)?, manga_id);

    config.tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.stream_timeout =
        Duration::from_secs(profile.stream_timeout.unwrap_or(defaults.stream_timeout));

    let base = AssetRewriter::default();
    config.assets = AssetRewriter::new(
        profile
            .storage_prefix
            .as_deref()
            .unwrap_or(base.storage_prefix()),
        profile
            .public_prefix
            .as_deref()
            .unwrap_or(base.public_prefix()),
    );
    config.session_cookie = resolve_session_cookie(profile, profile_name);
    config.record_history = profile.record_history.unwrap_or(true);

    Ok(config)
}
