//! Shared configuration for linewatch consumers.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `linewatch_core::DashboardConfig`. The CLI adds
//! `GlobalOpts`-aware overrides on top.

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

use linewatch_core::{DashboardConfig, TierPolicy, TierThresholds, TlsVerification};

/// Keyring service under which API keys are stored.
pub const KEYRING_SERVICE: &str = "linewatch";

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "LINEWATCH_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API key configured for profile '{profile}'")]
    NoCredentials { profile: String },

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
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named store profiles.
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

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            poll_interval_ms: default_poll_interval_ms(),
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
    10
}
fn default_poll_interval_ms() -> u64 {
    5000
}

/// A named store profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Store base URL (e.g., "https://xyz.supabase.co").
    pub store_url: String,

    /// API key in plaintext. Prefer the keyring or an env var.
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Accept invalid TLS certificates.
    pub insecure: Option<bool>,

    /// Override request timeout (seconds).
    pub timeout: Option<u64>,

    /// Override poll interval (milliseconds).
    pub poll_interval_ms: Option<u64>,

    /// Machine to watch when none is given on the command line.
    pub default_machine: Option<String>,

    /// Tier threshold overrides.
    #[serde(default, skip_serializing_if = "Thresholds::is_empty")]
    pub thresholds: Thresholds,
}

/// Optional overrides for individual tier bands. Unset values keep the
/// plant defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct Thresholds {
    pub efficiency_success: Option<f64>,
    pub efficiency_warning: Option<f64>,
    pub oee_success: Option<f64>,
    pub oee_warning: Option<f64>,
    pub ppm_warning_above: Option<f64>,
}

impl Thresholds {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay these overrides on the default policy.
    pub fn to_policy(&self) -> TierPolicy {
        let base = TierPolicy::default();
        TierPolicy {
            efficiency: TierThresholds {
                success_at: self.efficiency_success.unwrap_or(base.efficiency.success_at),
                warning_at: self.efficiency_warning.unwrap_or(base.efficiency.warning_at),
            },
            oee: TierThresholds {
                success_at: self.oee_success.unwrap_or(base.oee.success_at),
                warning_at: self.oee_warning.unwrap_or(base.oee.warning_at),
            },
            ppm_warning_above: self.ppm_warning_above.unwrap_or(base.ppm_warning_above),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `LINEWATCH_CONFIG`, then XDG / platform
/// conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "linewatch", "linewatch").map_or_else(
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
    p.push("linewatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// A missing file is not an error; `LINEWATCH_`-prefixed variables with
/// `__` as the nesting separator override file values
/// (`LINEWATCH_DEFAULTS__OUTPUT=json`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("LINEWATCH_").split("__"));

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

// ── Credential resolution (without CLI flags) ───────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/api-key"))
}

/// Resolve an API key from the credential chain (no CLI flag step).
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's api_key_env → env var lookup
    if let Some(val) = profile
        .api_key_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
    {
        return Ok(SecretString::from(val));
    }

    // 2. System keyring
    if let Ok(secret) = keyring_entry(profile_name).and_then(|entry| entry.get_password()) {
        return Ok(SecretString::from(secret));
    }

    // 3. Plaintext in config
    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store an API key for `profile_name` in the system keyring.
pub fn store_api_key(profile_name: &str, key: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(key)?;
    Ok(())
}

/// Build a `DashboardConfig` from a profile, without CLI flag overrides.
pub fn profile_to_dashboard_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<DashboardConfig, ConfigError> {
    let api_key = resolve_api_key(profile, profile_name)?;
    build_dashboard_config(profile, profile_name, defaults, api_key)
}

/// Build a `DashboardConfig` from a profile with an already-resolved key.
pub fn build_dashboard_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    api_key: SecretString,
) -> Result<DashboardConfig, ConfigError> {
    let store_url: url::Url = profile
        .store_url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "store_url".into(),
            reason: format!("invalid URL: {}", profile.store_url),
        })?;

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let config = DashboardConfig {
        store_url,
        api_key,
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        poll_interval: Duration::from_millis(
            profile.poll_interval_ms.unwrap_or(defaults.poll_interval_ms),
        ),
        thresholds: profile.thresholds.to_policy(),
    };

    config.validate().map_err(|e| ConfigError::Validation {
        field: format!("profile '{profile_name}'"),
        reason: e.to_string(),
    })?;

    Ok(config)
}
