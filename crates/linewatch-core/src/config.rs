// ── Runtime dashboard configuration ──
//
// These types describe *where* the telemetry lives and how often to poll
// it. They carry credential data and tuning, but never touch disk: the
// CLI builds a `DashboardConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::classify::TierPolicy;
use crate::error::CoreError;
use crate::poller::DEFAULT_POLL_INTERVAL;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs on a plant-floor gateway).
    DangerAcceptInvalid,
}

/// Configuration for one dashboard session against one store.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Store base URL (e.g., `https://xyz.supabase.co`).
    pub store_url: Url,
    /// Public API key sent as `apikey` and bearer token.
    pub api_key: SecretString,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Interval between poll rounds.
    pub poll_interval: Duration,
    pub thresholds: TierPolicy,
}

impl DashboardConfig {
    pub fn new(store_url: Url, api_key: SecretString) -> Self {
        Self {
            store_url,
            api_key,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(10),
            poll_interval: DEFAULT_POLL_INTERVAL,
            thresholds: TierPolicy::default(),
        }
    }

    /// Reject settings the poller or classifiers cannot work with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.poll_interval.is_zero() {
            return Err(CoreError::Config {
                message: "poll interval must be greater than zero".into(),
            });
        }
        if self.timeout.is_zero() {
            return Err(CoreError::Config {
                message: "request timeout must be greater than zero".into(),
            });
        }
        self.thresholds.validate()
    }

    pub(crate) fn transport(&self) -> linewatch_api::TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => linewatch_api::TlsMode::System,
            TlsVerification::CustomCa(path) => linewatch_api::TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => linewatch_api::TlsMode::DangerAcceptInvalid,
        };
        linewatch_api::TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}
