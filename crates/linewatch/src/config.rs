//! CLI-side configuration: applies `GlobalOpts` overrides on top of the
//! shared `linewatch-config` profiles.

use std::time::Duration;

use secrecy::SecretString;

use linewatch_config::{Config, Defaults, Profile};
use linewatch_core::{DashboardConfig, MachineId};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use linewatch_config::config_path;

/// Everything a store-bound command needs.
pub struct ResolvedProfile {
    pub dashboard: DashboardConfig,
    pub default_machine: Option<String>,
}

impl ResolvedProfile {
    /// Machine from the command line, else the profile default.
    pub fn machine(&self, arg: Option<String>) -> Result<MachineId, CliError> {
        arg.or_else(|| self.default_machine.clone())
            .map(MachineId::from)
            .ok_or(CliError::NoMachine)
    }
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names for help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    names.sort();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

/// Build the dashboard configuration from the config file, the active
/// profile, and CLI overrides (flag > env > profile).
pub fn resolve(global: &GlobalOpts) -> Result<ResolvedProfile, CliError> {
    let cfg = linewatch_config::load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let Some(stored) = cfg.profiles.get(&profile_name) else {
        // An explicitly requested profile must exist.
        if global.profile.is_some() {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        return resolve_without_profile(global, &cfg.defaults, &profile_name);
    };

    let mut profile = stored.clone();
    apply_overrides(&mut profile, global);

    let dashboard = match global.api_key.as_ref() {
        Some(key) => linewatch_config::build_dashboard_config(
            &profile,
            &profile_name,
            &cfg.defaults,
            SecretString::from(key.clone()),
        )?,
        None => linewatch_config::profile_to_dashboard_config(
            &profile,
            &profile_name,
            &cfg.defaults,
        )?,
    };

    Ok(ResolvedProfile {
        dashboard,
        default_machine: profile.default_machine,
    })
}

/// No profile on disk: build from flags / env vars alone.
fn resolve_without_profile(
    global: &GlobalOpts,
    defaults: &Defaults,
    profile_name: &str,
) -> Result<ResolvedProfile, CliError> {
    let store_url = global.store_url.clone().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let key = global.api_key.clone().ok_or_else(|| CliError::NoCredentials {
        profile: profile_name.into(),
    })?;

    let mut profile = Profile {
        store_url,
        ..Profile::default()
    };
    apply_overrides(&mut profile, global);

    let dashboard = linewatch_config::build_dashboard_config(
        &profile,
        profile_name,
        defaults,
        SecretString::from(key),
    )?;
    Ok(ResolvedProfile {
        dashboard,
        default_machine: None,
    })
}

fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref url) = global.store_url {
        profile.store_url.clone_from(url);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
}

/// Apply a `--interval` override after resolution.
pub fn with_interval(mut resolved: ResolvedProfile, interval: Option<Duration>) -> ResolvedProfile {
    if let Some(interval) = interval {
        resolved.dashboard.poll_interval = interval;
    }
    resolved
}
