//! Config subcommand handlers.

use std::io::{self, BufRead};
use std::path::PathBuf;

use linewatch_config::{Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, InitArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

const MASK: &str = "********";

// ── Helpers ─────────────────────────────────────────────────────────

fn parse_value<T: std::str::FromStr>(key: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: key.into(),
        reason: format!("must be {expected}"),
    })
}

/// Copy of the config safe to print: plaintext keys are masked.
fn masked(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some(MASK.into());
        }
    }
    cfg
}

/// Apply `key = value` to a profile.
fn set_profile_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "store_url" | "store-url" | "url" => profile.store_url = value,
        "api_key" | "api-key" => profile.api_key = Some(value),
        "api_key_env" | "api-key-env" => profile.api_key_env = Some(value),
        "default_machine" | "default-machine" => profile.default_machine = Some(value),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(PathBuf::from(value)),
        "insecure" => profile.insecure = Some(parse_value(key, &value, "'true' or 'false'")?),
        "timeout" => profile.timeout = Some(parse_value(key, &value, "a number of seconds")?),
        "poll_interval_ms" | "poll-interval-ms" => {
            profile.poll_interval_ms = Some(parse_value(key, &value, "a number of milliseconds")?);
        }
        "thresholds.efficiency_success" => {
            profile.thresholds.efficiency_success = Some(parse_value(key, &value, "a percentage")?);
        }
        "thresholds.efficiency_warning" => {
            profile.thresholds.efficiency_warning = Some(parse_value(key, &value, "a percentage")?);
        }
        "thresholds.oee_success" => {
            profile.thresholds.oee_success = Some(parse_value(key, &value, "a percentage")?);
        }
        "thresholds.oee_warning" => {
            profile.thresholds.oee_warning = Some(parse_value(key, &value, "a percentage")?);
        }
        "thresholds.ppm_warning_above" => {
            profile.thresholds.ppm_warning_above = Some(parse_value(key, &value, "a number")?);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: "unknown config key. Valid keys: store_url, api_key, api_key_env, \
                         default_machine, ca_cert, insecure, timeout, poll_interval_ms, \
                         thresholds.{efficiency_success,efficiency_warning,oee_success,\
                         oee_warning,ppm_warning_above}"
                    .into(),
            });
        }
    }

    profile
        .thresholds
        .to_policy()
        .validate()
        .map_err(|e| CliError::Validation {
            field: "thresholds".into(),
            reason: e.to_string(),
        })
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init(init) => init_profile(init, global),

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = masked(&linewatch_config::load_config()?);
            let out = output::render_single(
                global.output,
                &cfg,
                |c| format!("{c:#?}"),
                |_| "config".into(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = linewatch_config::load_config()?;
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_profile_key(profile, &key, value)?;

            linewatch_config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Set {key} on profile '{profile_name}'");
            }
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = linewatch_config::load_config()?;
            let active = config::active_profile_name(global, &cfg);
            let mut names: Vec<_> = cfg.profiles.keys().collect();
            names.sort();
            for name in names {
                let marker = if *name == active { "*" } else { " " };
                println!("{marker} {name}");
            }
            Ok(())
        }

        // ── Use <name> ──────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = linewatch_config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            linewatch_config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Default profile set to '{name}'");
            }
            Ok(())
        }

        // ── SetKey: read from stdin ─────────────────────────────────
        ConfigCommand::SetKey { profile } => {
            let cfg = linewatch_config::load_config()?;
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));

            let mut key = String::new();
            io::stdin().lock().read_line(&mut key)?;
            let key = key.trim();
            if key.is_empty() {
                return Err(CliError::Validation {
                    field: "api_key".into(),
                    reason: "no key read from stdin".into(),
                });
            }

            linewatch_config::store_api_key(&profile_name, key)?;
            if !global.quiet {
                eprintln!("API key stored in system keyring for profile '{profile_name}'");
            }
            Ok(())
        }
    }
}

// ── Init ────────────────────────────────────────────────────────────

fn init_profile(init: InitArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = linewatch_config::load_config()?;
    if cfg.profiles.contains_key(&init.name) && !init.force {
        return Err(CliError::Validation {
            field: "name".into(),
            reason: format!(
                "profile '{}' already exists; pass --force to replace it",
                init.name
            ),
        });
    }

    let api_key = match (init.key, init.keyring) {
        (Some(key), true) => {
            linewatch_config::store_api_key(&init.name, &key)?;
            if !global.quiet {
                eprintln!("API key stored in system keyring");
            }
            None
        }
        (key, _) => key,
    };

    let profile = Profile {
        store_url: init.url,
        api_key,
        api_key_env: init.key_env,
        default_machine: init.default_machine,
        ..Profile::default()
    };
    // Validates the URL before anything is written.
    linewatch_config::build_dashboard_config(
        &profile,
        &init.name,
        &cfg.defaults,
        secrecy::SecretString::from(String::from("validation")),
    )?;

    cfg.profiles.insert(init.name.clone(), profile);
    if cfg.default_profile.is_none() || cfg.profiles.len() == 1 {
        cfg.default_profile = Some(init.name.clone());
    }
    let path = linewatch_config::save_config(&cfg)?;

    if !global.quiet {
        eprintln!("Configuration written to {}", path.display());
        eprintln!("  Profile: {}", init.name);
        eprintln!("\n  Test it: linewatch machines");
    }
    Ok(())
}
