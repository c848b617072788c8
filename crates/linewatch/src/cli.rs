//! Clap derive structures for the `linewatch` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// linewatch -- live production telemetry from the command line
#[derive(Debug, Parser)]
#[command(
    name = "linewatch",
    version,
    about = "Watch production line telemetry from the command line",
    long_about = "Polls a PostgREST-compatible telemetry store for per-machine\n\
        throughput, rejects, efficiency, OEE, and uptime, and renders a live\n\
        dashboard with threshold-based severity tiers.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Store profile to use
    #[arg(long, short = 'p', env = "LINEWATCH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Store base URL (overrides profile)
    #[arg(long, short = 'u', env = "LINEWATCH_STORE_URL", global = true)]
    pub store_url: Option<String>,

    /// Store API key
    #[arg(long, env = "LINEWATCH_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "LINEWATCH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "LINEWATCH_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "LINEWATCH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one record per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List machines known to the store
    #[command(alias = "ls", alias = "m")]
    Machines,

    /// Fetch one reading for a machine and print it
    Show(MachineArgs),

    /// Live view of a machine, refreshed on every poll
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Manage configuration profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct MachineArgs {
    /// Machine id (defaults to the profile's default_machine)
    pub machine: Option<String>,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub target: MachineArgs,

    /// Poll interval (e.g. "5s", "2s 500ms"); overrides the profile
    #[arg(long, short = 'i', value_parser = humantime::parse_duration)]
    pub interval: Option<Duration>,

    /// Flag data as stale when nothing merged for this long
    #[arg(long, default_value = "15s", value_parser = humantime::parse_duration)]
    pub stale_after: Duration,

    /// Exit after emitting this many readings
    #[arg(long, short = 'n')]
    pub count: Option<u64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or replace a profile
    Init(InitArgs),

    /// Display current configuration
    Show,

    /// Print the config file path
    Path,

    /// Set a value on the active profile
    Set {
        /// Profile key (store_url, api_key_env, default_machine, timeout, ...)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Read an API key from stdin and store it in the system keyring
    SetKey {
        /// Profile to store the key for (defaults to the active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Profile name
    #[arg(long, default_value = "default")]
    pub name: String,

    /// Store base URL
    #[arg(long = "url")]
    pub url: String,

    /// Environment variable holding the API key
    #[arg(long, conflicts_with = "key")]
    pub key_env: Option<String>,

    /// API key, saved in plaintext unless --keyring is given
    #[arg(long)]
    pub key: Option<String>,

    /// Store --key in the system keyring instead of the config file
    #[arg(long, requires = "key")]
    pub keyring: bool,

    /// Machine to use when none is given
    #[arg(long)]
    pub default_machine: Option<String>,

    /// Replace an existing profile of the same name
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
