//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one record per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use linewatch_core::{MachineStatus, Tier};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Paint `text` in the color of a severity tier.
pub fn paint_tier(text: &str, tier: Tier, color: bool) -> String {
    if !color {
        return text.to_owned();
    }
    match tier {
        Tier::Success => text.green().to_string(),
        Tier::Warning => text.yellow().to_string(),
        Tier::Danger => text.red().bold().to_string(),
        Tier::Default => text.to_owned(),
    }
}

/// Status dot plus label, e.g. `● Running`.
pub fn status_badge(status: MachineStatus, color: bool) -> String {
    let style = status.style();
    let dot = match status {
        MachineStatus::Running | MachineStatus::Idle | MachineStatus::Fault => "●",
        MachineStatus::Off => "○",
    };
    if !color {
        return format!("{dot} {}", style.label);
    }
    let dot = match status {
        MachineStatus::Running => dot.green().to_string(),
        MachineStatus::Idle => dot.yellow().to_string(),
        MachineStatus::Off => dot.dimmed().to_string(),
        MachineStatus::Fault => dot.red().to_string(),
    };
    format!("{dot} {}", style.label)
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    Ok(match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false)?,
        OutputFormat::JsonCompact => render_json(data, true)?,
        OutputFormat::Yaml => render_yaml(data)?,
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    })
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses a custom `detail_fn` that returns a pre-formatted
/// string, since detail views don't use `Tabled` derive.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    Ok(match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false)?,
        OutputFormat::JsonCompact => render_json(data, true)?,
        OutputFormat::Yaml => render_yaml(data)?,
        OutputFormat::Plain => id_fn(data),
    })
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
    let _ = stdout.flush();
}

// ── Format-specific renderers ────────────────────────────────────────

pub(crate) fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    Ok(if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    })
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}
