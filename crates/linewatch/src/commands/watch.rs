//! `linewatch watch`: live view of one machine, redrawn as rounds merge.

use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use tokio::time::timeout;

use linewatch_core::{Dashboard, DashboardView, LoadState, TierPolicy, ViewStream};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::report::{self, MachineReport};

/// Sub-fetches of one round land as separate changes; wait this long for
/// the rest before drawing.
const SETTLE: Duration = Duration::from_millis(150);

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let resolved = config::with_interval(config::resolve(global)?, args.interval);
    let machine = resolved.machine(args.target.machine)?;
    let interval = resolved.dashboard.poll_interval;
    let dashboard = Dashboard::connect(&resolved.dashboard)?;

    let mut stream = dashboard.subscribe();
    dashboard.select(machine);
    tracing::info!(?interval, "watching");

    let frame = Frame {
        format: global.output,
        color: output::should_color(global.color),
        clear: global.output == OutputFormat::Table && io::stdout().is_terminal(),
        quiet: global.quiet,
        interval,
        stale_after: args.stale_after,
    };

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut emitted = 0u64;
    let result = loop {
        let view = tokio::select! {
            _ = &mut ctrl_c => break Ok(()),
            next = stream.changed() => match next {
                Some(view) => view,
                None => break Ok(()),
            },
        };
        let view = settle(&mut stream, view).await;

        match frame.draw(&view, dashboard.policy()) {
            Ok(true) => emitted += 1,
            Ok(false) => {}
            Err(e) => break Err(e),
        }
        if args.count.is_some_and(|n| emitted >= n) {
            break Ok(());
        }
    };

    dashboard.stop();
    result
}

/// Drain changes that arrive within the settle window.
async fn settle(stream: &mut ViewStream, mut view: DashboardView) -> DashboardView {
    while let Ok(Some(next)) = timeout(SETTLE, stream.changed()).await {
        view = next;
    }
    view
}

struct Frame {
    format: OutputFormat,
    color: bool,
    clear: bool,
    quiet: bool,
    interval: Duration,
    stale_after: Duration,
}

impl Frame {
    /// Draw one frame. Returns whether a reading was emitted.
    fn draw(&self, view: &DashboardView, policy: &TierPolicy) -> Result<bool, CliError> {
        let report = MachineReport::from_view(view, policy);

        let text = match (self.format, report) {
            (OutputFormat::Table, Some(r)) => format!(
                "{}\n{}",
                r.detail(self.color),
                report::footer(view, self.interval, self.stale_after)
            ),
            (OutputFormat::Table, None) => format!(
                "{}\n{}",
                placeholder(view),
                report::footer(view, self.interval, self.stale_after)
            ),
            (format, Some(r)) => {
                output::render_single(format, &r, |r| r.detail(self.color), MachineReport::plain)?
            }
            // Structured formats only carry readings.
            (_, None) => return Ok(false),
        };
        let reading = view.snapshot.is_some();

        if self.quiet {
            return Ok(reading);
        }
        let mut stdout = io::stdout().lock();
        if self.clear {
            let _ = write!(stdout, "{CLEAR_SCREEN}");
        }
        let _ = writeln!(stdout, "{text}");
        let _ = stdout.flush();
        Ok(reading)
    }
}

fn placeholder(view: &DashboardView) -> String {
    let machine = view
        .selection
        .as_ref()
        .map_or_else(|| "machine".to_owned(), ToString::to_string);
    match view.load_state {
        LoadState::NotFound => format!("Machine '{machine}' not found; still polling"),
        LoadState::Idle => "No machine selected".to_owned(),
        LoadState::Loading | LoadState::Ready => format!("Loading {machine}..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_names_missing_machine() {
        let mut view = DashboardView::default();
        view.selection = Some("press-4".into());
        view.load_state = LoadState::NotFound;
        assert_eq!(placeholder(&view), "Machine 'press-4' not found; still polling");
    }

    #[test]
    fn structured_formats_skip_views_without_reading() {
        let frame = Frame {
            format: OutputFormat::Json,
            color: false,
            clear: false,
            quiet: true,
            interval: Duration::from_secs(5),
            stale_after: Duration::from_secs(15),
        };
        let mut view = DashboardView::default();
        view.load_state = LoadState::Loading;
        assert!(matches!(frame.draw(&view, &TierPolicy::default()), Ok(false)));
    }
}
