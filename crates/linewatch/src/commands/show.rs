//! `linewatch show`: a single poll round for one machine.

use linewatch_core::{CoreError, Dashboard, DashboardView, LoadState, TierPolicy};

use crate::cli::{GlobalOpts, MachineArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::report::MachineReport;

pub async fn handle(args: MachineArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let resolved = config::resolve(global)?;
    let machine = resolved.machine(args.machine)?;
    let dashboard = Dashboard::connect(&resolved.dashboard)?;

    let view = dashboard.load_once(machine.clone()).await;
    let report = report_or_error(&view, dashboard.policy(), machine.as_str())?;

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &report,
        |r| r.detail(color),
        MachineReport::plain,
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// A report when the round produced a snapshot, else the error that
/// kept it from doing so.
fn report_or_error(
    view: &DashboardView,
    policy: &TierPolicy,
    machine: &str,
) -> Result<MachineReport, CliError> {
    if view.load_state == LoadState::NotFound {
        return Err(CoreError::not_found(machine).into());
    }
    MachineReport::from_view(view, policy).ok_or_else(|| {
        view.last_error
            .clone()
            .unwrap_or_else(|| CoreError::unavailable("no reading received"))
            .into()
    })
}
