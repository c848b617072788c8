//! `linewatch machines`: list the machines the store knows about.

use std::sync::Arc;

use tabled::Tabled;

use linewatch_core::{Dashboard, Machine};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct MachineRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let resolved = config::resolve(global)?;
    let dashboard = Dashboard::connect(&resolved.dashboard)?;
    let machines = dashboard.refresh_machines().await?;

    let color = output::should_color(global.color);
    let list: Vec<&Machine> = machines.iter().map(Arc::as_ref).collect();
    let out = output::render_list(
        global.output,
        &list,
        |m| MachineRow {
            id: m.id.to_string(),
            name: m.name.clone(),
            status: output::status_badge(m.status, color),
        },
        |m| m.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
