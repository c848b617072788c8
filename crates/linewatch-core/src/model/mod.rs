// ── Domain model ──
//
// Canonical types the dashboard works with. Store rows are converted into
// these at the source boundary (see `convert`), so nothing past that point
// handles raw status strings or clock text.

pub mod history;
pub mod machine;
pub mod snapshot;

pub use history::{DistributionSlice, HistoryPoint};
pub use machine::{Machine, MachineId, MachineStatus};
pub use snapshot::{ProductionMetrics, Snapshot, TimeMetrics, UptimeCategory, format_hours};
