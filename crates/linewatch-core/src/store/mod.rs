// ── Dashboard state ──
//
// `ViewStore` owns the merged view for the selected machine;
// `MachineDirectory` caches the selectable machines.

mod collection;
pub mod view;

pub(crate) use collection::MachineDirectory;
pub use view::{CycleId, DashboardView, LoadState, RoundOutcome, ViewStore};
