// linewatch-core: Live polling and view-state layer between linewatch-api
// and dashboard consumers (CLI).

pub mod classify;
pub mod config;
pub mod convert;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod poller;
pub mod source;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use classify::{Metric, MetricTiers, StatusStyle, Tier, TierPolicy, TierThresholds};
pub use config::{DashboardConfig, TlsVerification};
pub use dashboard::Dashboard;
pub use error::CoreError;
pub use poller::{DEFAULT_POLL_INTERVAL, Poller};
pub use source::TelemetrySource;
pub use store::{CycleId, DashboardView, LoadState, RoundOutcome, ViewStore};
pub use stream::ViewStream;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    DistributionSlice, HistoryPoint, Machine, MachineId, MachineStatus, ProductionMetrics,
    Snapshot, TimeMetrics, UptimeCategory, format_hours,
};
