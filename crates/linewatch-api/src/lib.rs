// linewatch-api: Async Rust client for the PostgREST store behind the dashboard.
//
// Read-only: the machine directory, per-machine snapshot rows, hourly
// production history, and uptime distribution shares.

pub mod client;
pub mod error;
pub mod machines;
pub mod models;
pub mod telemetry;
pub mod transport;

pub use client::StoreClient;
pub use error::Error;
pub use models::{DistributionRow, HistoryRow, MachineRow, MachineSummaryRow};
pub use transport::{TlsMode, TransportConfig};
