// ── Classifiers ──
//
// Pure functions from readings to presentation tiers.

pub mod status;
pub mod tier;

pub use status::StatusStyle;
pub use tier::{Metric, MetricTiers, Tier, TierPolicy, TierThresholds};
