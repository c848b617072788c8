// ── History & distribution types ──

use serde::{Deserialize, Serialize};

use super::snapshot::UptimeCategory;

/// One hour of production for the rolling history chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// Display label, e.g. `"06:00"`.
    pub label: String,
    pub hour: i32,
    pub produced: i64,
    pub rejects: i64,
    pub efficiency: f64,
}

/// Named share of total uptime. Values are percentages; their sum is
/// whatever the store reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSlice {
    pub name: String,
    pub value: f64,
}

impl DistributionSlice {
    pub fn category(&self) -> Option<UptimeCategory> {
        UptimeCategory::from_slice_name(&self.name)
    }
}
