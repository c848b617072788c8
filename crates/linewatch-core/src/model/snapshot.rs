// ── Snapshot domain types ──
//
// The current reading for one machine: counters, rates, and the uptime
// breakdown over the active shift.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::history::DistributionSlice;
use super::machine::Machine;

/// Current reading for one machine at fetch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub machine: Machine,
    pub production: ProductionMetrics,
    pub time: TimeMetrics,
}

/// Cumulative shift counters and derived rates.
///
/// `accepted_pieces` is reported by the store on its own and is not
/// reconciled against `total_produced - total_rejects`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductionMetrics {
    pub total_produced: i64,
    pub total_rejects: i64,
    pub accepted_pieces: i64,
    /// Parts-per-million rejection rate.
    pub ppm_rejection: f64,
    /// Percentage, nominally 0..=100.
    pub efficiency: f64,
    /// Overall equipment effectiveness, percentage.
    pub oee: f64,
}

/// Uptime breakdown in hours plus the shift window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeMetrics {
    pub on_time: f64,
    pub off_time: f64,
    pub idle_time: f64,
    pub fault_time: f64,
    pub shift_start: NaiveTime,
    pub shift_end: NaiveTime,
}

/// Named bucket of the uptime breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum UptimeCategory {
    Running,
    Idle,
    Off,
    Fault,
}

impl UptimeCategory {
    /// Map a distribution slice name to its category. Unknown names yield `None`.
    pub fn from_slice_name(name: &str) -> Option<Self> {
        name.trim().parse().ok()
    }

    /// Slice order of the uptime chart.
    pub const CHART_ORDER: [Self; 4] = [Self::Running, Self::Off, Self::Idle, Self::Fault];
}

impl TimeMetrics {
    /// Hours recorded for one uptime bucket.
    pub fn hours(&self, category: UptimeCategory) -> f64 {
        match category {
            UptimeCategory::Running => self.on_time,
            UptimeCategory::Idle => self.idle_time,
            UptimeCategory::Off => self.off_time,
            UptimeCategory::Fault => self.fault_time,
        }
    }

    pub fn total_hours(&self) -> f64 {
        self.on_time + self.off_time + self.idle_time + self.fault_time
    }

    /// Share of the recorded total spent in `category`, as a percentage.
    ///
    /// Zero when nothing has been recorded yet.
    pub fn share_percent(&self, category: UptimeCategory) -> f64 {
        let total = self.total_hours();
        if total > 0.0 {
            self.hours(category) / total * 100.0
        } else {
            0.0
        }
    }

    /// Distribution computed from the breakdown, rounded to whole percent.
    ///
    /// Used when the store has no distribution rows for a machine.
    pub fn derived_distribution(&self) -> Vec<DistributionSlice> {
        if self.total_hours() <= 0.0 {
            return Vec::new();
        }
        UptimeCategory::CHART_ORDER
            .into_iter()
            .map(|category| DistributionSlice {
                name: category.to_string(),
                value: self.share_percent(category).round(),
            })
            .collect()
    }
}

/// Format fractional hours as `"6h 30m"`.
pub fn format_hours(hours: f64) -> String {
    if !hours.is_finite() || hours <= 0.0 {
        return "0h 0m".into();
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total_minutes = (hours * 60.0).round() as u64;
    format!("{}h {}m", total_minutes / 60, total_minutes % 60)
}
