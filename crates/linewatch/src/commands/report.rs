//! Machine report: the serializable and table forms of a dashboard view,
//! shared by `show` and `watch`.

use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;
use tabled::Tabled;

use linewatch_core::{
    DashboardView, DistributionSlice, HistoryPoint, Machine, MetricTiers, ProductionMetrics,
    Tier, TierPolicy, TimeMetrics, UptimeCategory, format_hours,
};

use crate::output::{paint_tier, render_table, status_badge};

// ── Serializable report ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct MachineReport {
    pub machine: Machine,
    pub status_label: &'static str,
    pub load_state: String,
    pub production: ProductionMetrics,
    pub tiers: MetricTiers,
    pub time: TimeMetrics,
    pub history: Vec<HistoryPoint>,
    pub distribution: Vec<DistributionSlice>,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl MachineReport {
    /// Build a report from a view that holds a snapshot.
    pub fn from_view(view: &DashboardView, policy: &TierPolicy) -> Option<Self> {
        let snap = view.snapshot.as_ref()?;
        Some(Self {
            machine: snap.machine.clone(),
            status_label: snap.machine.status.style().label,
            load_state: view.load_state.to_string(),
            production: snap.production,
            tiers: policy.evaluate(&snap.production),
            time: snap.time,
            history: view.history.clone(),
            distribution: view.distribution_or_derived(),
            last_updated: view.last_updated,
            last_error: view.last_error.as_ref().map(ToString::to_string),
        })
    }

    /// One scripting-friendly line.
    pub fn plain(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{:.1}\t{:.1}\t{:.0}",
            self.machine.id,
            self.machine.status,
            self.production.total_produced,
            self.production.total_rejects,
            self.production.efficiency,
            self.production.oee,
            self.production.ppm_rejection,
        )
    }

    /// Full table rendering.
    pub fn detail(&self, color: bool) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} ({})  {}",
            self.machine.name,
            self.machine.id,
            status_badge(self.machine.status, color)
        );
        let _ = writeln!(
            out,
            "Shift {} - {}",
            clock(self.time.shift_start),
            clock(self.time.shift_end)
        );
        out.push('\n');
        out.push_str(&render_table(&self.kpi_rows(color)));
        out.push('\n');
        out.push_str(&render_table(&self.uptime_rows()));

        if !self.history.is_empty() {
            out.push('\n');
            let rows: Vec<HistoryRow> = self.history.iter().map(HistoryRow::from).collect();
            out.push_str(&render_table(&rows));
        }
        out
    }

    fn kpi_rows(&self, color: bool) -> Vec<KpiRow> {
        let p = &self.production;
        vec![
            KpiRow::plain("Produced", p.total_produced.to_string()),
            KpiRow::plain("Rejects", p.total_rejects.to_string()),
            KpiRow::plain("Accepted", p.accepted_pieces.to_string()),
            KpiRow {
                metric: "PPM rejection",
                value: paint_tier(&format!("{:.0}", p.ppm_rejection), self.tiers.ppm, color),
                tier: tier_label(self.tiers.ppm),
            },
            KpiRow {
                metric: "Efficiency",
                value: paint_tier(&format!("{:.1}%", p.efficiency), self.tiers.efficiency, color),
                tier: tier_label(self.tiers.efficiency),
            },
            KpiRow {
                metric: "OEE",
                value: paint_tier(&format!("{:.1}%", p.oee), self.tiers.oee, color),
                tier: tier_label(self.tiers.oee),
            },
        ]
    }

    fn uptime_rows(&self) -> Vec<UptimeRow> {
        UptimeCategory::CHART_ORDER
            .into_iter()
            .map(|category| {
                let share = self
                    .distribution
                    .iter()
                    .find(|s| s.category() == Some(category))
                    .map_or(0.0, |s| s.value);
                UptimeRow {
                    state: category.to_string(),
                    hours: format_hours(self.time.hours(category)),
                    share: format!("{share:.0}%"),
                }
            })
            .collect()
    }
}

/// Footer for live views: freshness, cadence, last error.
pub fn footer(view: &DashboardView, interval: Duration, stale_after: Duration) -> String {
    let mut out = String::new();
    match view.last_updated {
        Some(at) => {
            let age = (Utc::now() - at).to_std().unwrap_or_default();
            let _ = write!(
                out,
                "Updated {} ago",
                humantime::format_duration(Duration::from_secs(age.as_secs()))
            );
        }
        None => out.push_str("Waiting for first reading"),
    }
    let _ = write!(
        out,
        " · polling every {} · Ctrl-C to quit",
        humantime::format_duration(interval)
    );
    if view.last_updated.is_some() && view.is_stale(stale_after) {
        out.push_str("\n! Data may be stale");
    }
    if let Some(ref err) = view.last_error {
        let _ = write!(out, "\n! Last error: {err}");
    }
    out
}

fn tier_label(tier: Tier) -> String {
    match tier {
        Tier::Default => String::new(),
        other => other.to_string(),
    }
}

fn clock(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct KpiRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Tier")]
    tier: String,
}

impl KpiRow {
    fn plain(metric: &'static str, value: String) -> Self {
        Self {
            metric,
            value,
            tier: String::new(),
        }
    }
}

#[derive(Tabled)]
struct UptimeRow {
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Time")]
    hours: String,
    #[tabled(rename = "Share")]
    share: String,
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Hour")]
    label: String,
    #[tabled(rename = "Produced")]
    produced: i64,
    #[tabled(rename = "Rejects")]
    rejects: i64,
    #[tabled(rename = "Efficiency")]
    efficiency: String,
}

impl From<&HistoryPoint> for HistoryRow {
    fn from(p: &HistoryPoint) -> Self {
        Self {
            label: p.label.clone(),
            produced: p.produced,
            rejects: p.rejects,
            efficiency: format!("{:.1}%", p.efficiency),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linewatch_core::{LoadState, MachineStatus, Snapshot};

    fn ready_view() -> DashboardView {
        let mut view = DashboardView::default();
        view.load_state = LoadState::Ready;
        view.snapshot = Some(Snapshot {
            machine: Machine {
                id: "machine-1".into(),
                name: "CNC Machine 01".into(),
                status: MachineStatus::Fault,
            },
            production: ProductionMetrics {
                total_produced: 4582,
                total_rejects: 47,
                accepted_pieces: 4535,
                ppm_rejection: 60_000.0,
                efficiency: 92.3,
                oee: 61.0,
            },
            time: TimeMetrics {
                on_time: 6.0,
                off_time: 1.0,
                idle_time: 0.5,
                fault_time: 0.5,
                shift_start: NaiveTime::from_hms_opt(6, 0, 0).unwrap_or_default(),
                shift_end: NaiveTime::from_hms_opt(14, 0, 0).unwrap_or_default(),
            },
        });
        view
    }

    #[test]
    fn report_requires_snapshot() {
        assert!(MachineReport::from_view(&DashboardView::default(), &TierPolicy::default()).is_none());
    }

    #[test]
    fn report_evaluates_tiers_and_derives_distribution() {
        let report = MachineReport::from_view(&ready_view(), &TierPolicy::default());
        let Some(report) = report else {
            panic!("expected a report");
        };
        assert_eq!(report.status_label, "Fault");
        assert_eq!(report.tiers.efficiency, Tier::Success);
        assert_eq!(report.tiers.oee, Tier::Danger);
        assert_eq!(report.tiers.ppm, Tier::Warning);
        assert_eq!(report.distribution.len(), 4);
        assert_eq!(
            report.plain(),
            "machine-1\tfault\t4582\t47\t92.3\t61.0\t60000"
        );
    }

    #[test]
    fn detail_lists_uptime_hours() {
        let Some(report) = MachineReport::from_view(&ready_view(), &TierPolicy::default()) else {
            panic!("expected a report");
        };
        let text = report.detail(false);
        assert!(text.contains("CNC Machine 01 (machine-1)  ● Fault"));
        assert!(text.contains("Shift 06:00 - 14:00"));
        assert!(text.contains("6h 0m"));
        assert!(text.contains("75%"));
    }

    #[test]
    fn footer_reports_error_and_waiting_state() {
        let mut view = DashboardView::default();
        view.last_error = Some(linewatch_core::CoreError::unavailable("timed out"));
        let text = footer(&view, Duration::from_secs(5), Duration::from_secs(15));
        assert!(text.starts_with("Waiting for first reading"));
        assert!(text.contains("polling every 5s"));
        assert!(text.contains("Last error"));
        assert!(!text.contains("stale"));
    }
}
