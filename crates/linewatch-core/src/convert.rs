// ── Row-to-domain conversions ──
//
// Bridges raw `linewatch_api` rows into canonical `linewatch_core::model`
// types. Unlike lenient field mapping, a row that cannot be represented
// (unknown status, negative uptime, unreadable clock time) is rejected
// with `CoreError::Invalid` so the view keeps its previous slice.

use chrono::NaiveTime;

use linewatch_api::{DistributionRow, HistoryRow, MachineRow, MachineSummaryRow};

use crate::error::CoreError;
use crate::model::{
    DistributionSlice, HistoryPoint, Machine, MachineId, MachineStatus, ProductionMetrics,
    Snapshot, TimeMetrics,
};

// ── Helpers ────────────────────────────────────────────────────────

fn parse_status(raw: &str) -> Result<MachineStatus, CoreError> {
    raw.trim()
        .to_ascii_lowercase()
        .parse()
        .map_err(|_| CoreError::invalid(format!("unknown machine status '{raw}'")))
}

/// Accepts `HH:MM` and `HH:MM:SS`.
fn parse_clock(field: &str, raw: &str) -> Result<NaiveTime, CoreError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| CoreError::invalid(format!("{field}: unreadable clock time '{raw}'")))
}

fn non_negative_hours(field: &str, value: f64) -> Result<f64, CoreError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(CoreError::invalid(format!(
            "{field} must be a non-negative number of hours, got {value}"
        )))
    }
}

// ── Machine ────────────────────────────────────────────────────────

impl TryFrom<MachineSummaryRow> for Machine {
    type Error = CoreError;

    fn try_from(row: MachineSummaryRow) -> Result<Self, Self::Error> {
        Ok(Machine {
            status: parse_status(&row.status)?,
            id: MachineId::from(row.id),
            name: row.name,
        })
    }
}

// ── Snapshot ───────────────────────────────────────────────────────

impl TryFrom<MachineRow> for Snapshot {
    type Error = CoreError;

    fn try_from(row: MachineRow) -> Result<Self, Self::Error> {
        let time = TimeMetrics {
            on_time: non_negative_hours("on_time", row.on_time)?,
            off_time: non_negative_hours("off_time", row.off_time)?,
            idle_time: non_negative_hours("idle_time", row.idle_time)?,
            fault_time: non_negative_hours("fault_time", row.fault_time)?,
            shift_start: parse_clock("shift_start", &row.shift_start)?,
            shift_end: parse_clock("shift_end", &row.shift_end)?,
        };

        Ok(Snapshot {
            machine: Machine {
                status: parse_status(&row.status)?,
                id: MachineId::from(row.id),
                name: row.name,
            },
            production: ProductionMetrics {
                total_produced: row.total_produced,
                total_rejects: row.total_rejects,
                accepted_pieces: row.accepted_pieces,
                ppm_rejection: row.ppm_rejection,
                efficiency: row.efficiency,
                oee: row.oee,
            },
            time,
        })
    }
}

// ── History & distribution ─────────────────────────────────────────

impl From<HistoryRow> for HistoryPoint {
    fn from(row: HistoryRow) -> Self {
        HistoryPoint {
            label: row.time_label,
            hour: row.hour,
            produced: row.produced,
            rejects: row.rejects,
            efficiency: row.efficiency,
        }
    }
}

impl From<DistributionRow> for DistributionSlice {
    fn from(row: DistributionRow) -> Self {
        DistributionSlice {
            name: row.name,
            value: row.value,
        }
    }
}

/// Convert history rows, ordered by hour regardless of store ordering.
pub fn history_points(rows: Vec<HistoryRow>) -> Vec<HistoryPoint> {
    let mut points: Vec<HistoryPoint> = rows.into_iter().map(HistoryPoint::from).collect();
    points.sort_by_key(|p| p.hour);
    points
}
