// Store row types
//
// One struct per table projection, mirroring the column names exactly.
// Values are kept raw (status as text, shift times as text); validation
// and conversion into domain types happens in linewatch-core.

use serde::{Deserialize, Serialize};

/// Column projection for a full machine snapshot.
pub(crate) const MACHINE_COLUMNS: &str = "id,name,status,total_produced,total_rejects,\
accepted_pieces,ppm_rejection,efficiency,oee,on_time,off_time,idle_time,fault_time,\
shift_start,shift_end";

/// Column projection for the machine directory.
pub(crate) const MACHINE_SUMMARY_COLUMNS: &str = "id,name,status";

/// Column projection for hourly production history.
pub(crate) const HISTORY_COLUMNS: &str = "hour,time_label,produced,rejects,efficiency";

/// Column projection for uptime distribution shares.
pub(crate) const DISTRIBUTION_COLUMNS: &str = "name,value";

/// `machines` row: identity, status, cumulative counters, and uptime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineRow {
    pub id: String,
    pub name: String,
    pub status: String,
    pub total_produced: i64,
    pub total_rejects: i64,
    pub accepted_pieces: i64,
    pub ppm_rejection: f64,
    pub efficiency: f64,
    pub oee: f64,
    /// Hours spent running during the current shift.
    pub on_time: f64,
    pub off_time: f64,
    pub idle_time: f64,
    pub fault_time: f64,
    /// `HH:MM` or `HH:MM:SS` depending on the column type.
    pub shift_start: String,
    pub shift_end: String,
}

/// `machines` row trimmed to what a selector needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSummaryRow {
    pub id: String,
    pub name: String,
    pub status: String,
}

/// `production_history` row (one per hour).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub hour: i32,
    pub time_label: String,
    pub produced: i64,
    pub rejects: i64,
    pub efficiency: f64,
}

/// `machine_time_distribution` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionRow {
    pub name: String,
    pub value: f64,
}

/// PostgREST error body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PostgrestError {
    pub code: Option<String>,
    pub message: String,
}
