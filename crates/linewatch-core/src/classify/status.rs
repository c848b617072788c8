// ── Status classifier ──
//
// Discrete machine state to visual treatment. Total over the closed
// `MachineStatus` set; adding a variant fails to compile until it is
// styled here.

use serde::Serialize;

use crate::model::MachineStatus;

/// Visual treatment for a machine status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusStyle {
    /// Palette key for the status indicator.
    pub color: &'static str,
    /// Glow effect key; empty when the status has none.
    pub glow: &'static str,
    pub label: &'static str,
}

impl StatusStyle {
    pub fn has_glow(&self) -> bool {
        !self.glow.is_empty()
    }
}

impl MachineStatus {
    pub fn style(self) -> StatusStyle {
        match self {
            Self::Running => StatusStyle {
                color: "status-running",
                glow: "glow-green",
                label: "Running",
            },
            Self::Idle => StatusStyle {
                color: "status-warning",
                glow: "glow-yellow",
                label: "Idle",
            },
            Self::Off => StatusStyle {
                color: "status-offline",
                glow: "",
                label: "Offline",
            },
            Self::Fault => StatusStyle {
                color: "status-fault",
                glow: "glow-red",
                label: "Fault",
            },
        }
    }
}
