// ── Machine identity types ──

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Stable identifier of a monitored machine or production line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MachineId(String);

impl MachineId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MachineId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for MachineId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for MachineId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Discrete operating state reported by the store.
///
/// Closed set: a value outside it is a malformed record, rejected at the
/// conversion boundary rather than mapped to a catch-all.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MachineStatus {
    Running,
    Idle,
    Off,
    Fault,
}

impl MachineStatus {
    pub fn is_producing(self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Directory entry for a machine: what the selector lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub id: MachineId,
    pub name: String,
    pub status: MachineStatus,
}
