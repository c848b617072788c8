// ── Metric tier evaluator ──
//
// Continuous readings to severity tiers. Thresholds live in one
// `TierPolicy`; config may override them, the defaults are the plant
// standard. Tiers are computed on demand and never stored in view state.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::CoreError;
use crate::model::ProductionMetrics;

/// Severity tier for a metric reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tier {
    Default,
    Success,
    Warning,
    Danger,
}

/// Metrics that carry a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Metric {
    Efficiency,
    Oee,
    PpmRejection,
}

/// Higher-is-better bands: `>= success_at` succeeds, `>= warning_at` warns,
/// anything lower (NaN included) is danger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub success_at: f64,
    pub warning_at: f64,
}

impl TierThresholds {
    pub fn classify(&self, value: f64) -> Tier {
        if value >= self.success_at {
            Tier::Success
        } else if value >= self.warning_at {
            Tier::Warning
        } else {
            Tier::Danger
        }
    }
}

/// Threshold table for every tiered metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierPolicy {
    pub efficiency: TierThresholds,
    pub oee: TierThresholds,
    /// Rejection rate above which PPM is flagged. Equal is not flagged.
    pub ppm_warning_above: f64,
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self {
            efficiency: TierThresholds {
                success_at: 85.0,
                warning_at: 70.0,
            },
            oee: TierThresholds {
                success_at: 80.0,
                warning_at: 65.0,
            },
            ppm_warning_above: 50_000.0,
        }
    }
}

impl TierPolicy {
    pub fn classify(&self, metric: Metric, value: f64) -> Tier {
        match metric {
            Metric::Efficiency => self.efficiency.classify(value),
            Metric::Oee => self.oee.classify(value),
            Metric::PpmRejection => {
                if value > self.ppm_warning_above {
                    Tier::Warning
                } else {
                    Tier::Default
                }
            }
        }
    }

    pub fn efficiency(&self, value: f64) -> Tier {
        self.classify(Metric::Efficiency, value)
    }

    pub fn oee(&self, value: f64) -> Tier {
        self.classify(Metric::Oee, value)
    }

    pub fn ppm(&self, value: f64) -> Tier {
        self.classify(Metric::PpmRejection, value)
    }

    /// Evaluate all tiered metrics of a snapshot.
    pub fn evaluate(&self, metrics: &ProductionMetrics) -> MetricTiers {
        MetricTiers {
            efficiency: self.efficiency(metrics.efficiency),
            oee: self.oee(metrics.oee),
            ppm: self.ppm(metrics.ppm_rejection),
        }
    }

    /// Reject bands that can never produce `Warning`.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, t) in [("efficiency", &self.efficiency), ("oee", &self.oee)] {
            if !(t.success_at.is_finite() && t.warning_at.is_finite()) {
                return Err(CoreError::config(format!("{name} thresholds must be finite")));
            }
            if t.warning_at > t.success_at {
                return Err(CoreError::config(format!(
                    "{name}: warning_at ({}) is above success_at ({})",
                    t.warning_at, t.success_at
                )));
            }
        }
        if !self.ppm_warning_above.is_finite() {
            return Err(CoreError::config("ppm_warning_above must be finite"));
        }
        Ok(())
    }
}

/// Tier per metric for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricTiers {
    pub efficiency: Tier,
    pub oee: Tier,
    pub ppm: Tier,
}
