//! Period-over-period comparison types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Percentage change between two periods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PercentChange {
    /// Both periods are zero.
    NotApplicable,
    /// Zero baseline with a non-zero current value.
    New,
    Change(f64),
}

impl PercentChange {
    /// `((current - previous) / previous) * 100`, with the zero-baseline
    /// cases reported as [`NotApplicable`](Self::NotApplicable) and
    /// [`New`](Self::New) instead of dividing by zero.
    pub fn between(previous: f64, current: f64) -> Self {
        if previous == 0.0 {
            if current == 0.0 {
                Self::NotApplicable
            } else {
                Self::New
            }
        } else {
            Self::Change((current - previous) / previous * 100.0)
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Self::Change(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for PercentChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotApplicable => f.write_str("N/A"),
            Self::New => f.write_str("New"),
            Self::Change(v) => write!(f, "{v:.2}%"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub metric: String,
    pub previous: f64,
    pub current: f64,
    pub change: PercentChange,
}

impl MetricComparison {
    pub fn new(metric: impl Into<String>, previous: f64, current: f64) -> Self {
        Self {
            metric: metric.into(),
            previous,
            current,
            change: PercentChange::between(previous, current),
        }
    }
}

/// Both periods' values for one key, one entry per compared metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub key: String,
    /// Whether the key appeared in the previous / current period.
    pub in_previous: bool,
    pub in_current: bool,
    pub metrics: Vec<MetricComparison>,
}

impl ComparisonRow {
    pub fn metric(&self, name: &str) -> Option<&MetricComparison> {
        self.metrics.iter().find(|m| m.metric == name)
    }
}
