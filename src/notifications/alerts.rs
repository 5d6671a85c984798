//! Capacity alerts derived from location stats

use serde::{Deserialize, Serialize};

use crate::ledger::LocationStats;

/// Utilization above which an alert is critical regardless of threshold
pub const CRITICAL_UTILIZATION: f64 = 90.0;

/// Severity level of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// Above the facility's own threshold
    Warning,
    /// Nearly full
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    /// Severity for a utilization percentage
    pub fn for_utilization(utilization: f64) -> Self {
        if utilization > CRITICAL_UTILIZATION {
            Self::Critical
        } else {
            Self::Warning
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A facility whose storage utilization crossed its alert threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityAlert {
    pub location: String,
    pub severity: AlertSeverity,
    pub utilization: f64,
    pub alert_threshold: u8,
    pub total_items: u64,
    pub capacity: u32,
    pub message: String,
}

/// Alerts for every facility above its threshold, most utilized first
pub fn capacity_alerts(stats: &[LocationStats]) -> Vec<CapacityAlert> {
    let mut alerts: Vec<CapacityAlert> = stats
        .iter()
        .filter(|s| s.alert)
        .map(|s| CapacityAlert {
            location: s.name.clone(),
            severity: AlertSeverity::for_utilization(s.utilization),
            utilization: s.utilization,
            alert_threshold: s.alert_threshold,
            total_items: s.total_items,
            capacity: s.capacity,
            message: format!(
                "{} is at {:.1}% capacity (threshold {}%)",
                s.name, s.utilization, s.alert_threshold
            ),
        })
        .collect();

    alerts.sort_by(|a, b| b.utilization.total_cmp(&a.utilization));
    alerts
}
