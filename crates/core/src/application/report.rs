// Health Report - aggregated probe results

use crate::domain::HealthStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// One registration's result within a report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReportEntry {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, Value>,
}

/// Aggregated report over every check that ran
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub checked_at: DateTime<Utc>,
    pub total_duration_ms: u64,
    pub entries: BTreeMap<String, HealthReportEntry>,
}

impl HealthReport {
    /// Build a report; the overall status is the worst entry status
    ///
    /// A report with no entries is Healthy.
    pub fn new(
        entries: BTreeMap<String, HealthReportEntry>,
        checked_at: DateTime<Utc>,
        total_duration_ms: u64,
    ) -> Self {
        let status = entries
            .values()
            .map(|entry| entry.status)
            .min()
            .unwrap_or(HealthStatus::Healthy);

        Self {
            status,
            checked_at,
            total_duration_ms,
            entries,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }

    /// Entries that are not Healthy, worst first
    pub fn failing(&self) -> Vec<(&str, &HealthReportEntry)> {
        let mut failing: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.status.is_healthy())
            .map(|(name, entry)| (name.as_str(), entry))
            .collect();
        failing.sort_by_key(|(_, entry)| entry.status);
        failing
    }
}
