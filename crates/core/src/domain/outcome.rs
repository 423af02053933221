// Probe Outcome

use super::error::ProbeError;
use super::status::HealthStatus;
use serde_json::Value;
use std::collections::BTreeMap;

/// Result of one probe invocation
///
/// Produced fresh on every call and handed to the reporting layer. An outcome
/// built from a failure always has a non-empty description.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub status: HealthStatus,
    pub description: Option<String>,
    pub failure: Option<ProbeError>,
    pub data: BTreeMap<String, Value>,
}

impl ProbeOutcome {
    pub fn new(status: HealthStatus, description: Option<String>) -> Self {
        Self {
            status,
            description,
            failure: None,
            data: BTreeMap::new(),
        }
    }

    pub fn healthy() -> Self {
        Self::new(HealthStatus::Healthy, None)
    }

    pub fn degraded(description: impl Into<String>) -> Self {
        Self::new(HealthStatus::Degraded, Some(description.into()))
    }

    pub fn unhealthy(description: impl Into<String>) -> Self {
        Self::new(HealthStatus::Unhealthy, Some(description.into()))
    }

    /// Unhealthy outcome carrying the failure that caused it
    pub fn failed(failure: ProbeError) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            description: Some(failure.to_string()),
            failure: Some(failure),
            data: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// True when the outcome was produced by a caught failure rather than a verdict
    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}
