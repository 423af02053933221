// Probe Failure Types
// Every variant is converted into an Unhealthy outcome; none escape to callers

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The address could not be turned into connect options
    #[error("Invalid target address: {0}")]
    InvalidAddress(String),

    /// Network unreachable, authentication rejected, TLS failure...
    #[error("Connectivity failure: {0}")]
    Connectivity(String),

    /// Connection opened but the diagnostic command failed
    #[error("Execution failure: {0}")]
    Execution(String),

    #[error("Probe cancelled")]
    Cancelled,

    #[error("Probe timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),

    /// The connection customization hook panicked
    #[error("Connection customization failed: {0}")]
    Customization(String),

    /// The result-interpretation callback panicked
    #[error("Result interpretation failed: {0}")]
    Interpretation(String),

    /// The health check itself panicked
    #[error("Health check panicked: {0}")]
    Panicked(String),
}

impl ProbeError {
    /// Short machine-friendly category, used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::InvalidAddress(_) => "invalid_address",
            ProbeError::Connectivity(_) => "connectivity",
            ProbeError::Execution(_) => "execution",
            ProbeError::Cancelled => "cancelled",
            ProbeError::TimedOut(_) => "timed_out",
            ProbeError::Customization(_) => "customization",
            ProbeError::Interpretation(_) => "interpretation",
            ProbeError::Panicked(_) => "panicked",
        }
    }
}
