// Health Check Port
// Object-safe seam between probes and the aggregation layer

use crate::domain::ProbeOutcome;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// A single health check
///
/// Implementations never fail: every failure is folded into the outcome.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Run the check once
    ///
    /// # Arguments
    /// * `cancel` - Cooperative cancellation; a cancelled check reports Unhealthy
    async fn check(&self, cancel: CancellationToken) -> ProbeOutcome;
}
