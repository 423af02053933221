// Health Check Service
// Runs registered checks concurrently and aggregates them into a report

use super::panic_guard::execute_guarded_async;
use super::registration::HealthCheckRegistration;
use super::report::{HealthReport, HealthReportEntry};
use crate::domain::{HealthStatus, ProbeError, ProbeOutcome};
use crate::port::{HealthCheck, TimeProvider};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub(crate) struct RegisteredCheck {
    pub(crate) registration: HealthCheckRegistration,
    pub(crate) check: Arc<dyn HealthCheck>,
}

/// Aggregation service built by [`super::HealthChecksBuilder`]
pub struct HealthCheckService {
    checks: Vec<RegisteredCheck>,
    time_provider: Arc<dyn TimeProvider>,
}

impl HealthCheckService {
    pub(crate) fn new(checks: Vec<RegisteredCheck>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            checks,
            time_provider,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.checks.iter().map(|c| c.registration.name())
    }

    pub fn registrations(&self) -> impl Iterator<Item = &HealthCheckRegistration> {
        self.checks.iter().map(|c| &c.registration)
    }

    /// Run every registered check
    pub async fn check_health(&self, cancel: &CancellationToken) -> HealthReport {
        self.check_health_filtered(|_| true, cancel).await
    }

    /// Run the checks selected by `predicate` concurrently
    ///
    /// Timeouts and failure-status overrides are applied here, per registration.
    pub async fn check_health_filtered<P>(
        &self,
        predicate: P,
        cancel: &CancellationToken,
    ) -> HealthReport
    where
        P: Fn(&HealthCheckRegistration) -> bool,
    {
        let started = Instant::now();
        let checked_at = self.time_provider.now();

        let selected: Vec<&RegisteredCheck> = self
            .checks
            .iter()
            .filter(|c| predicate(&c.registration))
            .collect();

        debug!(selected = selected.len(), "Running health checks");

        let results = join_all(selected.iter().map(|c| run_check(c, cancel))).await;

        let entries: BTreeMap<String, HealthReportEntry> = selected
            .iter()
            .map(|c| c.registration.name().to_string())
            .zip(results)
            .collect();

        let report = HealthReport::new(entries, checked_at, elapsed_ms(started));

        info!(
            status = %report.status,
            checks = report.entries.len(),
            total_duration_ms = report.total_duration_ms,
            "Health report ready"
        );

        report
    }
}

async fn run_check(entry: &RegisteredCheck, cancel: &CancellationToken) -> HealthReportEntry {
    let registration = &entry.registration;
    let token = cancel.child_token();
    let started = Instant::now();

    let guarded = async {
        execute_guarded_async(async { entry.check.check(token.clone()).await })
            .await
            .into_result()
            .unwrap_or_else(|msg| ProbeOutcome::failed(ProbeError::Panicked(msg)))
    };

    let outcome = match registration.timeout() {
        Some(limit) => match tokio::time::timeout(limit, guarded).await {
            Ok(outcome) => outcome,
            Err(_) => {
                // Dropping the timed-out future already released its connection
                token.cancel();
                ProbeOutcome::failed(ProbeError::TimedOut(limit))
            }
        },
        None => guarded.await,
    };

    let outcome = apply_failure_status(outcome, registration.failure_status());
    let duration_ms = elapsed_ms(started);

    if outcome.status != HealthStatus::Healthy {
        warn!(
            check = %registration.name(),
            status = %outcome.status,
            description = outcome.description.as_deref().unwrap_or(""),
            duration_ms,
            "Health check not healthy"
        );
    }

    HealthReportEntry {
        status: outcome.status,
        description: outcome.description,
        error: outcome.failure.map(|f| f.to_string()),
        duration_ms,
        tags: registration.tags().iter().cloned().collect(),
        data: outcome.data,
    }
}

/// Failed outcomes report the registration's failure status; verdicts are kept
fn apply_failure_status(mut outcome: ProbeOutcome, failure_status: HealthStatus) -> ProbeOutcome {
    if outcome.is_failure() {
        outcome.status = failure_status;
    }
    outcome
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Predicate selecting registrations that carry any of `tags`
///
/// An empty tag list selects everything.
pub fn tag_predicate(tags: &[String]) -> impl Fn(&HealthCheckRegistration) -> bool + '_ {
    move |registration| {
        tags.is_empty() || tags.iter().any(|tag| registration.tags().contains(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{HealthChecksBuilder, ProbeExecutor};
    use crate::domain::{ProbeConfiguration, ScalarValue};
    use crate::port::data_store::mocks::{MockBehavior, MockConnector};
    use crate::port::health_check::MockHealthCheck;
    use crate::port::time_provider::FixedTimeProvider;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn mock_check(outcome: ProbeOutcome) -> Arc<dyn HealthCheck> {
        let mut mock = MockHealthCheck::new();
        mock.expect_check().times(1).returning(move |_| outcome.clone());
        Arc::new(mock)
    }

    fn probe(connector: Arc<MockConnector>) -> Arc<dyn HealthCheck> {
        let config = ProbeConfiguration::builder("mem://primary").build().unwrap();
        Arc::new(ProbeExecutor::new(connector, config))
    }

    #[tokio::test]
    async fn test_all_healthy() {
        let service = HealthChecksBuilder::new()
            .add_check("a", mock_check(ProbeOutcome::healthy()))
            .add_check("b", mock_check(ProbeOutcome::healthy()))
            .build()
            .unwrap();

        let report = service.check_health(&CancellationToken::new()).await;

        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.entries.len(), 2);
    }

    #[tokio::test]
    async fn test_failure_carries_description() {
        let connector = Arc::new(MockConnector::failing_command("no such table: SYS"));
        let service = HealthChecksBuilder::new()
            .add_check("db", probe(connector))
            .build()
            .unwrap();

        let report = service.check_health(&CancellationToken::new()).await;
        let entry = &report.entries["db"];

        assert_eq!(report.status, HealthStatus::Unhealthy);
        let description = entry.description.as_deref().unwrap();
        assert!(description.contains("no such table"));
        assert!(entry.error.as_deref().unwrap().starts_with("Execution failure"));
    }

    #[tokio::test]
    async fn test_failure_status_override_applies_to_failures() {
        let connector = Arc::new(MockConnector::refusing("connection refused"));
        let service = HealthChecksBuilder::new()
            .add(
                HealthCheckRegistration::from_check("cache-db", probe(connector))
                    .with_failure_status(Some(HealthStatus::Degraded)),
            )
            .build()
            .unwrap();

        let report = service.check_health(&CancellationToken::new()).await;

        assert_eq!(report.entries["cache-db"].status, HealthStatus::Degraded);
        assert_eq!(report.status, HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn test_failure_status_override_keeps_verdicts() {
        let service = HealthChecksBuilder::new()
            .add(
                HealthCheckRegistration::from_check(
                    "db",
                    mock_check(ProbeOutcome::unhealthy("replica lagging")),
                )
                .with_failure_status(Some(HealthStatus::Degraded)),
            )
            .build()
            .unwrap();

        let report = service.check_health(&CancellationToken::new()).await;

        assert_eq!(report.entries["db"].status, HealthStatus::Unhealthy);
        assert!(report.entries["db"].error.is_none());
    }

    #[tokio::test]
    async fn test_timeout_releases_connection() {
        let connector = Arc::new(MockConnector::new(MockBehavior::HangOnCommand));
        let service = HealthChecksBuilder::new()
            .add(
                HealthCheckRegistration::from_check("db", probe(connector.clone()))
                    .with_timeout(Some(Duration::from_millis(50))),
            )
            .build()
            .unwrap();

        let report = service.check_health(&CancellationToken::new()).await;
        let entry = &report.entries["db"];

        assert_eq!(entry.status, HealthStatus::Unhealthy);
        assert_eq!(entry.error.as_deref(), Some("Probe timed out after 50ms"));
        assert_eq!(connector.opened(), 1);
        assert_eq!(connector.live_connections(), 0);
    }

    #[tokio::test]
    async fn test_panicking_check_keeps_report() {
        let mut broken = MockHealthCheck::new();
        broken
            .expect_check()
            .times(1)
            .returning(|_| panic!("driver bug"));

        let service = HealthChecksBuilder::new()
            .add_check("healthy", mock_check(ProbeOutcome::healthy()))
            .add(
                HealthCheckRegistration::from_check("broken", Arc::new(broken))
                    .with_failure_status(Some(HealthStatus::Degraded)),
            )
            .build()
            .unwrap();

        let report =
            tokio::spawn(async move { service.check_health(&CancellationToken::new()).await })
                .await
                .unwrap();

        assert_eq!(report.entries["healthy"].status, HealthStatus::Healthy);
        assert_eq!(report.entries["broken"].status, HealthStatus::Degraded);
        assert_eq!(
            report.entries["broken"].error.as_deref(),
            Some("Health check panicked: driver bug")
        );
        assert_eq!(report.status, HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn test_cancelled_service_call() {
        let connector = Arc::new(MockConnector::new(MockBehavior::HangOnOpen));
        let service = HealthChecksBuilder::new()
            .add_check("db", probe(connector))
            .build()
            .unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = service.check_health(&cancel).await;

        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert_eq!(report.entries["db"].error.as_deref(), Some("Probe cancelled"));
    }

    #[tokio::test]
    async fn test_tag_filter_selects_matching_checks() {
        let mut untouched = MockHealthCheck::new();
        untouched.expect_check().never();

        let service = HealthChecksBuilder::new()
            .add(
                HealthCheckRegistration::from_check("db", mock_check(ProbeOutcome::healthy()))
                    .with_tags(["db"]),
            )
            .add(
                HealthCheckRegistration::from_check("other", Arc::new(untouched))
                    .with_tags(["cache"]),
            )
            .build()
            .unwrap();

        let tags = vec!["db".to_string()];
        let report = service
            .check_health_filtered(tag_predicate(&tags), &CancellationToken::new())
            .await;

        assert_eq!(report.entries.keys().collect::<Vec<_>>(), vec!["db"]);
        assert_eq!(report.entries["db"].tags, vec!["db".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_tag_filter_selects_all() {
        let service = HealthChecksBuilder::new()
            .add(
                HealthCheckRegistration::from_check("a", mock_check(ProbeOutcome::healthy()))
                    .with_tags(["db"]),
            )
            .add_check("b", mock_check(ProbeOutcome::degraded("slow")))
            .build()
            .unwrap();

        let report = service
            .check_health_filtered(tag_predicate(&[]), &CancellationToken::new())
            .await;

        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.status, HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn test_report_stamped_by_time_provider() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let service = HealthChecksBuilder::new()
            .with_time_provider(Arc::new(FixedTimeProvider(at)))
            .add_check(
                "db",
                probe(Arc::new(MockConnector::returning(ScalarValue::Integer(1)))),
            )
            .build()
            .unwrap();

        let report = service.check_health(&CancellationToken::new()).await;

        assert_eq!(report.checked_at, at);
        assert!(report.is_healthy());
    }
}
