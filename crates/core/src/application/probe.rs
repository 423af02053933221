// Probe Executor
// One connect -> execute -> interpret cycle per call, no retries, no state

use super::panic_guard::execute_guarded;
use crate::domain::{ProbeConfiguration, ProbeError, ProbeOutcome, ScalarValue};
use crate::port::{Connector, HealthCheck, StoreConnection};
use async_trait::async_trait;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Executes the diagnostic probe against one target
///
/// Holds only the connector and the read-only configuration, so concurrent
/// calls never interfere; each call opens and releases its own connection.
pub struct ProbeExecutor<C: Connector> {
    connector: Arc<C>,
    config: Arc<ProbeConfiguration<C::Options>>,
}

impl<C: Connector> ProbeExecutor<C> {
    pub fn new(connector: Arc<C>, config: ProbeConfiguration<C::Options>) -> Self {
        Self {
            connector,
            config: Arc::new(config),
        }
    }

    /// Run one probe and map the result to an outcome
    ///
    /// Never fails: connectivity, execution, cancellation and hook panics all
    /// come back as an Unhealthy outcome carrying the failure.
    ///
    /// # Arguments
    /// * `cancel` - Aborts an in-flight open or command; the connection is still released
    pub async fn execute(&self, cancel: &CancellationToken) -> ProbeOutcome {
        let started = Instant::now();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProbeError::Cancelled),
            result = self.probe_once() => result,
        };

        let outcome = match result {
            Ok(value) => self.interpret(value),
            Err(failure) => {
                warn!(
                    kind = failure.kind(),
                    error = %failure,
                    "Probe failed"
                );
                ProbeOutcome::failed(failure)
            }
        };

        debug!(
            status = %outcome.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Probe finished"
        );

        outcome
    }

    /// Connect, run the command, close
    ///
    /// If this future is dropped mid-flight (cancellation, timeout) the
    /// connection it owns is dropped with it and released by its destructor.
    async fn probe_once(&self) -> Result<ScalarValue, ProbeError> {
        let mut options = self.connector.prepare(self.config.address())?;

        if let Some(configure) = self.config.configure() {
            options = execute_guarded(AssertUnwindSafe(|| configure(options)))
                .into_result()
                .map_err(ProbeError::Customization)?;
        }

        let mut connection = self.connector.open(options).await?;
        debug!("Probe connection opened");

        let result = connection.execute_scalar(self.config.command()).await;

        if let Err(e) = connection.close().await {
            warn!(error = %e, "Failed to close probe connection");
        }

        result
    }

    fn interpret(&self, value: ScalarValue) -> ProbeOutcome {
        let Some(builder) = self.config.result_builder() else {
            return ProbeOutcome::healthy();
        };

        match execute_guarded(AssertUnwindSafe(|| builder(&value))).into_result() {
            Ok(outcome) => outcome,
            Err(msg) => ProbeOutcome::failed(ProbeError::Interpretation(msg)),
        }
    }
}

#[async_trait]
impl<C: Connector> HealthCheck for ProbeExecutor<C> {
    async fn check(&self, cancel: CancellationToken) -> ProbeOutcome {
        self.execute(&cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HealthStatus;
    use crate::port::data_store::mocks::{MockBehavior, MockConnector, MockOptions};
    use std::time::Duration;

    fn config(address: &str) -> ProbeConfiguration<MockOptions> {
        ProbeConfiguration::builder(address).build().unwrap()
    }

    #[tokio::test]
    async fn test_healthy_when_command_succeeds() {
        let connector = Arc::new(MockConnector::returning(ScalarValue::Integer(1)));
        let executor = ProbeExecutor::new(connector.clone(), config("mem://primary"));

        let outcome = executor.execute(&CancellationToken::new()).await;

        assert_eq!(outcome.status, HealthStatus::Healthy);
        assert!(outcome.failure.is_none());
        assert_eq!(connector.opened(), 1);
        assert_eq!(connector.closed(), 1);
        assert_eq!(connector.live_connections(), 0);
        assert_eq!(connector.last_command().as_deref(), Some("SELECT 1;"));
    }

    #[tokio::test]
    async fn test_healthy_regardless_of_scalar_without_builder() {
        for value in [
            ScalarValue::Null,
            ScalarValue::Integer(0),
            ScalarValue::Text("anything".to_string()),
        ] {
            let connector = Arc::new(MockConnector::returning(value));
            let executor = ProbeExecutor::new(connector, config("mem://primary"));

            let outcome = executor.execute(&CancellationToken::new()).await;
            assert_eq!(outcome.status, HealthStatus::Healthy);
        }
    }

    #[tokio::test]
    async fn test_unreachable_target_is_unhealthy() {
        let connector = Arc::new(MockConnector::refusing("connection refused"));
        let executor = ProbeExecutor::new(connector.clone(), config("mem://unreachable-host"));

        let outcome = executor.execute(&CancellationToken::new()).await;

        assert_eq!(outcome.status, HealthStatus::Unhealthy);
        assert!(matches!(outcome.failure, Some(ProbeError::Connectivity(_))));
        assert!(outcome.description.unwrap().contains("connection refused"));
        assert_eq!(connector.opened(), 0);
    }

    #[tokio::test]
    async fn test_failed_command_is_unhealthy_and_released() {
        let connector = Arc::new(MockConnector::failing_command("no such table: NO_SUCH_TABLE"));
        let config = ProbeConfiguration::builder("mem://primary")
            .command("SELECT 1 FROM NO_SUCH_TABLE")
            .build()
            .unwrap();
        let executor = ProbeExecutor::new(connector.clone(), config);

        let outcome = executor.execute(&CancellationToken::new()).await;

        assert_eq!(outcome.status, HealthStatus::Unhealthy);
        assert!(matches!(outcome.failure, Some(ProbeError::Execution(_))));
        assert!(outcome.description.unwrap().contains("NO_SUCH_TABLE"));
        assert_eq!(connector.closed(), 1);
        assert_eq!(connector.live_connections(), 0);
    }

    #[tokio::test]
    async fn test_close_failure_keeps_outcome() {
        let connector = Arc::new(MockConnector::returning(ScalarValue::Integer(1)));
        connector.set_behavior(MockBehavior::FailClose(ScalarValue::Integer(1)));
        let executor = ProbeExecutor::new(connector.clone(), config("mem://primary"));

        let outcome = executor.execute(&CancellationToken::new()).await;

        assert_eq!(outcome.status, HealthStatus::Healthy);
        assert!(outcome.failure.is_none());
        assert_eq!(connector.closed(), 1);
        assert_eq!(connector.live_connections(), 0);
    }

    #[tokio::test]
    async fn test_invalid_address_is_unhealthy() {
        let connector = Arc::new(MockConnector::returning(ScalarValue::Integer(1)));
        let executor = ProbeExecutor::new(connector.clone(), config("mem://bad address"));

        let outcome = executor.execute(&CancellationToken::new()).await;

        assert!(matches!(outcome.failure, Some(ProbeError::InvalidAddress(_))));
        assert_eq!(connector.opened(), 0);
    }

    #[tokio::test]
    async fn test_builder_result_is_returned_verbatim() {
        let connector = Arc::new(MockConnector::returning(ScalarValue::Integer(250)));
        let config = ProbeConfiguration::builder("mem://primary")
            .command("SELECT count(*) FROM pending")
            .result_builder(|value| match value.as_i64() {
                Some(rows) if rows > 100 => {
                    ProbeOutcome::degraded(format!("{} pending rows", rows)).with_data("rows", rows)
                }
                _ => ProbeOutcome::healthy(),
            })
            .build()
            .unwrap();
        let executor = ProbeExecutor::new(connector, config);

        let outcome = executor.execute(&CancellationToken::new()).await;

        assert_eq!(
            outcome,
            ProbeOutcome::degraded("250 pending rows").with_data("rows", 250)
        );
    }

    #[tokio::test]
    async fn test_builder_unhealthy_verdict_is_not_a_failure() {
        let connector = Arc::new(MockConnector::returning(ScalarValue::Null));
        let config = ProbeConfiguration::builder("mem://primary")
            .result_builder(|_| ProbeOutcome::unhealthy("replica lagging"))
            .build()
            .unwrap();
        let executor = ProbeExecutor::new(connector, config);

        let outcome = executor.execute(&CancellationToken::new()).await;

        assert_eq!(outcome.status, HealthStatus::Unhealthy);
        assert!(!outcome.is_failure());
    }

    #[tokio::test]
    async fn test_builder_not_called_on_failure() {
        let connector = Arc::new(MockConnector::failing_command("syntax error"));
        let config = ProbeConfiguration::builder("mem://primary")
            .result_builder(|_| panic!("builder must not run after a failure"))
            .build()
            .unwrap();
        let executor = ProbeExecutor::new(connector, config);

        let outcome = executor.execute(&CancellationToken::new()).await;
        assert!(matches!(outcome.failure, Some(ProbeError::Execution(_))));
    }

    #[tokio::test]
    async fn test_panicking_builder_is_unhealthy() {
        let connector = Arc::new(MockConnector::returning(ScalarValue::Integer(1)));
        let config = ProbeConfiguration::builder("mem://primary")
            .result_builder(|_| panic!("threshold lookup failed"))
            .build()
            .unwrap();
        let executor = ProbeExecutor::new(connector.clone(), config);

        let outcome = executor.execute(&CancellationToken::new()).await;

        assert_eq!(outcome.status, HealthStatus::Unhealthy);
        assert_eq!(
            outcome.failure,
            Some(ProbeError::Interpretation("threshold lookup failed".to_string()))
        );
        assert_eq!(connector.live_connections(), 0);
    }

    #[tokio::test]
    async fn test_configure_hook_runs_before_open() {
        let connector = Arc::new(MockConnector::returning(ScalarValue::Integer(1)));
        let config = ProbeConfiguration::builder("mem://primary")
            .configure(|options: MockOptions| MockOptions {
                timeout_ms: Some(250),
                application_name: Some("pulsecheck".to_string()),
                ..options
            })
            .build()
            .unwrap();
        let executor = ProbeExecutor::new(connector.clone(), config);

        executor.execute(&CancellationToken::new()).await;

        let seen = connector.last_options().unwrap();
        assert_eq!(seen.address, "mem://primary");
        assert_eq!(seen.timeout_ms, Some(250));
        assert_eq!(seen.application_name.as_deref(), Some("pulsecheck"));
    }

    #[tokio::test]
    async fn test_panicking_configure_hook_skips_open() {
        let connector = Arc::new(MockConnector::returning(ScalarValue::Integer(1)));
        let config = ProbeConfiguration::builder("mem://primary")
            .configure(|_: MockOptions| panic!("bad tls bundle"))
            .build()
            .unwrap();
        let executor = ProbeExecutor::new(connector.clone(), config);

        let outcome = executor.execute(&CancellationToken::new()).await;

        assert!(matches!(outcome.failure, Some(ProbeError::Customization(_))));
        assert_eq!(connector.opened(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_never_connects() {
        let connector = Arc::new(MockConnector::returning(ScalarValue::Integer(1)));
        let executor = ProbeExecutor::new(connector.clone(), config("mem://primary"));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = executor.execute(&cancel).await;

        assert_eq!(outcome.failure, Some(ProbeError::Cancelled));
        assert_eq!(connector.opened(), 0);
    }

    #[tokio::test]
    async fn test_cancel_during_command_releases_connection() {
        let connector = Arc::new(MockConnector::new(MockBehavior::HangOnCommand));
        let executor = Arc::new(ProbeExecutor::new(connector.clone(), config("mem://primary")));
        let cancel = CancellationToken::new();

        let handle = {
            let executor = Arc::clone(&executor);
            let cancel = cancel.clone();
            tokio::spawn(async move { executor.execute(&cancel).await })
        };

        // Wait until the connection is open and the command is in flight
        while connector.last_command().is_none() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(connector.live_connections(), 1);

        cancel.cancel();
        let outcome = handle.await.unwrap();

        assert_eq!(outcome.status, HealthStatus::Unhealthy);
        assert_eq!(outcome.failure, Some(ProbeError::Cancelled));
        assert_eq!(connector.live_connections(), 0);
        assert_eq!(connector.closed(), 0);
    }

    #[tokio::test]
    async fn test_cancel_during_open() {
        let connector = Arc::new(MockConnector::new(MockBehavior::HangOnOpen));
        let executor = ProbeExecutor::new(connector.clone(), config("mem://primary"));
        let cancel = CancellationToken::new();

        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                cancel.cancel();
            })
        };

        let outcome = executor.execute(&cancel).await;
        canceller.await.unwrap();

        assert_eq!(outcome.failure, Some(ProbeError::Cancelled));
        assert_eq!(connector.live_connections(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_probes_do_not_interfere() {
        let connector = Arc::new(MockConnector::returning(ScalarValue::Integer(1)));
        let executor = Arc::new(ProbeExecutor::new(connector.clone(), config("mem://primary")));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let executor = Arc::clone(&executor);
                tokio::spawn(async move { executor.execute(&CancellationToken::new()).await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().status, HealthStatus::Healthy);
        }
        assert_eq!(connector.opened(), 8);
        assert_eq!(connector.closed(), 8);
        assert_eq!(connector.live_connections(), 0);
    }

    #[tokio::test]
    async fn test_usable_as_health_check_object() {
        let connector = Arc::new(MockConnector::returning(ScalarValue::Integer(1)));
        let check: Arc<dyn HealthCheck> =
            Arc::new(ProbeExecutor::new(connector, config("mem://primary")));

        let outcome = check.check(CancellationToken::new()).await;
        assert!(outcome.status.is_healthy());
    }
}
