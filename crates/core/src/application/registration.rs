// Health Check Registration
// Names, failure status, tags and timeout are carried for the aggregation
// layer; the probe itself never reads them.

use super::service::{HealthCheckService, RegisteredCheck};
use crate::domain::HealthStatus;
use crate::error::{ConfigError, Result};
use crate::port::time_provider::SystemTimeProvider;
use crate::port::{HealthCheck, TimeProvider};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Builds the check when the service is built
pub type CheckFactory = Arc<dyn Fn() -> Result<Arc<dyn HealthCheck>> + Send + Sync>;

/// A named health check plus the attributes used to report on it
#[derive(Clone)]
pub struct HealthCheckRegistration {
    name: String,
    factory: CheckFactory,
    failure_status: HealthStatus,
    tags: BTreeSet<String>,
    timeout: Option<Duration>,
}

impl HealthCheckRegistration {
    /// Register a lazily built check
    ///
    /// The factory runs once, in [`HealthChecksBuilder::build`], so values it
    /// depends on (an address read from settings, say) are resolved at wiring time.
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn HealthCheck>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(factory),
            failure_status: HealthStatus::Unhealthy,
            tags: BTreeSet::new(),
            timeout: None,
        }
    }

    /// Register an already built check
    pub fn from_check(name: impl Into<String>, check: Arc<dyn HealthCheck>) -> Self {
        Self::new(name, move || Ok(Arc::clone(&check)))
    }

    /// Status reported when the check fails; `None` keeps Unhealthy
    pub fn with_failure_status(mut self, status: Option<HealthStatus>) -> Self {
        self.failure_status = status.unwrap_or(HealthStatus::Unhealthy);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn failure_status(&self) -> HealthStatus {
        self.failure_status
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn instantiate(&self) -> Result<Arc<dyn HealthCheck>> {
        (self.factory)()
    }
}

impl fmt::Debug for HealthCheckRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthCheckRegistration")
            .field("name", &self.name)
            .field("failure_status", &self.failure_status)
            .field("tags", &self.tags)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Collects registrations and builds the aggregation service
pub struct HealthChecksBuilder {
    registrations: Vec<HealthCheckRegistration>,
    time_provider: Arc<dyn TimeProvider>,
}

impl HealthChecksBuilder {
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
            time_provider: Arc::new(SystemTimeProvider),
        }
    }

    pub fn add(mut self, registration: HealthCheckRegistration) -> Self {
        self.registrations.push(registration);
        self
    }

    pub fn add_check(self, name: impl Into<String>, check: Arc<dyn HealthCheck>) -> Self {
        self.add(HealthCheckRegistration::from_check(name, check))
    }

    pub fn with_time_provider(mut self, time_provider: Arc<dyn TimeProvider>) -> Self {
        self.time_provider = time_provider;
        self
    }

    pub fn registrations(&self) -> &[HealthCheckRegistration] {
        &self.registrations
    }

    /// Validate registrations and instantiate every check
    ///
    /// # Errors
    /// - ConfigError::EmptyName if a registration has a blank name
    /// - ConfigError::DuplicateName if two registrations share a name
    /// - Any error returned by a registration's factory
    pub fn build(self) -> Result<HealthCheckService> {
        let mut seen = HashSet::new();
        let mut checks = Vec::with_capacity(self.registrations.len());

        for registration in self.registrations {
            if registration.name.trim().is_empty() {
                return Err(ConfigError::EmptyName);
            }
            if !seen.insert(registration.name.clone()) {
                return Err(ConfigError::DuplicateName(registration.name));
            }

            let check = registration.instantiate()?;
            debug!(
                check = %registration.name,
                tags = ?registration.tags,
                timeout_ms = ?registration.timeout.map(|t| t.as_millis() as u64),
                "Health check registered"
            );
            checks.push(RegisteredCheck {
                registration,
                check,
            });
        }

        Ok(HealthCheckService::new(checks, self.time_provider))
    }
}

impl Default for HealthChecksBuilder {
    fn default() -> Self {
        Self::new()
    }
}
