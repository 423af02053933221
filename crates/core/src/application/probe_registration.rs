// Probe Registration Builder
// Turns probe settings plus a connector into a HealthCheckRegistration

use super::probe::ProbeExecutor;
use super::registration::HealthCheckRegistration;
use crate::domain::{
    ConfigureHook, HealthStatus, ProbeConfiguration, ProbeOutcome, ResultBuilder, ScalarValue,
    DEFAULT_HEALTH_QUERY,
};
use crate::error::Result;
use crate::port::{Connector, HealthCheck};
use std::sync::Arc;
use std::time::Duration;

type AddressFactory = Arc<dyn Fn() -> String + Send + Sync>;

enum Source<O> {
    Address(String),
    Factory(AddressFactory),
    Configuration(ProbeConfiguration<O>),
}

/// Registration settings for a probe against connector `C`
///
/// # Example
/// ```text
/// let builder = HealthChecksBuilder::new().add(
///     ProbeRegistration::new("sqlite://app.db")
///         .name("app-db")
///         .tags(["db"])
///         .timeout(Duration::from_secs(2))
///         .into_registration(Arc::new(SqliteConnector), "sqlite"),
/// );
/// ```
pub struct ProbeRegistration<C: Connector> {
    source: Source<C::Options>,
    command: String,
    configure: Option<ConfigureHook<C::Options>>,
    result_builder: Option<ResultBuilder>,
    name: Option<String>,
    failure_status: Option<HealthStatus>,
    tags: Vec<String>,
    timeout: Option<Duration>,
}

impl<C: Connector> ProbeRegistration<C> {
    /// Probe a fixed address
    pub fn new(address: impl Into<String>) -> Self {
        Self::with_source(Source::Address(address.into()))
    }

    /// Resolve the address when the service is built
    pub fn from_factory<F>(factory: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self::with_source(Source::Factory(Arc::new(factory)))
    }

    /// Use a complete configuration; command and hook settings on this builder are ignored
    pub fn from_configuration(config: ProbeConfiguration<C::Options>) -> Self {
        Self::with_source(Source::Configuration(config))
    }

    fn with_source(source: Source<C::Options>) -> Self {
        Self {
            source,
            command: DEFAULT_HEALTH_QUERY.to_string(),
            configure: None,
            result_builder: None,
            name: None,
            failure_status: None,
            tags: Vec::new(),
            timeout: None,
        }
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn configure<F>(mut self, hook: F) -> Self
    where
        F: Fn(C::Options) -> C::Options + Send + Sync + 'static,
    {
        self.configure = Some(Arc::new(hook));
        self
    }

    pub fn result_builder<F>(mut self, builder: F) -> Self
    where
        F: Fn(&ScalarValue) -> ProbeOutcome + Send + Sync + 'static,
    {
        self.result_builder = Some(Arc::new(builder));
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn failure_status(mut self, status: HealthStatus) -> Self {
        self.failure_status = Some(status);
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Finish the registration
    ///
    /// The configuration is validated when the service is built, so an empty
    /// address or command fails [`super::HealthChecksBuilder::build`].
    pub fn into_registration(
        self,
        connector: Arc<C>,
        default_name: &str,
    ) -> HealthCheckRegistration {
        let Self {
            source,
            command,
            configure,
            result_builder,
            name,
            failure_status,
            tags,
            timeout,
        } = self;

        let name = name.unwrap_or_else(|| default_name.to_string());

        let factory = move || -> Result<Arc<dyn HealthCheck>> {
            let config = match &source {
                Source::Configuration(config) => config.clone(),
                Source::Address(address) => ProbeConfiguration::builder(address.clone())
                    .command(command.clone())
                    .configure_hook(configure.clone())
                    .result_builder_hook(result_builder.clone())
                    .build()?,
                Source::Factory(factory) => ProbeConfiguration::builder(factory())
                    .command(command.clone())
                    .configure_hook(configure.clone())
                    .result_builder_hook(result_builder.clone())
                    .build()?,
            };
            let check: Arc<dyn HealthCheck> =
                Arc::new(ProbeExecutor::new(Arc::clone(&connector), config));
            Ok(check)
        };

        HealthCheckRegistration::new(name, factory)
            .with_failure_status(failure_status)
            .with_tags(tags)
            .with_timeout(timeout)
    }
}
