// Probe Configuration
// Built once at wiring time and shared read-only across invocations

use super::outcome::ProbeOutcome;
use super::scalar::ScalarValue;
use crate::error::{ConfigError, Result};
use std::fmt;
use std::sync::Arc;

/// Default diagnostic command: returns a single constant row
pub const DEFAULT_HEALTH_QUERY: &str = "SELECT 1;";

/// Hook applied to the connector's connect options before the connection opens
pub type ConfigureHook<O> = Arc<dyn Fn(O) -> O + Send + Sync>;

/// Maps the scalar query result to a verdict
pub type ResultBuilder = Arc<dyn Fn(&ScalarValue) -> ProbeOutcome + Send + Sync>;

/// Immutable probe configuration
///
/// `O` is the connect-options type of the connector the probe targets, so the
/// customization hook can tune driver-specific settings (timeouts, TLS...).
pub struct ProbeConfiguration<O> {
    address: String,
    command: String,
    configure: Option<ConfigureHook<O>>,
    result_builder: Option<ResultBuilder>,
}

impl<O> ProbeConfiguration<O> {
    /// Start building a configuration for `address`
    ///
    /// # Example
    /// ```text
    /// let config = ProbeConfiguration::<SqliteConnectOptions>::builder("sqlite::memory:")
    ///     .command("SELECT count(*) FROM jobs")
    ///     .result_builder(|v| ...)
    ///     .build()?;
    /// ```
    pub fn builder(address: impl Into<String>) -> ProbeConfigurationBuilder<O> {
        ProbeConfigurationBuilder {
            address: address.into(),
            command: DEFAULT_HEALTH_QUERY.to_string(),
            configure: None,
            result_builder: None,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn configure(&self) -> Option<&ConfigureHook<O>> {
        self.configure.as_ref()
    }

    pub fn result_builder(&self) -> Option<&ResultBuilder> {
        self.result_builder.as_ref()
    }
}

impl<O> Clone for ProbeConfiguration<O> {
    fn clone(&self) -> Self {
        Self {
            address: self.address.clone(),
            command: self.command.clone(),
            configure: self.configure.clone(),
            result_builder: self.result_builder.clone(),
        }
    }
}

// Address is left out: it usually embeds credentials
impl<O> fmt::Debug for ProbeConfiguration<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeConfiguration")
            .field("command", &self.command)
            .field("configure", &self.configure.is_some())
            .field("result_builder", &self.result_builder.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ProbeConfiguration`]
pub struct ProbeConfigurationBuilder<O> {
    address: String,
    command: String,
    configure: Option<ConfigureHook<O>>,
    result_builder: Option<ResultBuilder>,
}

impl<O> ProbeConfigurationBuilder<O> {
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn configure<F>(mut self, hook: F) -> Self
    where
        F: Fn(O) -> O + Send + Sync + 'static,
    {
        self.configure = Some(Arc::new(hook));
        self
    }

    pub fn configure_hook(mut self, hook: Option<ConfigureHook<O>>) -> Self {
        self.configure = hook;
        self
    }

    pub fn result_builder<F>(mut self, builder: F) -> Self
    where
        F: Fn(&ScalarValue) -> ProbeOutcome + Send + Sync + 'static,
    {
        self.result_builder = Some(Arc::new(builder));
        self
    }

    pub fn result_builder_hook(mut self, builder: Option<ResultBuilder>) -> Self {
        self.result_builder = builder;
        self
    }

    /// Validate and freeze the configuration
    ///
    /// # Errors
    /// - ConfigError::EmptyAddress if the address is empty or blank
    /// - ConfigError::EmptyCommand if the command text is empty or blank
    pub fn build(self) -> Result<ProbeConfiguration<O>> {
        if self.address.trim().is_empty() {
            return Err(ConfigError::EmptyAddress);
        }
        if self.command.trim().is_empty() {
            return Err(ConfigError::EmptyCommand);
        }

        Ok(ProbeConfiguration {
            address: self.address,
            command: self.command,
            configure: self.configure,
            result_builder: self.result_builder,
        })
    }
}
