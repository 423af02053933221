// Wiring-time Error Type
// Surfaced when configurations or registrations are built, never at probe time

use thiserror::Error;

/// Configuration error: a caller programming mistake, reported at setup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Target address must not be empty")]
    EmptyAddress,

    #[error("Command text must not be empty")]
    EmptyCommand,

    #[error("Health check name must not be empty")]
    EmptyName,

    #[error("Duplicate health check name: {0}")]
    DuplicateName(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias using ConfigError
pub type Result<T> = std::result::Result<T, ConfigError>;
