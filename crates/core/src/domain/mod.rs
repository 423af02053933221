// Domain Layer - Health model and probe configuration

pub mod config;
pub mod error;
pub mod outcome;
pub mod scalar;
pub mod status;

// Re-exports
pub use config::{
    ConfigureHook, ProbeConfiguration, ProbeConfigurationBuilder, ResultBuilder,
    DEFAULT_HEALTH_QUERY,
};
pub use error::ProbeError;
pub use outcome::ProbeOutcome;
pub use scalar::ScalarValue;
pub use status::HealthStatus;
