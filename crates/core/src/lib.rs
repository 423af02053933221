// pulsecheck Core - Probe Executor, Health Model & Ports
// NO database driver dependencies: stores are reached through port::Connector

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{
    HealthCheckRegistration, HealthCheckService, HealthChecksBuilder, HealthReport,
    ProbeExecutor, ProbeRegistration,
};
pub use domain::{HealthStatus, ProbeConfiguration, ProbeError, ProbeOutcome, ScalarValue};
pub use error::{ConfigError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
