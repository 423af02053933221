// Port Layer - Interfaces for external dependencies

pub mod data_store;
pub mod health_check;
pub mod time_provider;

// Re-exports
pub use data_store::{Connector, StoreConnection};
pub use health_check::HealthCheck;
pub use time_provider::TimeProvider;
