// Application Layer - Probe execution, registration and aggregation

mod panic_guard;
pub mod probe;
pub mod probe_registration;
pub mod registration;
pub mod report;
pub mod service;

// Re-exports
pub use panic_guard::{execute_guarded, execute_guarded_async, PanicGuardResult};
pub use probe::ProbeExecutor;
pub use probe_registration::ProbeRegistration;
pub use registration::{CheckFactory, HealthCheckRegistration, HealthChecksBuilder};
pub use report::{HealthReport, HealthReportEntry};
pub use service::{tag_predicate, HealthCheckService};
