pub mod checks;
pub mod models;
pub mod registry;

pub use models::{CheckOutput, HealthCheck, HealthCheckResult, HealthStatus, OverallHealth};
pub use registry::HealthRegistry;
