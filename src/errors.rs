use thiserror::Error;

/// Errors surfaced synchronously by the engine APIs.
///
/// Check timeouts and check execution failures are deliberately absent:
/// they are recorded as unhealthy results, never returned to callers.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("duplicate name: {0}")]
    DuplicateName(String),

    #[error("unknown check: {0}")]
    UnknownCheck(String),
}
