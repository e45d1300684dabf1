use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered by severity: a later variant always wins when statuses are
/// folded into an overall one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

/// What a check implementation reports when it completes on its own.
/// Failures and timeouts never come through here; the registry converts
/// those into unhealthy results.
#[derive(Debug, Clone)]
pub struct CheckOutput {
    pub status: HealthStatus,
    pub message: String,
}

impl CheckOutput {
    pub fn healthy(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: message.into(),
        }
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Degraded,
            message: message.into(),
        }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            message: message.into(),
        }
    }
}

/// A pluggable probe. Implementations may block on I/O; the registry
/// enforces the deadline and serializes runs per check.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> anyhow::Result<CheckOutput>;
}

/// Immutable record of one check execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub name: String,
    pub status: HealthStatus,
    pub message: String,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl HealthCheckResult {
    pub fn new(
        name: &str,
        status: HealthStatus,
        message: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration_ms,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HealthSummary {
    pub total: usize,
    pub healthy: usize,
    pub degraded: usize,
    pub unhealthy: usize,
}

/// Derived view over the latest result of every registration.
/// Recomputed on each query, never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallHealth {
    pub overall_status: HealthStatus,
    pub summary: HealthSummary,
    pub checks: BTreeMap<String, HealthCheckResult>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_orders_by_severity() {
        assert!(HealthStatus::Healthy < HealthStatus::Degraded);
        assert!(HealthStatus::Degraded < HealthStatus::Unhealthy);
        assert_eq!(
            HealthStatus::Degraded.max(HealthStatus::Unhealthy),
            HealthStatus::Unhealthy
        );
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&HealthStatus::Degraded).unwrap();
        assert_eq!(json, "\"degraded\"");
    }
}
