use crate::health::OverallHealth;
use crate::metrics::MetricSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertState {
    Pending,
    Firing,
    Resolved,
}

/// Predicate over one evaluation tick's inputs. Must be pure: no I/O, no
/// hidden state, so a given snapshot always yields the same transitions.
pub type AlertCondition = Box<dyn Fn(&MetricSnapshot, &OverallHealth) -> bool + Send + Sync>;

pub struct AlertRule {
    pub name: String,
    pub severity: AlertSeverity,
    /// How long the condition must hold continuously before the alert
    /// fires. The anti-flap window.
    pub for_duration: Duration,
    pub condition: AlertCondition,
}

impl AlertRule {
    pub fn new<F>(
        name: impl Into<String>,
        severity: AlertSeverity,
        for_duration: Duration,
        condition: F,
    ) -> Self
    where
        F: Fn(&MetricSnapshot, &OverallHealth) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            severity,
            for_duration,
            condition: Box::new(condition),
        }
    }
}

impl std::fmt::Debug for AlertRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertRule")
            .field("name", &self.name)
            .field("severity", &self.severity)
            .field("for_duration", &self.for_duration)
            .finish_non_exhaustive()
    }
}

/// One alert instance. At most one non-resolved instance exists per rule
/// name; a resolved alert is immutable and lives only in history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub rule_name: String,
    pub severity: AlertSeverity,
    pub state: AlertState,
    pub first_observed: DateTime<Utc>,
    pub fired_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub(crate) fn pending(rule: &AlertRule, now: DateTime<Utc>) -> Self {
        Self {
            rule_name: rule.name.clone(),
            severity: rule.severity,
            state: AlertState::Pending,
            first_observed: now,
            fired_at: None,
            resolved_at: None,
        }
    }
}
