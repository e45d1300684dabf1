use super::models::{AlertRule, AlertSeverity};
use crate::health::HealthStatus;
use crate::metrics::MetricSnapshot;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    GreaterThan,
    LessThan,
    Equals,
}

impl Comparison {
    fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::GreaterThan => value > threshold,
            Comparison::LessThan => value < threshold,
            Comparison::Equals => value == threshold,
        }
    }
}

/// Looks a series up across metric kinds: counter value, gauge value, or
/// histogram lifetime count. `key` is the rendered series key.
fn metric_value(snapshot: &MetricSnapshot, key: &str) -> Option<f64> {
    if let Some(value) = snapshot.counters.get(key) {
        return Some(*value as f64);
    }
    if let Some(value) = snapshot.gauges.get(key) {
        return Some(*value);
    }
    snapshot.histograms.get(key).map(|h| h.count as f64)
}

/// Fires while the overall status is at or above `target`.
pub fn overall_status_rule(
    name: &str,
    severity: AlertSeverity,
    target: HealthStatus,
    for_duration: Duration,
) -> AlertRule {
    AlertRule::new(name, severity, for_duration, move |_, health| {
        health.overall_status >= target
    })
}

/// Fires while one named check reports at or above `target`.
pub fn check_status_rule(
    name: &str,
    severity: AlertSeverity,
    check_name: &str,
    target: HealthStatus,
    for_duration: Duration,
) -> AlertRule {
    let check_name = check_name.to_string();
    AlertRule::new(name, severity, for_duration, move |_, health| {
        health
            .checks
            .get(&check_name)
            .map(|result| result.status >= target)
            .unwrap_or(false)
    })
}

/// Fires while a metric crosses a threshold. A missing series never
/// triggers.
pub fn metric_threshold_rule(
    name: &str,
    severity: AlertSeverity,
    metric_key: &str,
    comparison: Comparison,
    threshold: f64,
    for_duration: Duration,
) -> AlertRule {
    let metric_key = metric_key.to_string();
    AlertRule::new(name, severity, for_duration, move |snapshot, _| {
        metric_value(snapshot, &metric_key)
            .map(|value| comparison.holds(value, threshold))
            .unwrap_or(false)
    })
}

/// Fires while `errors / requests` exceeds `threshold`. No requests means
/// no rate, which never triggers.
pub fn error_rate_rule(
    name: &str,
    severity: AlertSeverity,
    errors_key: &str,
    requests_key: &str,
    threshold: f64,
    for_duration: Duration,
) -> AlertRule {
    let errors_key = errors_key.to_string();
    let requests_key = requests_key.to_string();
    AlertRule::new(name, severity, for_duration, move |snapshot, _| {
        let errors = snapshot.counters.get(&errors_key).copied().unwrap_or(0);
        let requests = snapshot.counters.get(&requests_key).copied().unwrap_or(0);
        if requests == 0 {
            return false;
        }
        errors as f64 / requests as f64 > threshold
    })
}
