use crate::alerts::{AlertSeverity, AlertState};
use crate::health::{HealthStatus, OverallHealth};
use crate::startup::Monitor;
use actix_web::{get, web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
struct InfoBody {
    service: &'static str,
    version: &'static str,
    uptime_seconds: u64,
    health_checks: usize,
    alert_rules: usize,
    timestamp: DateTime<Utc>,
}

#[get("/info")]
pub async fn info(monitor: web::Data<Monitor>) -> HttpResponse {
    HttpResponse::Ok().json(InfoBody {
        service: "opswatch",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: monitor.uptime_seconds(),
        health_checks: monitor.health.check_names().len(),
        alert_rules: monitor.alerts.rule_count(),
        timestamp: Utc::now(),
    })
}

#[derive(Serialize)]
struct StatusBody {
    overall_status: HealthStatus,
    health: OverallHealth,
    alerts: AlertCounts,
    metrics_summary: MetricCounts,
    timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
struct AlertCounts {
    active_count: usize,
    total_rules: usize,
}

#[derive(Serialize)]
struct MetricCounts {
    counters: usize,
    gauges: usize,
    histograms: usize,
}

/// Composite view: health widened by active alerts. A firing critical
/// alert escalates to unhealthy; any other active alert to degraded.
#[tracing::instrument(name = "System status", skip(monitor))]
#[get("/status")]
pub async fn status(monitor: web::Data<Monitor>) -> HttpResponse {
    let health = monitor.health.overall_status();
    let active = monitor.alerts.active_alerts();
    let snapshot = monitor.metrics.snapshot();

    let mut overall = health.overall_status;
    if !active.is_empty() {
        overall = overall.max(HealthStatus::Degraded);
    }
    if active
        .iter()
        .any(|a| a.state == AlertState::Firing && a.severity == AlertSeverity::Critical)
    {
        overall = HealthStatus::Unhealthy;
    }

    let body = StatusBody {
        overall_status: overall,
        health,
        alerts: AlertCounts {
            active_count: active.len(),
            total_rules: monitor.alerts.rule_count(),
        },
        metrics_summary: MetricCounts {
            counters: snapshot.counters.len(),
            gauges: snapshot.gauges.len(),
            histograms: snapshot.histograms.len(),
        },
        timestamp: Utc::now(),
    };

    if overall == HealthStatus::Unhealthy {
        HttpResponse::ServiceUnavailable().json(body)
    } else {
        HttpResponse::Ok().json(body)
    }
}
