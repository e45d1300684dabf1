use super::HistoryParams;
use crate::alerts::Alert;
use crate::startup::Monitor;
use actix_web::{get, web, HttpResponse};
use serde::Serialize;

#[derive(Serialize)]
struct ActiveBody {
    active_count: usize,
    total_rules: usize,
    alerts: Vec<Alert>,
}

#[tracing::instrument(name = "Active alerts", skip(monitor))]
#[get("")]
pub async fn active(monitor: web::Data<Monitor>) -> HttpResponse {
    let alerts = monitor.alerts.active_alerts();
    HttpResponse::Ok().json(ActiveBody {
        active_count: alerts.len(),
        total_rules: monitor.alerts.rule_count(),
        alerts,
    })
}

#[derive(Serialize)]
struct HistoryBody {
    history: Vec<Alert>,
    count: usize,
}

#[get("/history")]
pub async fn history(
    monitor: web::Data<Monitor>,
    params: web::Query<HistoryParams>,
) -> HttpResponse {
    let history = monitor.alerts.alert_history(params.limit);
    HttpResponse::Ok().json(HistoryBody {
        count: history.len(),
        history,
    })
}
