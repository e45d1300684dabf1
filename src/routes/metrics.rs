use super::HistoryParams;
use crate::metrics::MetricSnapshot;
use crate::startup::Monitor;
use actix_web::{get, web, HttpResponse};
use serde::Serialize;

#[tracing::instrument(name = "Metrics snapshot", skip(monitor))]
#[get("")]
pub async fn snapshot(monitor: web::Data<Monitor>) -> HttpResponse {
    HttpResponse::Ok().json(monitor.metrics.snapshot())
}

#[get("/prometheus")]
pub async fn prometheus(monitor: web::Data<Monitor>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4; charset=utf-8")
        .body(monitor.metrics.export_prometheus())
}

#[derive(Serialize)]
struct HistoryBody {
    history: Vec<MetricSnapshot>,
    count: usize,
}

#[get("/history")]
pub async fn history(
    monitor: web::Data<Monitor>,
    params: web::Query<HistoryParams>,
) -> HttpResponse {
    let history = monitor.metrics.history(params.limit);
    HttpResponse::Ok().json(HistoryBody {
        count: history.len(),
        history,
    })
}
