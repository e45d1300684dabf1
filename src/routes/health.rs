use super::HistoryParams;
use crate::errors::MonitorError;
use crate::health::{HealthCheckResult, HealthStatus};
use crate::helpers::JsonResponse;
use crate::startup::Monitor;
use actix_web::{get, web, HttpResponse};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CheckParams {
    pub force: Option<bool>,
}

/// Overall health. Degraded still answers 200; only unhealthy is 503 so
/// load balancers keep routing to a degraded instance.
#[tracing::instrument(name = "Overall health", skip(monitor))]
#[get("")]
pub async fn overall(monitor: web::Data<Monitor>) -> HttpResponse {
    let overall = monitor.health.overall_status();
    if overall.overall_status == HealthStatus::Unhealthy {
        HttpResponse::ServiceUnavailable().json(overall)
    } else {
        HttpResponse::Ok().json(overall)
    }
}

#[derive(Serialize)]
struct ProbeBody {
    status: &'static str,
}

#[get("/ready")]
pub async fn ready(monitor: web::Data<Monitor>) -> HttpResponse {
    if monitor.health.readiness() {
        HttpResponse::Ok().json(ProbeBody { status: "ready" })
    } else {
        JsonResponse::service_unavailable("not ready")
    }
}

#[get("/live")]
pub async fn live(monitor: web::Data<Monitor>) -> HttpResponse {
    // Liveness distinguishes "restart me" from "don't route to me"; if
    // this handler runs at all, the process is alive.
    if monitor.health.liveness() {
        HttpResponse::Ok().json(ProbeBody { status: "alive" })
    } else {
        JsonResponse::service_unavailable("not alive")
    }
}

#[derive(Serialize)]
struct CheckListBody {
    checks: Vec<CheckListEntry>,
    total_count: usize,
}

#[derive(Serialize)]
struct CheckListEntry {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latest: Option<HealthCheckResult>,
}

#[get("/checks")]
pub async fn check_list(monitor: web::Data<Monitor>) -> HttpResponse {
    let names = monitor.health.check_names();
    let checks: Vec<CheckListEntry> = names
        .iter()
        .map(|name| CheckListEntry {
            name: name.clone(),
            latest: monitor.health.latest_result(name).ok().flatten(),
        })
        .collect();
    HttpResponse::Ok().json(CheckListBody {
        total_count: checks.len(),
        checks,
    })
}

#[derive(Serialize)]
struct NotYetRunBody {
    name: String,
    message: &'static str,
}

/// Latest result for one check. Only `?force=true` executes the check
/// (through the registry's serialized path); a check that has never run
/// is reported as such, never run implicitly.
#[tracing::instrument(name = "Health check by name", skip(monitor))]
#[get("/checks/{name}")]
pub async fn check_item(
    monitor: web::Data<Monitor>,
    path: web::Path<(String,)>,
    params: web::Query<CheckParams>,
) -> HttpResponse {
    let (name,) = path.into_inner();
    let force = params.force.unwrap_or(false);

    let result = if force {
        monitor.health.run_check(&name).await
    } else {
        match monitor.health.latest_result(&name) {
            Ok(Some(result)) => Ok(result),
            Ok(None) => {
                return HttpResponse::Ok().json(NotYetRunBody {
                    name,
                    message: "has not run yet",
                })
            }
            Err(err) => Err(err),
        }
    };

    match result {
        Ok(result) if result.status == HealthStatus::Unhealthy => {
            HttpResponse::ServiceUnavailable().json(result)
        }
        Ok(result) => HttpResponse::Ok().json(result),
        Err(MonitorError::UnknownCheck(name)) => {
            JsonResponse::not_found(&format!("Health check {} not found", name))
        }
        Err(err) => JsonResponse::bad_request(&err.to_string()),
    }
}

#[derive(Serialize)]
struct HistoryBody<T: Serialize> {
    history: Vec<T>,
    count: usize,
}

#[get("/history")]
pub async fn history(
    monitor: web::Data<Monitor>,
    params: web::Query<HistoryParams>,
) -> HttpResponse {
    let history = monitor.health.overall_history(params.limit);
    HttpResponse::Ok().json(HistoryBody {
        count: history.len(),
        history,
    })
}
