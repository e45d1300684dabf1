use crate::alerts::AlertEngine;
use crate::configuration::Settings;
use crate::health::HealthRegistry;
use crate::helpers::JsonResponse;
use crate::metrics::MetricStore;
use crate::routes;
use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{web, App, HttpResponse, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Instant;
use tracing_actix_web::TracingLogger;

/// The one process-wide handle over the three engines. Constructed once at
/// startup and passed to everything that needs it; no ambient singletons.
pub struct Monitor {
    pub metrics: Arc<MetricStore>,
    pub health: Arc<HealthRegistry>,
    pub alerts: Arc<AlertEngine>,
    started_at: Instant,
}

impl Monitor {
    pub fn new(settings: &Settings) -> Self {
        let metrics = Arc::new(MetricStore::new(&settings.metrics));
        let health = Arc::new(HealthRegistry::new(&settings.health, metrics.clone()));
        let alerts = Arc::new(AlertEngine::new(&settings.alerts));
        Self {
            metrics,
            health,
            alerts,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Request-path instrumentation. The metric names are owned by this
    /// crate, so a kind mismatch only happens on caller misuse and is
    /// logged rather than surfaced.
    pub(crate) fn observe_request(&self, status: actix_web::http::StatusCode, elapsed_secs: f64) {
        if let Err(err) = self
            .metrics
            .increment_counter("opswatch_requests_total", &[], 1)
        {
            tracing::debug!(error = %err, "Skipped request counter");
        }
        if let Err(err) =
            self.metrics
                .observe_histogram("opswatch_request_duration_seconds", &[], elapsed_secs)
        {
            tracing::debug!(error = %err, "Skipped request duration");
        }
        if status.is_client_error() || status.is_server_error() {
            if let Err(err) = self
                .metrics
                .increment_counter("opswatch_errors_total", &[], 1)
            {
                tracing::debug!(error = %err, "Skipped error counter");
            }
        }
    }
}

pub async fn run(
    listener: TcpListener,
    monitor: Arc<Monitor>,
    _settings: Settings,
) -> Result<Server, std::io::Error> {
    let server = HttpServer::new(move || {
        let monitor_mw = monitor.clone();
        App::new()
            .wrap(TracingLogger::default())
            .wrap(Cors::permissive())
            .wrap_fn(move |req, srv| {
                let monitor = monitor_mw.clone();
                let start = Instant::now();
                let fut = actix_web::dev::Service::call(srv, req);
                async move {
                    let res = fut.await;
                    if let Ok(res) = &res {
                        monitor.observe_request(res.status(), start.elapsed().as_secs_f64());
                    }
                    res
                }
            })
            .app_data(web::Data::from(monitor.clone()))
            .service(
                web::scope("/health")
                    .service(routes::health::overall)
                    .service(routes::health::ready)
                    .service(routes::health::live)
                    .service(routes::health::check_list)
                    .service(routes::health::check_item)
                    .service(routes::health::history),
            )
            .service(
                web::scope("/metrics")
                    .service(routes::metrics::snapshot)
                    .service(routes::metrics::prometheus)
                    .service(routes::metrics::history),
            )
            .service(
                web::scope("/alerts")
                    .service(routes::alerts::active)
                    .service(routes::alerts::history),
            )
            .service(routes::system::info)
            .service(routes::system::status)
            .default_service(web::route().to(|| async {
                JsonResponse::not_found("Unknown route")
            }))
    })
    .listen(listener)?
    .run();

    Ok(server)
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("uptime_seconds", &self.uptime_seconds())
            .finish_non_exhaustive()
    }
}
