use opswatch::alerts::rules;
use opswatch::alerts::{AlertSeverity, LogNotifier, WebhookNotifier};
use opswatch::configuration::get_configuration;
use opswatch::health::{checks, HealthStatus};
use opswatch::scheduler::Scheduler;
use opswatch::startup::{run, Monitor};
use opswatch::telemetry::{get_subscriber, init_subscriber};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let subscriber = get_subscriber("opswatch".into(), "info".into());
    init_subscriber(subscriber);

    let settings = get_configuration().expect("Failed to read configuration.");
    let monitor = Arc::new(Monitor::new(&settings));

    for check in &settings.health.checks {
        match checks::from_settings(check) {
            Ok(built) => {
                if let Err(err) = monitor.health.register(&check.name, check.critical, built) {
                    tracing::error!(check = %check.name, error = %err, "Skipped health check");
                }
            }
            Err(err) => {
                tracing::error!(check = %check.name, error = %err, "Failed to build health check");
            }
        }
    }

    for rule in [
        rules::overall_status_rule(
            "system-unhealthy",
            AlertSeverity::Critical,
            HealthStatus::Unhealthy,
            Duration::from_secs(30),
        ),
        rules::error_rate_rule(
            "high-error-rate",
            AlertSeverity::Warning,
            "opswatch_errors_total",
            "opswatch_requests_total",
            0.05,
            Duration::from_secs(60),
        ),
    ] {
        if let Err(err) = monitor.alerts.add_rule(rule) {
            tracing::error!(error = %err, "Skipped alert rule");
        }
    }

    monitor.alerts.add_notifier(Arc::new(LogNotifier));
    if let Some(url) = &settings.alerts.webhook_url {
        match WebhookNotifier::new(url) {
            Ok(notifier) => monitor.alerts.add_notifier(Arc::new(notifier)),
            Err(err) => tracing::error!(error = %err, "Failed to build webhook notifier"),
        }
    }

    let scheduler = Scheduler::start(monitor.clone(), &settings);

    let address = format!("{}:{}", settings.app_host, settings.app_port);
    tracing::info!("Start server at {:?}", &address);
    let listener = TcpListener::bind(&address)?;

    run(listener, monitor, settings).await?.await?;

    scheduler.shutdown().await;
    Ok(())
}
