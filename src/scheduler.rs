use crate::configuration::Settings;
use crate::startup::Monitor;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Drives the three periodic jobs: health sweep, metric snapshot and alert
/// evaluation, each on its own configured interval.
///
/// Shutdown stops issuing new ticks; an in-flight sweep finishes (or hits
/// its per-check timeout) before the task exits.
pub struct Scheduler {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn start(monitor: Arc<Monitor>, settings: &Settings) -> Self {
        let (shutdown, _) = watch::channel(false);

        let handles = vec![
            tokio::spawn(health_sweep_loop(
                monitor.clone(),
                Duration::from_secs(settings.health.check_interval_secs),
                shutdown.subscribe(),
            )),
            tokio::spawn(metric_snapshot_loop(
                monitor.clone(),
                Duration::from_secs(settings.metrics.snapshot_interval_secs),
                shutdown.subscribe(),
            )),
            tokio::spawn(alert_evaluation_loop(
                monitor,
                Duration::from_secs(settings.alerts.evaluation_interval_secs),
                shutdown.subscribe(),
            )),
        ];

        Self { shutdown, handles }
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            let _ = handle.await;
        }
        tracing::info!("Scheduler stopped");
    }
}

async fn health_sweep_loop(
    monitor: Arc<Monitor>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let results = monitor.health.run_all().await;
                let overall = monitor.health.record_overall();
                tracing::debug!(
                    checks = results.len(),
                    status = ?overall.overall_status,
                    "Health sweep complete"
                );
            }
            _ = shutdown.changed() => break,
        }
    }
}

async fn metric_snapshot_loop(
    monitor: Arc<Monitor>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                monitor.metrics.record_snapshot();
            }
            _ = shutdown.changed() => break,
        }
    }
}

async fn alert_evaluation_loop(
    monitor: Arc<Monitor>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // One snapshot per tick: every rule sees the same inputs.
                let snapshot = monitor.metrics.snapshot();
                let health = monitor.health.overall_status();
                let events = monitor.alerts.evaluate_tick(&snapshot, &health, Utc::now());
                monitor.alerts.dispatch(&events).await;
            }
            _ = shutdown.changed() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::Settings;

    #[tokio::test]
    async fn ticks_record_history_and_shutdown_stops_them() {
        let settings = Settings::default();
        let monitor = Arc::new(Monitor::new(&settings));
        monitor.metrics.set_gauge("x", &[], 1.0).unwrap();

        // 1s floor on intervals keeps this test honest: the first interval
        // tick fires immediately, so one pass of each job is enough.
        let scheduler = Scheduler::start(monitor.clone(), &settings);
        tokio::time::sleep(Duration::from_millis(200)).await;
        scheduler.shutdown().await;

        assert!(!monitor.metrics.history(None).is_empty());
        assert!(!monitor.health.overall_history(None).is_empty());
    }
}
