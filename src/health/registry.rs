use super::models::{
    CheckOutput, HealthCheck, HealthCheckResult, HealthStatus, HealthSummary, OverallHealth,
};
use crate::configuration::HealthSettings;
use crate::errors::MonitorError;
use crate::metrics::MetricStore;
use chrono::Utc;
use futures_util::future::join_all;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::timeout;

struct CheckEntry {
    name: String,
    check: Arc<dyn HealthCheck>,
    critical: bool,
    /// Serializes executions of this check: a forced run and the scheduled
    /// sweep never race on the same name.
    run_guard: Mutex<()>,
    latest: RwLock<Option<HealthCheckResult>>,
    history: RwLock<VecDeque<HealthCheckResult>>,
}

/// Owns the registered checks, their execution and their bounded history.
///
/// Different checks run concurrently; a single check is serialized by its
/// run guard. Every execution lands as a fully-formed result: a failure or
/// timeout becomes an unhealthy record, never an error to the caller.
pub struct HealthRegistry {
    entries: RwLock<Vec<Arc<CheckEntry>>>,
    check_timeout: Duration,
    per_check_capacity: usize,
    overall_history: RwLock<VecDeque<OverallHealth>>,
    overall_capacity: usize,
    metrics: Arc<MetricStore>,
}

impl HealthRegistry {
    pub fn new(settings: &HealthSettings, metrics: Arc<MetricStore>) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            check_timeout: Duration::from_secs(settings.check_timeout_secs),
            per_check_capacity: settings.per_check_history_capacity,
            overall_history: RwLock::new(VecDeque::with_capacity(settings.history_capacity)),
            overall_capacity: settings.history_capacity,
            metrics,
        }
    }

    pub fn register(
        &self,
        name: &str,
        critical: bool,
        check: Arc<dyn HealthCheck>,
    ) -> Result<(), MonitorError> {
        let mut entries = self.entries.write().unwrap();
        if entries.iter().any(|e| e.name == name) {
            return Err(MonitorError::DuplicateName(name.to_string()));
        }
        tracing::info!(check = %name, critical, "Registered health check");
        entries.push(Arc::new(CheckEntry {
            name: name.to_string(),
            check,
            critical,
            run_guard: Mutex::new(()),
            latest: RwLock::new(None),
            history: RwLock::new(VecDeque::new()),
        }));
        Ok(())
    }

    fn entry(&self, name: &str) -> Result<Arc<CheckEntry>, MonitorError> {
        self.entries
            .read()
            .unwrap()
            .iter()
            .find(|e| e.name == name)
            .cloned()
            .ok_or_else(|| MonitorError::UnknownCheck(name.to_string()))
    }

    pub fn check_names(&self) -> Vec<String> {
        self.entries
            .read()
            .unwrap()
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    /// Executes one check, records the result and returns it.
    pub async fn run_check(&self, name: &str) -> Result<HealthCheckResult, MonitorError> {
        let entry = self.entry(name)?;
        Ok(self.run_entry(&entry).await)
    }

    async fn run_entry(&self, entry: &CheckEntry) -> HealthCheckResult {
        let _guard = entry.run_guard.lock().await;
        let start = Instant::now();
        let outcome = timeout(self.check_timeout, entry.check.check()).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let output = match outcome {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                tracing::error!(check = %entry.name, error = %err, "Health check failed");
                CheckOutput::unhealthy(format!("check failed: {:#}", err))
            }
            Err(_) => {
                tracing::warn!(
                    check = %entry.name,
                    timeout_secs = self.check_timeout.as_secs(),
                    "Health check timed out"
                );
                CheckOutput::unhealthy(format!(
                    "timeout after {}s",
                    self.check_timeout.as_secs()
                ))
            }
        };

        let result =
            HealthCheckResult::new(&entry.name, output.status, output.message, duration_ms);
        self.record(entry, result.clone());
        result
    }

    fn record(&self, entry: &CheckEntry, result: HealthCheckResult) {
        {
            let mut history = entry.history.write().unwrap();
            if history.len() >= self.per_check_capacity {
                history.pop_front();
            }
            history.push_back(result.clone());
        }
        // The registry is itself an instrumentation call site.
        if let Err(err) = self.metrics.observe_histogram(
            "opswatch_check_duration_seconds",
            &[("check", &entry.name)],
            result.duration_ms as f64 / 1000.0,
        ) {
            tracing::debug!(error = %err, "Skipped check duration metric");
        }
        if let Err(err) = self.metrics.increment_counter(
            "opswatch_check_runs_total",
            &[("check", &entry.name), ("status", result.status.as_str())],
            1,
        ) {
            tracing::debug!(error = %err, "Skipped check run metric");
        }
        *entry.latest.write().unwrap() = Some(result);
    }

    /// Runs every registered check concurrently; each one is bounded by the
    /// configured per-check timeout.
    pub async fn run_all(&self) -> BTreeMap<String, HealthCheckResult> {
        let entries: Vec<Arc<CheckEntry>> = self.entries.read().unwrap().clone();
        let results = join_all(entries.iter().map(|entry| self.run_entry(entry))).await;
        results
            .into_iter()
            .map(|result| (result.name.clone(), result))
            .collect()
    }

    /// Folds the latest stored result of each registration. O(checks), no
    /// I/O, so probes answer without forcing a fresh run.
    ///
    /// A critical check can force unhealthy; a non-critical one caps at
    /// degraded.
    pub fn overall_status(&self) -> OverallHealth {
        let entries = self.entries.read().unwrap();
        let mut status = HealthStatus::Healthy;
        let mut summary = HealthSummary {
            total: entries.len(),
            ..HealthSummary::default()
        };
        let mut checks = BTreeMap::new();

        for entry in entries.iter() {
            let latest = entry.latest.read().unwrap().clone();
            let Some(result) = latest else { continue };
            match result.status {
                HealthStatus::Healthy => summary.healthy += 1,
                HealthStatus::Degraded => summary.degraded += 1,
                HealthStatus::Unhealthy => summary.unhealthy += 1,
            }
            let contribution = match result.status {
                HealthStatus::Unhealthy if !entry.critical => HealthStatus::Degraded,
                other => other,
            };
            status = status.max(contribution);
            checks.insert(entry.name.clone(), result);
        }

        OverallHealth {
            overall_status: status,
            summary,
            checks,
            timestamp: Utc::now(),
        }
    }

    /// Readiness reflects overall status: not ready while unhealthy.
    pub fn readiness(&self) -> bool {
        self.overall_status().overall_status != HealthStatus::Unhealthy
    }

    /// Liveness only says the process answers; a failing dependency must
    /// not get the process restarted.
    pub fn liveness(&self) -> bool {
        true
    }

    pub fn latest_result(&self, name: &str) -> Result<Option<HealthCheckResult>, MonitorError> {
        let entry = self.entry(name)?;
        let latest = entry.latest.read().unwrap().clone();
        Ok(latest)
    }

    pub fn check_history(
        &self,
        name: &str,
        limit: Option<usize>,
    ) -> Result<Vec<HealthCheckResult>, MonitorError> {
        let entry = self.entry(name)?;
        let history = entry.history.read().unwrap();
        let skip = limit
            .map(|l| history.len().saturating_sub(l))
            .unwrap_or(0);
        Ok(history.iter().skip(skip).cloned().collect())
    }

    /// Folds current state into an overall snapshot and appends it to the
    /// bounded ring. Called by the scheduler after each sweep.
    pub fn record_overall(&self) -> OverallHealth {
        let overall = self.overall_status();
        let mut history = self.overall_history.write().unwrap();
        if history.len() >= self.overall_capacity {
            history.pop_front();
        }
        history.push_back(overall.clone());
        overall
    }

    pub fn overall_history(&self, limit: Option<usize>) -> Vec<OverallHealth> {
        let history = self.overall_history.read().unwrap();
        let skip = limit
            .map(|l| history.len().saturating_sub(l))
            .unwrap_or(0);
        history.iter().skip(skip).cloned().collect()
    }
}
