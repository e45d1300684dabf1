use super::models::{Alert, AlertRule, AlertState};
use super::notify::AlertNotifier;
use crate::configuration::AlertSettings;
use crate::errors::MonitorError;
use crate::health::OverallHealth;
use crate::metrics::MetricSnapshot;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

/// Evaluates declarative rules against one snapshot per tick and owns the
/// active-alert set and the resolved-alert history.
///
/// Only the evaluation tick mutates state; query readers take the read
/// lock. Rules are evaluated in insertion order, and every rule in a tick
/// sees the same snapshot, so transitions are reproducible from recorded
/// input.
pub struct AlertEngine {
    rules: RwLock<Vec<AlertRule>>,
    active: RwLock<Vec<Alert>>,
    history: RwLock<VecDeque<Alert>>,
    history_capacity: usize,
    notifiers: RwLock<Vec<Arc<dyn AlertNotifier>>>,
}

impl AlertEngine {
    pub fn new(settings: &AlertSettings) -> Self {
        Self {
            rules: RwLock::new(Vec::new()),
            active: RwLock::new(Vec::new()),
            history: RwLock::new(VecDeque::with_capacity(settings.history_capacity)),
            history_capacity: settings.history_capacity,
            notifiers: RwLock::new(Vec::new()),
        }
    }

    pub fn add_rule(&self, rule: AlertRule) -> Result<(), MonitorError> {
        let mut rules = self.rules.write().unwrap();
        if rules.iter().any(|r| r.name == rule.name) {
            return Err(MonitorError::DuplicateName(rule.name));
        }
        tracing::info!(rule = %rule.name, severity = ?rule.severity, "Added alert rule");
        rules.push(rule);
        Ok(())
    }

    /// Removes a rule; an alert still active for it is resolved into
    /// history so the active set never references an unknown rule.
    pub fn remove_rule(&self, name: &str) -> bool {
        let mut rules = self.rules.write().unwrap();
        let before = rules.len();
        rules.retain(|r| r.name != name);
        if rules.len() == before {
            return false;
        }
        drop(rules);

        let mut active = self.active.write().unwrap();
        if let Some(pos) = active.iter().position(|a| a.rule_name == name) {
            let alert = active.remove(pos);
            self.resolve(alert, Utc::now());
        }
        tracing::info!(rule = %name, "Removed alert rule");
        true
    }

    pub fn rule_count(&self) -> usize {
        self.rules.read().unwrap().len()
    }

    pub fn add_notifier(&self, notifier: Arc<dyn AlertNotifier>) {
        self.notifiers.write().unwrap().push(notifier);
    }

    /// One evaluation pass. `now` is injected so transitions are a pure
    /// function of `(snapshot, health, now)`. Returns the alerts that
    /// changed state this tick (newly firing and newly resolved), for
    /// delivery through `dispatch`.
    pub fn evaluate_tick(
        &self,
        snapshot: &MetricSnapshot,
        health: &OverallHealth,
        now: DateTime<Utc>,
    ) -> Vec<Alert> {
        let rules = self.rules.read().unwrap();
        let mut active = self.active.write().unwrap();
        let mut events = Vec::new();

        for rule in rules.iter() {
            let triggered = (rule.condition)(snapshot, health);
            let pos = active.iter().position(|a| a.rule_name == rule.name);

            match (triggered, pos) {
                (true, None) => {
                    tracing::info!(rule = %rule.name, "Alert pending");
                    active.push(Alert::pending(rule, now));
                }
                (true, Some(pos)) => {
                    let alert = &mut active[pos];
                    if alert.state == AlertState::Pending {
                        let held = (now - alert.first_observed)
                            .to_std()
                            .unwrap_or_default();
                        if held >= rule.for_duration {
                            alert.state = AlertState::Firing;
                            alert.fired_at = Some(now);
                            events.push(alert.clone());
                        }
                    }
                }
                (false, Some(pos)) => {
                    let alert = active.remove(pos);
                    events.push(self.resolve(alert, now));
                }
                (false, None) => {}
            }
        }
        events
    }

    /// Delivers transition events to every registered notifier. A failed
    /// delivery is logged and never touches engine state.
    pub async fn dispatch(&self, events: &[Alert]) {
        let notifiers: Vec<Arc<dyn AlertNotifier>> = self.notifiers.read().unwrap().clone();
        for alert in events {
            for notifier in &notifiers {
                if let Err(err) = notifier.notify(alert).await {
                    tracing::error!(
                        rule = %alert.rule_name,
                        error = %err,
                        "Alert notification failed"
                    );
                }
            }
        }
    }

    fn resolve(&self, mut alert: Alert, now: DateTime<Utc>) -> Alert {
        alert.state = AlertState::Resolved;
        alert.resolved_at = Some(now);
        let mut history = self.history.write().unwrap();
        if history.len() >= self.history_capacity {
            history.pop_front();
        }
        history.push_back(alert.clone());
        alert
    }

    /// Pending and firing alerts, oldest first.
    pub fn active_alerts(&self) -> Vec<Alert> {
        self.active.read().unwrap().clone()
    }

    /// Resolved alerts, oldest first, bounded.
    pub fn alert_history(&self, limit: Option<usize>) -> Vec<Alert> {
        let history = self.history.read().unwrap();
        let skip = limit
            .map(|l| history.len().saturating_sub(l))
            .unwrap_or(0);
        history.iter().skip(skip).cloned().collect()
    }
}
