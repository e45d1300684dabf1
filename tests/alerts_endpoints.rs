mod common;

use chrono::{Duration as ChronoDuration, Utc};
use common::spawn_app;
use opswatch::alerts::rules::{metric_threshold_rule, Comparison};
use opswatch::alerts::{Alert, AlertNotifier, AlertSeverity, AlertState, WebhookNotifier};
use std::time::Duration;

#[tokio::test]
async fn no_rules_means_an_empty_active_set() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/alerts", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["active_count"], 0);
    assert_eq!(body["total_rules"], 0);
    assert!(body["alerts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn firing_alert_shows_up_in_the_active_set() {
    let app = spawn_app().await;
    app.monitor
        .alerts
        .add_rule(metric_threshold_rule(
            "lag-high",
            AlertSeverity::Warning,
            "consumer_lag",
            Comparison::GreaterThan,
            100.0,
            Duration::from_secs(30),
        ))
        .unwrap();
    app.monitor
        .metrics
        .set_gauge("consumer_lag", &[], 500.0)
        .unwrap();

    // Two ticks 30s apart promote the alert from pending to firing.
    let snapshot = app.monitor.metrics.snapshot();
    let health = app.monitor.health.overall_status();
    let t0 = Utc::now();
    app.monitor.alerts.evaluate_tick(&snapshot, &health, t0);
    app.monitor
        .alerts
        .evaluate_tick(&snapshot, &health, t0 + ChronoDuration::seconds(30));

    let client = reqwest::Client::new();
    let response = client
        .get(&format!("{}/alerts", &app.address))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["active_count"], 1);
    assert_eq!(body["total_rules"], 1);
    assert_eq!(body["alerts"][0]["rule_name"], "lag-high");
    assert_eq!(body["alerts"][0]["state"], "firing");
    assert_eq!(body["alerts"][0]["severity"], "warning");
}

#[tokio::test]
async fn resolved_alerts_land_in_history() {
    let app = spawn_app().await;
    app.monitor
        .alerts
        .add_rule(metric_threshold_rule(
            "lag-high",
            AlertSeverity::Warning,
            "consumer_lag",
            Comparison::GreaterThan,
            100.0,
            Duration::ZERO,
        ))
        .unwrap();

    let health = app.monitor.health.overall_status();
    let t0 = Utc::now();

    app.monitor
        .metrics
        .set_gauge("consumer_lag", &[], 500.0)
        .unwrap();
    let snapshot = app.monitor.metrics.snapshot();
    app.monitor.alerts.evaluate_tick(&snapshot, &health, t0);

    app.monitor
        .metrics
        .set_gauge("consumer_lag", &[], 10.0)
        .unwrap();
    let snapshot = app.monitor.metrics.snapshot();
    app.monitor
        .alerts
        .evaluate_tick(&snapshot, &health, t0 + ChronoDuration::seconds(15));

    let client = reqwest::Client::new();
    let active: serde_json::Value = client
        .get(&format!("{}/alerts", &app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(active["active_count"], 0);

    let history: serde_json::Value = client
        .get(&format!("{}/alerts/history", &app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history["count"], 1);
    assert_eq!(history["history"][0]["state"], "resolved");
    assert!(history["history"][0]["resolved_at"].is_string());
}

#[tokio::test]
async fn webhook_notifier_surfaces_non_success_responses() {
    // Any route on the spawned server rejects POST with a 404, which is
    // exactly what a misconfigured webhook target looks like.
    let app = spawn_app().await;
    let notifier = WebhookNotifier::new(format!("{}/hooks", app.address)).unwrap();

    let alert = Alert {
        rule_name: "lag-high".to_string(),
        severity: AlertSeverity::Warning,
        state: AlertState::Firing,
        first_observed: Utc::now(),
        fired_at: Some(Utc::now()),
        resolved_at: None,
    };
    let err = notifier.notify(&alert).await.unwrap_err();
    assert!(err.to_string().contains("404"));
}
