mod common;

use common::{spawn_app, StaticCheck};
use opswatch::health::HealthStatus;
use std::sync::Arc;

#[tokio::test]
async fn empty_registry_reports_healthy() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/health", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["overall_status"], "healthy");
    assert_eq!(body["summary"]["total"], 0);
}

#[tokio::test]
async fn critical_unhealthy_check_flips_health_and_readiness() {
    let app = spawn_app().await;
    app.monitor
        .health
        .register("broker", true, Arc::new(StaticCheck(HealthStatus::Unhealthy)))
        .unwrap();
    app.monitor.health.run_all().await;

    let client = reqwest::Client::new();
    let response = client
        .get(&format!("{}/health", &app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 503);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["overall_status"], "unhealthy");
    assert_eq!(body["checks"]["broker"]["status"], "unhealthy");

    let ready = client
        .get(&format!("{}/health/ready", &app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(ready.status().as_u16(), 503);

    // Liveness stays green: the process itself answers.
    let live = client
        .get(&format!("{}/health/live", &app.address))
        .send()
        .await
        .unwrap();
    assert!(live.status().is_success());
}

#[tokio::test]
async fn degraded_instance_still_answers_200() {
    let app = spawn_app().await;
    app.monitor
        .health
        .register("cache", false, Arc::new(StaticCheck(HealthStatus::Unhealthy)))
        .unwrap();
    app.monitor.health.run_all().await;

    let client = reqwest::Client::new();
    let response = client
        .get(&format!("{}/health", &app.address))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["overall_status"], "degraded");

    let ready = client
        .get(&format!("{}/health/ready", &app.address))
        .send()
        .await
        .unwrap();
    assert!(ready.status().is_success());
}

#[tokio::test]
async fn unknown_check_name_is_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/health/checks/unknown-name", &app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn forced_check_runs_and_returns_the_result() {
    let app = spawn_app().await;
    app.monitor
        .health
        .register("db", false, Arc::new(StaticCheck(HealthStatus::Healthy)))
        .unwrap();

    let client = reqwest::Client::new();
    let response = client
        .get(&format!("{}/health/checks/db?force=true", &app.address))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["name"], "db");
    assert_eq!(body["status"], "healthy");
    assert!(body["duration_ms"].is_number());

    // The forced run is now the stored latest.
    let history = app.monitor.health.check_history("db", None).unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn unforced_read_never_executes_the_check() {
    let app = spawn_app().await;
    app.monitor
        .health
        .register("db", false, Arc::new(StaticCheck(HealthStatus::Healthy)))
        .unwrap();

    let client = reqwest::Client::new();
    let response = client
        .get(&format!("{}/health/checks/db", &app.address))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["name"], "db");
    assert_eq!(body["message"], "has not run yet");

    // The read left no trace: the check did not execute.
    assert!(app.monitor.health.check_history("db", None).unwrap().is_empty());
    assert!(app.monitor.health.latest_result("db").unwrap().is_none());
}

#[tokio::test]
async fn check_list_names_every_registration() {
    let app = spawn_app().await;
    app.monitor
        .health
        .register("a", false, Arc::new(StaticCheck(HealthStatus::Healthy)))
        .unwrap();
    app.monitor
        .health
        .register("b", true, Arc::new(StaticCheck(HealthStatus::Healthy)))
        .unwrap();

    let client = reqwest::Client::new();
    let response = client
        .get(&format!("{}/health/checks", &app.address))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["total_count"], 2);
}

#[tokio::test]
async fn health_history_is_served_oldest_first() {
    let app = spawn_app().await;
    app.monitor
        .health
        .register("db", false, Arc::new(StaticCheck(HealthStatus::Healthy)))
        .unwrap();
    app.monitor.health.run_all().await;
    app.monitor.health.record_overall();
    app.monitor.health.record_overall();

    let client = reqwest::Client::new();
    let response = client
        .get(&format!("{}/health/history?limit=1", &app.address))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["history"][0]["overall_status"], "healthy");
}
