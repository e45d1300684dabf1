mod common;

use common::spawn_app;

#[tokio::test]
async fn json_snapshot_serves_written_series() {
    let app = spawn_app().await;
    app.monitor
        .metrics
        .increment_counter("messages_consumed", &[("topic", "orders")], 42)
        .unwrap();
    app.monitor
        .metrics
        .set_gauge("consumer_lag", &[], 7.0)
        .unwrap();

    let client = reqwest::Client::new();
    let response = client
        .get(&format!("{}/metrics", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["counters"]["messages_consumed{topic=\"orders\"}"], 42);
    assert_eq!(body["gauges"]["consumer_lag"], 7.0);
}

#[tokio::test]
async fn prometheus_exposition_has_the_right_content_type() {
    let app = spawn_app().await;
    app.monitor
        .metrics
        .increment_counter("messages_consumed", &[], 3)
        .unwrap();
    app.monitor
        .metrics
        .observe_histogram("consume_latency", &[], 0.25)
        .unwrap();

    let client = reqwest::Client::new();
    let response = client
        .get(&format!("{}/metrics/prometheus", &app.address))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));
    assert!(content_type.contains("version=0.0.4"));

    let body = response.text().await.unwrap();
    assert!(body.contains("# TYPE messages_consumed_total counter"));
    assert!(body.contains("messages_consumed_total 3"));
    assert!(body.contains("consume_latency_bucket{le=\"+Inf\"} 1"));
    assert!(body.contains("consume_latency_count 1"));
}

#[tokio::test]
async fn history_limit_keeps_the_newest_snapshots() {
    let app = spawn_app().await;
    for value in [1.0, 2.0, 3.0] {
        app.monitor.metrics.set_gauge("load", &[], value).unwrap();
        app.monitor.metrics.record_snapshot();
    }

    let client = reqwest::Client::new();
    let response = client
        .get(&format!("{}/metrics/history?limit=2", &app.address))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["count"], 2);
    assert_eq!(body["history"][0]["gauges"]["load"], 2.0);
    assert_eq!(body["history"][1]["gauges"]["load"], 3.0);
}

#[tokio::test]
async fn every_request_is_counted() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    client
        .get(&format!("{}/info", &app.address))
        .send()
        .await
        .unwrap();

    let response = client
        .get(&format!("{}/metrics", &app.address))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["counters"]["opswatch_requests_total"].as_u64().unwrap() >= 1);
    assert!(body["histograms"]["opswatch_request_duration_seconds"]["count"]
        .as_u64()
        .unwrap()
        >= 1);
}

#[tokio::test]
async fn client_errors_feed_the_error_counter() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let missing = client
        .get(&format!("{}/no-such-route", &app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);

    let response = client
        .get(&format!("{}/metrics", &app.address))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["counters"]["opswatch_errors_total"].as_u64().unwrap() >= 1);
}
