use async_trait::async_trait;
use opswatch::configuration::Settings;
use opswatch::health::{CheckOutput, HealthCheck, HealthStatus};
use opswatch::startup::{run, Monitor};
use std::sync::Arc;

pub struct TestApp {
    pub address: String,
    pub monitor: Arc<Monitor>,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(Settings::default()).await
}

// Server runs on a random port in a background task; tests drive the
// engines directly through the monitor handle instead of waiting for
// scheduler ticks.
pub async fn spawn_app_with(settings: Settings) -> TestApp {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let monitor = Arc::new(Monitor::new(&settings));
    let server = run(listener, monitor.clone(), settings)
        .await
        .expect("Failed to bind address.");
    tokio::spawn(server);

    TestApp { address, monitor }
}

pub struct StaticCheck(pub HealthStatus);

#[async_trait]
impl HealthCheck for StaticCheck {
    async fn check(&self) -> anyhow::Result<CheckOutput> {
        Ok(CheckOutput {
            status: self.0,
            message: format!("always {}", self.0.as_str()),
        })
    }
}
