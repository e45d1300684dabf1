#[derive(Debug, Clone, serde::Deserialize)]
pub struct Settings {
    #[serde(default = "default_app_host")]
    pub app_host: String,
    #[serde(default = "default_app_port")]
    pub app_port: u16,
    #[serde(default)]
    pub health: HealthSettings,
    #[serde(default)]
    pub metrics: MetricsSettings,
    #[serde(default)]
    pub alerts: AlertSettings,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct HealthSettings {
    /// Interval of the scheduled check sweep.
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
    /// Deadline for a single check run.
    #[serde(default = "default_check_timeout")]
    pub check_timeout_secs: u64,
    /// Capacity of the overall-health snapshot ring.
    #[serde(default = "default_health_history")]
    pub history_capacity: usize,
    /// Capacity of each check's own result ring.
    #[serde(default = "default_per_check_history")]
    pub per_check_history_capacity: usize,
    /// Checks built from configuration at startup.
    #[serde(default)]
    pub checks: Vec<CheckSettings>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct CheckSettings {
    pub name: String,
    pub kind: CheckKind,
    /// `host:port` for tcp, a URL for http.
    pub target: String,
    #[serde(default)]
    pub critical: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    Tcp,
    Http,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MetricsSettings {
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval_secs: u64,
    #[serde(default = "default_metrics_history")]
    pub history_capacity: usize,
    /// Retained sample window per histogram series.
    #[serde(default = "default_histogram_window")]
    pub histogram_window: usize,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AlertSettings {
    #[serde(default = "default_evaluation_interval")]
    pub evaluation_interval_secs: u64,
    #[serde(default = "default_alert_history")]
    pub history_capacity: usize,
    /// Optional endpoint that receives fired and resolved alerts as JSON.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

fn default_app_host() -> String {
    "127.0.0.1".to_string()
}

fn default_app_port() -> u16 {
    8080
}

fn default_check_interval() -> u64 {
    30
}

fn default_check_timeout() -> u64 {
    5
}

fn default_health_history() -> usize {
    100
}

fn default_per_check_history() -> usize {
    50
}

fn default_snapshot_interval() -> u64 {
    60
}

fn default_metrics_history() -> usize {
    60
}

fn default_histogram_window() -> usize {
    1000
}

fn default_evaluation_interval() -> u64 {
    15
}

fn default_alert_history() -> usize {
    1000
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval(),
            check_timeout_secs: default_check_timeout(),
            history_capacity: default_health_history(),
            per_check_history_capacity: default_per_check_history(),
            checks: Vec::new(),
        }
    }
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            snapshot_interval_secs: default_snapshot_interval(),
            history_capacity: default_metrics_history(),
            histogram_window: default_histogram_window(),
        }
    }
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            evaluation_interval_secs: default_evaluation_interval(),
            history_capacity: default_alert_history(),
            webhook_url: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_host: default_app_host(),
            app_port: default_app_port(),
            health: HealthSettings::default(),
            metrics: MetricsSettings::default(),
            alerts: AlertSettings::default(),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // The configuration file is optional; every field has a default so the
    // server can start bare. Variables like
    // OPSWATCH__HEALTH__CHECK_INTERVAL_SECS=10 override file values.
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(config::Environment::with_prefix("OPSWATCH").separator("__"))
        .build()?;

    settings.try_deserialize()
}
