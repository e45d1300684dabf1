pub mod engine;
pub mod models;
pub mod notify;
pub mod rules;

pub use engine::AlertEngine;
pub use models::{Alert, AlertRule, AlertSeverity, AlertState};
pub use notify::{AlertNotifier, LogNotifier, WebhookNotifier};
