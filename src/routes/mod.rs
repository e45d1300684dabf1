pub mod alerts;
pub mod health;
pub mod metrics;
pub mod system;

use serde::Deserialize;

/// `?limit=N` on every history endpoint keeps the newest N entries.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}
