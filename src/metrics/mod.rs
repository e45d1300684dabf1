pub mod models;
pub mod prometheus;
pub mod store;

pub use models::{HistogramSnapshot, MetricSnapshot, SeriesKey};
pub use store::MetricStore;
