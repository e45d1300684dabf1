use super::models::{HistogramData, MetricSnapshot, Series, SeriesKey};
use crate::configuration::MetricsSettings;
use crate::errors::MonitorError;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::RwLock;

/// Thread-safe store for counters, gauges and histograms.
///
/// Series live in a sharded map so writers to unrelated series never block
/// each other; a snapshot is consistent per series, not across the map.
/// The first write to a `(name, labels)` pair fixes its variant for the
/// life of the process.
pub struct MetricStore {
    series: DashMap<SeriesKey, Series>,
    histogram_window: usize,
    history: RwLock<VecDeque<MetricSnapshot>>,
    history_capacity: usize,
}

impl MetricStore {
    pub fn new(settings: &MetricsSettings) -> Self {
        Self {
            series: DashMap::new(),
            histogram_window: settings.histogram_window,
            history: RwLock::new(VecDeque::with_capacity(settings.history_capacity)),
            history_capacity: settings.history_capacity,
        }
    }

    pub fn increment_counter(
        &self,
        name: &str,
        labels: &[(&str, &str)],
        delta: i64,
    ) -> Result<(), MonitorError> {
        if delta < 0 {
            return Err(MonitorError::InvalidArgument(format!(
                "counter {} cannot be decremented (delta {})",
                name, delta
            )));
        }
        let key = SeriesKey::new(name, labels);
        match self.series.entry(key) {
            Entry::Occupied(mut entry) => match entry.get_mut() {
                Series::Counter(value) => {
                    *value += delta as u64;
                    Ok(())
                }
                other => Err(kind_mismatch(name, "counter", other.kind())),
            },
            Entry::Vacant(entry) => {
                entry.insert(Series::Counter(delta as u64));
                Ok(())
            }
        }
    }

    pub fn set_gauge(
        &self,
        name: &str,
        labels: &[(&str, &str)],
        value: f64,
    ) -> Result<(), MonitorError> {
        let key = SeriesKey::new(name, labels);
        match self.series.entry(key) {
            Entry::Occupied(mut entry) => match entry.get_mut() {
                Series::Gauge(current) => {
                    *current = value;
                    Ok(())
                }
                other => Err(kind_mismatch(name, "gauge", other.kind())),
            },
            Entry::Vacant(entry) => {
                entry.insert(Series::Gauge(value));
                Ok(())
            }
        }
    }

    /// Delta may be negative; gauges move both ways.
    pub fn add_gauge(
        &self,
        name: &str,
        labels: &[(&str, &str)],
        delta: f64,
    ) -> Result<(), MonitorError> {
        let key = SeriesKey::new(name, labels);
        match self.series.entry(key) {
            Entry::Occupied(mut entry) => match entry.get_mut() {
                Series::Gauge(current) => {
                    *current += delta;
                    Ok(())
                }
                other => Err(kind_mismatch(name, "gauge", other.kind())),
            },
            Entry::Vacant(entry) => {
                entry.insert(Series::Gauge(delta));
                Ok(())
            }
        }
    }

    pub fn observe_histogram(
        &self,
        name: &str,
        labels: &[(&str, &str)],
        value: f64,
    ) -> Result<(), MonitorError> {
        let key = SeriesKey::new(name, labels);
        match self.series.entry(key) {
            Entry::Occupied(mut entry) => match entry.get_mut() {
                Series::Histogram(data) => {
                    data.observe(value);
                    Ok(())
                }
                other => Err(kind_mismatch(name, "histogram", other.kind())),
            },
            Entry::Vacant(entry) => {
                let mut data = HistogramData::new(self.histogram_window);
                data.observe(value);
                entry.insert(Series::Histogram(data));
                Ok(())
            }
        }
    }

    /// Point-in-time copy of all series. Each entry is read under its shard
    /// lock, so no series is ever observed mid-write.
    pub fn snapshot(&self) -> MetricSnapshot {
        let mut snapshot = MetricSnapshot::empty();
        snapshot.timestamp = Utc::now();
        for entry in self.series.iter() {
            let rendered = entry.key().render();
            match entry.value() {
                Series::Counter(value) => {
                    snapshot.counters.insert(rendered, *value);
                }
                Series::Gauge(value) => {
                    snapshot.gauges.insert(rendered, *value);
                }
                Series::Histogram(data) => {
                    snapshot.histograms.insert(rendered, data.to_snapshot());
                }
            }
        }
        snapshot
    }

    /// Takes a snapshot and appends it to the bounded history ring.
    /// Called by the scheduler once per snapshot interval.
    pub fn record_snapshot(&self) -> MetricSnapshot {
        let snapshot = self.snapshot();
        let mut history = self.history.write().unwrap();
        if history.len() >= self.history_capacity {
            history.pop_front();
        }
        history.push_back(snapshot.clone());
        snapshot
    }

    /// Past snapshots, oldest first. `limit` keeps the newest entries.
    pub fn history(&self, limit: Option<usize>) -> Vec<MetricSnapshot> {
        let history = self.history.read().unwrap();
        let skip = limit
            .map(|l| history.len().saturating_sub(l))
            .unwrap_or(0);
        history.iter().skip(skip).cloned().collect()
    }

    pub fn export_prometheus(&self) -> String {
        super::prometheus::render(&self.snapshot())
    }
}

fn kind_mismatch(name: &str, wanted: &str, found: &str) -> MonitorError {
    MonitorError::InvalidArgument(format!(
        "metric {} is a {}, not a {}",
        name, found, wanted
    ))
}
