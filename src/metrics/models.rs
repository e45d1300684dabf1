use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Upper bounds shared by every histogram series, in seconds.
/// Observations above the last bound only land in the implicit `+Inf` bucket.
pub(crate) const DEFAULT_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Identity of one time series: metric name plus its label set.
/// Labels are kept sorted so that `{a="1",b="2"}` and `{b="2",a="1"}`
/// are the same series.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub name: String,
    pub labels: Vec<(String, String)>,
}

impl SeriesKey {
    pub fn new(name: &str, labels: &[(&str, &str)]) -> Self {
        let mut labels: Vec<(String, String)> = labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        labels.sort();
        Self {
            name: name.to_string(),
            labels,
        }
    }

    /// Rendered form used as the JSON map key and as the Prometheus series
    /// reference: `name{k="v",...}`, or the bare name when unlabeled.
    pub fn render(&self) -> String {
        if self.labels.is_empty() {
            return self.name.clone();
        }
        let labels = self
            .labels
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, v))
            .collect::<Vec<_>>()
            .join(",");
        format!("{}{{{}}}", self.name, labels)
    }
}

/// One live series. The variant is fixed by the first write.
#[derive(Debug, Clone)]
pub(crate) enum Series {
    Counter(u64),
    Gauge(f64),
    Histogram(HistogramData),
}

impl Series {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Series::Counter(_) => "counter",
            Series::Gauge(_) => "gauge",
            Series::Histogram(_) => "histogram",
        }
    }
}

/// Running histogram state: a bounded sample window for quantiles plus
/// cumulative bucket counts for the Prometheus triad.
#[derive(Debug, Clone)]
pub(crate) struct HistogramData {
    window: VecDeque<f64>,
    window_cap: usize,
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    /// `(le, cumulative count)` in ascending `le` order.
    buckets: Vec<(f64, u64)>,
}

impl HistogramData {
    pub(crate) fn new(window_cap: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(window_cap.min(1024)),
            window_cap,
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            buckets: DEFAULT_BUCKETS.iter().map(|le| (*le, 0)).collect(),
        }
    }

    pub(crate) fn observe(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        if self.window.len() >= self.window_cap {
            self.window.pop_front();
        }
        self.window.push_back(value);
        for (le, count) in self.buckets.iter_mut() {
            if value <= *le {
                *count += 1;
            }
        }
    }

    /// Nearest-rank quantile over a sorted copy of the retained window.
    /// Quantiles therefore describe the last `window_cap` observations,
    /// while count/sum/buckets cover the whole process lifetime.
    fn quantile(&self, q: f64) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let mut sorted: Vec<f64> = self.window.iter().copied().collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let rank = ((q * sorted.len() as f64).ceil() as usize).max(1);
        sorted[rank.min(sorted.len()) - 1]
    }

    pub(crate) fn to_snapshot(&self) -> HistogramSnapshot {
        HistogramSnapshot {
            count: self.count,
            sum: self.sum,
            min: if self.count > 0 { self.min } else { 0.0 },
            max: if self.count > 0 { self.max } else { 0.0 },
            mean: if self.count > 0 {
                self.sum / self.count as f64
            } else {
                0.0
            },
            p50: self.quantile(0.50),
            p90: self.quantile(0.90),
            p99: self.quantile(0.99),
            buckets: self
                .buckets
                .iter()
                .map(|(le, count)| BucketCount {
                    le: *le,
                    count: *count,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BucketCount {
    pub le: f64,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistogramSnapshot {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
    pub buckets: Vec<BucketCount>,
}

/// Point-in-time copy of every series, keyed by the rendered series key.
/// Consistency is per series, not across the whole map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub timestamp: DateTime<Utc>,
    pub counters: BTreeMap<String, u64>,
    pub gauges: BTreeMap<String, f64>,
    pub histograms: BTreeMap<String, HistogramSnapshot>,
}

impl MetricSnapshot {
    pub fn empty() -> Self {
        Self {
            timestamp: Utc::now(),
            counters: BTreeMap::new(),
            gauges: BTreeMap::new(),
            histograms: BTreeMap::new(),
        }
    }
}
