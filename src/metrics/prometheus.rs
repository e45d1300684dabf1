use super::models::MetricSnapshot;
use std::collections::BTreeMap;

/// Renders a snapshot in the Prometheus text exposition format.
///
/// Counters are suffixed `_total` per convention; histograms expand into
/// the cumulative `_bucket`/`_sum`/`_count` triad with a trailing `+Inf`
/// bucket. Series are grouped by family first, so each `# TYPE` header is
/// emitted exactly once even when a bare series and a labeled series of
/// the same name are split by another name in key order. Snapshot maps
/// are sorted, so output is deterministic.
pub fn render(snapshot: &MetricSnapshot) -> String {
    let mut lines = Vec::new();

    for (name, series) in grouped(&snapshot.counters) {
        lines.push(format!("# TYPE {}_total counter", name));
        for (labels, value) in series {
            lines.push(format!("{}_total{} {}", name, braced(labels), value));
        }
    }

    for (name, series) in grouped(&snapshot.gauges) {
        lines.push(format!("# TYPE {} gauge", name));
        for (labels, value) in series {
            lines.push(format!("{}{} {}", name, braced(labels), value));
        }
    }

    for (name, series) in grouped(&snapshot.histograms) {
        lines.push(format!("# TYPE {} histogram", name));
        for (labels, hist) in series {
            for bucket in &hist.buckets {
                lines.push(format!(
                    "{}_bucket{{{}le=\"{}\"}} {}",
                    name,
                    label_prefix(labels),
                    bucket.le,
                    bucket.count
                ));
            }
            lines.push(format!(
                "{}_bucket{{{}le=\"+Inf\"}} {}",
                name,
                label_prefix(labels),
                hist.count
            ));
            lines.push(format!("{}_sum{} {}", name, braced(labels), hist.sum));
            lines.push(format!("{}_count{} {}", name, braced(labels), hist.count));
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Buckets rendered keys by family name. Within a family the bare series
/// sorts first, then labeled series in key order.
fn grouped<V>(map: &BTreeMap<String, V>) -> BTreeMap<&str, Vec<(&str, &V)>> {
    let mut families: BTreeMap<&str, Vec<(&str, &V)>> = BTreeMap::new();
    for (key, value) in map {
        let (name, labels) = split_key(key);
        families.entry(name).or_default().push((labels, value));
    }
    families
}

/// Splits a rendered series key back into `(name, labels)`.
fn split_key(key: &str) -> (&str, &str) {
    match key.split_once('{') {
        Some((name, rest)) => (name, rest.trim_end_matches('}')),
        None => (key, ""),
    }
}

fn braced(labels: &str) -> String {
    if labels.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", labels)
    }
}

fn label_prefix(labels: &str) -> String {
    if labels.is_empty() {
        String::new()
    } else {
        format!("{},", labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::MetricsSettings;
    use crate::metrics::MetricStore;

    #[test]
    fn counters_are_suffixed_total() {
        let store = MetricStore::new(&MetricsSettings::default());
        store.increment_counter("requests", &[], 7).unwrap();
        let text = store.export_prometheus();
        assert!(text.contains("# TYPE requests_total counter"));
        assert!(text.contains("requests_total 7"));
    }

    #[test]
    fn labels_are_rendered_inline() {
        let store = MetricStore::new(&MetricsSettings::default());
        store
            .increment_counter("req", &[("code", "200"), ("method", "GET")], 3)
            .unwrap();
        store.set_gauge("load", &[("host", "a")], 0.5).unwrap();
        let text = store.export_prometheus();
        assert!(text.contains("req_total{code=\"200\",method=\"GET\"} 3"));
        assert!(text.contains("load{host=\"a\"} 0.5"));
    }

    #[test]
    fn histogram_expands_into_the_triad() {
        let store = MetricStore::new(&MetricsSettings::default());
        store.observe_histogram("latency", &[], 0.25).unwrap();
        store.observe_histogram("latency", &[], 0.5).unwrap();
        let text = store.export_prometheus();
        assert!(text.contains("# TYPE latency histogram"));
        assert!(text.contains("latency_bucket{le=\"0.25\"} 1"));
        assert!(text.contains("latency_bucket{le=\"0.5\"} 2"));
        assert!(text.contains("latency_bucket{le=\"+Inf\"} 2"));
        assert!(text.contains("latency_count 2"));
        assert!(text.contains("latency_sum 0.75"));
    }

    #[test]
    fn families_stay_grouped_despite_interleaving_key_order() {
        let store = MetricStore::new(&MetricsSettings::default());
        // Keys sort op < opx < op{a="1"}, splitting the op family.
        store.increment_counter("op", &[], 1).unwrap();
        store.increment_counter("opx", &[], 9).unwrap();
        store.increment_counter("op", &[("a", "1")], 2).unwrap();
        let text = store.export_prometheus();

        assert_eq!(text.matches("# TYPE op_total counter").count(), 1);
        let lines: Vec<&str> = text.lines().collect();
        let header = lines
            .iter()
            .position(|l| *l == "# TYPE op_total counter")
            .unwrap();
        assert_eq!(lines[header + 1], "op_total 1");
        assert_eq!(lines[header + 2], "op_total{a=\"1\"} 2");
    }

    #[test]
    fn exposition_matches_the_json_snapshot() {
        let store = MetricStore::new(&MetricsSettings::default());
        store.increment_counter("ops", &[], 5).unwrap();
        store.observe_histogram("dur", &[], 1.5).unwrap();
        let snapshot = store.snapshot();
        let text = render(&snapshot);
        assert!(text.contains(&format!("ops_total {}", snapshot.counters["ops"])));
        let hist = &snapshot.histograms["dur"];
        assert!(text.contains(&format!("dur_count {}", hist.count)));
        assert!(text.contains(&format!("dur_sum {}", hist.sum)));
    }
}
