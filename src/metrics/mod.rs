//! In-process metrics for the HTTP surface and the event pipeline.
//!
//! Counters, gauges and histograms live in a process-global registry and are
//! served in Prometheus text form at `/metrics` and as JSON at `/metrics/json`.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::json;
use tracing::info;

/// Monotonically increasing counter.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    value: Arc<AtomicU64>,
}

impl Counter {
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, delta: u64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Point-in-time value. Stores the f64 bit pattern so readings round-trip exactly.
#[derive(Debug, Clone, Default)]
pub struct Gauge {
    bits: Arc<AtomicU64>,
}

impl Gauge {
    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

/// Running count and sum of observations.
#[derive(Debug, Clone, Default)]
pub struct Histogram {
    count: Arc<AtomicU64>,
    sum_bits: Arc<AtomicU64>,
}

impl Histogram {
    pub fn observe(&self, value: f64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        let _ = self
            .sum_bits
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                Some((f64::from_bits(bits) + value).to_bits())
            });
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> f64 {
        f64::from_bits(self.sum_bits.load(Ordering::Relaxed))
    }
}

/// Process-wide registry keyed by metric name.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    counters: DashMap<String, Counter>,
    gauges: DashMap<String, Gauge>,
    histograms: DashMap<String, Histogram>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> Counter {
        self.counters.entry(name.to_string()).or_default().clone()
    }

    pub fn gauge(&self, name: &str) -> Gauge {
        self.gauges.entry(name.to_string()).or_default().clone()
    }

    pub fn histogram(&self, name: &str) -> Histogram {
        self.histograms.entry(name.to_string()).or_default().clone()
    }

    /// Prometheus text exposition. Names come out sorted so scrapes are stable.
    pub fn export_text(&self) -> String {
        let mut out = String::new();

        let mut counters: Vec<(String, u64)> = self
            .counters
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().get()))
            .collect();
        counters.sort();
        for (name, value) in counters {
            let _ = writeln!(out, "# TYPE {name} counter");
            let _ = writeln!(out, "{name} {value}");
        }

        let mut gauges: Vec<(String, f64)> = self
            .gauges
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().get()))
            .collect();
        gauges.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, value) in gauges {
            let _ = writeln!(out, "# TYPE {name} gauge");
            let _ = writeln!(out, "{name} {value}");
        }

        let mut histograms: Vec<(String, u64, f64)> = self
            .histograms
            .iter()
            .map(|entry| {
                (
                    entry.key().clone(),
                    entry.value().count(),
                    entry.value().sum(),
                )
            })
            .collect();
        histograms.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, count, sum) in histograms {
            let _ = writeln!(out, "# TYPE {name} histogram");
            let _ = writeln!(out, "{name}_count {count}");
            let _ = writeln!(out, "{name}_sum {sum}");
        }

        out
    }

    /// JSON rendering, handy for inspection without a Prometheus scraper.
    pub fn export_json(&self) -> serde_json::Value {
        let mut counter_pairs: Vec<(String, u64)> = self
            .counters
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().get()))
            .collect();
        counter_pairs.sort();
        let mut counters = serde_json::Map::new();
        for (name, value) in counter_pairs {
            counters.insert(name, json!(value));
        }

        let mut gauge_pairs: Vec<(String, f64)> = self
            .gauges
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().get()))
            .collect();
        gauge_pairs.sort_by(|a, b| a.0.cmp(&b.0));
        let mut gauges = serde_json::Map::new();
        for (name, value) in gauge_pairs {
            gauges.insert(name, json!(value));
        }

        let mut histogram_triples: Vec<(String, u64, f64)> = self
            .histograms
            .iter()
            .map(|entry| {
                (
                    entry.key().clone(),
                    entry.value().count(),
                    entry.value().sum(),
                )
            })
            .collect();
        histogram_triples.sort_by(|a, b| a.0.cmp(&b.0));
        let mut histograms = serde_json::Map::new();
        for (name, count, sum) in histogram_triples {
            histograms.insert(name, json!({ "count": count, "sum": sum }));
        }

        json!({
            "counters": counters,
            "gauges": gauges,
            "histograms": histograms,
        })
    }
}

lazy_static::lazy_static! {
    pub static ref METRICS: MetricsRegistry = MetricsRegistry::new();
}

/// Bumps counter `name` by one.
pub fn increment_counter(name: &str) {
    METRICS.counter(name).inc();
}

/// Sets gauge `name` to `value`.
pub fn set_gauge(name: &str, value: f64) {
    METRICS.gauge(name).set(value);
}

/// Adds one observation to histogram `name`.
pub fn observe_histogram(name: &str, value: f64) {
    METRICS.histogram(name).observe(value);
}

/// Body for `GET /metrics`.
pub async fn metrics_handler() -> String {
    METRICS.export_text()
}

/// Body for `GET /metrics/json`.
pub async fn metrics_json_handler() -> serde_json::Value {
    METRICS.export_json()
}

/// Records process start time so scrapes can derive uptime.
pub fn init_metrics() {
    set_gauge(
        "process_start_time_seconds",
        chrono::Utc::now().timestamp() as f64,
    );
    info!("Metrics registry initialized");
}
