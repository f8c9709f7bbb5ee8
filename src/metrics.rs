use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};
use std::time::Instant;

use crate::Result;

lazy_static! {
    pub static ref SIMULATOR_UP: IntGauge = register_int_gauge!(
        "simulator_up",
        "Whether the simulator is serving (1) or not (0)"
    ).unwrap();

    // Request metrics
    pub static ref REQUEST_COUNTER: IntCounterVec = register_int_counter_vec!(
        "requests_total",
        "Total number of requests received",
        &["endpoint"]
    ).unwrap();

    pub static ref REQUEST_DURATION: HistogramVec = register_histogram_vec!(
        "request_duration_seconds",
        "Request duration in seconds",
        &["endpoint"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]
    ).unwrap();

    pub static ref AUTH_FAILURES: IntCounterVec = register_int_counter_vec!(
        "auth_failures_total",
        "Requests rejected by key authentication",
        &["reason"]
    ).unwrap();

    // Generator metrics
    pub static ref SERIES_GENERATED: IntCounter = register_int_counter!(
        "series_generated_total",
        "Total number of synthetic series returned"
    ).unwrap();

    pub static ref POINTS_GENERATED: IntCounter = register_int_counter!(
        "points_generated_total",
        "Total number of synthetic points returned"
    ).unwrap();
}

pub fn init_metrics() {
    SIMULATOR_UP.set(1);
}

/// Counts the request on creation and records its duration on drop.
pub struct RequestTimer {
    endpoint: &'static str,
    start: Instant,
}

impl RequestTimer {
    pub fn new(endpoint: &'static str) -> Self {
        REQUEST_COUNTER.with_label_values(&[endpoint]).inc();
        Self {
            endpoint,
            start: Instant::now(),
        }
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        REQUEST_DURATION
            .with_label_values(&[self.endpoint])
            .observe(duration);
    }
}

pub fn record_auth_failure(reason: &str) {
    AUTH_FAILURES.with_label_values(&[reason]).inc();
}

pub fn record_generated(series: usize, points: usize) {
    SERIES_GENERATED.inc_by(series as u64);
    POINTS_GENERATED.inc_by(points as u64);
}

/// Renders the default registry in the prometheus text format.
pub fn render() -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;

    String::from_utf8(buffer)
        .map_err(|e| crate::SimulatorError::Internal(format!("metrics are not utf-8: {}", e)))
}
