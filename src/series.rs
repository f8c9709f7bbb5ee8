//! Synthetic time-series generation.
//!
//! Every series is a noisy sine wave around a random base value with the
//! occasional spike. The random source is owned by the generator, so a
//! generator built from a fixed seed reproduces the same output.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_INTERVAL_SECS: u32 = 20;
pub const INSTANCE_IDS: [&str; 4] = ["0", "1", "2", "3"];
/// Upper bound on points in one series; larger ranges are refused by the API.
pub const MAX_POINTS_PER_SERIES: u64 = 500_000;

const BASE_RANGE: (f64, f64) = (2.0, 10.0);
const NOISE_RANGE: (f64, f64) = (-2.0, 2.0);
const SINE_AMPLITUDE: f64 = 3.0;
const SINE_PERIOD_DIVISOR: f64 = 100.0;
const SPIKE_PROBABILITY: f64 = 0.05;
const SPIKE_RANGE: (f64, f64) = (20.0, 50.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub from: i64,
    pub to: i64,
}

impl TimeRange {
    pub fn new(from: i64, to: i64) -> Self {
        Self { from, to }
    }

    pub fn from_millis(&self) -> i64 {
        self.from.saturating_mul(1000)
    }

    pub fn to_millis(&self) -> i64 {
        self.to.saturating_mul(1000)
    }

    /// Number of points `generate_pointlist` emits for this range.
    pub fn point_count(&self, interval_secs: u32) -> u64 {
        let from_ms = i128::from(self.from_millis());
        let to_ms = i128::from(self.to_millis());
        if to_ms < from_ms {
            return 0;
        }
        let step_ms = i128::from(effective_interval(interval_secs)) * 1000;
        u64::try_from((to_ms - from_ms) / step_ms + 1).unwrap_or(u64::MAX)
    }
}

/// Zero would never advance the clock; it is served as one second.
pub fn effective_interval(interval_secs: u32) -> u32 {
    interval_secs.max(1)
}

/// `[timestamp_ms, value]`, serialised as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point(pub f64, pub f64);

impl Point {
    pub fn timestamp(&self) -> f64 {
        self.0
    }

    pub fn value(&self) -> f64 {
        self.1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub aggr: String,
    pub attributes: HashMap<String, String>,
    pub display_name: String,
    pub end: i64,
    pub expression: String,
    pub interval: u32,
    pub length: usize,
    pub metric: String,
    pub pointlist: Vec<Point>,
    pub query_index: u32,
    pub scope: String,
    pub start: i64,
    pub tag_set: Vec<String>,
    pub unit: Option<String>,
}

pub struct SeriesGenerator<R = StdRng> {
    rng: R,
}

impl SeriesGenerator<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Seeded when `seed` is set, entropy-backed otherwise.
    pub fn with_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }
}

impl<R: Rng> SeriesGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Build one series, or four when grouping by `instance`.
    pub fn generate(
        &mut self,
        range: TimeRange,
        group_by: &[String],
        tags: &[String],
        metric: &str,
        aggregation: &str,
        interval_secs: u32,
    ) -> Vec<Series> {
        let interval_secs = effective_interval(interval_secs);
        let instances: &[&str] = if groups_by_instance(group_by) {
            &INSTANCE_IDS
        } else {
            &INSTANCE_IDS[..1]
        };
        let fan_out = instances.len() > 1;

        instances
            .iter()
            .map(|instance| {
                let mut tag_set: Vec<String> = tags
                    .iter()
                    .filter_map(|tag| tag.split_once(':'))
                    .map(|(key, value)| format!("{key}:{value}"))
                    .collect();
                if fan_out {
                    tag_set.push(format!("instance:{instance}"));
                }

                let pointlist = self.generate_pointlist(range, interval_secs);
                let joined = tag_set.join(",");

                Series {
                    aggr: aggregation.to_string(),
                    attributes: HashMap::new(),
                    display_name: metric.to_string(),
                    end: range.to_millis(),
                    expression: format!("{aggregation}:{metric}{{{joined}}}"),
                    interval: interval_secs,
                    length: pointlist.len(),
                    metric: metric.to_string(),
                    pointlist,
                    query_index: 0,
                    scope: joined,
                    start: range.from_millis(),
                    tag_set,
                    unit: None,
                }
            })
            .collect()
    }

    /// Points from `range.from` to `range.to` inclusive, `interval_secs` apart.
    /// An inverted range yields no points.
    pub fn generate_pointlist(&mut self, range: TimeRange, interval_secs: u32) -> Vec<Point> {
        let from_ms = range.from_millis();
        let to_ms = range.to_millis();
        let step_ms = i64::from(effective_interval(interval_secs)) * 1000;

        let base_value = self.rng.gen_range(BASE_RANGE.0..=BASE_RANGE.1);
        let mut points = Vec::new();
        let mut current = from_ms;

        while current <= to_ms {
            let elapsed = (current - from_ms) as f64 / 1000.0;
            let mut value = base_value
                + (elapsed / SINE_PERIOD_DIVISOR).sin() * SINE_AMPLITUDE
                + self.rng.gen_range(NOISE_RANGE.0..=NOISE_RANGE.1);

            if self.rng.gen::<f64>() < SPIKE_PROBABILITY {
                value += self.rng.gen_range(SPIKE_RANGE.0..=SPIKE_RANGE.1);
            }

            points.push(Point(current as f64, value.max(0.0)));

            current = match current.checked_add(step_ms) {
                Some(next) => next,
                None => break,
            };
        }

        points
    }
}

/// Exact membership or a raw substring hit anywhere in the dimension list,
/// so `instances` or `host_instance` also fan out.
pub fn groups_by_instance(group_by: &[String]) -> bool {
    group_by.iter().any(|dimension| dimension == "instance")
        || group_by.join(",").contains("instance")
}
