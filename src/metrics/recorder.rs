use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;

use super::QueryType;

/// One recorded store round-trip.
#[derive(Debug, Clone)]
pub struct LatencySample {
    pub query_type: QueryType,
    pub duration_ns: u64,
}

/// Bounded in-process history of latency samples; the oldest sample is
/// evicted once `capacity` is reached.
#[derive(Debug)]
pub struct LatencyRecorder {
    samples: VecDeque<LatencySample>,
    capacity: usize,
}

impl LatencyRecorder {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn record(&mut self, sample: LatencySample) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[cfg(test)]
    pub fn samples(&self) -> impl Iterator<Item = &LatencySample> {
        self.samples.iter()
    }

    /// Aggregate stats per query type, ordered by label.
    pub fn summary(&self) -> Vec<LatencySummary> {
        let mut by_type: BTreeMap<&'static str, Vec<u64>> = BTreeMap::new();
        for s in &self.samples {
            by_type
                .entry(s.query_type.as_str())
                .or_default()
                .push(s.duration_ns);
        }

        by_type
            .into_iter()
            .map(|(query_type, mut durations)| {
                durations.sort_unstable();
                let count = durations.len();
                let total: u64 = durations.iter().sum();
                let at = |q: f64| durations[((count as f64 * q) as usize).min(count - 1)];

                LatencySummary {
                    query_type,
                    sample_count: count,
                    min_ms: ms(durations[0]),
                    max_ms: ms(durations[count - 1]),
                    avg_ms: ms(total / count as u64),
                    p50_ms: ms(durations[count / 2]),
                    p95_ms: ms(at(0.95)),
                    p99_ms: ms(at(0.99)),
                }
            })
            .collect()
    }
}

fn ms(ns: u64) -> f64 {
    ns as f64 / 1_000_000.0
}

#[derive(Debug, Clone, Serialize)]
pub struct LatencySummary {
    pub query_type: &'static str,
    pub sample_count: usize,
    pub min_ms: f64,
    pub max_ms: f64,
    pub avg_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}
