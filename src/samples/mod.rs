//! Synthetic measurement records and the deterministic generator that
//! produces them.

#![allow(missing_docs)]

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// One synthetic timestamped measurement. Created by the generator,
/// consumed once by a reader, never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Ordering key: seconds since epoch, derived from the sequence index.
    pub ts: i64,
    pub label: String,
    pub concurrency: u32,
    pub response_time_ms: f64,
    pub success: bool,
}

/// One per-interval aggregate emitted by the pipeline to its listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRecord {
    pub ts: i64,
    pub throughput: usize,
    pub avg_response_time_ms: f64,
}

/// Outcome of one functional (pass/fail) test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionalStatus {
    Passed,
    Failed,
    Broken,
}

/// One record of the functional results pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionalSample {
    pub ts: i64,
    pub test_case: String,
    pub status: FunctionalStatus,
}

/// Deterministic sample factory with an explicit, injectable random source.
///
/// The ordering key is `base_ts + index`, so increasing indices always
/// produce increasing timestamps; only the auxiliary measurement fields
/// consume randomness.
#[derive(Debug)]
pub struct SampleGenerator<R = StdRng> {
    base_ts: i64,
    rng: R,
}

impl SampleGenerator<StdRng> {
    /// Reproducible generator: same seed, same samples.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// OS-entropy generator for tests that do not care about replay.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }
}

impl<R: Rng> SampleGenerator<R> {
    #[must_use]
    pub fn with_rng(rng: R) -> Self {
        Self {
            base_ts: Utc::now().timestamp(),
            rng,
        }
    }

    /// Pin the timestamp origin, for fully reproducible fixtures.
    #[must_use]
    pub fn with_base_ts(mut self, base_ts: i64) -> Self {
        self.base_ts = base_ts;
        self
    }

    /// One sample for the given sequence index.
    pub fn sample_at(&mut self, index: usize) -> Sample {
        let index_ts = i64::try_from(index).unwrap_or(i64::MAX);
        Sample {
            ts: self.base_ts.saturating_add(index_ts),
            label: "mock-scenario".to_string(),
            concurrency: self.rng.random_range(1..=100),
            response_time_ms: self.rng.random_range(0.5..1500.0),
            success: self.rng.random_bool(0.95),
        }
    }

    /// Zero to `max - 1` samples for the same index, emulating bursty
    /// arrival within one interval.
    pub fn burst_at(&mut self, index: usize, max: usize) -> Vec<Sample> {
        let count = self.rng.random_range(0..max.max(1));
        (0..count).map(|_| self.sample_at(index)).collect()
    }
}
