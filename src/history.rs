//! Bounded sample history
//!
//! Anxiety and heart-rate readings are kept by the caller in a fixed-size
//! ring buffer and handed to the engine on every call. The engine only reads
//! from it; appending is the caller's job between invocations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of samples retained per history
pub const DEFAULT_HISTORY_CAPACITY: usize = 30;

/// A single timestamped reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub value: f64,
    /// When the reading was taken. Absent for legacy producers that only
    /// sample on a fixed cadence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<DateTime<Utc>>,
}

impl Sample {
    pub fn new(value: f64) -> Self {
        Self { value, at: None }
    }

    pub fn at(value: f64, at: DateTime<Utc>) -> Self {
        Self {
            value,
            at: Some(at),
        }
    }
}

/// Append-only, most-recent-N history of samples (oldest first)
///
/// Deserializes from either `{"samples": [...], "capacity": n}` or a bare
/// array whose items are numbers or `{"value", "at"}` objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "HistoryRepr")]
pub struct SampleHistory {
    samples: VecDeque<Sample>,
    capacity: usize,
}

fn default_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SampleRepr {
    Bare(f64),
    Full(Sample),
}

impl From<SampleRepr> for Sample {
    fn from(repr: SampleRepr) -> Self {
        match repr {
            SampleRepr::Bare(value) => Sample::new(value),
            SampleRepr::Full(sample) => sample,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryRepr {
    Values(Vec<SampleRepr>),
    Full {
        samples: Vec<SampleRepr>,
        #[serde(default = "default_capacity")]
        capacity: usize,
    },
}

impl From<HistoryRepr> for SampleHistory {
    fn from(repr: HistoryRepr) -> Self {
        let (samples, capacity) = match repr {
            HistoryRepr::Values(samples) => {
                let capacity = samples.len().max(DEFAULT_HISTORY_CAPACITY);
                (samples, capacity)
            }
            HistoryRepr::Full { samples, capacity } => (samples, capacity),
        };
        let mut history = SampleHistory::new(capacity);
        for sample in samples {
            history.push(sample.into());
        }
        history
    }
}

impl Default for SampleHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl SampleHistory {
    /// Create an empty history retaining at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build a history from untimed values, as produced by fixed-cadence sources
    pub fn from_values(values: &[f64]) -> Self {
        let mut history = Self::new(values.len().max(DEFAULT_HISTORY_CAPACITY));
        for &value in values {
            history.push(Sample::new(value));
        }
        history
    }

    /// Append a sample, evicting the oldest once capacity is reached
    pub fn push(&mut self, sample: Sample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Sample> + ExactSizeIterator {
        self.samples.iter()
    }

    /// The last `n` samples, oldest first. Returns `None` if fewer are held.
    pub fn tail(&self, n: usize) -> Option<Vec<Sample>> {
        if self.samples.len() < n {
            return None;
        }
        Some(self.samples.iter().skip(self.samples.len() - n).copied().collect())
    }

    /// A copy holding only the newest `n` samples
    pub fn recent(&self, n: usize) -> SampleHistory {
        let mut window = SampleHistory::new(n);
        for sample in self.samples.iter().skip(self.samples.len().saturating_sub(n)) {
            window.push(*sample);
        }
        window
    }

    /// A copy with every value passed through `f`, timestamps kept
    pub fn map_values(&self, f: impl Fn(f64) -> f64) -> SampleHistory {
        SampleHistory {
            samples: self
                .samples
                .iter()
                .map(|s| Sample {
                    value: f(s.value),
                    at: s.at,
                })
                .collect(),
            capacity: self.capacity,
        }
    }

    /// Whether any consecutive pair of timestamped samples is out of order
    pub fn is_irregular(&self) -> bool {
        self.samples
            .iter()
            .zip(self.samples.iter().skip(1))
            .any(|(a, b)| match (a.at, b.at) {
                (Some(prev), Some(next)) => next <= prev,
                _ => false,
            })
    }
}

/// Minutes elapsed between two samples, falling back to `fallback_sec`
/// when either timestamp is missing or they are not strictly increasing.
pub fn elapsed_minutes(prev: &Sample, next: &Sample, fallback_sec: f64) -> f64 {
    elapsed_seconds(prev, next, fallback_sec) / 60.0
}

/// Seconds elapsed between two samples with the same fallback rule
pub fn elapsed_seconds(prev: &Sample, next: &Sample, fallback_sec: f64) -> f64 {
    match (prev.at, next.at) {
        (Some(a), Some(b)) if b > a => (b - a).num_milliseconds() as f64 / 1000.0,
        _ => fallback_sec,
    }
}
