//! Fake streaming readers, aggregation listeners, and a recording
//! aggregator double that wires them together in tests.

#![allow(missing_docs)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::contract::{Aggregator, AggregatorListener, FunctionalReader, SamplesReader};
use crate::samples::{AggregateRecord, FunctionalSample, Sample};

/// Default percentile tracking requested from the owning aggregator.
pub const DEFAULT_TRACK_PERCENTILES: [f64; 6] = [0.0, 50.0, 90.0, 99.0, 99.5, 100.0];

/// In-memory streaming reader: unbounded FIFO buffer, destructive drain.
///
/// Drain is restartable only by refilling via [`append`](Self::append);
/// each drain observes only what is queued at that moment.
pub struct FakeSamplesReader {
    queue: VecDeque<Sample>,
    pub track_percentiles: Vec<f64>,
    listeners: Vec<Box<dyn AggregatorListener>>,
}

impl Default for FakeSamplesReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSamplesReader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            track_percentiles: DEFAULT_TRACK_PERCENTILES.to_vec(),
            listeners: Vec::new(),
        }
    }

    pub fn append(&mut self, sample: Sample) {
        self.queue.push_back(sample);
    }

    pub fn extend(&mut self, samples: impl IntoIterator<Item = Sample>) {
        self.queue.extend(samples);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Lazy FIFO drain. `final_pass` distinguishes the flush-oriented last
    /// read from an incremental one; this fake drains fully either way,
    /// which is a known fidelity gap versus a real incremental reader.
    pub fn drain(&mut self, final_pass: bool) -> SampleDrain<'_> {
        tracing::debug!(final_pass, queued = self.queue.len(), "draining samples");
        SampleDrain {
            queue: &mut self.queue,
        }
    }

    /// Register a listener for per-interval aggregated callbacks. The
    /// owning aggregation pipeline triggers them through
    /// [`interval_complete`](SamplesReader::interval_complete); the reader
    /// itself never aggregates.
    pub fn add_listener(&mut self, listener: Box<dyn AggregatorListener>) {
        self.listeners.push(listener);
    }

    /// Forward one emitted interval to every registered listener.
    pub fn notify_listeners(&mut self, record: &AggregateRecord) {
        for listener in &mut self.listeners {
            listener.aggregated_interval(record);
        }
    }
}

impl SamplesReader for FakeSamplesReader {
    fn pop_sample(&mut self, _final_pass: bool) -> Option<Sample> {
        self.queue.pop_front()
    }

    fn interval_complete(&mut self, record: &AggregateRecord) {
        self.notify_listeners(record);
    }
}

/// Iterator over [`FakeSamplesReader::drain`]: yields-and-removes the head
/// until the queue empties.
pub struct SampleDrain<'a> {
    queue: &'a mut VecDeque<Sample>,
}

impl Iterator for SampleDrain<'_> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        self.queue.pop_front()
    }
}

/// Same drain contract as [`FakeSamplesReader`], for the functional
/// (pass/fail) results pipeline. Independent buffer, independent state.
#[derive(Default)]
pub struct FakeFunctionalReader {
    queue: VecDeque<FunctionalSample>,
}

impl FakeFunctionalReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, sample: FunctionalSample) {
        self.queue.push_back(sample);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn drain(&mut self, final_pass: bool) -> impl Iterator<Item = FunctionalSample> + '_ {
        tracing::debug!(final_pass, queued = self.queue.len(), "draining functional results");
        std::iter::from_fn(|| self.queue.pop_front())
    }
}

impl FunctionalReader for FakeFunctionalReader {
    fn pop_result(&mut self, _final_pass: bool) -> Option<FunctionalSample> {
        self.queue.pop_front()
    }
}

/// Listener that fail-fast panics on any non-increasing aggregate
/// timestamp and keeps the full history for post-hoc inspection.
///
/// Cheap-clone handle: every clone observes the same history, so tests can
/// register one copy and keep another for assertions.
#[derive(Clone, Default)]
pub struct SequenceCheckListener {
    inner: Arc<Mutex<Vec<AggregateRecord>>>,
}

impl SequenceCheckListener {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record received so far, in arrival order.
    #[must_use]
    pub fn records(&self) -> Vec<AggregateRecord> {
        self.inner.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl AggregatorListener for SequenceCheckListener {
    fn aggregated_interval(&mut self, record: &AggregateRecord) {
        let mut history = self.inner.lock();
        if let Some(last) = history.last() {
            assert!(
                last.ts < record.ts,
                "aggregate ts sequence wrong: {} >= {}",
                last.ts,
                record.ts
            );
        }
        tracing::info!(ts = record.ts, throughput = record.throughput, "aggregate");
        history.push(record.clone());
    }
}

/// Adapts a closure into an [`AggregatorListener`].
pub struct CallbackListener<F: FnMut(&AggregateRecord)> {
    callback: F,
}

impl<F: FnMut(&AggregateRecord)> CallbackListener<F> {
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F: FnMut(&AggregateRecord)> AggregatorListener for CallbackListener<F> {
    fn aggregated_interval(&mut self, record: &AggregateRecord) {
        (self.callback)(record);
    }
}

/// Minimal aggregation double: collects registered readers, and on demand
/// drains them all, groups samples per timestamp, and feeds each interval
/// to its own listeners and to every reader's registered listeners, in
/// ascending order.
#[derive(Default)]
pub struct RecordingAggregator {
    readers: Vec<Box<dyn SamplesReader>>,
    listeners: Vec<Box<dyn AggregatorListener>>,
}

impl RecordingAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }

    pub fn add_listener(&mut self, listener: Box<dyn AggregatorListener>) {
        self.listeners.push(listener);
    }

    /// Drain every registered reader and emit one aggregate per distinct
    /// timestamp, ascending. Returns the emitted records.
    pub fn consume(&mut self, final_pass: bool) -> Vec<AggregateRecord> {
        let mut intervals: BTreeMap<i64, Vec<Sample>> = BTreeMap::new();
        for reader in &mut self.readers {
            while let Some(sample) = reader.pop_sample(final_pass) {
                intervals.entry(sample.ts).or_default().push(sample);
            }
        }

        let mut emitted = Vec::with_capacity(intervals.len());
        for (ts, samples) in intervals {
            let total_rt: f64 = samples.iter().map(|sample| sample.response_time_ms).sum();
            #[allow(clippy::cast_precision_loss)]
            let record = AggregateRecord {
                ts,
                throughput: samples.len(),
                avg_response_time_ms: total_rt / samples.len() as f64,
            };
            for listener in &mut self.listeners {
                listener.aggregated_interval(&record);
            }
            for reader in &mut self.readers {
                reader.interval_complete(&record);
            }
            emitted.push(record);
        }
        emitted
    }
}

impl Aggregator for RecordingAggregator {
    fn add_reader(&mut self, reader: Box<dyn SamplesReader>) {
        self.readers.push(reader);
    }
}
