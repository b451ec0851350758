//! In-memory capture reporter used for verification

use super::{MetricReading, Reporter, ReporterError};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Captures every snapshot it receives, for inspection by tests
///
/// Clones share storage, so a test can keep a handle while the registry
/// owns the boxed reporter.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReporter {
    inner: Arc<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    options: Mutex<BTreeMap<String, String>>,
    snapshots: Mutex<Vec<Vec<MetricReading>>>,
    closed: AtomicBool,
}

impl InMemoryReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options received through `configure`
    #[must_use]
    pub fn options(&self) -> BTreeMap<String, String> {
        self.inner
            .options
            .lock()
            .map(|options| options.clone())
            .unwrap_or_default()
    }

    /// Every captured snapshot, oldest first (including the `init` one)
    #[must_use]
    pub fn snapshots(&self) -> Vec<Vec<MetricReading>> {
        self.inner
            .snapshots
            .lock()
            .map(|snapshots| snapshots.clone())
            .unwrap_or_default()
    }

    /// The most recent captured snapshot
    #[must_use]
    pub fn latest(&self) -> Option<Vec<MetricReading>> {
        self.inner
            .snapshots
            .lock()
            .ok()
            .and_then(|snapshots| snapshots.last().cloned())
    }

    /// Value of a metric in the most recent snapshot
    ///
    /// Matches on plain name plus a predicate over the full metric name,
    /// so callers can pin down a tag combination.
    #[must_use]
    pub fn latest_value<F>(&self, name: &str, matches: F) -> Option<f64>
    where
        F: Fn(&crate::metrics::MetricName) -> bool,
    {
        self.latest()?
            .iter()
            .find(|reading| reading.name.name() == name && matches(&reading.name))
            .map(|reading| reading.value)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    fn push(&self, snapshot: &[MetricReading]) {
        if let Ok(mut snapshots) = self.inner.snapshots.lock() {
            snapshots.push(snapshot.to_vec());
        }
    }
}

impl Reporter for InMemoryReporter {
    fn configure(&mut self, options: BTreeMap<String, String>) -> Result<(), ReporterError> {
        if let Ok(mut stored) = self.inner.options.lock() {
            *stored = options;
        }
        Ok(())
    }

    fn init(&self, snapshot: &[MetricReading]) {
        self.push(snapshot);
    }

    fn on_update(&self, snapshot: &[MetricReading]) -> Result<(), ReporterError> {
        self.push(snapshot);
        Ok(())
    }

    fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }
}
