//! Sensors: tagged accumulators over a bucketed sliding window
//!
//! A sensor records raw samples and derives one statistic (rate, average,
//! maximum, or a ratio against another sensor) over a trailing time window
//! split into sub-window buckets. Appending is amortized O(1); stale
//! buckets are expired lazily on record and read.

use super::name::MetricName;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Shared handle to a registered sensor
pub type SensorHandle = Arc<Sensor>;

/// Statistic a sensor derives from its windowed samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// Samples per second over the window; `0.0` when the window is empty
    Rate,
    /// Mean sample value; `NaN` when the window is empty (unmeasured)
    Avg,
    /// Maximum sample value; `NaN` when the window is empty (unmeasured)
    Max,
    /// Window count divided by a denominator sensor's window count;
    /// `NaN` when the denominator window is empty
    Ratio,
}

/// One sub-window of samples
#[derive(Debug)]
struct Bucket {
    start: Instant,
    count: u64,
    sum: f64,
    max: f64,
}

/// Bucketed trailing window of raw samples
#[derive(Debug)]
struct SampleWindow {
    window: Duration,
    bucket_len: Duration,
    buckets: VecDeque<Bucket>,
}

impl SampleWindow {
    fn new(window: Duration, num_buckets: usize) -> Self {
        let num_buckets = num_buckets.max(1);
        Self {
            window,
            bucket_len: window / num_buckets as u32,
            buckets: VecDeque::with_capacity(num_buckets + 1),
        }
    }

    /// Drop buckets whose entire span has left the window
    fn purge(&mut self, now: Instant) {
        while let Some(front) = self.buckets.front() {
            if now.duration_since(front.start) >= self.window {
                self.buckets.pop_front();
            } else {
                break;
            }
        }
    }

    fn record(&mut self, value: f64, now: Instant) {
        self.purge(now);
        match self.buckets.back_mut() {
            Some(bucket) if now.duration_since(bucket.start) < self.bucket_len => {
                bucket.count += 1;
                bucket.sum += value;
                if value > bucket.max {
                    bucket.max = value;
                }
            }
            _ => self.buckets.push_back(Bucket {
                start: now,
                count: 1,
                sum: value,
                max: value,
            }),
        }
    }

    fn count(&self) -> u64 {
        self.buckets.iter().map(|b| b.count).sum()
    }

    fn sum(&self) -> f64 {
        self.buckets.iter().map(|b| b.sum).sum()
    }

    fn max(&self) -> Option<f64> {
        self.buckets
            .iter()
            .filter(|b| b.count > 0)
            .map(|b| b.max)
            .fold(None, |acc, m| match acc {
                Some(current) if current >= m => Some(current),
                _ => Some(m),
            })
    }
}

/// Named, tagged accumulator producing one derived statistic
///
/// Safe to record from any thread; each record takes only this sensor's
/// window lock. Created through
/// [`MetricRegistry`](super::registry::MetricRegistry), never directly.
#[derive(Debug)]
pub struct Sensor {
    name: MetricName,
    kind: SensorKind,
    window_len: Duration,
    window: Mutex<SampleWindow>,
    /// Denominator for `Ratio` sensors; `None` for every other kind
    denominator: Option<SensorHandle>,
}

impl Sensor {
    pub(crate) fn new(
        name: MetricName,
        kind: SensorKind,
        window: Duration,
        num_buckets: usize,
        denominator: Option<SensorHandle>,
    ) -> Self {
        Self {
            name,
            kind,
            window_len: window,
            window: Mutex::new(SampleWindow::new(window, num_buckets)),
            denominator,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &MetricName {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// Append a sample stamped with the current time
    pub fn record(&self, value: f64) {
        self.record_at(value, Instant::now());
    }

    /// Append a sample with an explicit timestamp
    pub fn record_at(&self, value: f64, now: Instant) {
        if let Ok(mut window) = self.window.lock() {
            window.record(value, now);
        }
    }

    /// Current derived value
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value_at(Instant::now())
    }

    /// Derived value as of `now`
    #[must_use]
    pub fn value_at(&self, now: Instant) -> f64 {
        let Ok(mut window) = self.window.lock() else {
            return f64::NAN;
        };
        window.purge(now);
        match self.kind {
            SensorKind::Rate => window.count() as f64 / self.window_len.as_secs_f64(),
            SensorKind::Avg => {
                let count = window.count();
                if count == 0 {
                    f64::NAN
                } else {
                    window.sum() / count as f64
                }
            }
            SensorKind::Max => window.max().unwrap_or(f64::NAN),
            SensorKind::Ratio => {
                let count = window.count();
                // Release our lock before touching the denominator's
                drop(window);
                let denominator = self
                    .denominator
                    .as_ref()
                    .map_or(0, |d| d.window_count_at(now));
                if denominator == 0 {
                    f64::NAN
                } else {
                    count as f64 / denominator as f64
                }
            }
        }
    }

    /// Number of samples currently inside the window
    #[must_use]
    pub fn window_count(&self) -> u64 {
        self.window_count_at(Instant::now())
    }

    pub(crate) fn window_count_at(&self, now: Instant) -> u64 {
        let Ok(mut window) = self.window.lock() else {
            return 0;
        };
        window.purge(now);
        window.count()
    }
}
