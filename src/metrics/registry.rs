//! Process-wide registry of named, tagged sensors
//!
//! Sensor creation synchronizes only on the name+tags key; recording on an
//! existing sensor takes that sensor's window lock alone. Reporter
//! emission runs on demand ([`MetricRegistry::flush`]) or on a background
//! tokio cadence, never on the recording path.

use super::name::MetricName;
use super::sensor::{Sensor, SensorHandle, SensorKind};
use crate::config::MetricsConfig;
use crate::reporter::{MetricReading, Reporter};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Thread-safe registry of sensors with reporter fan-out
///
/// Cloning is cheap; all clones share the same sensors and reporters.
#[derive(Clone)]
pub struct MetricRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    window: Duration,
    num_buckets: usize,
    sensors: DashMap<MetricName, SensorHandle>,
    reporters: Mutex<Vec<Box<dyn Reporter>>>,
}

impl fmt::Debug for MetricRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricRegistry")
            .field("window", &self.inner.window)
            .field("num_buckets", &self.inner.num_buckets)
            .field("sensors", &self.inner.sensors.len())
            .field("reporters", &self.reporter_count())
            .finish()
    }
}

impl MetricRegistry {
    /// Create a registry with the given sample window geometry
    #[must_use]
    pub fn new(window: Duration, num_buckets: usize) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                window,
                num_buckets: num_buckets.max(1),
                sensors: DashMap::new(),
                reporters: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Create a registry from a validated configuration
    #[must_use]
    pub fn from_config(config: &MetricsConfig) -> Self {
        Self::new(config.sample_window(), config.num_buckets)
    }

    /// Get or atomically create the sensor for `name`
    ///
    /// Concurrent calls with an identical name yield the same instance;
    /// no duplicate sensors ever exist for one `MetricName`. If the name
    /// is already registered with a different kind, the existing sensor
    /// wins and the mismatch is logged.
    pub fn sensor(&self, name: MetricName, kind: SensorKind) -> SensorHandle {
        self.get_or_create(name, kind, None)
    }

    /// Get or atomically create a ratio sensor
    ///
    /// The sensor's value is its window count divided by `denominator`'s
    /// window count, `NaN` while the denominator window is empty.
    pub fn ratio_sensor(&self, name: MetricName, denominator: &SensorHandle) -> SensorHandle {
        self.get_or_create(name, SensorKind::Ratio, Some(Arc::clone(denominator)))
    }

    fn get_or_create(
        &self,
        name: MetricName,
        kind: SensorKind,
        denominator: Option<SensorHandle>,
    ) -> SensorHandle {
        match self.inner.sensors.entry(name) {
            Entry::Occupied(entry) => {
                let existing = entry.get();
                if existing.kind() != kind {
                    warn!(
                        metric = %entry.key(),
                        requested = ?kind,
                        registered = ?existing.kind(),
                        "sensor already registered with a different kind, keeping the existing one"
                    );
                }
                Arc::clone(existing)
            }
            Entry::Vacant(entry) => {
                let sensor = Arc::new(Sensor::new(
                    entry.key().clone(),
                    kind,
                    self.inner.window,
                    self.inner.num_buckets,
                    denominator,
                ));
                entry.insert(Arc::clone(&sensor));
                sensor
            }
        }
    }

    /// Append a sample to a sensor obtained from this registry
    #[inline]
    pub fn record(&self, sensor: &SensorHandle, value: f64) {
        sensor.record(value);
    }

    /// Number of registered sensors
    #[must_use]
    pub fn sensor_count(&self) -> usize {
        self.inner.sensors.len()
    }

    /// Point-in-time view of every sensor, sorted by metric name
    #[must_use]
    pub fn snapshot(&self) -> Vec<MetricReading> {
        let now = Instant::now();
        let timestamp = SystemTime::now();
        let mut readings: Vec<MetricReading> = self
            .inner
            .sensors
            .iter()
            .map(|entry| MetricReading {
                name: entry.key().clone(),
                value: entry.value().value_at(now),
                timestamp,
            })
            .collect();
        readings.sort_by(|a, b| a.name.cmp(&b.name));
        readings
    }

    /// Register a configured reporter and hand it the current snapshot
    pub fn add_reporter(&self, reporter: Box<dyn Reporter>) {
        reporter.init(&self.snapshot());
        if let Ok(mut reporters) = self.inner.reporters.lock() {
            reporters.push(reporter);
        }
    }

    /// Number of registered reporters
    #[must_use]
    pub fn reporter_count(&self) -> usize {
        self.inner.reporters.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Push the current snapshot to every reporter
    ///
    /// A failing reporter is logged and skipped; it cannot affect the
    /// registry, the other reporters, or recording.
    pub fn flush(&self) {
        let snapshot = self.snapshot();
        let Ok(reporters) = self.inner.reporters.lock() else {
            return;
        };
        for reporter in reporters.iter() {
            if let Err(error) = reporter.on_update(&snapshot) {
                warn!(%error, "metrics reporter failed during emission, skipping");
            }
        }
    }

    /// Emit snapshots to reporters on a fixed cadence
    ///
    /// Runs until the returned handle is aborted or the runtime shuts
    /// down. Emission shares nothing with the recording path beyond the
    /// per-sensor window locks.
    pub fn spawn_emitter(&self, period: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            debug!(period_ms = period.as_millis() as u64, "metrics emitter started");
            loop {
                tick.tick().await;
                registry.flush();
            }
        })
    }

    /// Close every registered reporter
    pub fn close(&self) {
        let Ok(reporters) = self.inner.reporters.lock() else {
            return;
        };
        for reporter in reporters.iter() {
            reporter.close();
        }
    }
}
