//! Pluggable metric reporters
//!
//! Reporters are the sole export boundary of this crate: sinks that
//! receive metric snapshots on a cadence divorced from the request path.
//! Implementations are resolved at startup from identifier strings
//! through a [`ReporterRegistry`]; an unknown identifier fails
//! configuration validation, never runtime recording.

mod log;
mod memory;

pub use log::LogReporter;
pub use memory::InMemoryReporter;

use crate::metrics::MetricName;
use std::collections::{BTreeMap, HashMap};
use std::time::SystemTime;
use thiserror::Error;

/// One metric value captured at snapshot time
#[derive(Debug, Clone)]
pub struct MetricReading {
    pub name: MetricName,
    pub value: f64,
    pub timestamp: SystemTime,
}

/// Errors raised by reporter implementations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReporterError {
    /// A configuration option was rejected
    #[error("invalid reporter option '{key}': {reason}")]
    InvalidOption { key: String, reason: String },

    /// Emission to the underlying sink failed
    #[error("reporter emission failed: {0}")]
    Emission(String),
}

/// A pluggable sink for metric snapshots
///
/// `configure` runs once at startup with the merged reporter option map
/// (reserved-prefix keys arrive with the prefix stripped). After that the
/// reporter only observes: `init` with the snapshot at registration time,
/// `on_update` per emission, and `close` at shutdown. Implementations
/// must be safe to call from the emitter task while requests record
/// concurrently.
pub trait Reporter: Send + Sync {
    /// Apply startup configuration
    fn configure(&mut self, options: BTreeMap<String, String>) -> Result<(), ReporterError>;

    /// Observe the snapshot taken when the reporter was registered
    fn init(&self, snapshot: &[MetricReading]);

    /// Observe a periodic or on-demand snapshot
    fn on_update(&self, snapshot: &[MetricReading]) -> Result<(), ReporterError>;

    /// Release any resources held by the sink
    fn close(&self);
}

/// Factory producing an unconfigured reporter instance
pub type ReporterFactory = Box<dyn Fn() -> Box<dyn Reporter> + Send + Sync>;

/// Startup-time registry of reporter implementations by identifier
///
/// Replaces load-by-class-name schemes with an explicit factory map:
/// identifiers are resolved while building the pipeline, so a typo is a
/// configuration error instead of a runtime surprise.
pub struct ReporterRegistry {
    factories: HashMap<String, ReporterFactory>,
}

impl ReporterRegistry {
    /// An empty registry with no known identifiers
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry with the built-in `log` and `memory` reporters
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("log", || Box::new(LogReporter::new()));
        registry.register("memory", || Box::new(InMemoryReporter::new()));
        registry
    }

    /// Register a factory under an identifier, replacing any previous one
    pub fn register(
        &mut self,
        id: impl Into<String>,
        factory: impl Fn() -> Box<dyn Reporter> + Send + Sync + 'static,
    ) {
        self.factories.insert(id.into(), Box::new(factory));
    }

    /// Whether an identifier is known
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Instantiate the reporter registered under `id`
    #[must_use]
    pub fn build(&self, id: &str) -> Option<Box<dyn Reporter>> {
        self.factories.get(id).map(|factory| factory())
    }
}

impl Default for ReporterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for ReporterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("ReporterRegistry").field("ids", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_present() {
        let registry = ReporterRegistry::with_builtins();
        assert!(registry.contains("log"));
        assert!(registry.contains("memory"));
        assert!(!registry.contains("graphite"));
    }

    #[test]
    fn test_build_unknown_is_none() {
        let registry = ReporterRegistry::empty();
        assert!(registry.build("log").is_none());
    }

    #[test]
    fn test_register_custom_factory() {
        let mut registry = ReporterRegistry::empty();
        registry.register("capture", || Box::new(InMemoryReporter::new()));
        assert!(registry.contains("capture"));
        assert!(registry.build("capture").is_some());
    }
}
