//! Per-endpoint request metrics from out-of-order lifecycle notifications
//!
//! The dispatch layer reports a request's processing stages (matching,
//! filtering, method invocation, exception handling, completion) as
//! independent notifications that may arrive reordered, duplicated, or
//! concurrently. This crate turns that stream into windowed throughput,
//! latency, and error-rate sensors, guaranteeing exactly one set of
//! completion metrics per request, and fans snapshots out to pluggable
//! reporters off the request-serving path.
//!
//! ```no_run
//! use request_metrics::{
//!     build, EventKind, EventOutcome, MetricsConfig, ReporterRegistry, RequestId,
//! };
//!
//! # fn main() -> Result<(), request_metrics::ConfigError> {
//! let config = MetricsConfig {
//!     reporters: vec!["log".to_string()],
//!     ..Default::default()
//! };
//! let listener = build(&config, &ReporterRegistry::with_builtins())?;
//!
//! // Wired into the dispatch layer's notification hooks:
//! let id = RequestId::new(1);
//! listener.on_event(
//!     id,
//!     EventKind::Matched,
//!     &EventOutcome::new().with_resource_method("ItemsResource.get"),
//! );
//! listener.on_event(id, EventKind::Finished, &EventOutcome::new().with_status(200));
//! listener.request_released(id);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod listener;
pub mod logging;
pub mod metrics;
pub mod reporter;
pub mod tags;
pub mod types;

pub use config::{load_config, ConfigError, MetricsConfig};
pub use listener::{EventKind, EventOutcome, LifecycleListener, RequestContext};
pub use metrics::{MetricName, MetricRegistry, Sensor, SensorHandle, SensorKind};
pub use reporter::{
    InMemoryReporter, LogReporter, MetricReading, Reporter, ReporterError, ReporterRegistry,
};
pub use tags::StatusClass;
pub use types::{RequestId, ResourceMethodId};

/// Build a fully wired listener from a validated configuration
///
/// Validates `config` against `reporters`, creates the registry, then
/// instantiates and configures every listed reporter. All failures
/// surface here, at startup; nothing on the recording path can fail
/// afterwards.
pub fn build(
    config: &MetricsConfig,
    reporters: &ReporterRegistry,
) -> Result<LifecycleListener, ConfigError> {
    config.validate(reporters)?;

    let registry = MetricRegistry::from_config(config);
    let options = config.reporter_options();

    for id in &config.reporters {
        let mut reporter = reporters
            .build(id)
            .ok_or_else(|| ConfigError::UnknownReporter(id.clone()))?;
        reporter
            .configure(options.clone())
            .map_err(|source| ConfigError::Reporter {
                id: id.clone(),
                source,
            })?;
        registry.add_reporter(reporter);
    }

    Ok(LifecycleListener::from_config(registry, config))
}
