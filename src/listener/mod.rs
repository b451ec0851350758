//! Lifecycle listener: out-of-order notifications in, metrics out
//!
//! The listener owns one [`RequestContext`] per in-flight request and
//! drives its state machine from dispatch-layer notifications. The
//! terminal transition resolves tags and records into the global and
//! per-method sensors exactly once per request, no matter how the
//! notifications are ordered, duplicated, or raced across threads.

mod context;
mod event;

pub use context::RequestContext;
pub use event::{EventKind, EventOutcome};

use crate::config::MetricsConfig;
use crate::constants::{metric, tag};
use crate::metrics::{MetricName, MetricRegistry, SensorHandle, SensorKind};
use crate::tags::StatusClass;
use crate::types::{RequestId, ResourceMethodId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// The completion sensors for one scope (global, or one resource method)
#[derive(Debug)]
struct SensorSet {
    request_rate: SensorHandle,
    latency_avg: SensorHandle,
    latency_max: SensorHandle,
    response_size_avg: SensorHandle,
    /// Ratio sensors indexed by [`StatusClass::index`]
    error_rate: [SensorHandle; 5],
}

impl SensorSet {
    fn new(registry: &MetricRegistry, base_tags: &BTreeMap<String, String>) -> Self {
        let named = |name: &str| MetricName::new(name).with_tags(base_tags.clone());

        let request_rate = registry.sensor(named(metric::REQUEST_RATE), SensorKind::Rate);
        let latency_avg = registry.sensor(named(metric::REQUEST_LATENCY_AVG), SensorKind::Avg);
        let latency_max = registry.sensor(named(metric::REQUEST_LATENCY_MAX), SensorKind::Max);
        let response_size_avg =
            registry.sensor(named(metric::RESPONSE_SIZE_AVG), SensorKind::Avg);

        let error_rate = StatusClass::ALL.map(|class| {
            let name = named(metric::REQUEST_ERROR_RATE)
                .with_tag(tag::STATUS_CLASS, class.as_str());
            registry.ratio_sensor(name, &request_rate)
        });

        Self {
            request_rate,
            latency_avg,
            latency_max,
            response_size_avg,
            error_rate,
        }
    }

    fn record(&self, latency_ms: f64, class: StatusClass, response_size: Option<u64>) {
        self.request_rate.record(1.0);
        self.latency_avg.record(latency_ms);
        self.latency_max.record(latency_ms);
        if let Some(bytes) = response_size {
            self.response_size_avg.record(bytes as f64);
        }
        self.error_rate[class.index()].record(1.0);
    }
}

/// Receives lifecycle notifications and records completion metrics
///
/// Cloning is cheap; all clones share the same contexts and sensors. Every
/// method is safe to call concurrently from any number of worker threads,
/// including for the same request id. Nothing here returns an error or
/// panics into the dispatch layer: the listener is strictly observational.
#[derive(Debug, Clone)]
pub struct LifecycleListener {
    inner: Arc<ListenerInner>,
}

#[derive(Debug)]
struct ListenerInner {
    registry: MetricRegistry,
    contexts: DashMap<RequestId, Arc<RequestContext>>,
    global: SensorSet,
    per_method: DashMap<ResourceMethodId, Arc<SensorSet>>,
    global_tags: BTreeMap<String, String>,
    context_ttl: Duration,
}

impl LifecycleListener {
    /// Create a listener recording into `registry`
    ///
    /// `global_tags` are applied to every metric name; `context_ttl`
    /// bounds how long a context that never sees a terminal event is
    /// retained before [`evict_stale`](Self::evict_stale) removes it.
    #[must_use]
    pub fn new(
        registry: MetricRegistry,
        global_tags: BTreeMap<String, String>,
        context_ttl: Duration,
    ) -> Self {
        let global = SensorSet::new(&registry, &global_tags);
        Self {
            inner: Arc::new(ListenerInner {
                registry,
                contexts: DashMap::new(),
                global,
                per_method: DashMap::new(),
                global_tags,
                context_ttl,
            }),
        }
    }

    /// Create a listener using a validated configuration's tags and TTL
    #[must_use]
    pub fn from_config(registry: MetricRegistry, config: &MetricsConfig) -> Self {
        Self::new(registry, config.tags.clone(), config.context_ttl())
    }

    /// The registry this listener records into
    #[must_use]
    pub fn registry(&self) -> &MetricRegistry {
        &self.inner.registry
    }

    /// Number of request contexts currently tracked
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.contexts.len()
    }

    /// Handle one lifecycle notification
    ///
    /// Invoked zero or more times per request, in no guaranteed order,
    /// possibly with duplicated terminal events and from multiple threads
    /// at once. The first terminal signal records metrics; every later
    /// one is observed and discarded.
    pub fn on_event(&self, request_id: RequestId, kind: EventKind, outcome: &EventOutcome) {
        let ctx = self.context_for(request_id, kind);
        ctx.observe(kind);

        if kind == EventKind::Matched {
            if let Some(method) = &outcome.resource_method {
                ctx.note_resource_method(method.clone());
            }
        }

        if kind.is_terminal(outcome) {
            self.finalize(request_id, &ctx, outcome);
        }
    }

    /// The dispatch layer released its request object; drop the context
    ///
    /// After this the id must not reappear (ids are never reused). A
    /// release without a prior terminal event is logged as an anomaly.
    pub fn request_released(&self, request_id: RequestId) {
        if let Some((_, ctx)) = self.inner.contexts.remove(&request_id) {
            if !ctx.is_finalized() {
                warn!(
                    request_id = %request_id,
                    "request released without a terminal event, no metrics recorded"
                );
            }
        }
    }

    /// Remove contexts older than the configured TTL
    ///
    /// Returns how many were evicted. A safety net for requests whose
    /// terminal notification never arrives; called periodically by
    /// [`spawn_eviction`](Self::spawn_eviction).
    pub fn evict_stale(&self) -> usize {
        let ttl = self.inner.context_ttl;
        let now = Instant::now();
        let mut evicted = 0;
        self.inner.contexts.retain(|request_id, ctx| {
            if now.duration_since(ctx.started_at()) < ttl {
                return true;
            }
            if !ctx.is_finalized() {
                warn!(
                    request_id = %request_id,
                    "evicting request context that never saw a terminal event"
                );
            }
            evicted += 1;
            false
        });
        evicted
    }

    /// Run the stale-context sweep on a fixed cadence
    pub fn spawn_eviction(&self, period: Duration) -> JoinHandle<()> {
        let listener = self.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tick.tick().await;
                let evicted = listener.evict_stale();
                if evicted > 0 {
                    debug!(evicted, "evicted stale request contexts");
                }
            }
        })
    }

    fn context_for(&self, request_id: RequestId, kind: EventKind) -> Arc<RequestContext> {
        match self.inner.contexts.entry(request_id) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                if kind != EventKind::Start {
                    // Tolerated: events for one request arrive in any
                    // order, so the first observed one opens the context.
                    debug!(
                        request_id = %request_id,
                        kind = ?kind,
                        "first observed event for request is not START"
                    );
                }
                let ctx = Arc::new(RequestContext::new());
                entry.insert(Arc::clone(&ctx));
                ctx
            }
        }
    }

    fn finalize(&self, request_id: RequestId, ctx: &RequestContext, outcome: &EventOutcome) {
        if !ctx.try_finalize() {
            debug!(
                request_id = %request_id,
                "duplicate terminal event ignored, metrics already recorded"
            );
            return;
        }

        let latency_ms = Instant::now()
            .duration_since(ctx.started_at())
            .as_secs_f64()
            * 1000.0;
        let class = StatusClass::from_status(outcome.status);

        self.inner
            .global
            .record(latency_ms, class, outcome.response_size);

        match ctx.resource_method() {
            Some(method) => {
                let sensors = self.method_sensors(method);
                sensors.record(latency_ms, class, outcome.response_size);
            }
            None => {
                // Matching never completed; the request still counts in
                // the global sensors.
                debug!(
                    request_id = %request_id,
                    status_class = %class,
                    "no MATCHED event observed, per-method metrics skipped"
                );
            }
        }
    }

    fn method_sensors(&self, method: &ResourceMethodId) -> Arc<SensorSet> {
        match self.inner.per_method.entry(method.clone()) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                let tags = crate::tags::method_tags(&self.inner.global_tags, method);
                let sensors = Arc::new(SensorSet::new(&self.inner.registry, &tags));
                entry.insert(Arc::clone(&sensors));
                sensors
            }
        }
    }
}
