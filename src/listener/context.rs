//! Per-request tracking context with a finalize-once guard

use super::event::EventKind;
use crate::types::ResourceMethodId;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

/// Ephemeral state for one in-flight request
///
/// Created at the first observed lifecycle event and dropped after the
/// request is released (or evicted). All fields tolerate concurrent
/// notification threads; the `finalized` flag is the single point of
/// truth for whether metrics were recorded.
#[derive(Debug)]
pub struct RequestContext {
    started_at: Instant,
    resource_method: OnceLock<ResourceMethodId>,
    /// Bitmask of event kinds seen so far; diagnostic only, never gates
    /// correctness
    observed: AtomicU32,
    finalized: AtomicBool,
}

impl RequestContext {
    pub(crate) fn new() -> Self {
        Self {
            started_at: Instant::now(),
            resource_method: OnceLock::new(),
            observed: AtomicU32::new(0),
            finalized: AtomicBool::new(false),
        }
    }

    /// Monotonic time of the first observed event
    #[inline]
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Note that an event kind was seen
    #[inline]
    pub(crate) fn observe(&self, kind: EventKind) {
        self.observed.fetch_or(kind.bit(), Ordering::Relaxed);
    }

    /// Whether an event kind has been seen
    #[must_use]
    pub fn has_observed(&self, kind: EventKind) -> bool {
        self.observed.load(Ordering::Relaxed) & kind.bit() != 0
    }

    /// Record the matched resource method; the first value wins
    ///
    /// Keeps per-method attribution possible even when an error preempts
    /// the rest of the pipeline after matching.
    pub(crate) fn note_resource_method(&self, method: ResourceMethodId) {
        let _ = self.resource_method.set(method);
    }

    /// Matched resource method, if matching ever completed
    #[must_use]
    pub fn resource_method(&self) -> Option<&ResourceMethodId> {
        self.resource_method.get()
    }

    /// Attempt the terminal transition
    ///
    /// Exactly one caller per context wins; losers observe `false` and
    /// must perform no recording work.
    pub(crate) fn try_finalize(&self) -> bool {
        self.finalized
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Whether the terminal transition already happened
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized.load(Ordering::Acquire)
    }
}
