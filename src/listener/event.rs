//! Lifecycle notification kinds and their observable payload

use crate::types::ResourceMethodId;

/// Stage reached while processing one request
///
/// Notifications carrying these kinds arrive in no guaranteed order and
/// may be duplicated, especially when the dispatch layer aborts
/// processing on error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Start,
    Matched,
    Filtered,
    MethodStart,
    MethodFinished,
    Exception,
    ResponseFilterStart,
    Finished,
}

impl EventKind {
    /// All kinds, for diagnostics and tests
    pub const ALL: [Self; 8] = [
        Self::Start,
        Self::Matched,
        Self::Filtered,
        Self::MethodStart,
        Self::MethodFinished,
        Self::Exception,
        Self::ResponseFilterStart,
        Self::Finished,
    ];

    /// Bit used in the per-context observed-events mask
    #[inline]
    pub(crate) const fn bit(self) -> u32 {
        1 << self as u32
    }

    /// Whether this event closes the request's pipeline
    ///
    /// `Finished` is always terminal. `Exception` is terminal only when
    /// the dispatch layer signals that no further processing will occur;
    /// a recoverable exception is followed by more events and must not
    /// finalize the context.
    #[must_use]
    pub fn is_terminal(self, outcome: &EventOutcome) -> bool {
        match self {
            Self::Finished => true,
            Self::Exception => outcome.processing_aborted,
            _ => false,
        }
    }
}

/// Observable payload attached to a lifecycle notification
///
/// Fields are meaningful only for some event kinds: `resource_method` on
/// `Matched`, `status` and `response_size` on terminal events,
/// `processing_aborted` on `Exception`.
#[derive(Debug, Clone, Default)]
pub struct EventOutcome {
    /// Identity of the matched resource method
    pub resource_method: Option<ResourceMethodId>,
    /// Final HTTP status code, once the dispatch layer knows it
    pub status: Option<u16>,
    /// Response size in bytes, when the transport measured one
    pub response_size: Option<u64>,
    /// Dispatch layer signals no further processing will occur
    pub processing_aborted: bool,
}

impl EventOutcome {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the matched resource method
    #[must_use]
    pub fn with_resource_method(mut self, method: impl Into<ResourceMethodId>) -> Self {
        self.resource_method = Some(method.into());
        self
    }

    /// Builder method: set the final status code
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Builder method: set the measured response size
    #[must_use]
    pub fn with_response_size(mut self, bytes: u64) -> Self {
        self.response_size = Some(bytes);
        self
    }

    /// Builder method: mark processing as aborted
    #[must_use]
    pub fn aborted(mut self) -> Self {
        self.processing_aborted = true;
        self
    }
}
