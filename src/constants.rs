//! Constants used throughout the request metrics core
//!
//! This module centralizes metric names, tag keys, and configuration
//! defaults to improve maintainability and reduce duplication.

/// Exported metric names
///
/// Each name exists in a global variant and, when the resource method is
/// known, a per-method variant distinguished by the `method` tag.
pub mod metric {
    /// Completed requests per second over the sample window
    pub const REQUEST_RATE: &str = "request-rate";

    /// Average request latency (milliseconds) over the sample window
    pub const REQUEST_LATENCY_AVG: &str = "request-latency-avg";

    /// Maximum request latency (milliseconds) over the sample window
    pub const REQUEST_LATENCY_MAX: &str = "request-latency-max";

    /// Fraction of requests in a status-code class, tagged by `status-class`
    pub const REQUEST_ERROR_RATE: &str = "request-error-rate";

    /// Average response size (bytes) for requests that reported one
    pub const RESPONSE_SIZE_AVG: &str = "response-size-avg";
}

/// Tag keys attached to metric names
pub mod tag {
    /// Status-code class tag: `2xx`, `3xx`, `4xx`, `5xx`, or `unknown`
    pub const STATUS_CLASS: &str = "status-class";

    /// Resource method identity tag for per-method metric variants
    pub const METHOD: &str = "method";
}

/// Configuration defaults and the reserved reporter option prefix
pub mod config {
    /// Reserved prefix for reporter options
    ///
    /// Keys under this prefix are stripped of it and handed to every
    /// configured reporter. The unprefixed originals stay visible to the
    /// rest of the system.
    pub const REPORTER_PREFIX: &str = "metrics.reporter.";

    /// Default trailing sample window length in seconds
    pub const DEFAULT_SAMPLE_WINDOW_SECS: u64 = 30;

    /// Default number of sub-window buckets per sample window
    pub const DEFAULT_NUM_BUCKETS: usize = 6;

    /// Default TTL for request contexts that never see a terminal event
    ///
    /// Bounds memory when the dispatch layer drops a request without a
    /// FINISHED or terminal EXCEPTION notification.
    pub const DEFAULT_CONTEXT_TTL_SECS: u64 = 300;
}
