//! Reporter that emits snapshots through the tracing subsystem

use super::{MetricReading, Reporter, ReporterError};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Writes every snapshot to the process log
///
/// Useful as a zero-infrastructure default sink; each reading becomes one
/// `info` event under the `request_metrics::reporter` target.
#[derive(Debug, Default)]
pub struct LogReporter {
    options: BTreeMap<String, String>,
}

impl LogReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reporter for LogReporter {
    fn configure(&mut self, options: BTreeMap<String, String>) -> Result<(), ReporterError> {
        self.options = options;
        Ok(())
    }

    fn init(&self, snapshot: &[MetricReading]) {
        debug!(
            target: "request_metrics::reporter",
            sensors = snapshot.len(),
            options = self.options.len(),
            "log reporter registered"
        );
    }

    fn on_update(&self, snapshot: &[MetricReading]) -> Result<(), ReporterError> {
        for reading in snapshot {
            info!(
                target: "request_metrics::reporter",
                metric = %reading.name,
                value = reading.value,
                "metrics update"
            );
        }
        Ok(())
    }

    fn close(&self) {
        debug!(target: "request_metrics::reporter", "log reporter closed");
    }
}
