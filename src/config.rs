//! Metrics configuration: loading, validation, reporter option split

use crate::constants::config::{
    DEFAULT_CONTEXT_TTL_SECS, DEFAULT_NUM_BUCKETS, DEFAULT_SAMPLE_WINDOW_SECS, REPORTER_PREFIX,
};
use crate::reporter::{ReporterError, ReporterRegistry};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

fn default_sample_window_secs() -> u64 {
    DEFAULT_SAMPLE_WINDOW_SECS
}

fn default_num_buckets() -> usize {
    DEFAULT_NUM_BUCKETS
}

fn default_context_ttl_secs() -> u64 {
    DEFAULT_CONTEXT_TTL_SECS
}

/// Configuration validation errors
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("metrics sample window must be greater than zero")]
    ZeroSampleWindow,

    #[error("metrics sample window must have at least one bucket")]
    ZeroBuckets,

    #[error("request context ttl must be greater than zero")]
    ZeroContextTtl,

    #[error("unknown metrics reporter '{0}'")]
    UnknownReporter(String),

    #[error("reporter '{id}' rejected configuration")]
    Reporter {
        id: String,
        #[source]
        source: ReporterError,
    },
}

/// Startup configuration for the metrics core
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Reporter implementation identifiers; empty means metrics are
    /// computed but not exported
    #[serde(default)]
    pub reporters: Vec<String>,

    /// Trailing sample window length in seconds
    #[serde(default = "default_sample_window_secs")]
    pub sample_window_secs: u64,

    /// Number of sub-window buckets per sample window
    #[serde(default = "default_num_buckets")]
    pub num_buckets: usize,

    /// TTL in seconds for contexts that never see a terminal event
    #[serde(default = "default_context_ttl_secs")]
    pub context_ttl_secs: u64,

    /// Fixed tags applied to every metric
    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    /// Flat option map; keys under the reserved prefix are handed to
    /// reporters with the prefix stripped (see
    /// [`reporter_options`](Self::reporter_options))
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            reporters: Vec::new(),
            sample_window_secs: default_sample_window_secs(),
            num_buckets: default_num_buckets(),
            context_ttl_secs: default_context_ttl_secs(),
            tags: BTreeMap::new(),
            options: BTreeMap::new(),
        }
    }
}

impl MetricsConfig {
    #[must_use]
    pub fn sample_window(&self) -> Duration {
        Duration::from_secs(self.sample_window_secs)
    }

    #[must_use]
    pub fn context_ttl(&self) -> Duration {
        Duration::from_secs(self.context_ttl_secs)
    }

    /// The option map handed to each configured reporter
    ///
    /// Unprefixed keys are passed through as-is; keys under the reserved
    /// `metrics.reporter.` prefix are stripped of it and merged on top,
    /// so a prefixed key overrides an unprefixed key with the same
    /// suffix. The unprefixed originals stay untouched in
    /// [`options`](Self::options) for the rest of the system.
    #[must_use]
    pub fn reporter_options(&self) -> BTreeMap<String, String> {
        let mut merged: BTreeMap<String, String> = self
            .options
            .iter()
            .filter(|(key, _)| !key.starts_with(REPORTER_PREFIX))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        for (key, value) in &self.options {
            if let Some(suffix) = key.strip_prefix(REPORTER_PREFIX) {
                merged.insert(suffix.to_string(), value.clone());
            }
        }

        merged
    }

    /// Validate startup invariants against a reporter registry
    ///
    /// Fails on a zero window, zero buckets, zero TTL, or a reporter
    /// identifier the registry does not know. Runs once at startup so
    /// misconfiguration can never surface on the recording path.
    pub fn validate(&self, reporters: &ReporterRegistry) -> Result<(), ConfigError> {
        if self.sample_window_secs == 0 {
            return Err(ConfigError::ZeroSampleWindow);
        }
        if self.num_buckets == 0 {
            return Err(ConfigError::ZeroBuckets);
        }
        if self.context_ttl_secs == 0 {
            return Err(ConfigError::ZeroContextTtl);
        }
        for id in &self.reporters {
            if !reporters.contains(id) {
                return Err(ConfigError::UnknownReporter(id.clone()));
            }
        }
        Ok(())
    }
}

/// Load a [`MetricsConfig`] from a TOML file
pub fn load_config(config_path: &str) -> Result<MetricsConfig> {
    let config_content = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", config_path, e))?;

    let config: MetricsConfig = toml::from_str(&config_content)
        .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", config_path, e))?;

    Ok(config)
}
