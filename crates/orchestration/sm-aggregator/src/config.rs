//! Configuration types for aggregation runs.

use serde::{Deserialize, Serialize};

/// Which listing API drives the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingMode {
    /// List only live objects (ListObjectsV2); every entry is current.
    CurrentOnly,
    /// List every retained version plus delete markers (ListObjectVersions).
    AllVersions,
}

/// Configuration for an aggregation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Maximum number of page folds in flight at once.
    pub max_concurrent_folds: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_concurrent_folds: 8,
        }
    }
}

impl AggregationConfig {
    /// Create a new aggregation configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of concurrent page folds.
    ///
    /// Values below 1 are clamped to 1.
    pub fn with_max_concurrent_folds(mut self, max: usize) -> Self {
        self.max_concurrent_folds = max.max(1);
        self
    }
}
