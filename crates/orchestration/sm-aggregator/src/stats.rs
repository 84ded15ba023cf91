//! Aggregate statistics for a bucket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::source::{ObjectEntry, Page};

/// Statistics accumulated over one aggregation run.
///
/// Counters only ever increase and `last_modified` is a max-reduction over
/// current entries, so folding is commutative: any interleaving of page folds
/// produces the same final record as a single-threaded pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Number of current (live) object versions
    pub current_count: u64,

    /// Total bytes held by current versions
    pub current_size: u64,

    /// Number of non-current (superseded) versions
    pub versioned_count: u64,

    /// Total bytes held by non-current versions
    pub versioned_size: u64,

    /// Number of delete markers
    pub delete_markers: u64,

    /// Most recent modification timestamp among current entries
    pub last_modified: Option<DateTime<Utc>>,
}

impl AggregateStats {
    /// Create a zero-valued accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold every entry and marker on a page into a fresh accumulator.
    pub fn from_page(page: &Page) -> Self {
        let mut stats = Self::new();
        for entry in &page.entries {
            stats.fold_entry(entry);
        }
        stats.record_delete_markers(page.delete_markers.len() as u64);
        stats
    }

    /// Classify one entry and fold it in.
    pub fn fold_entry(&mut self, entry: &ObjectEntry) {
        if entry.is_current {
            self.record_current(entry.size, entry.last_modified);
        } else {
            self.record_noncurrent(entry.size);
        }
    }

    /// Record a current object version.
    pub fn record_current(&mut self, size: u64, last_modified: Option<DateTime<Utc>>) {
        self.current_count += 1;
        self.current_size += size;
        self.last_modified = self.last_modified.max(last_modified);
    }

    /// Record a non-current object version.
    pub fn record_noncurrent(&mut self, size: u64) {
        self.versioned_count += 1;
        self.versioned_size += size;
    }

    /// Record delete markers.
    pub fn record_delete_markers(&mut self, count: u64) {
        self.delete_markers += count;
    }

    /// Merge another accumulator into this one.
    ///
    /// Commutative and associative, so partial accumulators can merge in any
    /// order.
    pub fn merge(&mut self, other: &AggregateStats) {
        self.current_count += other.current_count;
        self.current_size += other.current_size;
        self.versioned_count += other.versioned_count;
        self.versioned_size += other.versioned_size;
        self.delete_markers += other.delete_markers;
        self.last_modified = self.last_modified.max(other.last_modified);
    }

    /// Total number of object versions, current and non-current.
    pub fn total_count(&self) -> u64 {
        self.current_count + self.versioned_count
    }

    /// Total bytes across current and non-current versions.
    pub fn total_size(&self) -> u64 {
        self.current_size + self.versioned_size
    }

    /// Mean size of a current object, or `None` when there are no current
    /// objects. Callers must not assume a non-zero count.
    pub fn average_current_size(&self) -> Option<u64> {
        if self.current_count == 0 {
            None
        } else {
            Some(self.current_size / self.current_count)
        }
    }
}
