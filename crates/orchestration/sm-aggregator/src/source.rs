//! Page and entry types produced by a listing source.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sm_error::Result;

/// One listed object version.
#[derive(Debug, Clone)]
pub struct ObjectEntry {
    /// The object key (full path within the bucket)
    pub key: String,

    /// Size of the object version in bytes
    pub size: u64,

    /// Last modified timestamp
    pub last_modified: Option<DateTime<Utc>>,

    /// Whether this is the live version of its key.
    ///
    /// Current-only listings mark every entry current; versioned listings
    /// carry the flag from the API.
    pub is_current: bool,
}

/// A delete marker: the key's current state is "deleted" while older
/// versions remain. Carries no size; counted, never sized.
#[derive(Debug, Clone)]
pub struct DeleteMarkerEntry {
    /// The key the marker applies to
    pub key: String,

    /// When the marker was created
    pub last_modified: Option<DateTime<Utc>>,
}

/// One batch of listing results, as returned by a single paginated API call.
///
/// Pages are transient: owned by the fetch loop and consumed exactly once by
/// the fold that receives them.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Object entries on this page
    pub entries: Vec<ObjectEntry>,

    /// Delete markers on this page (versioned listings only)
    pub delete_markers: Vec<DeleteMarkerEntry>,
}

impl Page {
    /// Total number of entries and markers on this page.
    pub fn len(&self) -> usize {
        self.entries.len() + self.delete_markers.len()
    }

    /// True when the page carries no entries and no markers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.delete_markers.is_empty()
    }

    /// Sum of entry sizes on this page.
    pub fn bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }
}

/// A paginated listing source.
///
/// The contract the aggregator relies on: pages arrive in some order until
/// the source is exhausted (`Ok(None)`) or a terminal error ends the
/// sequence. Transient failures are the source's own concern (retried
/// invisibly); an `Err` here is final for the whole run.
#[async_trait]
pub trait PageSource: Send {
    /// Fetch the next page, or `None` once the listing is exhausted.
    async fn next_page(&mut self) -> Result<Option<Page>>;
}
