//! The concurrent pagination-and-aggregation engine.

use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;
use sm_error::{Result, SmError};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::config::AggregationConfig;
use crate::source::PageSource;
use crate::stats::AggregateStats;

/// Drives a [`PageSource`] to exhaustion and folds every page into one
/// [`AggregateStats`] record.
///
/// Each page is folded by its own task so network-bound fetches overlap with
/// folding; a semaphore bounds how many folds run at once. The driver never
/// waits for a fold before requesting the next page, and the final result is
/// only read after every dispatched fold has completed.
pub struct Aggregator<S: PageSource> {
    source: S,
    config: AggregationConfig,
}

impl<S: PageSource> Aggregator<S> {
    /// Create an aggregator over a page source.
    pub fn new(source: S, config: AggregationConfig) -> Self {
        Self { source, config }
    }

    /// Consume the listing and return the final statistics snapshot.
    ///
    /// On a listing error the in-flight folds are still drained before the
    /// error propagates; no partial statistics are ever returned.
    pub async fn aggregate(mut self) -> Result<AggregateStats> {
        let stats = Arc::new(Mutex::new(AggregateStats::new()));
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_folds));
        let mut folds = Vec::new();
        let mut pages: u64 = 0;
        let mut listing_error: Option<SmError> = None;

        loop {
            match self.source.next_page().await {
                Ok(Some(page)) => {
                    let permit = match semaphore.clone().acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            listing_error =
                                Some(SmError::Config(format!("Failed to acquire semaphore: {e}")));
                            break;
                        }
                    };

                    pages += 1;
                    let stats = Arc::clone(&stats);
                    folds.push(tokio::spawn(async move {
                        let _permit = permit;
                        // Fold lock-free into a page-local record, then merge
                        // under the lock.
                        let page_stats = AggregateStats::from_page(&page);
                        stats.lock().merge(&page_stats);
                    }));
                }
                Ok(None) => break,
                Err(e) => {
                    listing_error = Some(e);
                    break;
                }
            }
        }

        // Completion barrier: every dispatched fold finishes before the
        // result (or the error) is surfaced.
        let joined = join_all(folds).await;

        if let Some(e) = listing_error {
            return Err(e);
        }

        for join in joined {
            join.map_err(|e| SmError::Other(anyhow::anyhow!("page fold task failed: {e}")))?;
        }

        debug!(pages, "Listing exhausted, folds complete");

        let stats = Arc::try_unwrap(stats)
            .map(Mutex::into_inner)
            .unwrap_or_else(|stats| stats.lock().clone());
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{DeleteMarkerEntry, ObjectEntry, Page};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use sm_error::ListingError;
    use std::collections::VecDeque;

    /// Synthetic source that replays a fixed sequence of pages and errors.
    struct VecPageSource {
        items: VecDeque<std::result::Result<Page, ListingError>>,
    }

    impl VecPageSource {
        fn new(items: Vec<std::result::Result<Page, ListingError>>) -> Self {
            Self {
                items: items.into(),
            }
        }
    }

    #[async_trait]
    impl PageSource for VecPageSource {
        async fn next_page(&mut self) -> Result<Option<Page>> {
            match self.items.pop_front() {
                None => Ok(None),
                Some(Ok(page)) => Ok(Some(page)),
                Some(Err(e)) => Err(e.into()),
            }
        }
    }

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn entry(key: &str, size: u64, modified: Option<i64>, is_current: bool) -> ObjectEntry {
        ObjectEntry {
            key: key.to_string(),
            size,
            last_modified: modified.map(ts),
            is_current,
        }
    }

    fn page(entries: Vec<ObjectEntry>) -> Page {
        Page {
            entries,
            delete_markers: Vec::new(),
        }
    }

    async fn aggregate_pages(pages: Vec<Page>, config: AggregationConfig) -> AggregateStats {
        let source = VecPageSource::new(pages.into_iter().map(Ok).collect());
        Aggregator::new(source, config).aggregate().await.unwrap()
    }

    #[tokio::test]
    async fn test_empty_source() {
        let stats = aggregate_pages(vec![], AggregationConfig::new()).await;

        assert_eq!(stats, AggregateStats::new());
        assert!(stats.last_modified.is_none());
        assert_eq!(stats.average_current_size(), None);
    }

    #[tokio::test]
    async fn test_empty_pages_count_nothing() {
        let stats =
            aggregate_pages(vec![Page::default(), Page::default()], AggregationConfig::new()).await;
        assert_eq!(stats.total_count(), 0);
    }

    #[tokio::test]
    async fn test_current_only_bucket() {
        // 3 current objects of sizes 100/200/300, no versioning
        let stats = aggregate_pages(
            vec![page(vec![
                entry("a", 100, Some(1), true),
                entry("b", 200, Some(2), true),
                entry("c", 300, Some(3), true),
            ])],
            AggregationConfig::new(),
        )
        .await;

        assert_eq!(stats.current_count, 3);
        assert_eq!(stats.current_size, 600);
        assert_eq!(stats.versioned_count, 0);
        assert_eq!(stats.versioned_size, 0);
        assert_eq!(stats.delete_markers, 0);
        assert_eq!(stats.last_modified, Some(ts(3)));
        assert_eq!(stats.average_current_size(), Some(200));
    }

    #[tokio::test]
    async fn test_versioned_bucket() {
        // 2 keys, each one current (50, 150) and one non-current (10, 20)
        // version, plus a delete marker
        let stats = aggregate_pages(
            vec![Page {
                entries: vec![
                    entry("k1", 50, Some(5), true),
                    entry("k1", 10, Some(1), false),
                    entry("k2", 150, Some(6), true),
                    entry("k2", 20, Some(2), false),
                ],
                delete_markers: vec![DeleteMarkerEntry {
                    key: "k3".to_string(),
                    last_modified: Some(ts(7)),
                }],
            }],
            AggregationConfig::new(),
        )
        .await;

        assert_eq!(stats.current_count, 2);
        assert_eq!(stats.current_size, 200);
        assert_eq!(stats.versioned_count, 2);
        assert_eq!(stats.versioned_size, 30);
        assert_eq!(stats.delete_markers, 1);
        assert_eq!(stats.last_modified, Some(ts(6)));
    }

    fn synthetic_entries(count: usize) -> Vec<ObjectEntry> {
        (0..count)
            .map(|i| {
                entry(
                    &format!("key-{i:04}"),
                    ((i * 37) % 1000) as u64,
                    Some(i as i64),
                    i % 3 != 0,
                )
            })
            .collect()
    }

    fn partition(entries: &[ObjectEntry], page_size: usize) -> Vec<Page> {
        entries
            .chunks(page_size)
            .map(|chunk| page(chunk.to_vec()))
            .collect()
    }

    #[tokio::test]
    async fn test_partition_invariance() {
        let entries = synthetic_entries(120);

        let as_one = aggregate_pages(partition(&entries, 120), AggregationConfig::new()).await;
        let as_seven = aggregate_pages(partition(&entries, 17), AggregationConfig::new()).await;
        let as_singletons = aggregate_pages(partition(&entries, 1), AggregationConfig::new()).await;

        assert_eq!(as_one, as_seven);
        assert_eq!(as_one, as_singletons);
    }

    #[tokio::test]
    async fn test_every_entry_folded_exactly_once() {
        let entries = synthetic_entries(200);
        let expected_current = entries.iter().filter(|e| e.is_current).count() as u64;
        let expected_bytes: u64 = entries.iter().map(|e| e.size).sum();

        let mut pages = partition(&entries, 9);
        pages[0].delete_markers = vec![
            DeleteMarkerEntry {
                key: "m1".to_string(),
                last_modified: None,
            },
            DeleteMarkerEntry {
                key: "m2".to_string(),
                last_modified: None,
            },
        ];

        let stats = aggregate_pages(pages, AggregationConfig::new()).await;

        assert_eq!(stats.total_count(), 200);
        assert_eq!(stats.current_count, expected_current);
        assert_eq!(stats.versioned_count, 200 - expected_current);
        assert_eq!(stats.total_size(), expected_bytes);
        assert_eq!(stats.delete_markers, 2);
    }

    #[tokio::test]
    async fn test_many_pages_with_bounded_concurrency() {
        let entries = synthetic_entries(640);
        let pages = partition(&entries, 10);
        let expected = aggregate_pages(partition(&entries, 640), AggregationConfig::new()).await;

        let stats =
            aggregate_pages(pages, AggregationConfig::new().with_max_concurrent_folds(4)).await;

        assert_eq!(stats, expected);
    }

    #[tokio::test]
    async fn test_last_modified_max_across_pages() {
        let stats = aggregate_pages(
            vec![
                page(vec![entry("a", 1, Some(30), true)]),
                page(vec![entry("b", 1, Some(90), true)]),
                page(vec![entry("c", 1, Some(60), true)]),
            ],
            AggregationConfig::new(),
        )
        .await;

        assert_eq!(stats.last_modified, Some(ts(90)));
    }

    #[tokio::test]
    async fn test_listing_error_aborts_without_partial_stats() {
        let source = VecPageSource::new(vec![
            Ok(page(vec![entry("a", 100, None, true)])),
            Ok(page(vec![entry("b", 200, None, true)])),
            Ok(page(vec![entry("c", 300, None, true)])),
            Err(ListingError::Api("connection reset".to_string())),
        ]);

        let result = Aggregator::new(source, AggregationConfig::new())
            .aggregate()
            .await;

        match result {
            Err(SmError::Listing(ListingError::Api(_))) => {}
            other => panic!("expected listing error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_on_first_page() {
        let source = VecPageSource::new(vec![Err(ListingError::BucketNotFound(
            "missing-bucket".to_string(),
        ))]);

        let result = Aggregator::new(source, AggregationConfig::new())
            .aggregate()
            .await;

        assert!(matches!(
            result,
            Err(SmError::Listing(ListingError::BucketNotFound(_)))
        ));
    }
}
