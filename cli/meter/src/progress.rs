//! Progress reporting for aggregation runs.
//!
//! A listing has no known total, so progress is a running counter line on
//! stderr rather than a percentage bar.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sm_aggregator::{Page, PageSource};
use sm_cli_common::{format_bytes, format_number};
use sm_error::Result;
use tokio::task::JoinHandle;

/// Periodic progress reporter for aggregation runs.
pub struct ProgressReporter {
    /// Whether progress reporting is enabled
    enabled: bool,
    /// Reporting interval
    interval: Duration,
    /// Shared state for progress tracking
    state: Arc<ProgressState>,
    /// Handle to the background reporter task
    handle: Option<JoinHandle<()>>,
}

/// Shared state for progress tracking.
struct ProgressState {
    /// Number of pages listed so far
    pages_listed: AtomicU64,
    /// Number of entries and delete markers seen so far
    objects_seen: AtomicU64,
    /// Total bytes seen so far
    bytes_seen: AtomicU64,
    /// Whether to stop reporting
    stop: AtomicBool,
    /// Start time
    start_time: Instant,
}

impl ProgressReporter {
    /// Create a new progress reporter.
    pub fn new(enabled: bool, interval_secs: u64) -> Self {
        Self {
            enabled,
            interval: Duration::from_secs(interval_secs),
            state: Arc::new(ProgressState {
                pages_listed: AtomicU64::new(0),
                objects_seen: AtomicU64::new(0),
                bytes_seen: AtomicU64::new(0),
                stop: AtomicBool::new(false),
                start_time: Instant::now(),
            }),
            handle: None,
        }
    }

    /// Start the background progress reporter.
    pub fn start(&mut self) {
        if !self.enabled {
            return;
        }

        let state = Arc::clone(&self.state);
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.tick().await; // Skip first immediate tick

            loop {
                interval_timer.tick().await;

                if state.stop.load(Ordering::Relaxed) {
                    break;
                }

                let pages = state.pages_listed.load(Ordering::Relaxed);
                let objects = state.objects_seen.load(Ordering::Relaxed);
                let bytes = state.bytes_seen.load(Ordering::Relaxed);
                let elapsed = state.start_time.elapsed();

                let _ = writeln!(
                    io::stderr(),
                    "[progress] {} pages, {} objects, {} ({:.1}s elapsed)",
                    format_number(pages),
                    format_number(objects),
                    format_bytes(bytes),
                    elapsed.as_secs_f64()
                );
            }
        });

        self.handle = Some(handle);
    }

    /// Wrap a page source so that every page it yields is counted.
    pub fn wrap<S: PageSource>(&self, source: S) -> ProgressSource<S> {
        ProgressSource {
            inner: source,
            state: Arc::clone(&self.state),
            enabled: self.enabled,
        }
    }

    /// Stop the progress reporter and print a final summary line.
    pub async fn stop(mut self) {
        if !self.enabled {
            return;
        }

        self.state.stop.store(true, Ordering::Relaxed);

        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }

        let pages = self.state.pages_listed.load(Ordering::Relaxed);
        let objects = self.state.objects_seen.load(Ordering::Relaxed);
        let bytes = self.state.bytes_seen.load(Ordering::Relaxed);
        let elapsed = self.state.start_time.elapsed();

        let _ = writeln!(
            io::stderr(),
            "[progress] Complete: {} pages, {} objects, {} ({:.1}s)",
            format_number(pages),
            format_number(objects),
            format_bytes(bytes),
            elapsed.as_secs_f64()
        );
    }
}

/// A [`PageSource`] decorator that feeds the progress counters.
pub struct ProgressSource<S> {
    inner: S,
    state: Arc<ProgressState>,
    enabled: bool,
}

#[async_trait]
impl<S: PageSource> PageSource for ProgressSource<S> {
    async fn next_page(&mut self) -> Result<Option<Page>> {
        let page = self.inner.next_page().await?;

        if self.enabled {
            if let Some(ref page) = page {
                self.state.pages_listed.fetch_add(1, Ordering::Relaxed);
                self.state
                    .objects_seen
                    .fetch_add(page.len() as u64, Ordering::Relaxed);
                self.state
                    .bytes_seen
                    .fetch_add(page.bytes(), Ordering::Relaxed);
            }
        }

        Ok(page)
    }
}
