//! Paginated S3 listing as a [`PageSource`].

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use chrono::{DateTime, Utc};
use sm_error::{ListingError, Result};
use tracing::debug;

use super::retry::{RetryConfig, with_retry};
use crate::config::ListingMode;
use crate::source::{DeleteMarkerEntry, ObjectEntry, Page, PageSource};

/// Pagination cursor across listing calls.
#[derive(Debug, Clone)]
enum PagerState {
    Start,
    NextObjects {
        continuation_token: String,
    },
    NextVersions {
        key_marker: Option<String>,
        version_id_marker: Option<String>,
    },
    Exhausted,
}

/// A [`PageSource`] backed by the S3 listing APIs.
///
/// `CurrentOnly` mode drives ListObjectsV2 with continuation tokens;
/// `AllVersions` drives ListObjectVersions with key/version-id markers.
/// Transient failures are retried per [`RetryConfig`]; anything that survives
/// the budget ends the sequence with a terminal [`ListingError`].
pub struct S3PageSource {
    client: Client,
    bucket: String,
    prefix: Option<String>,
    mode: ListingMode,
    retry: RetryConfig,
    state: PagerState,
}

impl S3PageSource {
    /// Create a page source for one bucket/prefix/mode.
    pub fn new(
        client: Client,
        bucket: impl Into<String>,
        prefix: Option<String>,
        mode: ListingMode,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix,
            mode,
            retry: RetryConfig::default(),
            state: PagerState::Start,
        }
    }

    /// Override the retry configuration.
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The bucket this source lists.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn fetch_object_page(&mut self) -> Result<Page> {
        let token = match &self.state {
            PagerState::NextObjects { continuation_token } => Some(continuation_token.clone()),
            _ => None,
        };

        let client = self.client.clone();
        let bucket = self.bucket.clone();
        let prefix = self.prefix.clone();

        let resp = with_retry(&self.retry, "list_objects_v2", || {
            let client = client.clone();
            let bucket = bucket.clone();
            let prefix = prefix.clone();
            let token = token.clone();

            async move {
                let mut req = client.list_objects_v2().bucket(&bucket);
                if let Some(ref prefix) = prefix {
                    req = req.prefix(prefix);
                }
                if let Some(ref token) = token {
                    req = req.continuation_token(token);
                }
                req.send()
                    .await
                    .map_err(|e| format!("list_objects_v2 failed: {}", DisplayErrorContext(e)))
            }
        })
        .await
        .map_err(|e| ListingError::from_api_failure(&self.bucket, e))?;

        let mut page = Page::default();
        if let Some(contents) = resp.contents {
            for obj in contents {
                // The current-only API returns only live objects.
                if let Some(entry) = entry_from_object(obj) {
                    page.entries.push(entry);
                }
            }
        }

        self.state = if resp.is_truncated == Some(true) {
            match resp.next_continuation_token {
                Some(continuation_token) => PagerState::NextObjects { continuation_token },
                None => PagerState::Exhausted,
            }
        } else {
            PagerState::Exhausted
        };

        debug!(
            bucket = %self.bucket,
            entries = page.entries.len(),
            "Fetched object page"
        );

        Ok(page)
    }

    async fn fetch_version_page(&mut self) -> Result<Page> {
        let (key_marker, version_id_marker) = match &self.state {
            PagerState::NextVersions {
                key_marker,
                version_id_marker,
            } => (key_marker.clone(), version_id_marker.clone()),
            _ => (None, None),
        };

        let client = self.client.clone();
        let bucket = self.bucket.clone();
        let prefix = self.prefix.clone();

        let resp = with_retry(&self.retry, "list_object_versions", || {
            let client = client.clone();
            let bucket = bucket.clone();
            let prefix = prefix.clone();
            let key_marker = key_marker.clone();
            let version_id_marker = version_id_marker.clone();

            async move {
                let mut req = client.list_object_versions().bucket(&bucket);
                if let Some(ref prefix) = prefix {
                    req = req.prefix(prefix);
                }
                if let Some(ref marker) = key_marker {
                    req = req.key_marker(marker);
                }
                if let Some(ref marker) = version_id_marker {
                    req = req.version_id_marker(marker);
                }
                req.send().await.map_err(|e| {
                    format!("list_object_versions failed: {}", DisplayErrorContext(e))
                })
            }
        })
        .await
        .map_err(|e| ListingError::from_api_failure(&self.bucket, e))?;

        let mut page = Page::default();
        if let Some(versions) = resp.versions {
            for version in versions {
                if let Some(entry) = entry_from_version(version) {
                    page.entries.push(entry);
                }
            }
        }
        if let Some(markers) = resp.delete_markers {
            for marker in markers {
                if let Some(marker) = marker_from_sdk(marker) {
                    page.delete_markers.push(marker);
                }
            }
        }

        self.state = if resp.is_truncated == Some(true) {
            let key_marker = resp.next_key_marker;
            let version_id_marker = resp.next_version_id_marker;
            if key_marker.is_none() && version_id_marker.is_none() {
                PagerState::Exhausted
            } else {
                PagerState::NextVersions {
                    key_marker,
                    version_id_marker,
                }
            }
        } else {
            PagerState::Exhausted
        };

        debug!(
            bucket = %self.bucket,
            entries = page.entries.len(),
            delete_markers = page.delete_markers.len(),
            "Fetched version page"
        );

        Ok(page)
    }
}

#[async_trait]
impl PageSource for S3PageSource {
    async fn next_page(&mut self) -> Result<Option<Page>> {
        if matches!(self.state, PagerState::Exhausted) {
            return Ok(None);
        }

        let page = match self.mode {
            ListingMode::CurrentOnly => self.fetch_object_page().await?,
            ListingMode::AllVersions => self.fetch_version_page().await?,
        };

        Ok(Some(page))
    }
}

fn convert_timestamp(t: Option<aws_sdk_s3::primitives::DateTime>) -> Option<DateTime<Utc>> {
    t.and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()))
}

fn entry_from_object(obj: aws_sdk_s3::types::Object) -> Option<ObjectEntry> {
    let key = obj.key.unwrap_or_default();

    // Skip directory markers and empty keys
    if key.is_empty() || key.ends_with('/') {
        return None;
    }

    Some(ObjectEntry {
        key,
        size: obj.size.unwrap_or(0).max(0) as u64,
        last_modified: convert_timestamp(obj.last_modified),
        is_current: true,
    })
}

fn entry_from_version(version: aws_sdk_s3::types::ObjectVersion) -> Option<ObjectEntry> {
    let key = version.key.unwrap_or_default();

    // Skip directory markers and empty keys
    if key.is_empty() || key.ends_with('/') {
        return None;
    }

    Some(ObjectEntry {
        key,
        size: version.size.unwrap_or(0).max(0) as u64,
        last_modified: convert_timestamp(version.last_modified),
        is_current: version.is_latest.unwrap_or(false),
    })
}

fn marker_from_sdk(marker: aws_sdk_s3::types::DeleteMarkerEntry) -> Option<DeleteMarkerEntry> {
    let key = marker.key.unwrap_or_default();
    if key.is_empty() {
        return None;
    }

    Some(DeleteMarkerEntry {
        key,
        last_modified: convert_timestamp(marker.last_modified),
    })
}
