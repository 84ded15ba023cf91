//! sm-aggregator - concurrent bucket statistics aggregation for s3meter.
//!
//! This crate walks the paginated listing of an S3 bucket and folds every
//! entry into an aggregate statistics record. It supports:
//!
//! - Current-only listing (ListObjectsV2) and all-versions listing
//!   (ListObjectVersions) with delete-marker counting
//! - Concurrent page folding with a bounded number of in-flight folds
//! - Retry with exponential backoff for transient listing failures
//! - A [`PageSource`] trait seam so the aggregation logic runs against
//!   synthetic sources in tests
//!
//! # Example
//!
//! ```ignore
//! use sm_aggregator::{AggregationConfig, Aggregator, ListingMode, S3Config};
//! use sm_aggregator::s3::{S3PageSource, create_s3_client};
//!
//! let s3_config = S3Config::new().with_region("eu-west-1");
//! let client = create_s3_client(&s3_config).await?;
//!
//! let source = S3PageSource::new(client, "my-bucket", None, ListingMode::AllVersions);
//! let stats = Aggregator::new(source, AggregationConfig::new()).aggregate().await?;
//!
//! eprintln!("{} current objects", stats.current_count);
//! ```

pub mod aggregator;
pub mod config;
pub mod s3;
pub mod source;
pub mod stats;

pub use aggregator::Aggregator;
pub use config::{AggregationConfig, ListingMode};
pub use s3::{RetryConfig, S3Config, S3PageSource, create_s3_client};
pub use source::{DeleteMarkerEntry, ObjectEntry, Page, PageSource};
pub use stats::AggregateStats;
