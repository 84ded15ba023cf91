//! S3 client construction and paginated listing.

mod client;
mod list;
mod retry;

pub use client::{S3Config, create_s3_client};
pub use list::S3PageSource;
pub use retry::{ErrorClassification, RetryConfig, classify_error, with_retry};
