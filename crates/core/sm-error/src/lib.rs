//! Error types for s3meter.
//!
//! This crate provides:
//! - [`SmError`] - Top-level error enum shared across the workspace
//! - [`ListingError`] - Terminal failures while enumerating a bucket
//! - A [`Result`] alias used throughout the other crates

use thiserror::Error;

/// Top-level error type for s3meter.
#[derive(Error, Debug)]
pub enum SmError {
    /// The listing source failed to enumerate the bucket
    #[error("Listing error: {0}")]
    Listing(#[from] ListingError),

    /// Invalid or incomplete configuration, detected before any listing call
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors (wrapped anyhow)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Terminal listing failures.
///
/// These surface after the listing source has exhausted its own retry budget;
/// a single one aborts the whole aggregation run.
#[derive(Error, Debug)]
pub enum ListingError {
    /// The bucket does not exist in the resolved region
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    /// The credentials in use may not list this bucket
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Any other enumeration failure (network, API error)
    #[error("Listing failed: {0}")]
    Api(String),
}

impl ListingError {
    /// Map a listing-API failure to a terminal error variant.
    ///
    /// The SDK surfaces service errors as display strings; matching is done
    /// case-insensitively on the well-known S3 error codes.
    pub fn from_api_failure(bucket: &str, error: impl std::fmt::Display) -> Self {
        let message = error.to_string();
        let lower = message.to_lowercase();

        if lower.contains("nosuchbucket") {
            ListingError::BucketNotFound(bucket.to_string())
        } else if lower.contains("accessdenied") || lower.contains("403") {
            ListingError::AccessDenied(message)
        } else {
            ListingError::Api(message)
        }
    }
}

/// Result type alias using SmError.
pub type Result<T> = std::result::Result<T, SmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_api_failure_bucket_not_found() {
        let err = ListingError::from_api_failure("my-bucket", "NoSuchBucket: it is gone");
        assert!(matches!(err, ListingError::BucketNotFound(ref b) if b == "my-bucket"));
    }

    #[test]
    fn test_from_api_failure_access_denied() {
        let err = ListingError::from_api_failure("my-bucket", "AccessDenied: nope");
        assert!(matches!(err, ListingError::AccessDenied(_)));

        let err = ListingError::from_api_failure("my-bucket", "HTTP 403 Forbidden");
        assert!(matches!(err, ListingError::AccessDenied(_)));
    }

    #[test]
    fn test_from_api_failure_other() {
        let err = ListingError::from_api_failure("my-bucket", "connection reset by peer");
        assert!(matches!(err, ListingError::Api(_)));
    }

    #[test]
    fn test_error_display() {
        let err = SmError::Listing(ListingError::BucketNotFound("my-bucket".to_string()));
        assert!(err.to_string().contains("Bucket not found"));

        let err = SmError::Config("--secret-key given without --access-key".to_string());
        assert!(err.to_string().contains("Configuration error"));
    }
}
