//! CLI argument definitions for s3meter.

use clap::Parser;
use sm_cli_common::LogLevel;

/// Aggregate storage statistics for an S3 bucket.
///
/// Walks the bucket's paginated listing and reports object counts, byte
/// sizes and delete markers, optionally including non-current versions.
///
/// ## Examples
///
/// Current objects only:
///   s3meter -b my-bucket
///
/// Whole version history under a prefix:
///   s3meter -b my-bucket -p logs/ --include-versions --detailed
#[derive(Parser, Debug)]
#[command(name = "s3meter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    // === S3 Configuration ===
    /// S3 bucket name
    #[arg(short, long, env = "S3METER_BUCKET")]
    pub bucket: String,

    /// Key prefix restricting aggregation to part of the bucket
    #[arg(short, long, env = "S3METER_PREFIX")]
    pub prefix: Option<String>,

    /// AWS region
    #[arg(short, long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    /// Custom S3 endpoint URL (for LocalStack)
    #[arg(long, env = "S3METER_ENDPOINT")]
    pub endpoint: Option<String>,

    /// AWS access key ID
    #[arg(long, env = "AWS_ACCESS_KEY_ID")]
    pub access_key: Option<String>,

    /// AWS secret access key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY")]
    pub secret_key: Option<String>,

    /// AWS profile name
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    // === Aggregation Options ===
    /// Include non-current object versions and delete markers
    #[arg(short = 'v', long)]
    pub include_versions: bool,

    /// Detailed output (last-modified timestamp and average object size)
    #[arg(short, long)]
    pub detailed: bool,

    /// Maximum concurrent page folds (must be >= 1)
    #[arg(long, default_value = "8", value_parser = parse_positive_usize)]
    pub concurrency: usize,

    // === Progress Options ===
    /// Seconds between progress lines on stderr (must be >= 1)
    #[arg(long, default_value = "5", value_parser = parse_positive_u64)]
    pub progress_interval: u64,

    /// Disable progress reporting
    #[arg(long)]
    pub no_progress: bool,

    // === Logging Options ===
    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

/// Parse a positive usize (>= 1).
fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value < 1 {
        return Err(format!("{} is not in 1..", value));
    }
    Ok(value)
}

/// Parse a positive u64 (>= 1).
fn parse_positive_u64(s: &str) -> Result<u64, String> {
    let value: u64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value < 1 {
        return Err(format!("{} is not in 1..", value));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["s3meter", "-b", "my-bucket"]).unwrap();

        assert_eq!(cli.bucket, "my-bucket");
        assert!(cli.prefix.is_none());
        assert!(!cli.include_versions);
        assert!(!cli.detailed);
        assert_eq!(cli.concurrency, 8);
        assert_eq!(cli.progress_interval, 5);
        assert!(!cli.no_progress);
    }

    #[test]
    fn test_bucket_is_required() {
        assert!(Cli::try_parse_from(["s3meter"]).is_err());
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "s3meter",
            "-b",
            "my-bucket",
            "-p",
            "logs/",
            "-v",
            "-d",
            "--concurrency",
            "4",
        ])
        .unwrap();

        assert_eq!(cli.prefix.as_deref(), Some("logs/"));
        assert!(cli.include_versions);
        assert!(cli.detailed);
        assert_eq!(cli.concurrency, 4);
    }

    #[test]
    fn test_concurrency_rejects_zero() {
        let result = Cli::try_parse_from(["s3meter", "-b", "my-bucket", "--concurrency", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_positive_usize() {
        assert_eq!(parse_positive_usize("3"), Ok(3));
        assert!(parse_positive_usize("0").is_err());
        assert!(parse_positive_usize("abc").is_err());
    }
}
