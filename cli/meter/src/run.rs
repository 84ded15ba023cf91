//! Main execution logic for the s3meter CLI.

use anyhow::Result;
use sm_aggregator::{
    AggregateStats, AggregationConfig, Aggregator, ListingMode, S3Config, S3PageSource,
    create_s3_client,
};
use sm_error::SmError;
use tracing::debug;

use crate::args::Cli;
use crate::progress::ProgressReporter;

/// Execute an aggregation run with the provided arguments.
pub async fn execute(args: &Cli) -> Result<AggregateStats> {
    let mut s3_config = S3Config::new().with_region(&args.region);

    if let Some(endpoint) = &args.endpoint {
        s3_config = s3_config.with_endpoint(endpoint);
    }

    match (&args.access_key, &args.secret_key) {
        (Some(access_key), Some(secret_key)) => {
            s3_config = s3_config.with_credentials(access_key, secret_key, None);
        }
        (None, None) => {}
        _ => {
            return Err(SmError::Config(
                "--access-key and --secret-key must be given together".to_string(),
            )
            .into());
        }
    }

    if let Some(profile) = &args.profile {
        s3_config = s3_config.with_profile(profile);
    }

    let client = create_s3_client(&s3_config).await?;

    let mode = if args.include_versions {
        ListingMode::AllVersions
    } else {
        ListingMode::CurrentOnly
    };
    let source = S3PageSource::new(client, &args.bucket, args.prefix.clone(), mode);

    let config = AggregationConfig::new().with_max_concurrent_folds(args.concurrency);

    let mut progress = ProgressReporter::new(!args.no_progress, args.progress_interval);
    progress.start();
    let source = progress.wrap(source);

    debug!(
        bucket = %args.bucket,
        prefix = ?args.prefix,
        mode = ?mode,
        concurrency = config.max_concurrent_folds,
        "Starting aggregation"
    );

    let result = Aggregator::new(source, config).aggregate().await;
    progress.stop().await;

    Ok(result?)
}
