//! s3meter CLI
//!
//! Aggregate storage statistics for an S3 bucket.

use std::time::Instant;

use clap::Parser;
use sm_aggregator::AggregateStats;
use sm_cli_common::{format_bytes, format_number, init_logging};

mod args;
mod progress;
mod run;

use args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Logging and progress go to stderr; stdout carries only the report
    init_logging(args.log_level)?;

    let started = Instant::now();
    let stats = match run::execute(&args).await {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };

    print_report(&args, &stats, started.elapsed().as_secs_f64());

    Ok(())
}

fn print_report(args: &Cli, stats: &AggregateStats, elapsed_secs: f64) {
    println!();
    println!("S3 storage report");
    println!("  Bucket:          {}", args.bucket);
    if let Some(prefix) = &args.prefix {
        println!("  Prefix:          {}", prefix);
    }
    println!("  Elapsed:         {:.2}s", elapsed_secs);
    println!();
    println!(
        "  Current objects: {} ({})",
        format_number(stats.current_count),
        format_bytes(stats.current_size)
    );

    if args.include_versions {
        println!(
            "  Older versions:  {} ({})",
            format_number(stats.versioned_count),
            format_bytes(stats.versioned_size)
        );
        println!("  Delete markers:  {}", format_number(stats.delete_markers));
        println!("  Total size:      {}", format_bytes(stats.total_size()));
    }

    if args.detailed {
        let last_modified = stats
            .last_modified
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "n/a".to_string());
        println!("  Last modified:   {}", last_modified);

        let average = stats
            .average_current_size()
            .map(format_bytes)
            .unwrap_or_else(|| "n/a".to_string());
        println!("  Average size:    {}", average);
    }
}
