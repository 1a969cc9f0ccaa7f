use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wclite::cmd::wclite::Args;
use wclite::config::JobConfig;
use wclite::driver::{job_name, Driver};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

fn build_config(args: &Args) -> Result<JobConfig> {
    let mut config = match &args.config {
        Some(path) => JobConfig::from_file(path)?,
        None => JobConfig::default(),
    };
    if let Some(buckets) = args.buckets {
        config.bucket_count = buckets;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(retries) = args.retries {
        config.retry_budget = retries;
    }
    config.validated()
}

fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let config = build_config(&args)?;
    let name = job_name(&args.input, &args.output);

    let mut driver = Driver::new(config);
    let report = driver
        .run(&args.input, &args.output)
        .with_context(|| format!("Job failed: {name}"))?;

    tracing::info!(
        shards = report.shards,
        buckets = report.buckets_written,
        distinct = report.distinct_tokens,
        total = report.total_tokens,
        "{} finished in {:.2?}",
        report.name,
        report.elapsed
    );
    Ok(())
}
