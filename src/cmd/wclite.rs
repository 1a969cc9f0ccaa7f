use std::path::PathBuf;

use clap::Parser;

/// Count words across one or more text files.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Input file, directory, or glob pattern
    pub input: String,

    /// Output file; fully replaced on success
    pub output: PathBuf,

    /// Number of shuffle buckets
    #[clap(short, long)]
    pub buckets: Option<u32>,

    /// Number of map workers
    #[clap(short, long)]
    pub workers: Option<usize>,

    /// Re-attempts allowed per failed shard
    #[clap(short, long)]
    pub retries: Option<u32>,

    /// JSON job configuration file; flags override its values
    #[clap(short, long)]
    pub config: Option<PathBuf>,
}
