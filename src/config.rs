//! Run configuration for the job driver.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

/// What to do when the destination already holds output.
///
/// Replacement is the only supported mode: a successful run fully
/// replaces prior output, never appends to or merges with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    #[default]
    Replace,
}

/// Options recognized by the job driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Number of shuffle partitions.
    pub bucket_count: u32,
    /// Re-attempts allowed per failed shard, on top of the first attempt.
    pub retry_budget: u32,
    /// Number of map workers. Independent of the bucket count.
    pub workers: usize,
    pub output_mode: OutputMode,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            bucket_count: 11,
            retry_budget: 2,
            workers: default_workers(),
            output_mode: OutputMode::Replace,
        }
    }
}

impl JobConfig {
    /// Loads a configuration from a JSON file. Unset fields fall back
    /// to their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Rejects configurations the engine cannot run with.
    pub fn validated(self) -> Result<Self> {
        ensure!(self.bucket_count > 0, "bucket_count must be at least 1");
        ensure!(self.workers > 0, "workers must be at least 1");
        Ok(self)
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = JobConfig::default().validated().unwrap();
        assert!(config.bucket_count > 0);
        assert!(config.workers > 0);
        assert_eq!(config.output_mode, OutputMode::Replace);
    }

    #[test]
    fn zero_buckets_is_rejected() {
        let config = JobConfig {
            bucket_count: 0,
            ..Default::default()
        };
        assert!(config.validated().is_err());
    }

    #[test]
    fn partial_config_file_keeps_defaults_for_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.json");
        std::fs::write(&path, r#"{ "bucket_count": 3 }"#).unwrap();

        let config = JobConfig::from_file(&path).unwrap();
        assert_eq!(config.bucket_count, 3);
        assert_eq!(config.retry_budget, JobConfig::default().retry_budget);
    }

    #[test]
    fn output_mode_round_trips_as_kebab_case() {
        let json = serde_json::to_string(&OutputMode::Replace).unwrap();
        assert_eq!(json, r#""replace""#);
    }
}
