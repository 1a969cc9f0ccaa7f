//! Orchestrates a word-count run from source to sink.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{info, warn};
use uuid::Uuid;

use crate::combine::PartialCount;
use crate::config::JobConfig;
use crate::error::EngineError;
use crate::shuffle::{FinalCount, Shuffle};
use crate::sink;
use crate::source::{self, Shard};
use crate::tokenize;

/// Lifecycle of a run. `Failed` is reachable from every non-terminal
/// state; the destination is only touched in `Writing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    MappingAndCombining,
    ShufflingAndMerging,
    Writing,
    Completed,
    Failed,
}

/// Summary of a completed run, for operator logs.
#[derive(Debug)]
pub struct JobReport {
    pub name: String,
    pub shards: usize,
    pub buckets_written: usize,
    pub distinct_tokens: usize,
    pub total_tokens: u64,
    pub elapsed: Duration,
}

/// Human-readable identifier for a run, derived from its endpoints.
/// Attached to logs and monitoring only; never part of correctness.
pub fn job_name(input: &str, output: &Path) -> String {
    format!("wclite: '{}' -> '{}'", input, output.display())
}

/// Runs the two-phase pipeline synchronously to completion or failure.
///
/// There is no partial success: either every bucket merges and the
/// destination is atomically replaced, or the run fails and the
/// destination is left exactly as it was before the run started.
pub struct Driver {
    config: JobConfig,
    state: JobState,
    run_id: Uuid,
}

impl Driver {
    pub fn new(config: JobConfig) -> Self {
        Self {
            config,
            state: JobState::Pending,
            run_id: Uuid::new_v4(),
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn run_id(&self) -> &Uuid {
        &self.run_id
    }

    pub fn run(&mut self, input: &str, output: &Path) -> Result<JobReport, EngineError> {
        match self.try_run(input, output) {
            Ok(report) => {
                self.state = JobState::Completed;
                Ok(report)
            }
            Err(err) => {
                self.state = JobState::Failed;
                Err(err)
            }
        }
    }

    fn try_run(&mut self, input: &str, output: &Path) -> Result<JobReport, EngineError> {
        let name = job_name(input, output);
        let started = Instant::now();
        info!(job = %name, run_id = %self.run_id, "starting run");

        let shards = source::discover_shards(input)?;
        info!(shards = shards.len(), workers = self.config.workers, "input discovered");

        self.state = JobState::MappingAndCombining;
        let shuffle = Shuffle::new(self.config.bucket_count);
        self.map_and_combine(&shards, &shuffle)?;

        self.state = JobState::ShufflingAndMerging;
        let finals = shuffle.merge()?;

        self.state = JobState::Writing;
        sink::write_counts(output, &finals, &self.run_id)?;

        let report = report_for(name, shards.len(), &finals, started.elapsed());
        info!(
            buckets = report.buckets_written,
            distinct = report.distinct_tokens,
            total = report.total_tokens,
            "run completed"
        );
        Ok(report)
    }

    /// Runs the map/combine phase over all shards with a pool of worker
    /// threads draining a shared queue.
    ///
    /// A shard failure does not abort other shards' in-flight work; the
    /// pool keeps draining the queue and the first recorded failure is
    /// surfaced once every shard has been attempted.
    fn map_and_combine(&self, shards: &[Shard], shuffle: &Shuffle) -> Result<(), EngineError> {
        let queue: Mutex<VecDeque<Shard>> = Mutex::new(shards.iter().cloned().collect());
        let failures: Mutex<Vec<EngineError>> = Mutex::new(Vec::new());
        let workers = self.config.workers.min(shards.len()).max(1);

        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    let shard = queue.lock().expect("shard queue poisoned").pop_front();
                    let Some(shard) = shard else { break };
                    match run_shard(&shard, self.config.retry_budget) {
                        Ok(partial) => shuffle.accept(partial),
                        Err(err) => failures.lock().expect("failure list poisoned").push(err),
                    }
                });
            }
        });

        let mut failures = failures.into_inner().expect("failure list poisoned");
        match failures.is_empty() {
            true => Ok(()),
            false => Err(failures.remove(0)),
        }
    }
}

/// Maps and combines one shard, retrying from scratch on failure.
///
/// Every attempt re-reads the shard from its beginning and builds a
/// fresh [`PartialCount`]; a failed attempt's partial never reaches the
/// shuffle, so a retry cannot double count.
fn run_shard(shard: &Shard, retry_budget: u32) -> Result<PartialCount, EngineError> {
    let attempts = retry_budget + 1;
    let mut last_err = None;
    for attempt in 1..=attempts {
        match map_shard_once(shard) {
            Ok(partial) => return Ok(partial),
            Err(err) => {
                warn!(
                    shard = %shard.path.display(),
                    attempt,
                    "shard attempt failed: {err}"
                );
                last_err = Some(err);
            }
        }
    }
    Err(EngineError::WorkerFailure {
        shard: shard.path.display().to_string(),
        attempts,
        source: Box::new(last_err.expect("no attempt was made")),
    })
}

fn map_shard_once(shard: &Shard) -> Result<PartialCount, EngineError> {
    let mut partial = PartialCount::new();
    for line in source::read_lines(shard)? {
        let line = line?;
        for token in tokenize::tokens(&line.text) {
            partial.add(token);
        }
    }
    Ok(partial)
}

fn report_for(
    name: String,
    shards: usize,
    finals: &[FinalCount],
    elapsed: Duration,
) -> JobReport {
    JobReport {
        name,
        shards,
        buckets_written: finals.len(),
        distinct_tokens: finals.iter().map(|f| f.counts.len()).sum(),
        total_tokens: finals.iter().flat_map(|f| f.counts.values()).sum(),
        elapsed,
    }
}
