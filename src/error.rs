//! Error taxonomy for the engine.

use thiserror::Error;

use crate::BucketIndex;

/// Everything that can fatally fail a run.
///
/// A shard's map/combine failure is retried up to the configured budget
/// before it surfaces here as [`EngineError::WorkerFailure`]. A merge
/// failure is always fatal: partial output is not an acceptable success
/// state, so the run fails rather than expose an incomplete result.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No input file matched the given path, directory, or pattern.
    #[error("input not found: {path}")]
    InputNotFound { path: String },

    /// An input file exists but could not be opened or read.
    #[error("input unreadable: {path}")]
    InputUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The destination could not be staged, written, or replaced.
    #[error("output unwritable: {path}")]
    OutputUnwritable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// One shard's map/combine phase failed on every attempt.
    #[error("shard `{shard}` failed after {attempts} attempts")]
    WorkerFailure {
        shard: String,
        attempts: u32,
        #[source]
        source: Box<EngineError>,
    },

    /// One bucket's merge could not complete.
    #[error("merge failed for bucket {bucket}: {detail}")]
    MergeFailure { bucket: BucketIndex, detail: String },
}
