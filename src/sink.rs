//! Writes final counts as tab-delimited rows, replacing prior output.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use itertools::Itertools;
use uuid::Uuid;

use crate::error::EngineError;
use crate::shuffle::FinalCount;

/// Header row naming the two output columns.
pub const HEADER: &str = "word\tcount";

/// Writes every bucket's totals to `dest`, fully replacing any prior
/// content at that path.
///
/// Rows land in a staging file next to `dest` and are renamed over it
/// only once fully written and flushed, so an aborted or failed run
/// leaves the destination exactly as it was. Rows are grouped by bucket
/// and sorted by token within a bucket, which keeps output reproducible
/// across runs with the same bucket count.
pub fn write_counts(
    dest: &Path,
    finals: &[FinalCount],
    run_id: &Uuid,
) -> Result<(), EngineError> {
    let staging = staging_path(dest, run_id);
    let result = write_staged(&staging, dest, finals);
    if result.is_err() {
        let _ = fs::remove_file(&staging);
    }
    result
}

fn staging_path(dest: &Path, run_id: &Uuid) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{name}.{run_id}.staging"))
}

fn unwritable(dest: &Path, source: std::io::Error) -> EngineError {
    EngineError::OutputUnwritable {
        path: dest.display().to_string(),
        source,
    }
}

fn write_staged(staging: &Path, dest: &Path, finals: &[FinalCount]) -> Result<(), EngineError> {
    let file = File::create(staging).map_err(|e| unwritable(dest, e))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "{HEADER}").map_err(|e| unwritable(dest, e))?;
    for final_count in finals {
        for (token, n) in final_count.counts.iter().sorted_by(|a, b| a.0.cmp(b.0)) {
            writeln!(out, "{token}\t{n}").map_err(|e| unwritable(dest, e))?;
        }
    }
    out.flush().map_err(|e| unwritable(dest, e))?;

    fs::rename(staging, dest).map_err(|e| unwritable(dest, e))
}
