//! Reads input files as streams of line records.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use glob::glob;

use crate::error::EngineError;

/// One line of input text.
///
/// `offset` is the byte position of the line's start within its file,
/// carried for diagnostics only; correctness never depends on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub offset: u64,
    pub text: String,
}

/// A contiguous slice of input assigned to one map worker.
///
/// One shard per input file; ids are stable across runs because shard
/// discovery sorts paths.
#[derive(Debug, Clone)]
pub struct Shard {
    pub id: usize,
    pub path: PathBuf,
}

/// Expands `input` into the run's shard list.
///
/// `input` may be a single file, a directory (every file directly
/// inside it), or a glob pattern.
pub fn discover_shards(input: &str) -> Result<Vec<Shard>, EngineError> {
    let path = Path::new(input);
    let mut paths: Vec<PathBuf> = if path.is_dir() {
        let entries = std::fs::read_dir(path).map_err(|e| EngineError::InputUnreadable {
            path: input.to_string(),
            source: e,
        })?;
        entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect()
    } else if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        glob(input)
            .map_err(|_| EngineError::InputNotFound {
                path: input.to_string(),
            })?
            .flatten()
            .filter(|p| p.is_file())
            .collect()
    };

    if paths.is_empty() {
        return Err(EngineError::InputNotFound {
            path: input.to_string(),
        });
    }
    paths.sort_unstable();
    Ok(paths
        .into_iter()
        .enumerate()
        .map(|(id, path)| Shard { id, path })
        .collect())
}

/// Streams the lines of one shard, in file order, with byte offsets.
///
/// A file without a trailing newline still yields its final line. The
/// iterator ends after the first read error.
pub fn read_lines(
    shard: &Shard,
) -> Result<impl Iterator<Item = Result<Line, EngineError>>, EngineError> {
    let path = shard.path.clone();
    let file = File::open(&path).map_err(|e| EngineError::InputUnreadable {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut reader = BufReader::new(file);
    let mut offset: u64 = 0;
    let mut failed = false;

    Ok(std::iter::from_fn(move || {
        if failed {
            return None;
        }
        let mut buf = String::new();
        match reader.read_line(&mut buf) {
            Ok(0) => None,
            Ok(n) => {
                let line_offset = offset;
                offset += n as u64;
                while buf.ends_with('\n') || buf.ends_with('\r') {
                    buf.pop();
                }
                Some(Ok(Line {
                    offset: line_offset,
                    text: buf,
                }))
            }
            Err(e) => {
                failed = true;
                Some(Err(EngineError::InputUnreadable {
                    path: path.display().to_string(),
                    source: e,
                }))
            }
        }
    }))
}
