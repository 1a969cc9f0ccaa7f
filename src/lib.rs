//! A self-contained batch word-count engine.
//!
//! Input files are split into shards (one per file), tokenized and
//! locally aggregated by a pool of map workers, routed to shuffle
//! buckets by a stable hash, and merged per bucket into final totals,
//! which are written out as tab-delimited rows. All intermediate state
//! lives in process memory; the only durable artifact is the output
//! file, which is replaced atomically on full success.

use std::hash::Hasher;

pub mod cmd;
pub mod combine;
pub mod config;
pub mod driver;
pub mod error;
pub mod shuffle;
pub mod sink;
pub mod source;
pub mod tokenize;

/////////////////////////////////////////////////////////////////////////////
// Partitioning
/////////////////////////////////////////////////////////////////////////////

/// Index of a shuffle bucket, in `[0, bucket_count)`.
pub type BucketIndex = u32;

/// Hashes an intermediate key. Compute a shuffle bucket for a given key
/// by calculating `ihash(key) % bucket_count`.
pub fn ihash(key: &[u8]) -> u32 {
    let mut hasher = fnv::FnvHasher::with_key(0);
    hasher.write(key);
    let value = hasher.finish() & 0x7fffffff;
    u32::try_from(value).expect("Failed to compute ihash of value")
}

/// Routes a token to its shuffle bucket.
///
/// Pure and total: the same `(token, bucket_count)` pair always maps to
/// the same bucket, so a retried shard routes its tokens identically to
/// the first attempt, and no two buckets ever claim the same token.
pub fn bucket_of(token: &str, bucket_count: u32) -> BucketIndex {
    ihash(token.as_bytes()) % bucket_count
}
