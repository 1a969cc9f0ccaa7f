//! Routes partial counts to buckets and merges them into final totals.

use std::collections::HashMap;

use dashmap::DashMap;

use crate::combine::PartialCount;
use crate::error::EngineError;
use crate::{bucket_of, BucketIndex};

/// Fully merged totals for one bucket's slice of the token key space.
///
/// Created once per bucket during the merge and never mutated after
/// being handed to the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalCount {
    pub bucket: BucketIndex,
    pub counts: HashMap<String, u64>,
}

/// Collects per-shard partial counts, grouped by destination bucket.
///
/// Workers hand their completed [`PartialCount`] to [`Shuffle::accept`],
/// which splits it by bucket and appends each slice to that bucket's
/// contribution list. A failed shard attempt never reaches the shuffle,
/// so contributions already collected cannot be corrupted by a crash
/// elsewhere.
pub struct Shuffle {
    bucket_count: u32,
    parts: DashMap<BucketIndex, Vec<PartialCount>>,
}

impl Shuffle {
    pub fn new(bucket_count: u32) -> Self {
        Self {
            bucket_count,
            parts: DashMap::new(),
        }
    }

    /// Consumes one shard's partial count, routing every token to its
    /// bucket. An empty partial contributes nothing.
    pub fn accept(&self, partial: PartialCount) {
        let mut split: HashMap<BucketIndex, PartialCount> = HashMap::new();
        for (token, n) in partial.into_counts() {
            let bucket = bucket_of(&token, self.bucket_count);
            split.entry(bucket).or_default().add_many(token, n);
        }
        for (bucket, slice) in split {
            self.parts.entry(bucket).or_default().push(slice);
        }
    }

    /// Merges every bucket's contributions into per-bucket totals,
    /// sorted by bucket index.
    ///
    /// Buckets that received no tokens are absent from the result; the
    /// union over the returned buckets is the job's output.
    pub fn merge(self) -> Result<Vec<FinalCount>, EngineError> {
        let mut finals = Vec::with_capacity(self.parts.len());
        for (bucket, parts) in self.parts.into_iter() {
            finals.push(merge_bucket(bucket, parts)?);
        }
        finals.sort_unstable_by_key(|f| f.bucket);
        Ok(finals)
    }
}

/// Sums any number of partial counts into one bucket's final totals.
///
/// Commutative and associative: contributions may arrive in any order
/// and in any grouping without affecting the result. Empty
/// contributions are no-ops.
pub fn merge_bucket(
    bucket: BucketIndex,
    parts: Vec<PartialCount>,
) -> Result<FinalCount, EngineError> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for part in parts {
        for (token, n) in part.into_counts() {
            let slot = counts.entry(token).or_insert(0);
            *slot = slot.checked_add(n).ok_or_else(|| EngineError::MergeFailure {
                bucket,
                detail: "token count overflowed u64".to_string(),
            })?;
        }
    }
    Ok(FinalCount { bucket, counts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combine::combine;

    fn partial(tokens: &[&str]) -> PartialCount {
        combine(tokens.iter().copied())
    }

    #[test]
    fn merge_sums_counts_per_token() {
        let merged = merge_bucket(0, vec![partial(&["a", "b", "a"]), partial(&["a", "c"])])
            .expect("merge failed");
        assert_eq!(merged.counts.get("a"), Some(&3));
        assert_eq!(merged.counts.get("b"), Some(&1));
        assert_eq!(merged.counts.get("c"), Some(&1));
    }

    #[test]
    fn merge_is_order_and_grouping_independent() {
        let a = partial(&["x", "y"]);
        let b = partial(&["y", "y", "z"]);
        let c = partial(&["x"]);

        let abc = merge_bucket(0, vec![a.clone(), b.clone(), c.clone()]).unwrap();
        let cab = merge_bucket(0, vec![c.clone(), a.clone(), b.clone()]).unwrap();
        assert_eq!(abc.counts, cab.counts);

        // merging in two steps matches merging all at once
        let ab = merge_bucket(0, vec![a, b]).unwrap();
        let mut ab_part = PartialCount::new();
        for (token, n) in ab.counts {
            ab_part.add_many(token, n);
        }
        let staged = merge_bucket(0, vec![ab_part, c]).unwrap();
        assert_eq!(staged.counts, abc.counts);
    }

    #[test]
    fn merge_tolerates_empty_contributions() {
        let merged =
            merge_bucket(3, vec![PartialCount::new(), partial(&["w"]), PartialCount::new()])
                .unwrap();
        assert_eq!(merged.counts.get("w"), Some(&1));
        assert_eq!(merged.counts.len(), 1);
    }

    #[test]
    fn merge_overflow_is_a_merge_failure() {
        let mut a = PartialCount::new();
        a.add_many("w".to_string(), u64::MAX);
        let err = merge_bucket(7, vec![a, partial(&["w"])]).unwrap_err();
        match err {
            EngineError::MergeFailure { bucket, .. } => assert_eq!(bucket, 7),
            other => panic!("expected MergeFailure, got {other}"),
        }
    }

    #[test]
    fn accept_routes_a_token_to_exactly_one_bucket() {
        let shuffle = Shuffle::new(4);
        shuffle.accept(partial(&["same", "same"]));
        shuffle.accept(partial(&["same"]));
        let finals = shuffle.merge().unwrap();
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].counts.get("same"), Some(&3));
    }

    #[test]
    fn buckets_merge_independently() {
        let shuffle = Shuffle::new(5);
        shuffle.accept(partial(&["alpha", "beta", "gamma", "delta", "epsilon"]));
        let finals = shuffle.merge().unwrap();
        let total: u64 = finals.iter().flat_map(|f| f.counts.values()).sum();
        assert_eq!(total, 5);
        // every token landed in the bucket the partitioner names
        for f in &finals {
            for token in f.counts.keys() {
                assert_eq!(bucket_of(token, 5), f.bucket);
            }
        }
    }
}
