//! Candidate pruning by digest prefix buckets.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::PageDigest;

/// Yields index pairs `(i, j)` with `i < j` that share a blocking bucket.
///
/// Each record lands in two buckets: `(block_size, sig prefix)` and
/// `(2 * block_size, sig_double prefix)`. The doubled bucket is what lets
/// digests one block-size step apart still meet, mirroring how scoring
/// matches a primary signature against a neighbor's secondary one.
pub(crate) fn candidate_pairs(records: &[PageDigest], prefix_len: usize) -> Vec<(usize, usize)> {
    let mut buckets: BTreeMap<(u64, String), Vec<usize>> = BTreeMap::new();

    for (i, record) in records.iter().enumerate() {
        let bs = u64::from(record.digest.block_size());
        let sig = record.digest.sig();
        let sig_double = record.digest.sig_double();
        let head = &sig[..sig.len().min(prefix_len)];
        let head_double = &sig_double[..sig_double.len().min(prefix_len)];

        buckets.entry((bs, head.to_string())).or_default().push(i);
        buckets
            .entry((bs * 2, head_double.to_string()))
            .or_default()
            .push(i);
    }

    let mut pairs = BTreeSet::new();
    for indices in buckets.values() {
        for (pos, &i) in indices.iter().enumerate() {
            for &j in &indices[pos + 1..] {
                pairs.insert((i.min(j), i.max(j)));
            }
        }
    }
    pairs.into_iter().collect()
}
