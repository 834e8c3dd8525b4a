//! Digest comparison: weighted edit distance over signature strings.

use crate::config::CtphError;
use crate::signature::{FuzzyHash, MIN_BLOCK_SIZE, SIGNATURE_LENGTH};
use crate::ROLLING_WINDOW;

/// Scores two digests on a 0-100 scale.
///
/// 0 means no measurable similarity, 100 an identical input. Comparison is
/// commutative. Digests are only comparable when their block sizes are
/// equal or one step apart on the `3 * 2^i` ladder; anything further apart
/// scores 0.
pub fn compare(a: &FuzzyHash, b: &FuzzyHash) -> u32 {
    // Equality is decided before scoring so an input always matches
    // itself at 100, regardless of how short its signatures are.
    if a == b {
        return 100;
    }

    let bs_a = u64::from(a.block_size());
    let bs_b = u64::from(b.block_size());

    if bs_a == bs_b {
        let s1 = score_strings(a.sig(), b.sig(), bs_a);
        let s2 = score_strings(a.sig_double(), b.sig_double(), bs_a * 2);
        s1.max(s2)
    } else if bs_a == bs_b * 2 {
        score_strings(a.sig(), b.sig_double(), bs_a)
    } else if bs_b == bs_a * 2 {
        score_strings(a.sig_double(), b.sig(), bs_b)
    } else {
        0
    }
}

/// Parses both digest strings and scores them.
pub fn compare_strs(a: &str, b: &str) -> Result<u32, CtphError> {
    let ha: FuzzyHash = a.parse()?;
    let hb: FuzzyHash = b.parse()?;
    Ok(compare(&ha, &hb))
}

/// Scores two signature strings computed at the same block size.
fn score_strings(s1: &str, s2: &str, block_size: u64) -> u32 {
    let s1 = squeeze_runs(s1);
    let s2 = squeeze_runs(s2);
    let len1 = s1.len();
    let len2 = s2.len();

    if len1 > SIGNATURE_LENGTH || len2 > SIGNATURE_LENGTH {
        return 0;
    }
    // Without a shared run of ROLLING_WINDOW characters any remaining
    // edit-distance similarity is indistinguishable from chance. This
    // gate also guarantees len1 + len2 > 0 below.
    if !has_common_substring(s1.as_bytes(), s2.as_bytes()) {
        return 0;
    }

    let dist = u64::from(edit_distance(s1.as_bytes(), s2.as_bytes()));

    // Rescale the distance to a proportion of the combined signature
    // length, then to 0-100 with 100 as a perfect match.
    let mut score = dist * SIGNATURE_LENGTH as u64 / (len1 + len2) as u64;
    score = (100 * score) / SIGNATURE_LENGTH as u64;
    if score >= 100 {
        return 0;
    }
    score = 100 - score;

    // At small block sizes a short signature covers too little input to
    // justify a strong match, so the score is capped by coverage.
    let cap = (block_size / u64::from(MIN_BLOCK_SIZE)) * len1.min(len2) as u64;
    score.min(cap) as u32
}

/// Collapses runs of more than three identical characters down to three.
///
/// Long runs carry almost no information but would dominate both the
/// common-substring gate and the edit distance.
fn squeeze_runs(s: &str) -> String {
    let bytes = s.as_bytes();
    if bytes.len() <= 3 {
        return s.to_string();
    }
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    out.extend_from_slice(&bytes[..3]);
    for &b in &bytes[3..] {
        let n = out.len();
        if b != out[n - 1] || b != out[n - 2] || b != out[n - 3] {
            out.push(b);
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// True when the two strings share any substring of [`ROLLING_WINDOW`]
/// characters.
fn has_common_substring(s1: &[u8], s2: &[u8]) -> bool {
    s1.windows(ROLLING_WINDOW)
        .any(|w| s2.windows(ROLLING_WINDOW).any(|v| v == w))
}

/// Weighted edit distance: insert and delete cost 1, substitution costs 2.
fn edit_distance(a: &[u8], b: &[u8]) -> u32 {
    let mut prev: Vec<u32> = (0..=b.len() as u32).collect();
    let mut curr = vec![0u32; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i as u32 + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitute = prev[j] + if ca == cb { 0 } else { 2 };
            let insert = curr[j] + 1;
            let delete = prev[j + 1] + 1;
            curr[j + 1] = substitute.min(insert).min(delete);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
