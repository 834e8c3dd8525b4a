//! # Pagedup Fuzzy Digests
//!
//! This crate computes context-triggered piecewise hashes (CTPH) over the
//! canonical byte encoding of rasterized pages, and scores pairs of digests
//! for similarity. It is the algorithmic core of page-level near-duplicate
//! detection.
//!
//! ## Contract
//!
//! - The digest layer **only** consumes canonical page bytes produced by the
//!   upstream rasterization stage. It never decodes images, reads files, or
//!   consults document metadata.
//! - The API is a pure function of `(bytes, config)` with no I/O, no clocks,
//!   and no global process state.
//!
//! Invariant: for the same input bytes and the same [`CtphConfig`], the
//! digest string is bit identical.
//!
//! ## Construction
//!
//! The input is scanned once with a rolling checksum over a 7-byte window.
//! Whenever the checksum crosses a content-dependent trigger point for the
//! chosen block size, the current segment's accumulated hash is emitted as a
//! single base64 character and the segment hash resets. Each pass emits two
//! signatures, one at the chosen block size and one at double that size, so
//! digests of slightly different inputs remain comparable when the block
//! size estimate lands one step apart.
//!
//! Because segment boundaries are chosen by local content, a small local
//! edit moves only nearby boundaries: near-identical inputs share most of
//! their signature characters, while unrelated inputs overlap only by
//! chance. [`compare`] turns that overlap into a 0-100 score via a weighted
//! edit distance.
//!
//! ## Example
//!
//! ```
//! use ctph::{compare, digest, CtphConfig};
//!
//! let cfg = CtphConfig::new().with_min_input_bytes(64);
//! let data: Vec<u8> = (0u32..8192).map(|i| (i * 151 % 251) as u8).collect();
//!
//! let hash = digest(&data, &cfg).unwrap();
//! assert_eq!(compare(&hash, &hash), 100);
//! ```

pub mod compare;
pub mod config;
pub mod generate;
pub mod signature;

pub use crate::compare::{compare, compare_strs};
pub use crate::config::{CtphConfig, CtphError};
pub use crate::generate::digest;
pub use crate::signature::{FuzzyHash, MIN_BLOCK_SIZE, SIGNATURE_LENGTH};

/// Current digest algorithm version for this crate.
pub const CTPH_VERSION: u16 = 1;

/// Human-readable algorithm identifier.
pub const CTPH_ALGORITHM: &str = "ctph_rolling64_v1";

/// Width of the rolling checksum window, in bytes.
///
/// Also the minimum common substring length required before two signatures
/// are scored at all; shorter overlaps are indistinguishable from chance.
pub const ROLLING_WINDOW: usize = 7;

#[cfg(test)]
mod tests {
    use super::*;

    fn pseudo_bytes(seed: u64, len: usize) -> Vec<u8> {
        let mut state = seed;
        let mut out = Vec::with_capacity(len + 8);
        while out.len() < len {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            out.extend_from_slice(&state.to_le_bytes());
        }
        out.truncate(len);
        out
    }

    #[test]
    fn digest_then_compare_round_trip() {
        let cfg = CtphConfig::new().with_min_input_bytes(64);
        let data = pseudo_bytes(7, 16 * 1024);

        let hash = digest(&data, &cfg).expect("digest should succeed");
        let reparsed: FuzzyHash = hash.to_string().parse().expect("own output must parse");

        assert_eq!(hash, reparsed);
        assert_eq!(compare(&hash, &reparsed), 100);
    }

    #[test]
    fn near_duplicate_scores_above_floor_unrelated_below_ceiling() {
        let cfg = CtphConfig::new().with_min_input_bytes(64);
        let original = pseudo_bytes(11, 16 * 1024);

        // A localized 32-byte patch, the digest analogue of a small scan
        // artifact on an otherwise identical page.
        let mut edited = original.clone();
        for (i, byte) in edited[4096..4128].iter_mut().enumerate() {
            *byte = (i as u8).wrapping_mul(37);
        }

        let unrelated = pseudo_bytes(12, 16 * 1024);

        let h_orig = digest(&original, &cfg).unwrap();
        let h_edit = digest(&edited, &cfg).unwrap();
        let h_other = digest(&unrelated, &cfg).unwrap();

        let near = compare(&h_orig, &h_edit);
        let far = compare(&h_orig, &h_other);

        assert!(near >= 70, "near-duplicate scored {near}, expected >= 70");
        assert!(far <= 30, "unrelated scored {far}, expected <= 30");
        assert!(near > far);
    }

    #[test]
    fn compare_strs_accepts_generated_digests() {
        let cfg = CtphConfig::new().with_min_input_bytes(64);
        let a = digest(&pseudo_bytes(21, 8192), &cfg).unwrap().to_string();
        let b = digest(&pseudo_bytes(22, 8192), &cfg).unwrap().to_string();

        let score = compare_strs(&a, &b).expect("well-formed digests must compare");
        assert!(score <= 100);
        assert_eq!(compare_strs(&a, &a).unwrap(), 100);
    }

    #[test]
    fn compare_strs_rejects_malformed_input() {
        let cfg = CtphConfig::new().with_min_input_bytes(64);
        let good = digest(&pseudo_bytes(31, 8192), &cfg).unwrap().to_string();

        let result = compare_strs(&good, "not a digest");
        assert!(matches!(result, Err(CtphError::MalformedDigest { .. })));
    }
}
