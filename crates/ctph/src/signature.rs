//! Digest representation, formatting, and strict parsing.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::CtphError;

/// Maximum number of characters in the primary signature.
pub const SIGNATURE_LENGTH: usize = 64;

/// Smallest permitted block size. Block sizes are always `3 * 2^i`.
pub const MIN_BLOCK_SIZE: u32 = 3;

/// Alphabet used to encode segment hashes, one character per segment.
pub(crate) const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// A context-triggered piecewise hash of one input.
///
/// Rendered as `block_size:sig:sig_double`. The primary signature is
/// computed at `block_size`, the secondary at twice that, which lets
/// [`crate::compare`] score digests whose block size estimates differ by
/// one step.
///
/// Either signature may be empty: an input whose rolling checksum never
/// crosses a trigger point (uniform bytes, for instance) produces no
/// segment characters, and that is still a well-formed digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuzzyHash {
    block_size: u32,
    sig: String,
    sig_double: String,
}

impl FuzzyHash {
    pub(crate) fn new(block_size: u32, sig: String, sig_double: String) -> Self {
        Self {
            block_size,
            sig,
            sig_double,
        }
    }

    /// The block size the primary signature was computed at.
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// The primary signature, at most [`SIGNATURE_LENGTH`] characters.
    pub fn sig(&self) -> &str {
        &self.sig
    }

    /// The secondary signature, computed at double the block size.
    pub fn sig_double(&self) -> &str {
        &self.sig_double
    }
}

/// Valid block sizes are exactly `MIN_BLOCK_SIZE * 2^i`.
fn is_valid_block_size(block_size: u32) -> bool {
    block_size % MIN_BLOCK_SIZE == 0 && (block_size / MIN_BLOCK_SIZE).is_power_of_two()
}

fn is_in_alphabet(part: &str) -> bool {
    part.bytes().all(|b| BASE64_ALPHABET.contains(&b))
}

impl fmt::Display for FuzzyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.block_size, self.sig, self.sig_double)
    }
}

impl FromStr for FuzzyHash {
    type Err = CtphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err(CtphError::MalformedDigest {
                reason: format!(
                    "expected 3 colon-separated parts, found {}",
                    parts.len()
                ),
            });
        }

        let bs_part = parts[0];
        if bs_part.is_empty() || !bs_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CtphError::MalformedDigest {
                reason: format!("block size {bs_part:?} is not a decimal integer"),
            });
        }
        let block_size: u32 = bs_part.parse().map_err(|_| CtphError::MalformedDigest {
            reason: format!("block size {bs_part:?} out of range"),
        })?;
        if !is_valid_block_size(block_size) {
            return Err(CtphError::MalformedDigest {
                reason: format!("block size {block_size} is not 3 * 2^i"),
            });
        }

        let sig = parts[1];
        let sig_double = parts[2];
        if sig.len() > SIGNATURE_LENGTH {
            return Err(CtphError::MalformedDigest {
                reason: format!(
                    "primary signature has {} chars, max {SIGNATURE_LENGTH}",
                    sig.len()
                ),
            });
        }
        if sig_double.len() > SIGNATURE_LENGTH / 2 {
            return Err(CtphError::MalformedDigest {
                reason: format!(
                    "secondary signature has {} chars, max {}",
                    sig_double.len(),
                    SIGNATURE_LENGTH / 2
                ),
            });
        }
        if !is_in_alphabet(sig) || !is_in_alphabet(sig_double) {
            return Err(CtphError::MalformedDigest {
                reason: "signature contains characters outside the base64 alphabet".into(),
            });
        }

        Ok(Self {
            block_size,
            sig: sig.to_string(),
            sig_double: sig_double.to_string(),
        })
    }
}

impl Serialize for FuzzyHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FuzzyHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Parse Tests ====================

    #[test]
    fn test_parse_round_trip() {
        let text = "96:AbCdEf+/123:XyZ9";
        let hash: FuzzyHash = text.parse().unwrap();
        assert_eq!(hash.block_size(), 96);
        assert_eq!(hash.sig(), "AbCdEf+/123");
        assert_eq!(hash.sig_double(), "XyZ9");
        assert_eq!(hash.to_string(), text);
    }

    #[test]
    fn test_parse_empty_signatures() {
        let hash: FuzzyHash = "3::".parse().unwrap();
        assert_eq!(hash.block_size(), 3);
        assert_eq!(hash.sig(), "");
        assert_eq!(hash.sig_double(), "");
    }

    #[test]
    fn test_parse_rejects_wrong_part_count() {
        assert!(matches!(
            "3:abc".parse::<FuzzyHash>(),
            Err(CtphError::MalformedDigest { .. })
        ));
        assert!(matches!(
            "3:a:b:c".parse::<FuzzyHash>(),
            Err(CtphError::MalformedDigest { .. })
        ));
        assert!(matches!(
            "".parse::<FuzzyHash>(),
            Err(CtphError::MalformedDigest { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_non_numeric_block_size() {
        assert!(matches!(
            "abc:def:gh".parse::<FuzzyHash>(),
            Err(CtphError::MalformedDigest { .. })
        ));
        assert!(matches!(
            "+6:def:gh".parse::<FuzzyHash>(),
            Err(CtphError::MalformedDigest { .. })
        ));
        assert!(matches!(
            ":def:gh".parse::<FuzzyHash>(),
            Err(CtphError::MalformedDigest { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_invalid_block_size() {
        // Not a multiple of 3.
        assert!(matches!(
            "4:abc:de".parse::<FuzzyHash>(),
            Err(CtphError::MalformedDigest { .. })
        ));
        // Multiple of 3 but 5 is not a power of two.
        assert!(matches!(
            "15:abc:de".parse::<FuzzyHash>(),
            Err(CtphError::MalformedDigest { .. })
        ));
        // Zero is never valid.
        assert!(matches!(
            "0:abc:de".parse::<FuzzyHash>(),
            Err(CtphError::MalformedDigest { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_out_of_alphabet_chars() {
        assert!(matches!(
            "3:ab c:de".parse::<FuzzyHash>(),
            Err(CtphError::MalformedDigest { .. })
        ));
        assert!(matches!(
            "3:ab=c:de".parse::<FuzzyHash>(),
            Err(CtphError::MalformedDigest { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_overlong_signatures() {
        let long_sig = "A".repeat(SIGNATURE_LENGTH + 1);
        let text = format!("3:{long_sig}:ab");
        assert!(matches!(
            text.parse::<FuzzyHash>(),
            Err(CtphError::MalformedDigest { .. })
        ));

        let long_double = "A".repeat(SIGNATURE_LENGTH / 2 + 1);
        let text = format!("3:abc:{long_double}");
        assert!(matches!(
            text.parse::<FuzzyHash>(),
            Err(CtphError::MalformedDigest { .. })
        ));
    }

    #[test]
    fn test_parse_accepts_max_length_signatures() {
        let sig = "A".repeat(SIGNATURE_LENGTH);
        let sig_double = "B".repeat(SIGNATURE_LENGTH / 2);
        let text = format!("6:{sig}:{sig_double}");
        let hash: FuzzyHash = text.parse().unwrap();
        assert_eq!(hash.sig().len(), SIGNATURE_LENGTH);
        assert_eq!(hash.sig_double().len(), SIGNATURE_LENGTH / 2);
    }

    // ==================== Block Size Tests ====================

    #[test]
    fn test_valid_block_size_ladder() {
        for i in 0..10 {
            assert!(is_valid_block_size(MIN_BLOCK_SIZE << i));
        }
        assert!(!is_valid_block_size(0));
        assert!(!is_valid_block_size(5));
        assert!(!is_valid_block_size(9));
    }

    // ==================== Serde Tests ====================

    #[test]
    fn test_serializes_as_string() {
        let hash: FuzzyHash = "12:abcDEF:ghi".parse().unwrap();
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, "\"12:abcDEF:ghi\"");
    }

    #[test]
    fn test_deserialize_round_trip() {
        let hash: FuzzyHash = "24:hello:wrld".parse().unwrap();
        let json = serde_json::to_string(&hash).unwrap();
        let back: FuzzyHash = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, back);
    }

    #[test]
    fn test_deserialize_rejects_malformed() {
        let result: Result<FuzzyHash, _> = serde_json::from_str("\"7:abc:de\"");
        assert!(result.is_err());
    }
}
