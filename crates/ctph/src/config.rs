//! Configuration and error types for fuzzy digest generation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for the CTPH digest stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CtphConfig {
    /// Configuration schema version.
    pub version: u32,

    /// Inputs shorter than this are rejected as too degenerate to digest.
    ///
    /// A rolling-hash signature over a handful of bytes carries almost no
    /// discriminating power, and comparing such digests produces scores
    /// that are noise. Rasterized pages are far larger than this floor in
    /// practice; hitting it indicates a broken render.
    pub min_input_bytes: usize,
}

impl CtphConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum input size in bytes.
    pub fn with_min_input_bytes(mut self, min_input_bytes: usize) -> Self {
        self.min_input_bytes = min_input_bytes;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), CtphError> {
        if self.version == 0 {
            return Err(CtphError::InvalidConfigVersion {
                version: self.version,
            });
        }
        if self.min_input_bytes == 0 {
            return Err(CtphError::InvalidConfigMinInput {
                min_input_bytes: self.min_input_bytes,
            });
        }
        Ok(())
    }
}

impl Default for CtphConfig {
    fn default() -> Self {
        Self {
            version: 1,
            min_input_bytes: 4096,
        }
    }
}

/// Errors produced by digest generation and comparison.
#[derive(Debug, Error)]
pub enum CtphError {
    /// The input is too short to produce a meaningful digest.
    #[error("input of {len} bytes is below the {min} byte minimum for fuzzy digests")]
    InputTooSmall { len: usize, min: usize },

    /// A digest string did not conform to the `block_size:sig:sig_double` format.
    #[error("malformed fuzzy digest: {reason}")]
    MalformedDigest { reason: String },

    /// The configuration version is not supported.
    #[error("invalid config version: {version} (expected >= 1)")]
    InvalidConfigVersion { version: u32 },

    /// The minimum input size is invalid.
    #[error("invalid min_input_bytes: {min_input_bytes} (must be > 0)")]
    InvalidConfigMinInput { min_input_bytes: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Default Tests ====================

    #[test]
    fn test_default_config() {
        let config = CtphConfig::default();
        assert_eq!(config.version, 1);
        assert_eq!(config.min_input_bytes, 4096);
    }

    #[test]
    fn test_new_equals_default() {
        assert_eq!(CtphConfig::new(), CtphConfig::default());
    }

    // ==================== Builder Tests ====================

    #[test]
    fn test_with_min_input_bytes() {
        let config = CtphConfig::new().with_min_input_bytes(128);
        assert_eq!(config.min_input_bytes, 128);
        assert_eq!(config.version, 1);
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_default_config_validates() {
        assert!(CtphConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_version_rejected() {
        let mut config = CtphConfig::new();
        config.version = 0;
        assert!(matches!(
            config.validate(),
            Err(CtphError::InvalidConfigVersion { version: 0 })
        ));
    }

    #[test]
    fn test_zero_min_input_rejected() {
        let config = CtphConfig::new().with_min_input_bytes(0);
        assert!(matches!(
            config.validate(),
            Err(CtphError::InvalidConfigMinInput {
                min_input_bytes: 0
            })
        ));
    }

    // ==================== Serde Tests ====================

    #[test]
    fn test_serde_round_trip() {
        let config = CtphConfig::new().with_min_input_bytes(2048);
        let json = serde_json::to_string(&config).unwrap();
        let back: CtphConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    // ==================== Error Display Tests ====================

    #[test]
    fn test_input_too_small_display() {
        let err = CtphError::InputTooSmall { len: 12, min: 4096 };
        let msg = err.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("4096"));
    }

    #[test]
    fn test_malformed_digest_display() {
        let err = CtphError::MalformedDigest {
            reason: "expected 3 colon-separated parts".into(),
        };
        assert!(err.to_string().contains("colon-separated"));
    }
}
