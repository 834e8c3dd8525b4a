//! Configuration and error types for the similarity index.

use ctph::CtphError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for the similarity index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexConfig {
    /// Configuration schema version.
    pub version: u32,

    /// Score floor used when the caller does not supply one.
    pub default_threshold: u32,

    /// Score candidate pairs on the rayon pool.
    pub use_parallel: bool,

    /// Optional candidate pruning before pairwise scoring.
    pub blocking: BlockingConfig,
}

/// Prefix blocking settings.
///
/// When enabled, only digests sharing a `(block size, signature prefix)`
/// bucket are compared. Near-duplicates usually share a leading segment,
/// but a pair whose edit falls in the first segment will be pruned and
/// never scored. Off by default; enabling it trades recall for speed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockingConfig {
    /// Whether candidate pruning is applied at all.
    pub enabled: bool,
    /// Number of leading signature characters forming the bucket key.
    pub prefix_len: usize,
}

impl IndexConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default similarity threshold.
    pub fn with_default_threshold(mut self, default_threshold: u32) -> Self {
        self.default_threshold = default_threshold;
        self
    }

    /// Enables or disables parallel pairwise scoring.
    pub fn with_use_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    /// Sets the blocking configuration.
    pub fn with_blocking(mut self, blocking: BlockingConfig) -> Self {
        self.blocking = blocking;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.version == 0 {
            return Err(IndexError::InvalidConfigVersion {
                version: self.version,
            });
        }
        if self.default_threshold > 100 {
            return Err(IndexError::InvalidConfigThreshold {
                threshold: self.default_threshold,
            });
        }
        if self.blocking.prefix_len == 0 {
            return Err(IndexError::InvalidConfigPrefixLen {
                prefix_len: self.blocking.prefix_len,
            });
        }
        Ok(())
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            version: 1,
            default_threshold: 80,
            use_parallel: true,
            blocking: BlockingConfig::default(),
        }
    }
}

impl Default for BlockingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            prefix_len: 7,
        }
    }
}

/// Errors produced by the similarity index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A digest string was rejected by the digest layer.
    #[error("digest error: {0}")]
    Digest(#[from] CtphError),

    /// The similarity threshold is out of range.
    #[error("invalid default_threshold: {threshold} (expected 0 to 100)")]
    InvalidConfigThreshold { threshold: u32 },

    /// The blocking prefix length is invalid.
    #[error("invalid blocking prefix_len: {prefix_len} (must be >= 1)")]
    InvalidConfigPrefixLen { prefix_len: usize },

    /// The configuration version is not supported.
    #[error("invalid config version: {version} (expected >= 1)")]
    InvalidConfigVersion { version: u32 },
}
