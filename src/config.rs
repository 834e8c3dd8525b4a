//! YAML configuration file support for pagedup.
//!
//! All pipeline stages (raster, digest, index, ocr, custody, report) are
//! configured from a single YAML file loaded at startup. Every section and
//! every field is optional; omitted values take the stage defaults.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! # Pagedup pipeline configuration
//! version: "1.0"
//!
//! raster:
//!   version: 1
//!   dpi: 150
//!   color_mode: "grayscale"
//!
//! digest:
//!   version: 1
//!   min_input_bytes: 4096
//!
//! index:
//!   version: 1
//!   default_threshold: 80
//!   use_parallel: true
//!   blocking_enabled: false
//!   blocking_prefix_len: 7
//!
//! ocr:
//!   version: 1
//!   binary: "ocrmypdf"
//!   languages: ["eng", "spa"]
//!   rotate_pages: true
//!   deskew: true
//!   jobs: 1
//!   output_type: "pdfa"
//!   retry_limit: 3
//!
//! custody:
//!   path: "custody.jsonl"
//!
//! report:
//!   path: "report.json"
//! ```

use std::fs;
use std::path::Path;

use ctph::CtphConfig;
use raster::{ColorMode, RasterConfig, MAX_DPI, MIN_DPI};
use serde::{Deserialize, Serialize};
use simindex::{BlockingConfig, IndexConfig};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration structure for the entire pagedup pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PagedupConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    /// Page rasterization configuration
    #[serde(default)]
    pub raster: RasterYamlConfig,

    /// Fuzzy digest configuration
    #[serde(default)]
    pub digest: DigestYamlConfig,

    /// Similarity index configuration
    #[serde(default)]
    pub index: IndexYamlConfig,

    /// OCR orchestration configuration
    #[serde(default)]
    pub ocr: OcrYamlConfig,

    /// Chain-of-custody log configuration
    #[serde(default)]
    pub custody: CustodyYamlConfig,

    /// Report output configuration
    #[serde(default)]
    pub report: ReportYamlConfig,
}

impl PagedupConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: PagedupConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        // Check version
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        // Validate individual stage configs
        self.raster.validate()?;
        self.digest.validate()?;
        self.index.validate()?;
        self.ocr.validate()?;
        self.custody.validate()?;
        self.report.validate()?;

        Ok(())
    }
}

impl Default for PagedupConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            raster: RasterYamlConfig::default(),
            digest: DigestYamlConfig::default(),
            index: IndexYamlConfig::default(),
            ocr: OcrYamlConfig::default(),
            custody: CustodyYamlConfig::default(),
            report: ReportYamlConfig::default(),
        }
    }
}

/// Page rasterization YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterYamlConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_dpi")]
    pub dpi: u32,

    #[serde(default = "default_color_mode")]
    pub color_mode: String,
}

impl RasterYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.version == 0 {
            return Err(ConfigLoadError::Validation(
                "raster.version must be >= 1".to_string(),
            ));
        }
        if self.dpi < MIN_DPI || self.dpi > MAX_DPI {
            return Err(ConfigLoadError::Validation(format!(
                "raster.dpi must be between {MIN_DPI} and {MAX_DPI}"
            )));
        }
        self.parsed_color_mode()?;
        Ok(())
    }

    fn parsed_color_mode(&self) -> Result<ColorMode, ConfigLoadError> {
        match self.color_mode.as_str() {
            "grayscale" => Ok(ColorMode::Grayscale),
            "rgb" => Ok(ColorMode::Rgb),
            other => Err(ConfigLoadError::Validation(format!(
                "raster.color_mode must be \"grayscale\" or \"rgb\", got {other:?}"
            ))),
        }
    }

    /// Build the rasterizer configuration this section describes.
    pub fn to_raster_config(&self) -> Result<RasterConfig, ConfigLoadError> {
        let mode = self.parsed_color_mode()?;
        Ok(RasterConfig::new()
            .with_dpi(self.dpi)
            .with_color_mode(mode))
    }
}

impl Default for RasterYamlConfig {
    fn default() -> Self {
        Self {
            version: 1,
            dpi: 150,
            color_mode: "grayscale".to_string(),
        }
    }
}

/// Fuzzy digest YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestYamlConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_min_input_bytes")]
    pub min_input_bytes: usize,
}

impl DigestYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.version == 0 {
            return Err(ConfigLoadError::Validation(
                "digest.version must be >= 1".to_string(),
            ));
        }
        if self.min_input_bytes == 0 {
            return Err(ConfigLoadError::Validation(
                "digest.min_input_bytes must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the digest configuration this section describes.
    pub fn to_ctph_config(&self) -> CtphConfig {
        CtphConfig::new().with_min_input_bytes(self.min_input_bytes)
    }
}

impl Default for DigestYamlConfig {
    fn default() -> Self {
        Self {
            version: 1,
            min_input_bytes: 4096,
        }
    }
}

/// Similarity index YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexYamlConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_threshold")]
    pub default_threshold: u32,

    #[serde(default = "true_value")]
    pub use_parallel: bool,

    #[serde(default)]
    pub blocking_enabled: bool,

    #[serde(default = "default_prefix_len")]
    pub blocking_prefix_len: usize,
}

impl IndexYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.version == 0 {
            return Err(ConfigLoadError::Validation(
                "index.version must be >= 1".to_string(),
            ));
        }
        if self.default_threshold > 100 {
            return Err(ConfigLoadError::Validation(
                "index.default_threshold must be <= 100".to_string(),
            ));
        }
        if self.blocking_prefix_len == 0 {
            return Err(ConfigLoadError::Validation(
                "index.blocking_prefix_len must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the index configuration this section describes.
    pub fn to_index_config(&self) -> IndexConfig {
        IndexConfig::new()
            .with_default_threshold(self.default_threshold)
            .with_use_parallel(self.use_parallel)
            .with_blocking(BlockingConfig {
                enabled: self.blocking_enabled,
                prefix_len: self.blocking_prefix_len,
            })
    }
}

impl Default for IndexYamlConfig {
    fn default() -> Self {
        Self {
            version: 1,
            default_threshold: 80,
            use_parallel: true,
            blocking_enabled: false,
            blocking_prefix_len: 7,
        }
    }
}

/// OCR orchestration YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrYamlConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Binary to invoke; a bare name is resolved through `PATH`.
    #[serde(default = "default_ocr_binary")]
    pub binary: String,

    /// Language hints passed as a single `+`-joined `-l` argument.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    #[serde(default = "true_value")]
    pub rotate_pages: bool,

    #[serde(default = "true_value")]
    pub deskew: bool,

    /// Jobs forwarded to each invocation. Files already run in parallel,
    /// so this stays at 1 unless the corpus is small.
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    #[serde(default = "default_output_type")]
    pub output_type: String,

    /// Attempts per file before it is recorded as failed.
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,
}

impl OcrYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.version == 0 {
            return Err(ConfigLoadError::Validation(
                "ocr.version must be >= 1".to_string(),
            ));
        }
        if self.binary.is_empty() {
            return Err(ConfigLoadError::Validation(
                "ocr.binary must not be empty".to_string(),
            ));
        }
        if self.languages.is_empty() || self.languages.iter().any(String::is_empty) {
            return Err(ConfigLoadError::Validation(
                "ocr.languages must contain at least one non-empty language".to_string(),
            ));
        }
        if self.jobs == 0 {
            return Err(ConfigLoadError::Validation(
                "ocr.jobs must be >= 1".to_string(),
            ));
        }
        if self.output_type.is_empty() {
            return Err(ConfigLoadError::Validation(
                "ocr.output_type must not be empty".to_string(),
            ));
        }
        if self.retry_limit == 0 {
            return Err(ConfigLoadError::Validation(
                "ocr.retry_limit must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for OcrYamlConfig {
    fn default() -> Self {
        Self {
            version: 1,
            binary: "ocrmypdf".to_string(),
            languages: vec!["eng".to_string(), "spa".to_string()],
            rotate_pages: true,
            deskew: true,
            jobs: 1,
            output_type: "pdfa".to_string(),
            retry_limit: 3,
        }
    }
}

/// Chain-of-custody log YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustodyYamlConfig {
    /// Log file path; a relative path is resolved beside the report.
    #[serde(default = "default_custody_path")]
    pub path: String,
}

impl CustodyYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.path.is_empty() {
            return Err(ConfigLoadError::Validation(
                "custody.path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CustodyYamlConfig {
    fn default() -> Self {
        Self {
            path: "custody.jsonl".to_string(),
        }
    }
}

/// Report output YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportYamlConfig {
    #[serde(default = "default_report_path")]
    pub path: String,
}

impl ReportYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.path.is_empty() {
            return Err(ConfigLoadError::Validation(
                "report.path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ReportYamlConfig {
    fn default() -> Self {
        Self {
            path: "report.json".to_string(),
        }
    }
}

// Helper functions for serde defaults
fn default_version() -> u32 {
    1
}
fn true_value() -> bool {
    true
}
fn default_dpi() -> u32 {
    150
}
fn default_color_mode() -> String {
    "grayscale".to_string()
}
fn default_min_input_bytes() -> usize {
    4096
}
fn default_threshold() -> u32 {
    80
}
fn default_prefix_len() -> usize {
    7
}
fn default_ocr_binary() -> String {
    "ocrmypdf".to_string()
}
fn default_languages() -> Vec<String> {
    vec!["eng".to_string(), "spa".to_string()]
}
fn default_jobs() -> usize {
    1
}
fn default_output_type() -> String {
    "pdfa".to_string()
}
fn default_retry_limit() -> u32 {
    3
}
fn default_custody_path() -> String {
    "custody.jsonl".to_string()
}
fn default_report_path() -> String {
    "report.json".to_string()
}
