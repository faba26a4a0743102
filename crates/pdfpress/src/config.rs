//! Configuration module for pdfpress.
//!
//! This module holds the settings that drive one pipeline instance:
//! - Compression on/off and quality tier
//! - Repair policy
//! - Parallelism for validation and repair
//! - External tool location and timeout
//! - Where request working directories are created
//!
//! It also owns output-name normalization, since the name a caller types is
//! free text and the artifact name must end in `.pdf`.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::PdfPressError;

/// Compression aggressiveness, mapped to a raster resolution target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Light downsampling (300 dpi).
    Low,
    /// Balanced downsampling (200 dpi).
    #[default]
    Medium,
    /// Strong downsampling (150 dpi).
    High,
    /// Screen-only downsampling (72 dpi).
    Maximum,
}

impl QualityTier {
    /// All tiers, lightest first.
    pub const ALL: [QualityTier; 4] = [Self::Low, Self::Medium, Self::High, Self::Maximum];

    /// Target raster resolution in dots per inch.
    pub fn resolution(&self) -> u32 {
        match self {
            Self::Low => 300,
            Self::Medium => 200,
            Self::High => 150,
            Self::Maximum => 72,
        }
    }

    /// Lowercase name as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Maximum => "maximum",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = PdfPressError;

    /// Parse a quality tier: "low", "medium", "high" or "maximum".
    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "maximum" => Ok(Self::Maximum),
            _ => Err(PdfPressError::invalid_config(format!(
                "Invalid quality tier: {s}. Must be one of: low, medium, high, maximum"
            ))),
        }
    }
}

/// Rule that decides the page sequence of the merged output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderingStrategy {
    /// Whole documents back to back, in upload order.
    #[default]
    Sequential,
    /// Pages of two documents interleaved pairwise.
    Alternating,
}

impl OrderingStrategy {
    /// Lowercase name as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Alternating => "alternating",
        }
    }
}

impl fmt::Display for OrderingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderingStrategy {
    type Err = PdfPressError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "alternating" | "alternate" => Ok(Self::Alternating),
            _ => Err(PdfPressError::invalid_config(format!(
                "Invalid ordering: {s}. Must be one of: sequential, alternating"
            ))),
        }
    }
}

/// Compression settings for one merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionSettings {
    /// Whether to run the external transform at all.
    pub enabled: bool,
    /// Quality tier used when enabled.
    pub tier: QualityTier,
}

impl CompressionSettings {
    /// Compression enabled at the given tier.
    pub fn with_tier(tier: QualityTier) -> Self {
        Self {
            enabled: true,
            tier,
        }
    }

    /// Compression switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            tier: QualityTier::default(),
        }
    }
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self::with_tier(QualityTier::Medium)
    }
}

/// Location and time bound of the external compression tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// Ghostscript binary, looked up on `PATH` when not absolute.
    pub binary: PathBuf,
    /// Upper bound for one invocation.
    pub timeout: Duration,
}

impl ToolConfig {
    /// Default binary name.
    pub const DEFAULT_BINARY: &'static str = "gs";

    /// Default time bound for one invocation.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(Self::DEFAULT_BINARY),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

/// Complete configuration for a pipeline instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Compression settings applied to every merge.
    pub compression: CompressionSettings,

    /// Attempt to repair documents that fail validation.
    pub repair: bool,

    /// Number of concurrent validation/repair jobs (None = auto-detect).
    pub jobs: Option<usize>,

    /// External compression tool.
    pub tool: ToolConfig,

    /// Parent directory for per-request working directories
    /// (None = system temp dir).
    pub work_root: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            compression: CompressionSettings::default(),
            repair: true,
            jobs: None,
            tool: ToolConfig::default(),
            work_root: None,
        }
    }
}

impl PipelineConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Jobs count is zero
    /// - Tool timeout is zero
    /// - Tool binary is empty
    /// - Work root is set but is not a directory
    pub fn validate(&self) -> Result<()> {
        if let Some(jobs) = self.jobs
            && jobs == 0
        {
            bail!("Number of jobs must be at least 1");
        }

        if self.tool.timeout.is_zero() {
            bail!("Compression timeout must be greater than zero");
        }

        if self.tool.binary.as_os_str().is_empty() {
            bail!("Compression tool path cannot be empty");
        }

        if let Some(ref root) = self.work_root
            && !root.is_dir()
        {
            bail!("Work directory does not exist: {}", root.display());
        }

        Ok(())
    }

    /// Get the effective number of parallel jobs.
    ///
    /// Returns the configured job count, or the number of CPU cores if auto-detect.
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

/// Turn a caller-typed output name into an artifact file name.
///
/// Only the final path component is kept, surrounding whitespace is trimmed,
/// and `.pdf` is appended unless the name already ends with it in any case.
/// An empty name falls back to [`default_output_name`].
///
/// # Errors
///
/// Returns an error if the name has no usable file name component
/// (e.g. `".."` or `"/"`).
///
/// # Examples
///
/// ```
/// use pdfpress::config::normalize_output_name;
///
/// assert_eq!(normalize_output_name("report").unwrap(), "report.pdf");
/// assert_eq!(normalize_output_name("REPORT.PDF").unwrap(), "REPORT.PDF");
/// assert_eq!(normalize_output_name("../etc/out").unwrap(), "out.pdf");
/// ```
pub fn normalize_output_name(name: &str) -> crate::Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Ok(default_output_name());
    }

    let file_name = Path::new(trimmed)
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            PdfPressError::invalid_output_name(name, "name has no file name component")
        })?;

    if file_name.to_lowercase().ends_with(".pdf") {
        Ok(file_name.to_string())
    } else {
        Ok(format!("{file_name}.pdf"))
    }
}

/// Timestamped default output name, e.g. `merged_20240131_174502.pdf`.
pub fn default_output_name() -> String {
    format!("merged_{}.pdf", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}
