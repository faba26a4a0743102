//! CLI argument parsing for pdfpress.
//!
//! This module defines the command-line interface structure using `clap`.
//! It handles argument parsing, validation, and help text generation.

use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use pdfpress::config::{
    CompressionSettings, OrderingStrategy, PipelineConfig, QualityTier, ToolConfig,
    default_output_name, normalize_output_name,
};
use pdfpress::{PdfPressError, Result};

/// Validate, repair, merge and recompress PDF documents.
///
/// pdfpress checks every input, repairs damaged files where it can, merges
/// the valid ones in sequential or alternating page order and optionally
/// shrinks the result with Ghostscript.
#[derive(Parser, Debug)]
#[command(name = "pdfpress")]
#[command(version)]
#[command(about = "Validate, repair, merge and recompress PDF documents", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Input PDF files or glob patterns (in order)
    ///
    /// Files are merged in the order provided; each pattern expands in
    /// path order.
    ///
    /// Examples:
    ///   pdfpress front.pdf back.pdf -o scan.pdf
    ///   pdfpress 'chapters/*.pdf' -o book.pdf
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Output PDF file path
    ///
    /// ".pdf" is appended when missing. Defaults to
    /// merged_YYYYMMDD_HHMMSS.pdf in the current directory.
    #[arg(short, long, value_name = "FILE", env = "PDFPRESS_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Page ordering
    ///
    /// - sequential: whole documents back to back (default)
    /// - alternating: interleave the pages of exactly two documents,
    ///   e.g. front and back scans of a duplex stack
    #[arg(long, value_name = "ORDER", default_value = "sequential", env = "PDFPRESS_ORDER")]
    #[arg(value_parser = ["sequential", "alternating"])]
    pub order: String,

    /// Compression quality tier
    ///
    /// Images are downsampled to the tier's resolution:
    /// low = 300 dpi, medium = 200 dpi, high = 150 dpi, maximum = 72 dpi.
    #[arg(long, value_name = "TIER", default_value = "medium", env = "PDFPRESS_QUALITY")]
    #[arg(value_parser = ["low", "medium", "high", "maximum"])]
    pub quality: String,

    /// Skip compression and keep the merged output as is
    #[arg(long, env = "PDFPRESS_NO_COMPRESS")]
    pub no_compress: bool,

    /// Leave invalid documents out instead of trying to repair them
    #[arg(long, env = "PDFPRESS_NO_REPAIR")]
    pub no_repair: bool,

    /// Ghostscript binary used for compression
    #[arg(long, value_name = "PATH", env = "PDFPRESS_GS")]
    pub gs: Option<PathBuf>,

    /// Compression timeout in seconds
    #[arg(long, value_name = "SECS", env = "PDFPRESS_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Number of parallel jobs for validation and repair
    ///
    /// Default is number of CPU cores. Use 1 for sequential processing.
    #[arg(short, long, value_name = "N", env = "PDFPRESS_JOBS")]
    pub jobs: Option<usize>,

    /// Print the merge report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Verbose output - show per-file details and statistics
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Overwrite an existing output file
    #[arg(short, long)]
    pub force: bool,
}

impl Cli {
    /// Convert CLI arguments into a validated pipeline configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the quality tier is invalid or the resulting
    /// configuration does not validate.
    pub fn to_config(&self) -> Result<PipelineConfig> {
        let compression = if self.no_compress {
            CompressionSettings::disabled()
        } else {
            CompressionSettings::with_tier(QualityTier::from_str(&self.quality)?)
        };

        let mut tool = ToolConfig::default();
        if let Some(ref gs) = self.gs {
            tool.binary = gs.clone();
        }
        if let Some(secs) = self.timeout {
            tool.timeout = Duration::from_secs(secs);
        }

        let config = PipelineConfig {
            compression,
            repair: !self.no_repair,
            jobs: self.jobs,
            tool,
            work_root: None,
        };

        config.validate().map_err(|e| {
            PdfPressError::invalid_config(format!("Configuration validation failed: {e}"))
        })?;

        Ok(config)
    }

    /// Requested ordering strategy.
    pub fn strategy(&self) -> Result<OrderingStrategy> {
        OrderingStrategy::from_str(&self.order)
    }

    /// Where the merged file is written.
    ///
    /// The file name is normalized the same way as artifact names; the
    /// directory part is kept.
    pub fn output_path(&self) -> Result<PathBuf> {
        let Some(ref output) = self.output else {
            return Ok(PathBuf::from(default_output_name()));
        };

        let name = normalize_output_name(&output.to_string_lossy())?;
        Ok(match output.parent() {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        })
    }

    /// Validate CLI arguments before processing.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(PdfPressError::invalid_config("No input files specified"));
        }

        if let Some(jobs) = self.jobs
            && jobs == 0
        {
            return Err(PdfPressError::invalid_config(
                "Number of jobs must be at least 1",
            ));
        }

        if self.timeout == Some(0) {
            return Err(PdfPressError::invalid_config(
                "Compression timeout must be at least 1 second",
            ));
        }

        Ok(())
    }
}
