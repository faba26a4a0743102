//! Recompression of merged output through an external raster transform.
//!
//! The transform is a seam: production code runs Ghostscript, tests plug in
//! fakes. The [`Compressor`] wraps any [`RasterTransform`] with the rules the
//! pipeline relies on:
//! - The tool is probed before first use and the probe cached on success
//! - Every run and probe is bounded by a timeout
//! - Output always goes to a separate file, never over the input
//! - A run counts only if it produced a non-empty file
//!
//! # Examples
//!
//! ```no_run
//! use pdfpress::compress::Compressor;
//! use pdfpress::config::{QualityTier, ToolConfig};
//! use std::path::Path;
//!
//! # async fn example() {
//! let compressor = Compressor::from_config(&ToolConfig::default());
//! match compressor
//!     .compress(Path::new("merged.pdf"), Path::new("small.pdf"), QualityTier::High)
//!     .await
//! {
//!     Ok(output) => println!("compressed to {} bytes", output.size),
//!     Err(e) => println!("keeping uncompressed output: {e}"),
//! }
//! # }
//! ```

pub mod ghostscript;

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::{QualityTier, ToolConfig};
use crate::error::CompressionError;
use crate::io::remove_if_exists;

pub use ghostscript::Ghostscript;

/// An external tool that rewrites a PDF with downsampled images.
pub trait RasterTransform: Send + Sync {
    /// Check that the tool can run; returns its version string.
    fn probe(&self) -> impl Future<Output = Result<String, CompressionError>> + Send;

    /// Rewrite `input` into `output` at `resolution` dpi.
    fn run(
        &self,
        input: &Path,
        output: &Path,
        resolution: u32,
    ) -> impl Future<Output = Result<(), CompressionError>> + Send;
}

/// A successful compression result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedOutput {
    /// Where the compressed file was written.
    pub path: PathBuf,

    /// Size of the compressed file in bytes.
    pub size: u64,

    /// Tier the file was compressed at.
    pub tier: QualityTier,
}

impl CompressedOutput {
    /// Whether the compressed file is strictly smaller than `size`.
    pub fn is_smaller_than(&self, size: u64) -> bool {
        self.size < size
    }
}

/// Compressor over a raster transform.
#[derive(Debug)]
pub struct Compressor<T: RasterTransform = Ghostscript> {
    transform: T,
    timeout: Duration,
    probed: RwLock<Option<String>>,
}

impl Compressor<Ghostscript> {
    /// Create a Ghostscript-backed compressor from tool settings.
    pub fn from_config(config: &ToolConfig) -> Self {
        Self::new(Ghostscript::from_config(config), config.timeout)
    }
}

impl<T: RasterTransform> Compressor<T> {
    /// Create a compressor over `transform`, bounding each call by `timeout`.
    pub fn new(transform: T, timeout: Duration) -> Self {
        Self {
            transform,
            timeout,
            probed: RwLock::new(None),
        }
    }

    /// The wrapped transform.
    pub fn transform(&self) -> &T {
        &self.transform
    }

    /// Check tool availability, using the cached probe when there is one.
    ///
    /// Only a successful probe is cached; a failure is retried next time.
    pub async fn availability(&self) -> Result<String, CompressionError> {
        if let Some(version) = self.probed.read().await.as_ref() {
            return Ok(version.clone());
        }

        let mut cache = self.probed.write().await;
        if let Some(version) = cache.as_ref() {
            return Ok(version.clone());
        }

        let version = self.bounded(self.transform.probe()).await?;
        debug!(%version, "compression tool available");
        *cache = Some(version.clone());
        Ok(version)
    }

    /// Forget the cached probe and check availability again.
    pub async fn reprobe(&self) -> Result<String, CompressionError> {
        self.probed.write().await.take();
        self.availability().await
    }

    /// Compress `input` into `output` at `tier`.
    ///
    /// `input` is never modified. On failure nothing is left at `output`.
    ///
    /// # Errors
    ///
    /// Returns a [`CompressionError`] if the tool is unavailable, fails,
    /// times out or produces an empty file, or if `output` equals `input`.
    pub async fn compress(
        &self,
        input: &Path,
        output: &Path,
        tier: QualityTier,
    ) -> Result<CompressedOutput, CompressionError> {
        if input == output {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "compression output must differ from its input",
            )
            .into());
        }

        self.availability().await?;
        remove_if_exists(output).await?;

        let resolution = tier.resolution();
        let result = self
            .bounded(self.transform.run(input, output, resolution))
            .await;

        if let Err(e) = result {
            warn!(%tier, error = %e, "compression failed");
            let _ = remove_if_exists(output).await;
            return Err(e);
        }

        let size = match tokio::fs::metadata(output).await {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        if size == 0 {
            let _ = remove_if_exists(output).await;
            return Err(CompressionError::EmptyOutput {
                path: output.to_path_buf(),
            });
        }

        info!(%tier, resolution, bytes = size, "compressed document");

        Ok(CompressedOutput {
            path: output.to_path_buf(),
            size,
            tier,
        })
    }

    async fn bounded<F, R>(&self, future: F) -> Result<R, CompressionError>
    where
        F: Future<Output = Result<R, CompressionError>>,
    {
        tokio::time::timeout(self.timeout, future)
            .await
            .unwrap_or(Err(CompressionError::TimedOut {
                after: self.timeout,
            }))
    }
}
