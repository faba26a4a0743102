//! PDF writing and saving operations.
//!
//! This module provides safe PDF writing with:
//! - Atomic writes (write to a uniquely named temp file, then rename)
//! - Deterministic serialization (no timestamps, no stream recompression)
//! - Write statistics
//!
//! The temporary file lives next to the target so the final rename never
//! crosses filesystems, and its name is unique so concurrent requests writing
//! into the same directory never collide.

use lopdf::Document;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;
use tracing::debug;

use crate::error::{PdfPressError, Result};

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        crate::utils::format_file_size(self.file_size)
    }
}

/// PDF writer with replace-or-abort semantics.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter;

impl PdfWriter {
    /// Create a new PDF writer.
    pub fn new() -> Self {
        Self
    }

    /// Serialize a document to bytes without altering its streams.
    ///
    /// # Errors
    ///
    /// Returns an error if `lopdf` fails to serialize the document.
    pub fn serialize(document: &mut Document) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        document
            .save_to(&mut buffer)
            .map_err(|e| PdfPressError::other(format!("Failed to serialize PDF: {e}")))?;
        Ok(buffer)
    }

    /// Write `bytes` to `path` atomically.
    ///
    /// Either the complete content ends up at `path`, or `path` is left as it
    /// was before the call; a partial file is never visible there.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The parent directory doesn't exist or isn't writable
    /// - Disk full
    /// - The final rename fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use pdfpress::io::PdfWriter;
    /// # use std::path::Path;
    /// # async fn example(bytes: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
    /// let stats = PdfWriter::new().write_atomic(bytes, Path::new("out.pdf")).await?;
    /// println!("Wrote {} in {:?}", stats.format_file_size(), stats.write_time);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn write_atomic(&self, bytes: Vec<u8>, path: &Path) -> Result<WriteStatistics> {
        let path_buf = path.to_path_buf();

        task::spawn_blocking(move || {
            let start = Instant::now();

            let parent = match path_buf.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            };

            let failed = |source: std::io::Error| PdfPressError::FailedToWrite {
                path: path_buf.clone(),
                source,
            };

            let mut temp = tempfile::Builder::new()
                .prefix(".pdfpress-")
                .suffix(".tmp")
                .tempfile_in(&parent)
                .map_err(failed)?;

            temp.write_all(&bytes).map_err(failed)?;
            temp.flush().map_err(failed)?;
            temp.as_file().sync_all().map_err(failed)?;

            // Dropping the temp file on any error above removes it.
            temp.persist(&path_buf).map_err(|e| failed(e.error))?;

            debug!(path = %path_buf.display(), bytes = bytes.len(), "wrote artifact");

            Ok::<_, PdfPressError>(WriteStatistics {
                write_time: start.elapsed(),
                file_size: bytes.len() as u64,
                output_path: path_buf,
            })
        })
        .await
        .map_err(|e| PdfPressError::other(format!("Write task failed: {e}")))?
    }

    /// Copy an existing file to `destination` atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or the destination
    /// cannot be written.
    pub async fn copy_atomic(&self, source: &Path, destination: &Path) -> Result<WriteStatistics> {
        let bytes = tokio::fs::read(source).await?;
        self.write_atomic(bytes, destination).await
    }
}

/// Remove a file, treating a missing file as already removed.
///
/// # Errors
///
/// Returns the I/O error if the file exists but cannot be removed.
pub async fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        result => result,
    }
}
