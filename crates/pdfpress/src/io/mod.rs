//! I/O operations for pdfpress.
//!
//! This module handles everything that touches document bytes:
//! - Ingested document handles (in-memory or file-backed)
//! - Loading and parsing PDF documents, one at a time or concurrently
//! - Writing artifacts atomically
//!
//! # Examples
//!
//! ```no_run
//! use pdfpress::io::{DocumentHandle, PdfReader, PdfWriter};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handle = DocumentHandle::from_path("input.pdf").await?;
//! let loaded = PdfReader::new().load(&handle).await?;
//!
//! let mut document = loaded.document;
//! let bytes = PdfWriter::serialize(&mut document)?;
//! PdfWriter::new().write_atomic(bytes, "copy.pdf".as_ref()).await?;
//! # Ok(())
//! # }
//! ```

pub mod handle;
pub mod reader;
pub mod writer;

pub use handle::{DocumentHandle, DocumentSource};
pub use reader::{LoadFailure, LoadResult, LoadedPdf, PdfReader};
pub use writer::{PdfWriter, WriteStatistics, remove_if_exists};
