//! pdfpress - Validate, repair, merge and recompress PDF documents.
//!
//! This library assembles a batch of uploaded PDF documents into one file.
//! It supports:
//!
//! - Structural validation with classified diagnostics
//! - Best-effort repair of damaged documents
//! - Sequential and alternating page ordering
//! - Deterministic merging through `lopdf`
//! - Optional recompression through Ghostscript, with fallback
//! - Size reporting before and after compression
//!
//! Invalid documents never abort a batch: they are left out and reported.
//!
//! # Examples
//!
//! ## Full Pipeline
//!
//! ```no_run
//! use pdfpress::config::{CompressionSettings, OrderingStrategy, PipelineConfig, QualityTier};
//! use pdfpress::io::DocumentHandle;
//! use pdfpress::pipeline::{Pipeline, Session};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig {
//!     compression: CompressionSettings::with_tier(QualityTier::High),
//!     ..Default::default()
//! };
//! let pipeline = Pipeline::new(config)?;
//!
//! let mut session = Session::new();
//! pipeline
//!     .ingest(
//!         &mut session,
//!         vec![
//!             DocumentHandle::from_path("a.pdf").await?,
//!             DocumentHandle::from_path("b.pdf").await?,
//!         ],
//!     )
//!     .await?;
//!
//! let output = pipeline
//!     .merge(&mut session, "merged", OrderingStrategy::Alternating)
//!     .await?;
//! println!("Reduced by {}", output.report.format_reduction());
//! # Ok(())
//! # }
//! ```
//!
//! ## Using Individual Components
//!
//! ```no_run
//! use pdfpress::io::DocumentHandle;
//! use pdfpress::repair::Repairer;
//! use pdfpress::validation::Validator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handle = DocumentHandle::from_path("input.pdf").await?;
//!
//! let validation = Validator::new().validate(&handle).await;
//! if !validation.is_valid() {
//!     let outcome = Repairer::new().repair(&handle, &validation).await;
//!     println!("repaired: {}", outcome.is_repaired());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compress;
pub mod config;
pub mod error;
pub mod io;
pub mod merge;
pub mod pipeline;
pub mod repair;
pub mod report;
pub mod utils;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::{CompressionSettings, OrderingStrategy, PipelineConfig, QualityTier};
pub use error::{CompressionError, PdfPressError, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
