//! PDF merging operations.
//!
//! This module provides the assembly half of the pipeline:
//! - [`Orderer`] turns page counts and an ordering strategy into a plan
//! - [`Merger`] re-reads the sources and writes one document following it
//! - [`PageTree`] keeps page appearance intact while pages change parents
//!
//! # Examples
//!
//! ```no_run
//! use pdfpress::config::OrderingStrategy;
//! use pdfpress::io::DocumentHandle;
//! use pdfpress::merge::{Merger, Orderer};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let documents = vec![
//!     DocumentHandle::from_path("odd.pdf").await?,
//!     DocumentHandle::from_path("even.pdf").await?,
//! ];
//!
//! let plan = Orderer::new().order(&[5, 5], OrderingStrategy::Alternating)?;
//! let merged = Merger::new()
//!     .merge(&plan, &documents, Path::new("scan.pdf"))
//!     .await?;
//! println!("Merged {} pages", merged.page_count);
//! # Ok(())
//! # }
//! ```

pub mod merger;
pub mod pages;
pub mod plan;

pub use merger::{MergeStatistics, MergedDocument, Merger};
pub use pages::PageTree;
pub use plan::{MergePlan, Orderer, PageSpan};
