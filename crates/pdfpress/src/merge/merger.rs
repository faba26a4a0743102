//! Core PDF merging implementation.
//!
//! This module implements the assembly step: it re-reads every document a
//! [`MergePlan`] draws from, renumbers objects so ids never collide, builds
//! one page tree in plan order and writes the result atomically.

use lopdf::{Document, ObjectId};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;
use tracing::{debug, info};

use crate::error::{PdfPressError, Result};
use crate::io::{DocumentHandle, LoadedPdf, PdfReader, PdfWriter};
use crate::merge::pages::PageTree;
use crate::merge::plan::MergePlan;

/// Statistics about a merge operation.
#[derive(Debug, Clone)]
pub struct MergeStatistics {
    /// Number of documents merged.
    pub files_merged: usize,

    /// Total number of pages in merged document.
    pub total_pages: usize,

    /// Total time taken for merge.
    pub merge_time: Duration,

    /// Time taken to re-read all sources.
    pub load_time: Duration,
}

/// The merged artifact on disk.
#[derive(Debug, Clone)]
pub struct MergedDocument {
    /// Where the artifact was written.
    pub path: PathBuf,

    /// Size of the artifact in bytes.
    pub size: u64,

    /// Number of pages in the artifact.
    pub page_count: usize,

    /// Statistics about the merge.
    pub statistics: MergeStatistics,
}

/// PDF merger that combines multiple documents.
#[derive(Debug, Clone, Default)]
pub struct Merger {
    /// Reader for loading PDFs.
    reader: PdfReader,

    /// Page tree editor.
    page_tree: PageTree,

    /// Writer for the artifact.
    writer: PdfWriter,
}

impl Merger {
    /// Create a new merger with default settings.
    pub fn new() -> Self {
        Self {
            reader: PdfReader::new(),
            page_tree: PageTree::new(),
            writer: PdfWriter::new(),
        }
    }

    /// Assemble `plan` over `documents` and write the result to `target`.
    ///
    /// Span document indexes refer to positions in `documents`. Sources are
    /// re-read one at a time, in batch order.
    ///
    /// # Errors
    ///
    /// Returns [`PdfPressError::MergeFailed`] naming the document when a
    /// source cannot be re-read or no longer has the planned pages, and a
    /// write error when the artifact cannot be stored. On error nothing is
    /// left at `target`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use pdfpress::config::OrderingStrategy;
    /// # use pdfpress::io::DocumentHandle;
    /// # use pdfpress::merge::{Merger, Orderer};
    /// # use std::path::Path;
    /// # async fn example(documents: Vec<DocumentHandle>) -> Result<(), Box<dyn std::error::Error>> {
    /// let plan = Orderer::new().order(&[3, 2], OrderingStrategy::Sequential)?;
    /// let merged = Merger::new().merge(&plan, &documents, Path::new("out.pdf")).await?;
    /// println!("Merged {} pages", merged.page_count);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn merge(
        &self,
        plan: &MergePlan,
        documents: &[DocumentHandle],
        target: &Path,
    ) -> Result<MergedDocument> {
        let merge_start = Instant::now();

        let load_start = Instant::now();
        let mut loaded = BTreeMap::new();
        for index in plan.documents() {
            let handle = documents.get(index).ok_or_else(|| {
                PdfPressError::merge_failed(format!("#{index}"), "document is not part of the batch")
            })?;

            let pdf = self
                .reader
                .load(handle)
                .await
                .map_err(|failure| PdfPressError::merge_failed(handle.name(), failure.to_string()))?;

            debug!(document = %handle.name(), pages = pdf.page_count, "reloaded source");
            loaded.insert(index, pdf);
        }
        let load_time = load_start.elapsed();

        let files_merged = loaded.len();
        let page_tree = self.page_tree;
        let plan_owned = plan.clone();

        let bytes = task::spawn_blocking(move || {
            let mut document = assemble(&plan_owned, loaded, page_tree)?;
            PdfWriter::serialize(&mut document)
        })
        .await
        .map_err(|e| PdfPressError::other(format!("Merge task failed: {e}")))??;

        let stats = self.writer.write_atomic(bytes, target).await?;
        let total_pages = plan.page_count();

        info!(
            files = files_merged,
            pages = total_pages,
            bytes = stats.file_size,
            "merged documents"
        );

        Ok(MergedDocument {
            path: stats.output_path,
            size: stats.file_size,
            page_count: total_pages,
            statistics: MergeStatistics {
                files_merged,
                total_pages,
                merge_time: merge_start.elapsed(),
                load_time,
            },
        })
    }
}

/// Build one document holding the planned pages.
///
/// Each source has its inheritable page attributes pushed down, is
/// renumbered past the ids already in use and is folded into the output.
/// A fresh page tree then lists the planned pages in order, and everything
/// the old catalogs referenced but the new tree does not is pruned.
fn assemble(
    plan: &MergePlan,
    sources: BTreeMap<usize, LoadedPdf>,
    page_tree: PageTree,
) -> Result<Document> {
    let mut merged = Document::with_version("1.4");
    let mut page_maps: BTreeMap<usize, (String, BTreeMap<u32, ObjectId>)> = BTreeMap::new();

    for (index, source) in sources {
        let LoadedPdf { mut document, name, .. } = source;

        page_tree
            .push_down_inherited(&mut document)
            .map_err(|e| PdfPressError::merge_failed(name.as_str(), e.to_string()))?;

        document.renumber_objects_with(merged.max_id + 1);

        if document.version > merged.version {
            merged.version = document.version.clone();
        }

        let pages = document.get_pages();
        merged.max_id = merged.max_id.max(document.max_id);
        merged.objects.extend(document.objects);
        page_maps.insert(index, (name, pages));
    }

    let mut kids = Vec::with_capacity(plan.page_count());
    for (index, page) in plan.pages() {
        let (name, pages) = page_maps
            .get(&index)
            .ok_or_else(|| PdfPressError::merge_failed(format!("#{index}"), "document was not loaded"))?;

        let page_id = pages.get(&page).copied().ok_or_else(|| {
            PdfPressError::merge_failed(name.as_str(), format!("page {page} no longer exists"))
        })?;
        kids.push(page_id);
    }

    page_tree.install_tree(&mut merged, &kids)?;

    merged.prune_objects();
    merged.renumber_objects();

    Ok(merged)
}
