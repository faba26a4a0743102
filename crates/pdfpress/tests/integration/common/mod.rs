//! Shared helpers for the integration tests.
//!
//! Documents are generated in memory with `lopdf`, and the compression tool
//! is replaced by [`FakeTool`] wherever a test needs to control it.

#![allow(dead_code)]

use lopdf::{Dictionary, Document, Object, Stream, dictionary};
use pdfpress::compress::RasterTransform;
use pdfpress::config::{CompressionSettings, PipelineConfig};
use pdfpress::io::{DocumentHandle, DocumentSource};
use pdfpress::pipeline::Pipeline;
use pdfpress::CompressionError;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// A PDF whose page `n` draws `"{label} page {n}"`.
pub fn pdf_bytes(label: &str, pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let kids: Vec<Object> = (1..=pages)
        .map(|n| {
            let text = format!("BT /F1 10 Tf 50 700 Td ({label} page {n}) Tj ET");
            let content_id = doc.add_object(Stream::new(Dictionary::new(), text.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            });
            Object::Reference(page_id)
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// An in-memory handle over a generated document.
pub fn handle(name: &str, label: &str, pages: usize) -> DocumentHandle {
    DocumentHandle::from_bytes(name, pdf_bytes(label, pages))
}

/// An in-memory handle that reports `declared_size` bytes.
pub fn handle_with_declared_size(name: &str, pages: usize, declared_size: u64) -> DocumentHandle {
    DocumentHandle::new(
        name,
        DocumentSource::Memory(pdf_bytes(name, pages).into()),
        declared_size,
    )
}

/// `bytes` with `startxref` pointing past the end of the file.
pub fn with_bad_startxref(bytes: &[u8]) -> Vec<u8> {
    let pos = bytes
        .windows(9)
        .rposition(|w| w == b"startxref")
        .expect("generated PDFs end with startxref");
    let mut damaged = bytes[..pos].to_vec();
    damaged.extend_from_slice(b"startxref\n99999999\n%%EOF\n");
    damaged
}

/// Page labels of `bytes`, in page order.
pub fn page_labels(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let content = doc.get_page_content(page_id).unwrap();
            let content = String::from_utf8_lossy(&content).into_owned();
            let start = content.find('(').unwrap() + 1;
            let end = content.rfind(')').unwrap();
            content[start..end].to_string()
        })
        .collect()
}

/// Configuration rooted in `work_root`, with the given compression.
pub fn config(work_root: &TempDir, compression: CompressionSettings) -> PipelineConfig {
    PipelineConfig {
        compression,
        work_root: Some(work_root.path().to_path_buf()),
        ..Default::default()
    }
}

/// Behavior of [`FakeTool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolMode {
    /// Writes half of the input.
    Halve,
    /// Never finishes.
    Hang,
    /// Not installed.
    Missing,
}

/// Compression tool double that counts calls.
#[derive(Debug, Clone)]
pub struct FakeTool {
    mode: ToolMode,
    probes: Arc<AtomicUsize>,
    runs: Arc<AtomicUsize>,
}

impl FakeTool {
    pub fn new(mode: ToolMode) -> Self {
        Self {
            mode,
            probes: Arc::new(AtomicUsize::new(0)),
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl RasterTransform for FakeTool {
    async fn probe(&self) -> Result<String, CompressionError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            ToolMode::Missing => Err(CompressionError::unavailable("fake-gs", "not found")),
            _ => Ok("fake 1.0".to_string()),
        }
    }

    async fn run(&self, input: &Path, output: &Path, _resolution: u32) -> Result<(), CompressionError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            ToolMode::Halve => {
                let bytes = tokio::fs::read(input).await?;
                tokio::fs::write(output, &bytes[..bytes.len() / 2]).await?;
                Ok(())
            }
            ToolMode::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
            ToolMode::Missing => Err(CompressionError::unavailable("fake-gs", "not found")),
        }
    }
}

/// A pipeline over a [`FakeTool`] in `mode`; returns the tool for inspection.
pub fn fake_pipeline(config: PipelineConfig, mode: ToolMode) -> (Pipeline<FakeTool>, FakeTool) {
    let tool = FakeTool::new(mode);
    let pipeline = Pipeline::with_transform(config, tool.clone()).unwrap();
    (pipeline, tool)
}
