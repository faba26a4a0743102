//! PDF reading and loading operations.
//!
//! This module turns a [`DocumentHandle`] into a parsed `lopdf` document:
//! - Content is read from memory or disk
//! - Cheap signature checks run before the parser
//! - Parsing happens on the blocking pool, one task per document
//!
//! Loading never returns a Rust error type: every way a document can fail to
//! load is a [`LoadFailure`] value, which the validator classifies and the
//! merger turns into a request error.

use lopdf::Document;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task;

use crate::io::handle::DocumentHandle;

/// How far into a file the `%PDF-` signature may appear.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// How far from the end of a file the `%%EOF` marker may appear.
const TRAILER_SEARCH_WINDOW: usize = 1024;

/// A loaded PDF document with metadata.
#[derive(Debug)]
pub struct LoadedPdf {
    /// The PDF document.
    pub document: Document,

    /// Display name of the source handle.
    pub name: String,

    /// Number of pages in the document.
    pub page_count: usize,

    /// Size of the parsed content in bytes.
    pub byte_size: u64,

    /// Time taken to read and parse the document.
    pub load_time: Duration,
}

/// Why a document could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    /// The content source could not be read.
    Unreadable(String),
    /// The content is zero bytes long.
    Empty,
    /// No `%PDF-` signature near the start of the content.
    MissingHeader,
    /// The content stops before the end-of-file marker; carries the
    /// parser's message.
    Truncated(String),
    /// The document is protected by a security handler.
    Encrypted,
    /// The document parsed but its page tree enumerates no pages.
    NoPages,
    /// The parser rejected the document; carries the parser's message.
    Parse(String),
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable(reason) => write!(f, "cannot read document: {reason}"),
            Self::Empty => write!(f, "file is empty"),
            Self::MissingHeader => write!(f, "missing %PDF- signature"),
            Self::Truncated(message) => write!(f, "file is truncated: {message}"),
            Self::Encrypted => write!(f, "document is encrypted"),
            Self::NoPages => write!(f, "page tree contains no pages"),
            Self::Parse(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for LoadFailure {}

/// Result of a load operation (success or failure).
pub type LoadResult = std::result::Result<LoadedPdf, LoadFailure>;

/// PDF reader that requires at least one page.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfReader;

impl PdfReader {
    /// Create a new PDF reader.
    pub fn new() -> Self {
        Self
    }

    /// Load a single document.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use pdfpress::io::{DocumentHandle, PdfReader};
    /// # async fn example(handle: DocumentHandle) {
    /// let reader = PdfReader::new();
    /// match reader.load(&handle).await {
    ///     Ok(loaded) => println!("{} pages", loaded.page_count),
    ///     Err(failure) => eprintln!("{}: {failure}", handle.name()),
    /// }
    /// # }
    /// ```
    pub async fn load(&self, handle: &DocumentHandle) -> LoadResult {
        let start = Instant::now();

        let bytes = handle
            .read()
            .await
            .map_err(|e| LoadFailure::Unreadable(e.to_string()))?;

        let mut loaded = self.load_bytes(handle.name(), bytes).await?;
        loaded.load_time = start.elapsed();
        Ok(loaded)
    }

    /// Parse already-read content on the blocking pool.
    pub async fn load_bytes(&self, name: &str, bytes: Arc<[u8]>) -> LoadResult {
        let name = name.to_string();
        let start = Instant::now();

        task::spawn_blocking(move || {
            let (document, page_count) = parse_document(&bytes, true)?;
            Ok(LoadedPdf {
                document,
                name,
                page_count,
                byte_size: bytes.len() as u64,
                load_time: start.elapsed(),
            })
        })
        .await
        .unwrap_or_else(|e| Err(LoadFailure::Parse(format!("parser task failed: {e}"))))
    }
}

/// Check for the `%PDF-` signature near the start of `bytes`.
pub fn has_pdf_header(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

/// Check for the `%%EOF` marker near the end of `bytes`.
pub fn has_eof_marker(bytes: &[u8]) -> bool {
    let window = &bytes[bytes.len().saturating_sub(TRAILER_SEARCH_WINDOW)..];
    window.windows(5).any(|w| w == b"%%EOF")
}

/// Parse `bytes` synchronously and count pages.
///
/// Runs the signature checks first so that empty or foreign content never
/// reaches the parser.
pub fn parse_document(bytes: &[u8], verify: bool) -> Result<(Document, usize), LoadFailure> {
    if bytes.is_empty() {
        return Err(LoadFailure::Empty);
    }

    if !has_pdf_header(bytes) {
        return Err(LoadFailure::MissingHeader);
    }

    let document = Document::load_mem(bytes).map_err(|e| {
        let message = e.to_string();
        let lower = message.to_lowercase();
        if ["encrypt", "decrypt", "password"].iter().any(|t| lower.contains(t)) {
            LoadFailure::Encrypted
        } else if !has_eof_marker(bytes) {
            LoadFailure::Truncated(message)
        } else {
            LoadFailure::Parse(message)
        }
    })?;

    if document.trailer.has(b"Encrypt") {
        return Err(LoadFailure::Encrypted);
    }

    let page_count = document.get_pages().len();
    if verify && page_count == 0 {
        return Err(LoadFailure::NoPages);
    }

    Ok((document, page_count))
}
