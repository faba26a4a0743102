//! Structural validation of ingested documents.
//!
//! The validator loads each document through `lopdf` (cross-reference table,
//! trailer and page tree, no rendering) and turns the outcome into a
//! [`ValidationResult`]. Validation never fails: every way a document can be
//! broken is described by a [`DiagnosticCode`] and a short message.
//!
//! # Examples
//!
//! ```no_run
//! use pdfpress::io::DocumentHandle;
//! use pdfpress::validation::Validator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handle = DocumentHandle::from_path("scan.pdf").await?;
//! let result = Validator::new().validate(&handle).await;
//! if result.is_valid() {
//!     println!("PDF has {} pages", result.page_count);
//! } else {
//!     println!("invalid: {}", result.message);
//! }
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::io::{DocumentHandle, LoadFailure, LoadResult, PdfReader};
use crate::utils::truncate_diagnostic;

/// Outcome of validating one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    /// The page tree can be enumerated and nothing blocks access.
    Valid,
    /// The document cannot be merged as is.
    Invalid,
}

/// Why a document is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticCode {
    /// Truncated content or a missing page tree.
    IncompleteStructure,
    /// Damaged cross-reference table or trailer.
    BrokenXref,
    /// Protected by a security handler.
    Encrypted,
    /// Anything else.
    Unknown,
}

impl DiagnosticCode {
    /// Get the code as a string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncompleteStructure => "incomplete-structure",
            Self::BrokenXref => "broken-xref",
            Self::Encrypted => "encrypted",
            Self::Unknown => "unknown",
        }
    }

    /// Whether a repair attempt makes sense for this code.
    pub fn is_repairable(&self) -> bool {
        !matches!(self, Self::Encrypted)
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify an underlying parser error message.
///
/// Checks run in a fixed order: security handler terms first, then
/// truncation terms, then cross-reference terms.
pub fn classify(message: &str) -> DiagnosticCode {
    const ENCRYPTED: &[&str] = &["encrypt", "decrypt", "password", "security handler"];
    const INCOMPLETE: &[&str] = &[
        "eof",
        "end of file",
        "unexpected end",
        "truncat",
        "fill whole buffer",
        "incomplete",
    ];
    const XREF: &[&str] = &["xref", "cross-reference", "cross reference", "trailer", "offset"];

    let lower = message.to_lowercase();
    let mentions = |terms: &[&str]| terms.iter().any(|term| lower.contains(term));

    if mentions(ENCRYPTED) {
        DiagnosticCode::Encrypted
    } else if mentions(INCOMPLETE) {
        DiagnosticCode::IncompleteStructure
    } else if mentions(XREF) {
        DiagnosticCode::BrokenXref
    } else {
        DiagnosticCode::Unknown
    }
}

/// Result of validating a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Valid or invalid.
    pub status: ValidationStatus,

    /// Number of pages; 0 when invalid.
    pub page_count: usize,

    /// Diagnostic code; present only when invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<DiagnosticCode>,

    /// Diagnostic text; non-empty when invalid.
    pub message: String,

    /// PDF version from the header, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ValidationResult {
    /// A valid result with `page_count` pages.
    pub fn valid(page_count: usize, version: Option<String>) -> Self {
        Self {
            status: ValidationStatus::Valid,
            page_count,
            code: None,
            message: String::new(),
            version,
        }
    }

    /// An invalid result; `message` is trimmed to the diagnostic limit.
    pub fn invalid(code: DiagnosticCode, message: impl AsRef<str>) -> Self {
        let mut message = truncate_diagnostic(message.as_ref());
        if message.is_empty() {
            message = format!("document rejected ({code})");
        }

        Self {
            status: ValidationStatus::Invalid,
            page_count: 0,
            code: Some(code),
            message,
            version: None,
        }
    }

    /// Whether the document can be merged.
    pub fn is_valid(&self) -> bool {
        self.status == ValidationStatus::Valid
    }

    /// Build a result from a load attempt.
    pub fn from_load(result: &LoadResult) -> Self {
        match result {
            Ok(loaded) => Self::valid(loaded.page_count, Some(loaded.document.version.clone())),
            Err(failure) => Self::from_failure(failure),
        }
    }

    fn from_failure(failure: &LoadFailure) -> Self {
        let code = match failure {
            LoadFailure::Empty | LoadFailure::Truncated(_) | LoadFailure::NoPages => {
                DiagnosticCode::IncompleteStructure
            }
            LoadFailure::Encrypted => DiagnosticCode::Encrypted,
            LoadFailure::Unreadable(_) | LoadFailure::MissingHeader => DiagnosticCode::Unknown,
            LoadFailure::Parse(message) => classify(message),
        };
        Self::invalid(code, failure.to_string())
    }
}

/// Validator for ingested documents.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    reader: PdfReader,
}

impl Validator {
    /// Create a new validator.
    pub fn new() -> Self {
        Self {
            reader: PdfReader::new(),
        }
    }

    /// Validate one document.
    pub async fn validate(&self, handle: &DocumentHandle) -> ValidationResult {
        let load = self.reader.load(handle).await;
        let result = ValidationResult::from_load(&load);

        match result.code {
            None => debug!(
                document = %handle.name(),
                pages = result.page_count,
                "document is valid"
            ),
            Some(code) => warn!(
                document = %handle.name(),
                %code,
                message = %result.message,
                "document is invalid"
            ),
        }

        result
    }

    /// Validate a batch concurrently, at most `jobs` at a time.
    ///
    /// Results are returned in the same order as `handles`.
    pub async fn validate_all(&self, handles: &[DocumentHandle], jobs: usize) -> Vec<ValidationResult> {
        use futures::stream::{self, StreamExt};

        let tasks = handles.iter().map(|handle| self.validate(handle));
        stream::iter(tasks).buffered(jobs.max(1)).collect().await
    }
}
