//! Best-effort reconstruction of invalid documents.
//!
//! A repair rescans the raw bytes for object bodies, writes them behind a
//! rebuilt cross-reference table, lets `lopdf` drop whatever is no longer
//! reachable and re-serializes the result. The repaired bytes are then
//! validated again; only a document that passes becomes a replacement.
//!
//! Repairs never touch the original handle. A successful repair yields a new
//! handle with the same name and the new bytes.

pub mod metadata;
pub mod scan;

use std::sync::Arc;
use tokio::task;
use tracing::{debug, info, warn};

use crate::io::{DocumentHandle, DocumentSource, PdfWriter, reader::parse_document};
use crate::validation::{DiagnosticCode, ValidationResult, Validator};

pub use metadata::{DocumentInfo, MetadataManager};

/// Outcome of one repair attempt.
#[derive(Debug, Clone)]
pub enum RepairOutcome {
    /// The document was rebuilt and now validates.
    Repaired {
        /// Replacement handle: same name, new bytes.
        handle: DocumentHandle,
        /// Fresh validation of the replacement.
        validation: ValidationResult,
    },
    /// The document could not be recovered.
    Unrepairable {
        /// Why the repair failed.
        reason: String,
    },
}

impl RepairOutcome {
    fn unrepairable(reason: impl Into<String>) -> Self {
        Self::Unrepairable {
            reason: reason.into(),
        }
    }

    /// Whether the repair produced a valid replacement.
    pub fn is_repaired(&self) -> bool {
        matches!(self, Self::Repaired { .. })
    }
}

/// Repairer for invalid documents.
#[derive(Debug, Clone, Default)]
pub struct Repairer {
    validator: Validator,
    metadata: MetadataManager,
}

impl Repairer {
    /// Create a new repairer.
    pub fn new() -> Self {
        Self {
            validator: Validator::new(),
            metadata: MetadataManager::new(),
        }
    }

    /// Attempt to repair the document behind `handle`.
    ///
    /// `diagnosis` is the validation result that made the document invalid;
    /// encrypted documents are turned away without reading them.
    pub async fn repair(&self, handle: &DocumentHandle, diagnosis: &ValidationResult) -> RepairOutcome {
        if diagnosis.code == Some(DiagnosticCode::Encrypted) {
            debug!(document = %handle.name(), "skipping repair of encrypted document");
            return RepairOutcome::unrepairable("encrypted documents are not repaired");
        }

        let bytes = match handle.read().await {
            Ok(bytes) => bytes,
            Err(e) => return RepairOutcome::unrepairable(format!("cannot read document: {e}")),
        };

        let metadata = self.metadata;
        let rebuilt = task::spawn_blocking(move || reconstruct(&bytes, metadata))
            .await
            .unwrap_or_else(|e| Err(format!("repair task failed: {e}")));

        let bytes = match rebuilt {
            Ok(bytes) => bytes,
            Err(reason) => {
                warn!(document = %handle.name(), %reason, "repair failed");
                return RepairOutcome::unrepairable(reason);
            }
        };

        let declared_size = bytes.len() as u64;
        let repaired = DocumentHandle::new(
            handle.name(),
            DocumentSource::Memory(Arc::from(bytes)),
            declared_size,
        );

        let validation = self.validator.validate(&repaired).await;
        if !validation.is_valid() {
            warn!(document = %handle.name(), "repaired document still invalid");
            return RepairOutcome::unrepairable(format!(
                "repaired document is still invalid: {}",
                validation.message
            ));
        }

        info!(
            document = %handle.name(),
            pages = validation.page_count,
            bytes = declared_size,
            "repaired document"
        );

        RepairOutcome::Repaired {
            handle: repaired,
            validation,
        }
    }

    /// Repair several documents concurrently, at most `jobs` at a time.
    ///
    /// Outcomes are returned in input order.
    pub async fn repair_all(
        &self,
        documents: &[(DocumentHandle, ValidationResult)],
        jobs: usize,
    ) -> Vec<RepairOutcome> {
        use futures::stream::{self, StreamExt};

        let tasks = documents
            .iter()
            .map(|(handle, diagnosis)| self.repair(handle, diagnosis));
        stream::iter(tasks).buffered(jobs.max(1)).collect().await
    }
}

/// Rebuild `bytes` into a clean, re-serialized document.
fn reconstruct(bytes: &[u8], metadata: MetadataManager) -> Result<Vec<u8>, String> {
    let scanned = scan::scan(bytes);
    if scanned.objects.is_empty() {
        return Err("no objects found".to_string());
    }

    let rebuilt = scan::rebuild(&scanned).ok_or("no document catalog found")?;

    let (mut document, _) = parse_document(&rebuilt, false).map_err(|e| e.to_string())?;

    let info = metadata.get_info(&document);
    metadata.replace_info(&mut document, &info);
    document.prune_objects();
    document.renumber_objects();

    PdfWriter::serialize(&mut document).map_err(|e| e.to_string())
}
