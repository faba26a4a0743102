//! Per-request batch state.
//!
//! A [`Session`] holds the ingested documents with their validation, the
//! current pipeline state and, once a merge has finished, its output. The
//! caller owns the session and lends it to the pipeline for each step.

use serde::Serialize;
use tempfile::TempDir;
use tracing::debug;

use crate::error::{PdfPressError, Result};
use crate::io::DocumentHandle;
use crate::pipeline::{MergeOutput, PipelineState};
use crate::validation::{DiagnosticCode, ValidationResult};

/// One ingested document and what is known about it.
#[derive(Debug, Clone)]
pub struct SessionDocument {
    handle: DocumentHandle,
    validation: Option<ValidationResult>,
    history: Vec<ValidationResult>,
    repair_failure: Option<String>,
    repair_attempted: bool,
}

impl SessionDocument {
    fn new(handle: DocumentHandle) -> Self {
        Self {
            handle,
            validation: None,
            history: Vec::new(),
            repair_failure: None,
            repair_attempted: false,
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// Current handle; a repaired replacement once repair succeeded.
    pub fn handle(&self) -> &DocumentHandle {
        &self.handle
    }

    /// Current validation, if the document has been validated.
    pub fn validation(&self) -> Option<&ValidationResult> {
        self.validation.as_ref()
    }

    /// Earlier validations superseded by a repair, oldest first.
    pub fn history(&self) -> &[ValidationResult] {
        &self.history
    }

    /// Why repair failed, if it was tried and failed.
    pub fn repair_failure(&self) -> Option<&str> {
        self.repair_failure.as_deref()
    }

    /// Whether a repair has been attempted.
    pub fn repair_attempted(&self) -> bool {
        self.repair_attempted
    }

    /// Whether the document was replaced by a repaired copy.
    pub fn is_repaired(&self) -> bool {
        !self.history.is_empty()
    }

    /// Whether the document currently validates.
    pub fn is_valid(&self) -> bool {
        self.validation.as_ref().is_some_and(ValidationResult::is_valid)
    }

    pub(crate) fn set_validation(&mut self, validation: ValidationResult) {
        self.validation = Some(validation);
    }

    pub(crate) fn supersede(&mut self, handle: DocumentHandle, validation: ValidationResult) {
        if let Some(previous) = self.validation.replace(validation) {
            self.history.push(previous);
        }
        self.handle = handle;
        self.repair_attempted = true;
    }

    pub(crate) fn mark_unrepairable(&mut self, reason: String) {
        self.repair_failure = Some(reason);
        self.repair_attempted = true;
    }
}

/// Pipeline step a diagnostic comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticStage {
    /// The document failed validation and repair was not tried.
    Validation,
    /// The document went through repair.
    Repair,
}

/// What happened to one document that did not simply validate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDiagnostic {
    /// Display name of the document.
    pub name: String,

    /// Step that produced the diagnostic.
    pub stage: DiagnosticStage,

    /// Original validation diagnostic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<DiagnosticCode>,

    /// Human-readable detail.
    pub message: String,

    /// Whether the document was left out of the merge.
    pub excluded: bool,
}

impl FileDiagnostic {
    fn for_document(doc: &SessionDocument) -> Option<Self> {
        let validation = doc.validation.as_ref()?;

        if validation.is_valid() {
            let original = doc.history.first()?;
            return Some(Self {
                name: doc.name().to_string(),
                stage: DiagnosticStage::Repair,
                code: original.code,
                message: format!("repaired ({})", original.message),
                excluded: false,
            });
        }

        let (stage, message) = match &doc.repair_failure {
            Some(reason) => (DiagnosticStage::Repair, reason.clone()),
            None => (DiagnosticStage::Validation, validation.message.clone()),
        };

        Some(Self {
            name: doc.name().to_string(),
            stage,
            code: validation.code,
            message,
            excluded: true,
        })
    }
}

/// Status overview of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Number of ingested documents.
    pub files: usize,

    /// Number of documents that currently validate.
    pub valid: usize,

    /// Aggregate declared size of the valid documents, in bytes.
    pub valid_size: u64,

    /// Whether enough documents validate to merge.
    pub ready_to_merge: bool,
}

/// Batch state for one merge request.
#[derive(Debug, Default)]
pub struct Session {
    state: PipelineState,
    documents: Vec<SessionDocument>,
    output: Option<MergeOutput>,
    workdir: Option<TempDir>,
}

impl Session {
    /// Minimum number of valid documents a merge needs.
    pub const MIN_VALID_DOCUMENTS: usize = 2;

    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pipeline state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Ingested documents in upload order.
    pub fn documents(&self) -> &[SessionDocument] {
        &self.documents
    }

    /// Look up a document by name.
    pub fn document(&self, name: &str) -> Option<&SessionDocument> {
        self.documents.iter().find(|doc| doc.name() == name)
    }

    /// Result of the last successful merge, while the session is `Ready`.
    pub fn output(&self) -> Option<&MergeOutput> {
        self.output.as_ref()
    }

    /// Counts used to display session status.
    pub fn summary(&self) -> SessionSummary {
        let valid: Vec<&SessionDocument> = self.documents.iter().filter(|d| d.is_valid()).collect();

        SessionSummary {
            files: self.documents.len(),
            valid: valid.len(),
            valid_size: valid.iter().map(|d| d.handle.declared_size()).sum(),
            ready_to_merge: valid.len() >= Self::MIN_VALID_DOCUMENTS,
        }
    }

    /// Per-file diagnostics for every excluded or repaired document.
    pub fn diagnostics(&self) -> Vec<FileDiagnostic> {
        self.documents.iter().filter_map(FileDiagnostic::for_document).collect()
    }

    /// Remove a document by name. Returns whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.documents.len();
        self.documents.retain(|doc| doc.name() != name);
        self.documents.len() != before
    }

    /// Discard the merge output and return to `Idle`.
    ///
    /// Ingested documents and their validation are kept.
    pub fn reset(&mut self) {
        self.discard_output();
        self.state = PipelineState::Idle;
    }

    /// Discard everything and return to `Idle`.
    pub fn clear(&mut self) {
        self.documents.clear();
        self.reset();
    }

    /// Move to `to`, rejecting transitions the state machine does not allow.
    pub(crate) fn transition(&mut self, to: PipelineState) -> Result<()> {
        if !self.state.can_transition_to(to) {
            return Err(PdfPressError::InvalidTransition {
                from: self.state,
                to,
            });
        }

        debug!(from = %self.state, %to, "pipeline transition");
        self.state = to;
        Ok(())
    }

    /// Abort the current request.
    pub(crate) fn fail(&mut self) {
        self.discard_output();
        debug!(from = %self.state, "pipeline failed");
        self.state = PipelineState::Failed;
    }

    /// Add handles, skipping names already present. Returns how many were added.
    pub(crate) fn add(&mut self, handles: impl IntoIterator<Item = DocumentHandle>) -> usize {
        let mut added = 0;
        for handle in handles {
            if self.document(handle.name()).is_some() {
                debug!(document = %handle.name(), "skipping duplicate upload");
                continue;
            }
            self.documents.push(SessionDocument::new(handle));
            added += 1;
        }
        added
    }

    pub(crate) fn documents_mut(&mut self) -> &mut [SessionDocument] {
        &mut self.documents
    }

    pub(crate) fn discard_output(&mut self) {
        self.output = None;
        // Dropping the directory deletes the artifact with it.
        self.workdir = None;
    }

    pub(crate) fn complete(&mut self, output: MergeOutput, workdir: TempDir) -> &MergeOutput {
        self.workdir = Some(workdir);
        self.output.insert(output)
    }

    #[cfg(test)]
    pub(crate) fn has_workdir(&self) -> bool {
        self.workdir.is_some()
    }
}
