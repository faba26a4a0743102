//! Orchestration of one merge request.
//!
//! The [`Pipeline`] drives a [`Session`] through its states:
//!
//! ```text
//! Idle → Ingesting → Validating → (Repairing) → Ordering → Merging
//!      → (Compressing) → Reporting → Ready
//! ```
//!
//! `Failed` is reached from Validating, Ordering or Merging when the request
//! cannot complete. Per-file problems never fail a request on their own:
//! invalid documents are left out and reported as [`FileDiagnostic`]s, and a
//! failed compression falls back to the uncompressed output.
//!
//! # Examples
//!
//! ```no_run
//! use pdfpress::config::{OrderingStrategy, PipelineConfig};
//! use pdfpress::io::DocumentHandle;
//! use pdfpress::pipeline::{Pipeline, Session};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = Pipeline::new(PipelineConfig::default())?;
//! let mut session = Session::new();
//!
//! let handles = vec![
//!     DocumentHandle::from_path("a.pdf").await?,
//!     DocumentHandle::from_path("b.pdf").await?,
//! ];
//! pipeline.ingest(&mut session, handles).await?;
//!
//! let output = pipeline
//!     .merge(&mut session, "combined", OrderingStrategy::Sequential)
//!     .await?;
//! output.artifact.persist_to("combined.pdf".as_ref()).await?;
//! println!("{} -> {}", output.report.format_original_size(), output.report.format_final_size());
//! # Ok(())
//! # }
//! ```

pub mod session;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::compress::{Compressor, Ghostscript, RasterTransform};
use crate::config::{OrderingStrategy, PipelineConfig, normalize_output_name};
use crate::error::{PdfPressError, Result};
use crate::io::{DocumentHandle, PdfWriter, WriteStatistics, remove_if_exists};
use crate::merge::{Merger, Orderer};
use crate::repair::{RepairOutcome, Repairer};
use crate::report::{MergeReport, SizeAccountant};
use crate::validation::{ValidationResult, Validator};

pub use session::{DiagnosticStage, FileDiagnostic, Session, SessionDocument, SessionSummary};

/// States of a merge request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    /// Nothing in progress.
    #[default]
    Idle,
    /// Documents are being added.
    Ingesting,
    /// Pending documents are being validated.
    Validating,
    /// Invalid documents are being repaired.
    Repairing,
    /// The page sequence is being planned.
    Ordering,
    /// The merged artifact is being assembled.
    Merging,
    /// The merged artifact is being compressed.
    Compressing,
    /// Sizes are being measured.
    Reporting,
    /// The artifact and report are available.
    Ready,
    /// The last request failed.
    Failed,
}

impl PipelineState {
    /// Lowercase state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Ingesting => "ingesting",
            Self::Validating => "validating",
            Self::Repairing => "repairing",
            Self::Ordering => "ordering",
            Self::Merging => "merging",
            Self::Compressing => "compressing",
            Self::Reporting => "reporting",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }

    /// Whether the state machine links `self` to `to`.
    ///
    /// Any state may return to `Idle`.
    pub fn can_transition_to(&self, to: PipelineState) -> bool {
        use PipelineState::*;

        matches!(
            (self, to),
            (_, Idle)
                | (Idle | Ingesting | Ready | Failed, Ingesting)
                | (Ingesting, Validating)
                | (Validating, Repairing | Ordering | Failed)
                | (Repairing, Ordering)
                | (Ordering, Merging | Failed)
                | (Merging, Compressing | Reporting | Failed)
                | (Compressing, Reporting)
                | (Reporting, Ready)
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The final file of a successful merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputArtifact {
    /// Normalized output name.
    pub name: String,

    /// Location inside the request's working directory.
    pub path: PathBuf,
}

impl OutputArtifact {
    /// Read the artifact into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact was discarded or cannot be read.
    pub async fn read(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.path).await?)
    }

    /// Copy the artifact to `destination`, atomically.
    ///
    /// # Errors
    ///
    /// Returns [`PdfPressError::FailedToWrite`] if the copy cannot be stored.
    pub async fn persist_to(&self, destination: &Path) -> Result<WriteStatistics> {
        PdfWriter::new().copy_atomic(&self.path, destination).await
    }
}

/// Everything a successful merge produces.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutput {
    /// The output file.
    pub artifact: OutputArtifact,

    /// Size and compression metrics.
    pub report: MergeReport,

    /// Documents that were excluded or repaired.
    pub diagnostics: Vec<FileDiagnostic>,

    /// Why compression did not apply, when it was attempted and failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_error: Option<String>,
}

/// Merge request controller.
#[derive(Debug)]
pub struct Pipeline<T: RasterTransform = Ghostscript> {
    config: PipelineConfig,
    validator: Validator,
    repairer: Repairer,
    orderer: Orderer,
    merger: Merger,
    compressor: Arc<Compressor<T>>,
}

impl Pipeline<Ghostscript> {
    /// Create a pipeline that compresses with Ghostscript.
    ///
    /// # Errors
    ///
    /// Returns [`PdfPressError::InvalidConfig`] if the configuration does
    /// not validate.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let transform = Ghostscript::from_config(&config.tool);
        Self::with_transform(config, transform)
    }
}

impl<T: RasterTransform> Pipeline<T> {
    /// Create a pipeline over a custom compression transform.
    ///
    /// # Errors
    ///
    /// Returns [`PdfPressError::InvalidConfig`] if the configuration does
    /// not validate.
    pub fn with_transform(config: PipelineConfig, transform: T) -> Result<Self> {
        config
            .validate()
            .map_err(|e| PdfPressError::invalid_config(e.to_string()))?;

        let compressor = Arc::new(Compressor::new(transform, config.tool.timeout));
        Ok(Self {
            config,
            validator: Validator::new(),
            repairer: Repairer::new(),
            orderer: Orderer::new(),
            merger: Merger::new(),
            compressor,
        })
    }

    /// Share an existing compressor, keeping its probe cache.
    pub fn with_compressor(mut self, compressor: Arc<Compressor<T>>) -> Self {
        self.compressor = compressor;
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Compressor in use.
    pub fn compressor(&self) -> &Arc<Compressor<T>> {
        &self.compressor
    }

    /// Add documents to the session and validate the new ones.
    ///
    /// Names already in the session are skipped. Ingesting into a `Ready`
    /// session discards the previous output. Returns how many documents
    /// were added.
    ///
    /// # Errors
    ///
    /// Returns [`PdfPressError::InvalidTransition`] if the session is in
    /// the middle of a merge.
    pub async fn ingest(
        &self,
        session: &mut Session,
        handles: impl IntoIterator<Item = DocumentHandle>,
    ) -> Result<usize> {
        session.transition(PipelineState::Ingesting)?;
        session.discard_output();

        let added = session.add(handles);
        let validated = self.validate_pending(session).await;

        info!(added, validated, "ingested documents");
        Ok(added)
    }

    /// Run one merge over the valid documents of `session`.
    ///
    /// On success the session is `Ready` and holds the returned output until
    /// it is reset. On a request-level failure it is `Failed` and nothing is
    /// left on disk.
    ///
    /// # Errors
    ///
    /// - [`PdfPressError::InvalidOutputName`] or
    ///   [`PdfPressError::InvalidTransition`] leave the session untouched
    /// - [`PdfPressError::InsufficientValidInputs`] when fewer than two
    ///   documents validate after repair
    /// - [`PdfPressError::UnsupportedOrdering`] for alternating with other
    ///   than two documents
    /// - [`PdfPressError::MergeFailed`] naming the source that broke assembly
    pub async fn merge<'s>(
        &self,
        session: &'s mut Session,
        output_name: &str,
        strategy: OrderingStrategy,
    ) -> Result<&'s MergeOutput> {
        let outcome = match Self::start(session, output_name) {
            Ok(name) => self.run(session, &name, strategy).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok((output, workdir)) => {
                session.transition(PipelineState::Ready)?;
                Ok(session.complete(output, workdir))
            }
            Err(e) if e.is_fatal() => {
                warn!(state = %session.state(), error = %e, "merge failed");
                session.fail();
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Normalize the output name and enter `Validating`.
    fn start(session: &mut Session, output_name: &str) -> Result<String> {
        let name = normalize_output_name(output_name)?;

        if session.state() == PipelineState::Idle {
            session.transition(PipelineState::Ingesting)?;
        }
        session.transition(PipelineState::Validating)?;

        Ok(name)
    }

    async fn run(
        &self,
        session: &mut Session,
        name: &str,
        strategy: OrderingStrategy,
    ) -> Result<(MergeOutput, TempDir)> {
        self.validate_pending(session).await;
        if session.documents().is_empty() {
            return Err(PdfPressError::insufficient_inputs(0, Session::MIN_VALID_DOCUMENTS));
        }

        if self.config.repair {
            self.repair_invalid(session).await?;
        }

        session.transition(PipelineState::Ordering)?;
        let (handles, page_counts): (Vec<DocumentHandle>, Vec<usize>) = session
            .documents()
            .iter()
            .filter(|doc| doc.is_valid())
            .map(|doc| {
                let pages = doc.validation().map_or(0, |v| v.page_count);
                (doc.handle().clone(), pages)
            })
            .unzip();

        if handles.len() < Session::MIN_VALID_DOCUMENTS {
            return Err(PdfPressError::insufficient_inputs(
                handles.len(),
                Session::MIN_VALID_DOCUMENTS,
            ));
        }

        let plan = self.orderer.order(&page_counts, strategy)?;
        let original_size: u64 = handles.iter().map(DocumentHandle::declared_size).sum();
        debug!(%strategy, spans = plan.spans().len(), pages = plan.page_count(), "planned merge");

        session.transition(PipelineState::Merging)?;
        let workdir = self.create_workdir()?;
        let work = workdir.path().join("work");
        let out = workdir.path().join("out");
        tokio::fs::create_dir(&work).await?;
        tokio::fs::create_dir(&out).await?;

        let merged = self
            .merger
            .merge(&plan, &handles, &work.join("merged.pdf"))
            .await?;

        let settings = self.config.compression;
        let mut chosen = merged.path.clone();
        let mut compressed = false;
        let mut compression_error = None;

        if settings.enabled {
            session.transition(PipelineState::Compressing)?;
            let target = work.join("compressed.pdf");

            match self.compressor.compress(&merged.path, &target, settings.tier).await {
                Ok(result) if result.is_smaller_than(merged.size) => {
                    chosen = result.path;
                    compressed = true;
                }
                Ok(result) => {
                    info!(
                        merged = merged.size,
                        compressed = result.size,
                        "compressed output is not smaller, keeping merged output"
                    );
                    if let Err(e) = remove_if_exists(&result.path).await {
                        debug!(error = %e, "failed to remove discarded compression output");
                    }
                }
                Err(e) => {
                    warn!(tier = %settings.tier, error = %e, "compression skipped");
                    compression_error = Some(e.to_string());
                }
            }
        }

        session.transition(PipelineState::Reporting)?;
        let artifact_path = out.join(name);
        tokio::fs::rename(&chosen, &artifact_path)
            .await
            .map_err(|source| PdfPressError::FailedToWrite {
                path: artifact_path.clone(),
                source,
            })?;
        let final_size = tokio::fs::metadata(&artifact_path).await?.len();

        let report = SizeAccountant::account(original_size, final_size, settings.enabled, compressed)
            .with_inputs(handles.len(), merged.page_count)
            .with_tier(settings.enabled.then_some(settings.tier));

        info!(
            output = %name,
            files = report.files_merged,
            pages = report.page_count,
            original = report.original_size,
            final_size = report.final_size,
            compressed = report.compressed,
            "merge complete"
        );

        let output = MergeOutput {
            artifact: OutputArtifact {
                name: name.to_string(),
                path: artifact_path,
            },
            report,
            diagnostics: session.diagnostics(),
            compression_error,
        };

        Ok((output, workdir))
    }

    /// Validate documents that have no result yet. Returns how many were validated.
    async fn validate_pending(&self, session: &mut Session) -> usize {
        let pending: Vec<(usize, DocumentHandle)> = session
            .documents()
            .iter()
            .enumerate()
            .filter(|(_, doc)| doc.validation().is_none())
            .map(|(index, doc)| (index, doc.handle().clone()))
            .collect();

        if pending.is_empty() {
            return 0;
        }

        let handles: Vec<DocumentHandle> = pending.iter().map(|(_, h)| h.clone()).collect();
        let results = self
            .validator
            .validate_all(&handles, self.config.effective_jobs())
            .await;

        let documents = session.documents_mut();
        for ((index, _), result) in pending.iter().zip(results) {
            documents[*index].set_validation(result);
        }

        pending.len()
    }

    /// Repair invalid documents that have not been tried yet.
    async fn repair_invalid(&self, session: &mut Session) -> Result<()> {
        let candidates: Vec<(usize, (DocumentHandle, ValidationResult))> = session
            .documents()
            .iter()
            .enumerate()
            .filter(|(_, doc)| !doc.is_valid() && !doc.repair_attempted())
            .filter_map(|(index, doc)| {
                let validation = doc.validation()?.clone();
                Some((index, (doc.handle().clone(), validation)))
            })
            .collect();

        if candidates.is_empty() {
            return Ok(());
        }

        session.transition(PipelineState::Repairing)?;

        let (indexes, batch): (Vec<usize>, Vec<(DocumentHandle, ValidationResult)>) =
            candidates.into_iter().unzip();
        let outcomes = self
            .repairer
            .repair_all(&batch, self.config.effective_jobs())
            .await;

        let documents = session.documents_mut();
        for (index, outcome) in indexes.into_iter().zip(outcomes) {
            match outcome {
                RepairOutcome::Repaired { handle, validation } => {
                    documents[index].supersede(handle, validation);
                }
                RepairOutcome::Unrepairable { reason } => {
                    documents[index].mark_unrepairable(reason);
                }
            }
        }

        Ok(())
    }

    fn create_workdir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("pdfpress-");

        let dir = match &self.config.work_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };

        debug!(path = %dir.path().display(), "created working directory");
        Ok(dir)
    }
}
