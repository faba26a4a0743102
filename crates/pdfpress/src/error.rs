//! Error types for pdfpress.
//!
//! Per-file problems (a document that does not validate, or cannot be
//! repaired) are not errors here: they are recorded as diagnostics on the
//! session and the batch carries on. The types in this module describe what
//! aborts a single merge request, plus the compression failures that the
//! pipeline absorbs by falling back to the uncompressed output.
//!
//! # Error Categories
//!
//! - **Request errors**: too few valid inputs, unsupported ordering, a source
//!   that became unreadable mid-merge
//! - **Configuration errors**: invalid settings or output names
//! - **Compression errors**: never fatal, see [`CompressionError`]

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::OrderingStrategy;
use crate::pipeline::PipelineState;

/// Result type alias for pdfpress operations.
pub type Result<T> = std::result::Result<T, PdfPressError>;

/// Request-level error for pdfpress operations.
#[derive(Debug, thiserror::Error)]
pub enum PdfPressError {
    /// Fewer valid documents than a merge needs, after validation and repair.
    #[error("At least {required} valid PDF documents are required to merge, found {valid}")]
    InsufficientValidInputs {
        /// Number of valid documents available.
        valid: usize,
        /// Number of valid documents required.
        required: usize,
    },

    /// A source document could not be read or assembled during the merge.
    #[error("Merge failed on '{document}'\n  Reason: {reason}")]
    MergeFailed {
        /// Display name of the offending document.
        document: String,
        /// Details about the failure.
        reason: String,
    },

    /// The ordering strategy cannot be applied to this many documents.
    #[error("{strategy} ordering requires exactly 2 documents, found {documents}")]
    UnsupportedOrdering {
        /// Requested strategy.
        strategy: OrderingStrategy,
        /// Number of documents in the request.
        documents: usize,
    },

    /// The output name cannot be used.
    #[error("Invalid output name '{name}': {reason}")]
    InvalidOutputName {
        /// Name as supplied by the caller.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// The session was asked to move between two states that are not linked.
    #[error("Invalid pipeline transition from {from} to {to}")]
    InvalidTransition {
        /// Current state.
        from: PipelineState,
        /// Requested state.
        to: PipelineState,
    },

    /// Failed to write the output artifact.
    #[error("Failed to write output file: {}\n  Reason: {source}", path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl PdfPressError {
    /// Create an InsufficientValidInputs error.
    pub fn insufficient_inputs(valid: usize, required: usize) -> Self {
        Self::InsufficientValidInputs { valid, required }
    }

    /// Create a MergeFailed error.
    pub fn merge_failed(document: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MergeFailed {
            document: document.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidOutputName error.
    pub fn invalid_output_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOutputName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if this error aborts the request outright.
    ///
    /// Configuration and state errors are caller mistakes and leave the
    /// session untouched; everything else moves the session to `Failed`.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::InvalidConfig { .. }
                | Self::InvalidOutputName { .. }
                | Self::InvalidTransition { .. }
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InsufficientValidInputs { .. } => 3,
            Self::MergeFailed { .. } => 6,
            Self::UnsupportedOrdering { .. } => 1,
            Self::InvalidOutputName { .. } => 1,
            Self::InvalidConfig { .. } => 1,
            Self::InvalidTransition { .. } => 1,
            Self::FailedToWrite { .. } => 5,
            Self::Io { .. } => 5,
            Self::Other { .. } => 1,
        }
    }
}

/// Failure of the external compression transform.
///
/// None of these abort a merge: the pipeline keeps the uncompressed output
/// and reports `compressed = false`.
#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    /// The compression tool is not installed or cannot be started.
    #[error("Compression tool '{binary}' is unavailable: {reason}")]
    ToolUnavailable {
        /// Binary that was probed.
        binary: String,
        /// Why it could not be used.
        reason: String,
    },

    /// The tool did not finish within the configured timeout.
    #[error("Compression timed out after {}s", after.as_secs())]
    TimedOut {
        /// Timeout that expired.
        after: Duration,
    },

    /// The tool exited with a failure status.
    #[error("Compression tool failed (exit code {})\n  {stderr}", code.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    ToolFailed {
        /// Exit code, if the process exited normally.
        code: Option<i32>,
        /// Trimmed standard error output.
        stderr: String,
    },

    /// The tool reported success but left no usable output.
    #[error("Compression produced an empty file: {}", path.display())]
    EmptyOutput {
        /// Path of the empty output.
        path: PathBuf,
    },

    /// I/O error around the transform.
    #[error("Compression I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },
}

impl CompressionError {
    /// Create a ToolUnavailable error.
    pub fn unavailable(binary: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ToolUnavailable {
            binary: binary.into(),
            reason: reason.into(),
        }
    }

    /// Check if the tool itself is missing, as opposed to a failed run.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::ToolUnavailable { .. } | Self::TimedOut { .. })
    }
}
