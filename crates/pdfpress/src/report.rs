//! Size accounting for finished merges.
//!
//! [`SizeAccountant::account`] turns the byte sizes measured around the
//! compression step into a [`MergeReport`].

use serde::Serialize;

use crate::config::QualityTier;
use crate::utils::format_file_size;

/// Metrics for one completed merge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    /// Aggregate declared size of the merged inputs, in bytes.
    pub original_size: u64,

    /// Size of the final artifact, in bytes.
    pub final_size: u64,

    /// `(original - final) / original * 100` when compressed, else 0.
    ///
    /// Negative when a compressed result ended up larger than the inputs.
    pub reduction_percent: f64,

    /// Whether the compressed file replaced the merged output.
    pub compressed: bool,

    /// Whether compression was tried at all.
    pub compression_attempted: bool,

    /// Tier requested for compression, if it was enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<QualityTier>,

    /// Number of documents merged.
    pub files_merged: usize,

    /// Number of pages in the artifact.
    pub page_count: usize,
}

impl MergeReport {
    /// Record the merged inputs.
    pub fn with_inputs(mut self, files_merged: usize, page_count: usize) -> Self {
        self.files_merged = files_merged;
        self.page_count = page_count;
        self
    }

    /// Record the requested compression tier.
    pub fn with_tier(mut self, tier: Option<QualityTier>) -> Self {
        self.tier = tier;
        self
    }

    /// Bytes saved; negative when the output grew.
    pub fn bytes_saved(&self) -> i64 {
        self.original_size as i64 - self.final_size as i64
    }

    /// Original size formatted for display.
    pub fn format_original_size(&self) -> String {
        format_file_size(self.original_size)
    }

    /// Final size formatted for display.
    pub fn format_final_size(&self) -> String {
        format_file_size(self.final_size)
    }

    /// Reduction formatted with one decimal, e.g. `"42.5%"`.
    pub fn format_reduction(&self) -> String {
        format!("{:.1}%", self.reduction_percent)
    }
}

/// Computes merge metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeAccountant;

impl SizeAccountant {
    /// Build a report from measured sizes.
    ///
    /// The reduction is only computed when compression succeeded and the
    /// original size is non-zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdfpress::report::SizeAccountant;
    ///
    /// let report = SizeAccountant::account(1000, 250, true, true);
    /// assert_eq!(report.reduction_percent, 75.0);
    ///
    /// let report = SizeAccountant::account(1000, 1000, true, false);
    /// assert_eq!(report.reduction_percent, 0.0);
    /// ```
    pub fn account(original: u64, final_size: u64, attempted: bool, successful: bool) -> MergeReport {
        let reduction_percent = if successful && original > 0 {
            (original as f64 - final_size as f64) / original as f64 * 100.0
        } else {
            0.0
        };

        MergeReport {
            original_size: original,
            final_size,
            reduction_percent,
            compressed: successful,
            compression_attempted: attempted,
            tier: None,
            files_merged: 0,
            page_count: 0,
        }
    }
}
