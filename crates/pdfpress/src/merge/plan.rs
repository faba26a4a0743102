//! Page ordering for assembly.
//!
//! The orderer is pure: given the page count of each valid document and an
//! [`OrderingStrategy`], it produces a [`MergePlan`] listing which pages of
//! which document go into the output, in output order.

use serde::Serialize;

use crate::config::OrderingStrategy;
use crate::error::{PdfPressError, Result};

/// A contiguous run of pages from one document.
///
/// Page numbers are 1-based and inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSpan {
    /// Index of the document in the merge batch.
    pub document: usize,
    /// First page of the run.
    pub first: u32,
    /// Last page of the run.
    pub last: u32,
}

impl PageSpan {
    /// A span covering a single page.
    pub fn single(document: usize, page: u32) -> Self {
        Self {
            document,
            first: page,
            last: page,
        }
    }

    /// Number of pages in the span, at least one.
    pub fn page_count(&self) -> usize {
        (self.last - self.first + 1) as usize
    }

    /// Page numbers covered by the span.
    pub fn pages(&self) -> impl Iterator<Item = u32> + use<> {
        self.first..=self.last
    }
}

/// Ordered list of page spans making up the output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergePlan {
    strategy: OrderingStrategy,
    spans: Vec<PageSpan>,
}

impl MergePlan {
    /// Strategy the plan was built with.
    pub fn strategy(&self) -> OrderingStrategy {
        self.strategy
    }

    /// Spans in output order.
    pub fn spans(&self) -> &[PageSpan] {
        &self.spans
    }

    /// Total number of output pages.
    pub fn page_count(&self) -> usize {
        self.spans.iter().map(PageSpan::page_count).sum()
    }

    /// Whether the plan has no pages.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Every `(document, page)` pair in output order.
    pub fn pages(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.spans
            .iter()
            .flat_map(|span| span.pages().map(move |page| (span.document, page)))
    }

    /// Indexes of the documents the plan draws from, ascending.
    pub fn documents(&self) -> Vec<usize> {
        let mut documents: Vec<usize> = self.spans.iter().map(|s| s.document).collect();
        documents.sort_unstable();
        documents.dedup();
        documents
    }
}

/// Computes merge plans.
#[derive(Debug, Clone, Copy, Default)]
pub struct Orderer;

impl Orderer {
    /// Create a new orderer.
    pub fn new() -> Self {
        Self
    }

    /// Build a plan for documents with the given page counts.
    ///
    /// # Errors
    ///
    /// Returns [`PdfPressError::UnsupportedOrdering`] when alternating is
    /// requested for anything other than exactly two documents.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdfpress::config::OrderingStrategy;
    /// use pdfpress::merge::Orderer;
    ///
    /// let plan = Orderer::new().order(&[2, 3], OrderingStrategy::Alternating).unwrap();
    /// let pages: Vec<_> = plan.pages().collect();
    /// assert_eq!(pages, vec![(0, 1), (1, 1), (0, 2), (1, 2), (1, 3)]);
    /// ```
    pub fn order(&self, page_counts: &[usize], strategy: OrderingStrategy) -> Result<MergePlan> {
        let spans = match strategy {
            OrderingStrategy::Sequential => sequential(page_counts),
            OrderingStrategy::Alternating => match page_counts {
                [a, b] => alternating(*a as u32, *b as u32),
                _ => {
                    return Err(PdfPressError::UnsupportedOrdering {
                        strategy,
                        documents: page_counts.len(),
                    });
                }
            },
        };

        Ok(MergePlan { strategy, spans })
    }
}

fn sequential(page_counts: &[usize]) -> Vec<PageSpan> {
    page_counts
        .iter()
        .enumerate()
        .filter(|(_, pages)| **pages > 0)
        .map(|(document, &pages)| PageSpan {
            document,
            first: 1,
            last: pages as u32,
        })
        .collect()
}

fn alternating(a: u32, b: u32) -> Vec<PageSpan> {
    let shared = a.min(b);
    let mut spans = Vec::with_capacity(shared as usize * 2 + 1);

    for page in 1..=shared {
        spans.push(PageSpan::single(0, page));
        spans.push(PageSpan::single(1, page));
    }

    if a > shared {
        spans.push(PageSpan {
            document: 0,
            first: shared + 1,
            last: a,
        });
    } else if b > shared {
        spans.push(PageSpan {
            document: 1,
            first: shared + 1,
            last: b,
        });
    }

    spans
}
