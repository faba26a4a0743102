//! Integration tests for ordering and assembly.

use pdfpress::config::{CompressionSettings, OrderingStrategy};
use pdfpress::io::DocumentHandle;
use pdfpress::pipeline::{PipelineState, Session};
use pdfpress::PdfPressError;
use tempfile::TempDir;

use crate::common::{
    ToolMode, config, fake_pipeline, handle, handle_with_declared_size, page_labels, pdf_bytes,
};

async fn merge_once(strategy: OrderingStrategy, documents: Vec<DocumentHandle>) -> Vec<u8> {
    let root = TempDir::new().unwrap();
    let (pipeline, _) = fake_pipeline(config(&root, CompressionSettings::disabled()), ToolMode::Missing);
    let mut session = Session::new();
    pipeline.ingest(&mut session, documents).await.unwrap();

    let output = pipeline.merge(&mut session, "out", strategy).await.unwrap();
    output.artifact.read().await.unwrap()
}

#[tokio::test]
async fn test_sequential_merge_is_byte_identical() {
    let documents = || vec![handle("a.pdf", "A", 2), handle("b.pdf", "B", 1), handle("c.pdf", "C", 2)];

    let first = merge_once(OrderingStrategy::Sequential, documents()).await;
    let second = merge_once(OrderingStrategy::Sequential, documents()).await;

    assert_eq!(first, second);
    assert_eq!(
        page_labels(&first),
        vec!["A page 1", "A page 2", "B page 1", "C page 1", "C page 2"]
    );
}

#[tokio::test]
async fn test_alternating_two_page_documents() {
    let bytes = merge_once(
        OrderingStrategy::Alternating,
        vec![handle("a.pdf", "A", 2), handle("b.pdf", "B", 2)],
    )
    .await;

    assert_eq!(page_labels(&bytes), vec!["A page 1", "B page 1", "A page 2", "B page 2"]);
}

#[tokio::test]
async fn test_alternating_appends_longer_document() {
    let bytes = merge_once(
        OrderingStrategy::Alternating,
        vec![handle("a.pdf", "A", 1), handle("b.pdf", "B", 3)],
    )
    .await;

    assert_eq!(
        page_labels(&bytes),
        vec!["A page 1", "B page 1", "B page 2", "B page 3"]
    );
}

#[tokio::test]
async fn test_original_size_sums_declared_sizes() {
    let root = TempDir::new().unwrap();
    let (pipeline, _) = fake_pipeline(config(&root, CompressionSettings::disabled()), ToolMode::Missing);
    let mut session = Session::new();
    pipeline
        .ingest(
            &mut session,
            vec![
                handle_with_declared_size("a.pdf", 1, 100 * 1024),
                handle_with_declared_size("b.pdf", 2, 200 * 1024),
                handle_with_declared_size("c.pdf", 1, 50 * 1024),
            ],
        )
        .await
        .unwrap();

    let output = pipeline
        .merge(&mut session, "sized", OrderingStrategy::Sequential)
        .await
        .unwrap();

    assert_eq!(output.report.original_size, 350 * 1024);
    assert!(!output.report.compressed);
    assert_eq!(output.report.reduction_percent, 0.0);
    assert_eq!(output.report.files_merged, 3);
    assert_eq!(output.report.page_count, 4);
}

#[tokio::test]
async fn test_single_valid_document_never_reaches_merge() {
    let root = TempDir::new().unwrap();
    let (pipeline, tool) = fake_pipeline(config(&root, CompressionSettings::default()), ToolMode::Halve);
    let mut session = Session::new();
    pipeline
        .ingest(
            &mut session,
            vec![
                handle("only.pdf", "O", 2),
                DocumentHandle::from_bytes("empty.pdf", Vec::new()),
            ],
        )
        .await
        .unwrap();

    let err = pipeline
        .merge(&mut session, "out", OrderingStrategy::Sequential)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PdfPressError::InsufficientValidInputs { valid: 1, required: 2 }
    ));
    assert_eq!(err.exit_code(), 3);
    assert_eq!(session.state(), PipelineState::Failed);
    assert_eq!(tool.probes(), 0);
    assert_eq!(tool.runs(), 0);
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_vanished_source_fails_merge_with_its_name() {
    let root = TempDir::new().unwrap();
    let inputs = TempDir::new().unwrap();
    let first = inputs.path().join("first.pdf");
    let second = inputs.path().join("second.pdf");
    std::fs::write(&first, pdf_bytes("F", 1)).unwrap();
    std::fs::write(&second, pdf_bytes("S", 1)).unwrap();

    let (pipeline, _) = fake_pipeline(config(&root, CompressionSettings::disabled()), ToolMode::Missing);
    let mut session = Session::new();
    pipeline
        .ingest(
            &mut session,
            vec![
                DocumentHandle::from_path(&first).await.unwrap(),
                DocumentHandle::from_path(&second).await.unwrap(),
            ],
        )
        .await
        .unwrap();
    assert!(session.summary().ready_to_merge);

    std::fs::remove_file(&second).unwrap();

    let err = pipeline
        .merge(&mut session, "out", OrderingStrategy::Sequential)
        .await
        .unwrap_err();

    assert!(matches!(err, PdfPressError::MergeFailed { ref document, .. } if document == "second.pdf"));
    assert_eq!(session.state(), PipelineState::Failed);
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_alternating_rejects_three_documents() {
    let root = TempDir::new().unwrap();
    let (pipeline, _) = fake_pipeline(config(&root, CompressionSettings::disabled()), ToolMode::Missing);
    let mut session = Session::new();
    pipeline
        .ingest(
            &mut session,
            vec![handle("a.pdf", "A", 1), handle("b.pdf", "B", 1), handle("c.pdf", "C", 1)],
        )
        .await
        .unwrap();

    let err = pipeline
        .merge(&mut session, "out", OrderingStrategy::Alternating)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PdfPressError::UnsupportedOrdering {
            strategy: OrderingStrategy::Alternating,
            documents: 3
        }
    ));
}
