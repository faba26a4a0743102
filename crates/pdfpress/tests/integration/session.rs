//! Integration tests for the session lifecycle.

use pdfpress::config::{CompressionSettings, OrderingStrategy};
use pdfpress::io::DocumentHandle;
use pdfpress::pipeline::{PipelineState, Session};
use pdfpress::PdfPressError;
use tempfile::TempDir;

use crate::common::{ToolMode, config, fake_pipeline, handle};

#[tokio::test]
async fn test_duplicate_names_are_skipped() {
    let root = TempDir::new().unwrap();
    let (pipeline, _) = fake_pipeline(config(&root, CompressionSettings::disabled()), ToolMode::Missing);
    let mut session = Session::new();

    assert_eq!(
        pipeline
            .ingest(&mut session, vec![handle("a.pdf", "A", 1), handle("a.pdf", "X", 4)])
            .await
            .unwrap(),
        1
    );
    assert_eq!(session.documents().len(), 1);
    assert_eq!(session.document("a.pdf").unwrap().validation().unwrap().page_count, 1);
}

#[tokio::test]
async fn test_summary_tracks_removal() {
    let root = TempDir::new().unwrap();
    let (pipeline, _) = fake_pipeline(config(&root, CompressionSettings::disabled()), ToolMode::Missing);
    let mut session = Session::new();
    pipeline
        .ingest(
            &mut session,
            vec![
                handle("a.pdf", "A", 1),
                handle("b.pdf", "B", 1),
                DocumentHandle::from_bytes("empty.pdf", Vec::new()),
            ],
        )
        .await
        .unwrap();

    let summary = session.summary();
    assert_eq!(summary.files, 3);
    assert_eq!(summary.valid, 2);
    assert!(summary.ready_to_merge);

    assert!(session.remove("b.pdf"));
    let summary = session.summary();
    assert_eq!(summary.files, 2);
    assert_eq!(summary.valid, 1);
    assert!(!summary.ready_to_merge);
}

#[tokio::test]
async fn test_new_merge_after_reset_reuses_validation() {
    let root = TempDir::new().unwrap();
    let (pipeline, _) = fake_pipeline(config(&root, CompressionSettings::disabled()), ToolMode::Missing);
    let mut session = Session::new();
    pipeline
        .ingest(&mut session, vec![handle("a.pdf", "A", 1), handle("b.pdf", "B", 2)])
        .await
        .unwrap();

    let first = pipeline
        .merge(&mut session, "first", OrderingStrategy::Sequential)
        .await
        .unwrap()
        .artifact
        .clone();

    session.reset();
    assert_eq!(session.state(), PipelineState::Idle);
    assert!(first.read().await.is_err());
    assert_eq!(session.summary().valid, 2);

    let second = pipeline
        .merge(&mut session, "second", OrderingStrategy::Alternating)
        .await
        .unwrap();
    assert_eq!(second.report.page_count, 3);
}

#[tokio::test]
async fn test_failed_merge_requires_new_ingestion() {
    let root = TempDir::new().unwrap();
    let (pipeline, _) = fake_pipeline(config(&root, CompressionSettings::disabled()), ToolMode::Missing);
    let mut session = Session::new();
    pipeline
        .ingest(&mut session, vec![handle("a.pdf", "A", 1)])
        .await
        .unwrap();

    pipeline
        .merge(&mut session, "out", OrderingStrategy::Sequential)
        .await
        .unwrap_err();
    assert_eq!(session.state(), PipelineState::Failed);

    let err = pipeline
        .merge(&mut session, "out", OrderingStrategy::Sequential)
        .await
        .unwrap_err();
    assert!(matches!(err, PdfPressError::InvalidTransition { .. }));

    pipeline
        .ingest(&mut session, vec![handle("b.pdf", "B", 1)])
        .await
        .unwrap();
    let output = pipeline
        .merge(&mut session, "out", OrderingStrategy::Sequential)
        .await
        .unwrap();
    assert_eq!(output.report.files_merged, 2);
}

#[tokio::test]
async fn test_clear_discards_everything() {
    let root = TempDir::new().unwrap();
    let (pipeline, _) = fake_pipeline(config(&root, CompressionSettings::disabled()), ToolMode::Missing);
    let mut session = Session::new();
    pipeline
        .ingest(&mut session, vec![handle("a.pdf", "A", 1), handle("b.pdf", "B", 1)])
        .await
        .unwrap();
    pipeline
        .merge(&mut session, "out", OrderingStrategy::Sequential)
        .await
        .unwrap();

    session.clear();

    assert_eq!(session.state(), PipelineState::Idle);
    assert!(session.documents().is_empty());
    assert!(session.output().is_none());
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}
