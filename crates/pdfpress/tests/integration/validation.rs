//! Integration tests for validation and repair through the pipeline.

use pdfpress::config::CompressionSettings;
use pdfpress::io::DocumentHandle;
use pdfpress::pipeline::{DiagnosticStage, PipelineState, Session};
use pdfpress::validation::{DiagnosticCode, ValidationStatus, Validator};
use tempfile::TempDir;

use crate::common::{ToolMode, config, fake_pipeline, handle, pdf_bytes, with_bad_startxref};

#[tokio::test]
async fn test_every_ingested_document_is_classified() {
    let root = TempDir::new().unwrap();
    let (pipeline, _) = fake_pipeline(config(&root, CompressionSettings::disabled()), ToolMode::Missing);
    let mut session = Session::new();

    let truncated = pdf_bytes("T", 2)[..40].to_vec();
    pipeline
        .ingest(
            &mut session,
            vec![
                handle("a.pdf", "A", 1),
                DocumentHandle::from_bytes("empty.pdf", Vec::new()),
                DocumentHandle::from_bytes("notes.txt", b"just some text".to_vec()),
                DocumentHandle::from_bytes("truncated.pdf", truncated),
                handle("b.pdf", "B", 3),
            ],
        )
        .await
        .unwrap();

    let results: Vec<_> = session
        .documents()
        .iter()
        .map(|doc| doc.validation().unwrap().clone())
        .collect();
    let valid = results.iter().filter(|r| r.is_valid()).count();
    let invalid = results.iter().filter(|r| !r.is_valid()).count();

    assert_eq!(valid + invalid, 5);
    assert_eq!(valid, 2);
    for result in results.iter().filter(|r| !r.is_valid()) {
        assert!(result.code.is_some());
        assert!(!result.message.is_empty());
        assert_eq!(result.page_count, 0);
    }
    for result in results.iter().filter(|r| r.is_valid()) {
        assert!(result.page_count >= 1);
    }

    let truncated = session.document("truncated.pdf").unwrap().validation().unwrap();
    assert_eq!(truncated.code, Some(DiagnosticCode::IncompleteStructure));
}

#[tokio::test]
async fn test_zero_byte_input_is_invalid() {
    let result = Validator::new()
        .validate(&DocumentHandle::from_bytes("empty.pdf", Vec::new()))
        .await;

    assert_eq!(result.status, ValidationStatus::Invalid);
    assert_eq!(result.code, Some(DiagnosticCode::IncompleteStructure));
    assert!(!result.message.is_empty());
}

#[tokio::test]
async fn test_input_without_signature_is_unknown() {
    let result = Validator::new()
        .validate(&DocumentHandle::from_bytes("image.png", b"\x89PNG\r\n\x1a\n....".to_vec()))
        .await;

    assert_eq!(result.code, Some(DiagnosticCode::Unknown));
}

#[tokio::test]
async fn test_repair_moves_document_to_valid_set() {
    let root = TempDir::new().unwrap();
    let (pipeline, _) = fake_pipeline(config(&root, CompressionSettings::disabled()), ToolMode::Missing);
    let mut session = Session::new();

    pipeline
        .ingest(
            &mut session,
            vec![
                handle("a.pdf", "A", 2),
                DocumentHandle::from_bytes("damaged.pdf", with_bad_startxref(&pdf_bytes("D", 2))),
            ],
        )
        .await
        .unwrap();
    assert_eq!(session.summary().valid, 1);

    let output = pipeline
        .merge(&mut session, "out", pdfpress::OrderingStrategy::Sequential)
        .await
        .unwrap();

    assert_eq!(output.report.files_merged, 2);
    assert_eq!(output.report.page_count, 4);

    let damaged = session.document("damaged.pdf").unwrap();
    assert!(damaged.is_valid());
    assert!(damaged.validation().unwrap().page_count >= 1);
    assert_eq!(damaged.history().len(), 1);
    assert_eq!(session.summary().valid, 2);
    assert_eq!(session.state(), PipelineState::Ready);
}

#[tokio::test]
async fn test_unrepairable_document_is_reported_and_excluded() {
    let root = TempDir::new().unwrap();
    let (pipeline, _) = fake_pipeline(config(&root, CompressionSettings::disabled()), ToolMode::Missing);
    let mut session = Session::new();

    pipeline
        .ingest(
            &mut session,
            vec![
                handle("a.pdf", "A", 1),
                handle("b.pdf", "B", 1),
                DocumentHandle::from_bytes("garbage.pdf", b"%PDF-1.4\nnothing here\n".to_vec()),
            ],
        )
        .await
        .unwrap();

    let output = pipeline
        .merge(&mut session, "out", pdfpress::OrderingStrategy::Sequential)
        .await
        .unwrap();

    assert_eq!(output.report.files_merged, 2);
    assert_eq!(output.diagnostics.len(), 1);

    let diagnostic = &output.diagnostics[0];
    assert_eq!(diagnostic.name, "garbage.pdf");
    assert_eq!(diagnostic.stage, DiagnosticStage::Repair);
    assert!(diagnostic.excluded);
    assert!(!diagnostic.message.is_empty());
}
