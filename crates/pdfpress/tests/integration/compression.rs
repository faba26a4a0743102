//! Integration tests for compression and its fallbacks.

use pdfpress::compress::Compressor;
use pdfpress::config::{CompressionSettings, OrderingStrategy, QualityTier};
use pdfpress::pipeline::{Pipeline, PipelineState, Session};
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use crate::common::{FakeTool, ToolMode, config, fake_pipeline, handle, page_labels};

#[rstest]
#[case(QualityTier::Low)]
#[case(QualityTier::Medium)]
#[case(QualityTier::High)]
#[case(QualityTier::Maximum)]
#[tokio::test]
async fn test_disabled_compression_reports_no_reduction(#[case] tier: QualityTier) {
    let root = TempDir::new().unwrap();
    let settings = CompressionSettings {
        enabled: false,
        tier,
    };
    let (pipeline, tool) = fake_pipeline(config(&root, settings), ToolMode::Halve);
    let mut session = Session::new();
    pipeline
        .ingest(&mut session, vec![handle("a.pdf", "A", 1), handle("b.pdf", "B", 1)])
        .await
        .unwrap();

    let output = pipeline
        .merge(&mut session, "out", OrderingStrategy::Sequential)
        .await
        .unwrap();

    assert!(!output.report.compressed);
    assert!(!output.report.compression_attempted);
    assert_eq!(output.report.reduction_percent, 0.0);
    assert_eq!(tool.runs(), 0);
}

#[tokio::test]
async fn test_missing_ghostscript_still_ends_ready() {
    let root = TempDir::new().unwrap();
    let mut config = config(&root, CompressionSettings::with_tier(QualityTier::Maximum));
    config.tool.binary = "/nonexistent/pdfpress-test/gs".into();

    let pipeline = Pipeline::new(config).unwrap();
    let mut session = Session::new();
    pipeline
        .ingest(&mut session, vec![handle("a.pdf", "A", 2), handle("b.pdf", "B", 1)])
        .await
        .unwrap();

    let output = pipeline
        .merge(&mut session, "out", OrderingStrategy::Sequential)
        .await
        .unwrap();

    assert!(!output.report.compressed);
    assert_eq!(output.report.reduction_percent, 0.0);
    assert_eq!(output.report.tier, Some(QualityTier::Maximum));
    assert!(output.compression_error.as_deref().unwrap().contains("unavailable"));
    assert_eq!(
        page_labels(&output.artifact.read().await.unwrap()),
        vec!["A page 1", "A page 2", "B page 1"]
    );
    assert_eq!(session.state(), PipelineState::Ready);
}

#[tokio::test]
async fn test_hanging_tool_times_out_and_falls_back() {
    let root = TempDir::new().unwrap();
    let mut config = config(&root, CompressionSettings::with_tier(QualityTier::High));
    config.tool.timeout = Duration::from_millis(200);

    let (pipeline, tool) = fake_pipeline(config, ToolMode::Hang);
    let mut session = Session::new();
    pipeline
        .ingest(&mut session, vec![handle("a.pdf", "A", 1), handle("b.pdf", "B", 1)])
        .await
        .unwrap();

    let output = pipeline
        .merge(&mut session, "out", OrderingStrategy::Sequential)
        .await
        .unwrap();

    assert_eq!(tool.runs(), 1);
    assert!(!output.report.compressed);
    assert!(output.report.compression_attempted);
    assert!(output.compression_error.as_deref().unwrap().contains("timed out"));
    assert_eq!(page_labels(&output.artifact.read().await.unwrap()).len(), 2);
}

#[tokio::test]
async fn test_successful_compression_reports_reduction() {
    let root = TempDir::new().unwrap();
    let (pipeline, tool) = fake_pipeline(
        config(&root, CompressionSettings::with_tier(QualityTier::Low)),
        ToolMode::Halve,
    );
    let mut session = Session::new();
    pipeline
        .ingest(&mut session, vec![handle("a.pdf", "A", 3), handle("b.pdf", "B", 3)])
        .await
        .unwrap();

    let output = pipeline
        .merge(&mut session, "out", OrderingStrategy::Sequential)
        .await
        .unwrap();

    assert_eq!(tool.runs(), 1);
    assert!(output.report.compressed);
    assert!(output.report.final_size < output.report.original_size);
    assert!(output.report.reduction_percent > 0.0);
}

#[tokio::test]
async fn test_probe_cached_across_requests() {
    let root = TempDir::new().unwrap();
    let tool = FakeTool::new(ToolMode::Halve);
    let compressor = Arc::new(Compressor::new(tool.clone(), Duration::from_secs(5)));

    for name in ["first", "second"] {
        let pipeline = Pipeline::with_transform(
            config(&root, CompressionSettings::default()),
            tool.clone(),
        )
        .unwrap()
        .with_compressor(Arc::clone(&compressor));

        let mut session = Session::new();
        pipeline
            .ingest(&mut session, vec![handle("a.pdf", "A", 1), handle("b.pdf", "B", 1)])
            .await
            .unwrap();
        pipeline
            .merge(&mut session, name, OrderingStrategy::Sequential)
            .await
            .unwrap();
    }

    assert_eq!(tool.probes(), 1);
    assert_eq!(tool.runs(), 2);
}

#[tokio::test]
async fn test_failed_probe_is_retried_per_request() {
    let root = TempDir::new().unwrap();
    let (pipeline, tool) = fake_pipeline(config(&root, CompressionSettings::default()), ToolMode::Missing);

    for name in ["first", "second"] {
        let mut session = Session::new();
        pipeline
            .ingest(&mut session, vec![handle("a.pdf", "A", 1), handle("b.pdf", "B", 1)])
            .await
            .unwrap();
        let output = pipeline
            .merge(&mut session, name, OrderingStrategy::Sequential)
            .await
            .unwrap();
        assert!(!output.report.compressed);
    }

    assert_eq!(tool.probes(), 2);
    assert_eq!(tool.runs(), 0);
}
