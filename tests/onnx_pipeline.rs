//! ONNX pipeline tests - drive the execute cycle with the real ONNX loader
//!
//! The default tests need no model on disk and exercise the load-failure
//! paths. The ignored test runs a real image-to-image model:
//!
//! Run: FRAME_INFERENCE_TEST_MODEL=models/udnie.onnx FRAME_INFERENCE_THREADS=2 \
//!      cargo test --release --test onnx_pipeline -- --ignored

use frame_inference_common::{DownloadMode, FrameGeometry};
use frame_inference_core::{
    ErrorCode, FrameOperator, FramePipeline, OutputTarget, OwnedFrame, ParameterSet,
    PipelineContext, PipelineError, OUTPUT_SLOT,
};
use std::env;
use std::io::Write;
use std::time::Instant;

fn cpu_pipeline(model_file: &str) -> FramePipeline {
    let mut pipeline = FramePipeline::new(PipelineContext::cpu());
    pipeline.configure(ParameterSet::new(model_file, DownloadMode::Instant));
    pipeline
}

#[test]
fn test_missing_model_file_is_load_failure() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does_not_exist.onnx");
    let mut pipeline = cpu_pipeline(missing.to_str().unwrap());

    let geometry = FrameGeometry::new(8, 8);
    let frame = OwnedFrame::filled(geometry, 100);
    let mut pixels = vec![-1.0f32; geometry.sample_count()];
    let report = pipeline.execute(Some(&frame), &mut OutputTarget::new(geometry, &mut pixels));

    assert!(matches!(report.error, Some(PipelineError::ModelLoadFailure(_))));
    assert_eq!(pipeline.state().error_code(), ErrorCode::LoadFailure);
    assert!(!pipeline.report_error().is_empty());
    assert!(!pipeline.model_cache().is_loaded());
    assert!(pixels.iter().all(|&v| v == -1.0));
}

#[test]
fn test_malformed_model_file_is_load_failure() -> anyhow::Result<()> {
    let mut file = tempfile::Builder::new().suffix(".onnx").tempfile()?;
    file.write_all(b"this is not a protobuf graph")?;
    let path = file.path().to_string_lossy().into_owned();
    let mut pipeline = cpu_pipeline(&path);

    let geometry = FrameGeometry::new(4, 4);
    let frame = OwnedFrame::filled(geometry, 100);
    let mut pixels = vec![0.0f32; geometry.sample_count()];
    let report = pipeline.execute(Some(&frame), &mut OutputTarget::new(geometry, &mut pixels));

    assert_eq!(report.error.map(|e| e.code()), Some(ErrorCode::LoadFailure));
    assert_eq!(pipeline.state().execute_count(), 1);

    // A second execute retries the load and fails the same way
    let report = pipeline.execute(Some(&frame), &mut OutputTarget::new(geometry, &mut pixels));
    assert_eq!(report.error.map(|e| e.code()), Some(ErrorCode::LoadFailure));
    assert_eq!(pipeline.state().execute_count(), 2);
    Ok(())
}

#[test]
fn test_missing_input_checked_before_model_load() {
    let mut pipeline = cpu_pipeline("/nonexistent/model.onnx");
    let geometry = FrameGeometry::new(4, 4);
    let mut pixels = vec![0.0f32; geometry.sample_count()];

    let report = pipeline.execute(None, &mut OutputTarget::new(geometry, &mut pixels));

    assert_eq!(report.error, Some(PipelineError::MissingInput));
    assert_eq!(pipeline.report_error(), "You must connect an input TOP.");
}

#[test]
#[ignore]
fn test_real_model_produces_opaque_frame() {
    let Ok(model_file) = env::var("FRAME_INFERENCE_TEST_MODEL") else {
        eprintln!("FRAME_INFERENCE_TEST_MODEL not set, skipping");
        return;
    };
    let mut pipeline = cpu_pipeline(&model_file);

    let geometry = FrameGeometry::new(224, 224);
    let frame = OwnedFrame::filled(geometry, 128);
    let mut pixels = vec![-1.0f32; geometry.sample_count()];

    let start = Instant::now();
    let report = pipeline.execute(Some(&frame), &mut OutputTarget::new(geometry, &mut pixels));
    println!("first execute: {:.3}s", start.elapsed().as_secs_f64());

    assert!(report.is_success(), "execute failed: {:?}", report.error);
    assert_eq!(report.written_slot, Some(OUTPUT_SLOT));
    assert!(pixels.chunks_exact(4).all(|p| p[3] == 1.0));
    assert!(pixels.iter().all(|v| v.is_finite()));

    let start = Instant::now();
    let report = pipeline.execute(Some(&frame), &mut OutputTarget::new(geometry, &mut pixels));
    println!("cached execute: {:.3}s", start.elapsed().as_secs_f64());
    assert!(report.is_success());
    assert_eq!(pipeline.marshaler().allocations(), 1);
}
