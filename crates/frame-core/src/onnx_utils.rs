//! ONNX Runtime utilities for model session creation
//!
//! This module creates ONNX Runtime sessions for the frame pipeline with graph
//! optimizations and the execution providers selected by the
//! [`PipelineContext`]. Providers are fixed for the lifetime of a session.

use crate::context::{ExecutionDevice, PipelineContext};
use ort::execution_providers::{
    CPUExecutionProvider, CUDAExecutionProvider, CoreMLExecutionProvider,
    ExecutionProviderDispatch,
};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};

/// Error type for ONNX operations
#[derive(Debug, thiserror::Error)]
pub enum OnnxError {
    #[error("Failed to create session builder: {0}")]
    SessionBuilderError(String),

    #[error("Failed to load ONNX model from {path}: {error}")]
    ModelLoadError { path: String, error: String },

    #[error("Model file not found: {0}")]
    ModelNotFound(String),
}

/// Execution providers for a device, in priority order
fn execution_providers(device: ExecutionDevice) -> Vec<ExecutionProviderDispatch> {
    match device {
        ExecutionDevice::Auto => vec![
            CoreMLExecutionProvider::default().with_subgraphs(true).build(),
            CUDAExecutionProvider::default().build(),
            CPUExecutionProvider::default().build(),
        ],
        ExecutionDevice::Cuda => vec![
            CUDAExecutionProvider::default().build(),
            CPUExecutionProvider::default().build(),
        ],
        ExecutionDevice::Cpu => vec![CPUExecutionProvider::default().build()],
    }
}

fn build_session(
    model_path: &Path,
    num_threads: usize,
    providers: Vec<ExecutionProviderDispatch>,
) -> Result<Session, OnnxError> {
    Session::builder()
        .map_err(|e| OnnxError::SessionBuilderError(e.to_string()))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| OnnxError::SessionBuilderError(e.to_string()))?
        .with_intra_threads(num_threads)
        .map_err(|e| OnnxError::SessionBuilderError(e.to_string()))?
        .with_memory_pattern(true)
        .map_err(|e| OnnxError::SessionBuilderError(e.to_string()))?
        .with_execution_providers(providers)
        .map_err(|e| OnnxError::SessionBuilderError(e.to_string()))?
        .commit_from_file(model_path)
        .map_err(|e| OnnxError::ModelLoadError {
            path: model_path.display().to_string(),
            error: e.to_string(),
        })
}

/// Create an ONNX Runtime session for the device in `ctx`
///
/// With [`ExecutionDevice::Auto`], a CoreML compilation failure (unsupported
/// operations) is retried with CUDA and CPU only.
///
/// # Errors
/// Returns [`OnnxError::ModelNotFound`] when the file does not exist and
/// [`OnnxError::ModelLoadError`] when ONNX Runtime rejects it.
pub fn create_session(model_path: &Path, ctx: &PipelineContext) -> Result<Session, OnnxError> {
    if !model_path.exists() {
        return Err(OnnxError::ModelNotFound(model_path.display().to_string()));
    }

    let num_threads = ctx.resolved_threads();
    let start = Instant::now();

    let session = match build_session(model_path, num_threads, execution_providers(ctx.device)) {
        Ok(session) => session,
        Err(OnnxError::ModelLoadError { error, .. })
            if ctx.device == ExecutionDevice::Auto
                && (error.contains("CoreML") || error.contains("MLModel")) =>
        {
            warn!(
                "CoreML failed for {}: {}; retrying with CUDA/CPU only",
                model_path.display(),
                error
            );
            build_session(
                model_path,
                num_threads,
                execution_providers(ExecutionDevice::Cuda),
            )
            .map_err(|e| OnnxError::ModelLoadError {
                path: model_path.display().to_string(),
                error: format!("CoreML failed, CPU/CUDA also failed: {e}"),
            })?
        }
        Err(e) => return Err(e),
    };

    debug!(
        "Session created for {} in {:.3}s ({:?}, {} threads)",
        model_path.display(),
        start.elapsed().as_secs_f64(),
        ctx.device,
        num_threads
    );

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_not_found() {
        let result = create_session(Path::new("nonexistent_model.onnx"), &PipelineContext::cpu());
        assert!(matches!(result.unwrap_err(), OnnxError::ModelNotFound(_)));
    }

    #[test]
    fn test_error_display() {
        let err = OnnxError::ModelNotFound("test.onnx".to_string());
        assert_eq!(err.to_string(), "Model file not found: test.onnx");

        let err = OnnxError::ModelLoadError {
            path: "test.onnx".to_string(),
            error: "invalid format".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to load ONNX model from test.onnx: invalid format"
        );
    }

    #[test]
    fn test_provider_lists() {
        assert_eq!(execution_providers(ExecutionDevice::Cpu).len(), 1);
        assert_eq!(execution_providers(ExecutionDevice::Cuda).len(), 2);
        assert_eq!(execution_providers(ExecutionDevice::Auto).len(), 3);
    }
}
