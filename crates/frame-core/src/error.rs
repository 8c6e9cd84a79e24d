//! Error types for the frame pipeline

use frame_inference_common::ProcessingError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shown when the configured model path is empty
pub const BLANK_PATH_MESSAGE: &str = "The requested model file path is blank.";

/// Shown when no input is connected or its pixels cannot be downloaded
pub const MISSING_INPUT_MESSAGE: &str = "You must connect an input TOP.";

/// Fallback diagnostic when a loader fails without a message
pub const GENERIC_LOAD_MESSAGE: &str = "error loading the model";

/// Failure of [`ModelCache::ensure_loaded`](crate::ModelCache::ensure_loaded)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("The requested model file path is blank.")]
    BlankPath,

    #[error("{0}")]
    LoadFailure(String),
}

/// Failure while converting between pixel buffers and tensors
#[derive(Error, Debug)]
pub enum MarshalError {
    #[error("Frame geometry {width}x{height} is empty")]
    EmptyGeometry { width: u32, height: u32 },

    #[error(transparent)]
    Buffer(#[from] ProcessingError),

    #[error("Tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Reasons an execute cycle aborts
///
/// Every variant is recoverable: it ends the current invocation only.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineError {
    #[error("The requested model file path is blank.")]
    BlankModelPath,

    #[error("{0}")]
    ModelLoadFailure(String),

    #[error("You must connect an input TOP.")]
    MissingInput,

    #[error("{0}")]
    ExecutionFailure(String),
}

impl PipelineError {
    /// Machine-distinguishable code for this error
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            PipelineError::BlankModelPath => ErrorCode::BlankPath,
            PipelineError::ModelLoadFailure(_) => ErrorCode::LoadFailure,
            PipelineError::MissingInput => ErrorCode::MissingInput,
            PipelineError::ExecutionFailure(_) => ErrorCode::ExecutionFailure,
        }
    }
}

impl From<LoadError> for PipelineError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::BlankPath => PipelineError::BlankModelPath,
            LoadError::LoadFailure(message) => PipelineError::ModelLoadFailure(message),
        }
    }
}

impl From<MarshalError> for PipelineError {
    fn from(err: MarshalError) -> Self {
        PipelineError::ExecutionFailure(err.to_string())
    }
}

/// Integer error codes exposed to the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ErrorCode {
    #[default]
    None = 0,
    BlankPath = 1,
    LoadFailure = 2,
    MissingInput = 3,
    ExecutionFailure = 4,
}

impl ErrorCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
