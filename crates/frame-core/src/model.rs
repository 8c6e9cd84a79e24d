//! Inference model abstraction and the ONNX Runtime implementation
//!
//! The pipeline only sees two seams: a [`ModelLoader`] that deserializes a
//! model file, and the [`InferenceModel`] it returns, a pure function from one
//! `[1, 3, H, W]` tensor to one output tensor.

use crate::context::PipelineContext;
use crate::onnx_utils::{create_session, OnnxError};
use ndarray::{Array4, ArrayView4};
use ort::{session::Session, value::TensorRef};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while loading or running a model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error(transparent)]
    Onnx(#[from] OnnxError),

    #[error("ONNX Runtime error: {0}")]
    OrtError(#[from] ort::Error),

    #[error("Model has no {0} tensors")]
    MissingTensor(&'static str),

    #[error("Invalid model output shape: expected 4 dimensions, got {0:?}")]
    InvalidOutputShape(Vec<i64>),

    #[error("Tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("{0}")]
    Other(String),
}

/// A deserialized inference graph
pub trait InferenceModel: Send {
    /// Run the forward computation on a single input tensor
    fn forward(&mut self, input: ArrayView4<'_, f32>) -> Result<Array4<f32>, ModelError>;
}

/// Deserializes models from files
pub trait ModelLoader: Send {
    fn load(&self, path: &Path) -> Result<Box<dyn InferenceModel>, ModelError>;
}

/// Model backed by an ONNX Runtime session
pub struct OnnxModel {
    session: Session,
    input_name: String,
    output_name: String,
}

impl OnnxModel {
    /// Wrap an existing session, capturing its first input and output names
    pub fn from_session(session: Session) -> Result<Self, ModelError> {
        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or(ModelError::MissingTensor("input"))?;
        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or(ModelError::MissingTensor("output"))?;

        Ok(Self {
            session,
            input_name,
            output_name,
        })
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }
}

impl InferenceModel for OnnxModel {
    fn forward(&mut self, input: ArrayView4<'_, f32>) -> Result<Array4<f32>, ModelError> {
        // ONNX Runtime needs a contiguous buffer; the permuted input is a strided view.
        let input = input.as_standard_layout();
        let input_tensor = TensorRef::from_array_view(input.view())?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])?;

        let (shape, data) = outputs[self.output_name.as_str()].try_extract_tensor::<f32>()?;

        if shape.len() != 4 || shape.iter().any(|&d| d < 0) {
            return Err(ModelError::InvalidOutputShape(shape.to_vec()));
        }
        let dims = (
            shape[0] as usize,
            shape[1] as usize,
            shape[2] as usize,
            shape[3] as usize,
        );

        // Copy out of the runtime's buffer so the result lives in host memory.
        Ok(Array4::from_shape_vec(dims, data.to_vec())?)
    }
}

/// Loads ONNX models with the execution providers of a fixed context
#[derive(Debug, Clone, Default)]
pub struct OnnxModelLoader {
    context: PipelineContext,
}

impl OnnxModelLoader {
    pub fn new(context: PipelineContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }
}

impl ModelLoader for OnnxModelLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn InferenceModel>, ModelError> {
        info!("Loading model from {}", path.display());

        let session = create_session(path, &self.context)?;
        let model = OnnxModel::from_session(session)?;

        debug!(
            "Model loaded (input: {}, output: {})",
            model.input_name(),
            model.output_name()
        );
        Ok(Box::new(model))
    }
}
