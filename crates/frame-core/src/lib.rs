//! Frame Inference Core - per-frame image-to-image neural inference
//!
//! Converts each incoming 4-channel video frame into a tensor, runs it through
//! a serialized model, and writes the result back into an RGBA float frame.
//!
//! # Example
//! ```no_run
//! use frame_inference_core::{FramePipeline, OutputTarget, OwnedFrame, ParameterSet, PipelineContext};
//! use frame_inference_common::{DownloadMode, FrameGeometry};
//!
//! let mut pipeline = FramePipeline::new(PipelineContext::default());
//! pipeline.set_params(ParameterSet::new("models/udnie.onnx", DownloadMode::Instant));
//!
//! let geometry = FrameGeometry::new(1280, 720);
//! let frame = OwnedFrame::filled(geometry, 128);
//! let mut pixels = vec![0.0f32; geometry.sample_count()];
//!
//! let report = pipeline.execute(Some(&frame), &mut OutputTarget::new(geometry, &mut pixels));
//! if let Some(err) = report.error {
//!     eprintln!("error {}: {}", err.code().as_i32(), err);
//! }
//! ```

pub mod background;
pub mod context;
pub mod error;
pub mod frame;
pub mod host;
pub mod image_io;
pub mod info;
pub mod marshal;
pub mod model;
pub mod model_cache;
pub mod onnx_utils;
pub mod params;
pub mod pipeline;
pub mod reporter;

pub use background::{BackgroundPipeline, CompletedFrame, FrameJob, SubmitError};
pub use context::{ExecutionDevice, PipelineContext};
pub use error::{ErrorCode, LoadError, MarshalError, PipelineError};
pub use frame::OwnedFrame;
pub use host::{operator_descriptor, FrameOperator};
pub use info::{GeneralInfo, InfoChannel, InfoTable, OperatorDescriptor};
pub use marshal::{from_model_output, ReusableInputBuffer, TensorMarshaler};
pub use model::{InferenceModel, ModelError, ModelLoader, OnnxModel, OnnxModelLoader};
pub use model_cache::{LoadedModel, ModelCache};
pub use params::{parameter_definitions, ParameterDefinition, ParameterKind, ParameterSet};
pub use pipeline::{
    CycleStage, ExecutionReport, FramePipeline, FrameSource, OutputTarget, OUTPUT_SLOT,
};
pub use reporter::ExecutionState;
