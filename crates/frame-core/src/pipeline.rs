//! The per-frame execute cycle
//!
//! Each call to [`FramePipeline::execute`] runs synchronously on the calling
//! thread and walks the stages
//!
//! ```text
//! Start -> ValidatedInput -> ModelReady -> Marshaled -> Inferred -> Written -> Done
//! ```
//!
//! Any failure aborts the remaining stages of that call only. The loaded model
//! and the reusable input buffer survive, and the next call starts fresh.

use crate::context::PipelineContext;
use crate::error::{PipelineError, GENERIC_LOAD_MESSAGE};
use crate::marshal::{from_model_output, TensorMarshaler};
use crate::model::{ModelLoader, OnnxModelLoader};
use crate::model_cache::ModelCache;
use crate::params::ParameterSet;
use crate::reporter::ExecutionState;
use frame_inference_common::{DownloadMode, FrameGeometry, COLOR_CHANNELS};
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use tracing::{trace, warn};

/// Output slot written by a successful cycle (single-buffer design)
pub const OUTPUT_SLOT: usize = 0;

/// Scale applied to model output before it is written to the frame
const OUTPUT_SCALE: f32 = 255.0;

/// A connected input frame
pub trait FrameSource {
    fn geometry(&self) -> FrameGeometry;

    /// Row-major 4-channel u8 pixels, or `None` if the host could not
    /// materialize them in CPU memory
    fn download(&self, mode: DownloadMode) -> Option<&[u8]>;
}

/// Destination frame provided by the host, filled in place
#[derive(Debug)]
pub struct OutputTarget<'a> {
    pub geometry: FrameGeometry,
    pub pixels: &'a mut [f32],
}

impl<'a> OutputTarget<'a> {
    pub fn new(geometry: FrameGeometry, pixels: &'a mut [f32]) -> Self {
        Self { geometry, pixels }
    }
}

/// Stages of the execute cycle, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum CycleStage {
    Start,
    ValidatedInput,
    ModelReady,
    Marshaled,
    Inferred,
    Written,
    Done,
}

/// Result of one execute call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    /// Value of the execute counter after this call
    pub execute_count: u64,

    /// Last stage reached
    pub stage: CycleStage,

    /// Slot written, `None` when the cycle aborted
    pub written_slot: Option<usize>,

    /// Why the cycle aborted
    pub error: Option<PipelineError>,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Frame-by-frame inference pipeline
///
/// Owns exactly one model cache and one reusable input buffer. Not
/// internally synchronized: use one pipeline per thread.
pub struct FramePipeline {
    params: ParameterSet,
    cache: ModelCache,
    marshaler: TensorMarshaler,
    state: ExecutionState,
}

impl FramePipeline {
    /// Create a pipeline that loads ONNX models on the context's device
    pub fn new(context: PipelineContext) -> Self {
        Self::with_loader(Box::new(OnnxModelLoader::new(context)))
    }

    /// Create a pipeline with a custom model loader
    pub fn with_loader(loader: Box<dyn ModelLoader>) -> Self {
        Self {
            params: ParameterSet::default(),
            cache: ModelCache::new(loader),
            marshaler: TensorMarshaler::new(),
            state: ExecutionState::new(),
        }
    }

    /// Replace the configured parameters; takes effect on the next execute
    pub fn set_params(&mut self, params: ParameterSet) {
        self.params = params;
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    pub fn model_cache(&self) -> &ModelCache {
        &self.cache
    }

    pub fn marshaler(&self) -> &TensorMarshaler {
        &self.marshaler
    }

    /// Run one execute cycle
    ///
    /// Errors are recorded in [`ExecutionState`] and returned in the report;
    /// they never propagate as panics.
    pub fn execute(
        &mut self,
        input: Option<&dyn FrameSource>,
        output: &mut OutputTarget<'_>,
    ) -> ExecutionReport {
        self.state.begin();
        let mut stage = CycleStage::Start;
        trace!("execute #{}: {:?}", self.state.execute_count(), stage);

        let result = self.run_cycle(input, output, &mut stage);

        let (written_slot, error) = match result {
            Ok(slot) => (Some(slot), None),
            Err(e) => {
                warn!(
                    "execute #{} aborted after {:?}: {}",
                    self.state.execute_count(),
                    stage,
                    e
                );
                self.state.fail(e.clone());
                (None, Some(e))
            }
        };

        ExecutionReport {
            execute_count: self.state.execute_count(),
            stage,
            written_slot,
            error,
        }
    }

    fn run_cycle(
        &mut self,
        input: Option<&dyn FrameSource>,
        output: &mut OutputTarget<'_>,
        stage: &mut CycleStage,
    ) -> Result<usize, PipelineError> {
        let count = self.state.execute_count();
        let advance = |stage: &mut CycleStage, next: CycleStage| {
            trace!("execute #{}: {:?}", count, next);
            *stage = next;
        };

        let input = input.ok_or(PipelineError::MissingInput)?;
        let pixels = input
            .download(self.params.image_download)
            .ok_or(PipelineError::MissingInput)?;
        advance(stage, CycleStage::ValidatedInput);

        self.cache.ensure_loaded(&self.params.model_file)?;
        let loaded = self.cache.loaded_mut().ok_or_else(|| {
            PipelineError::ModelLoadFailure(GENERIC_LOAD_MESSAGE.to_string())
        })?;
        advance(stage, CycleStage::ModelReady);

        let geometry = output.geometry;
        if input.geometry() != geometry {
            return Err(PipelineError::ExecutionFailure(format!(
                "input frame {} does not match output frame {}",
                input.geometry(),
                geometry
            )));
        }
        geometry
            .check_buffer_len(output.pixels.len())
            .map_err(|e| PipelineError::ExecutionFailure(e.to_string()))?;
        let model_input = self.marshaler.to_model_input(pixels, geometry)?;
        advance(stage, CycleStage::Marshaled);

        let model = loaded.model_mut();
        let mut result = panic::catch_unwind(AssertUnwindSafe(|| model.forward(model_input)))
            .map_err(|_| PipelineError::ExecutionFailure("model forward pass panicked".to_string()))?
            .map_err(|e| PipelineError::ExecutionFailure(e.to_string()))?;
        result.mapv_inplace(|v| v / OUTPUT_SCALE);

        let expected = [
            1,
            COLOR_CHANNELS,
            geometry.height as usize,
            geometry.width as usize,
        ];
        if result.shape() != expected {
            return Err(PipelineError::ExecutionFailure(format!(
                "model output shape {:?} does not match expected {:?}",
                result.shape(),
                expected
            )));
        }
        advance(stage, CycleStage::Inferred);

        from_model_output(result.view(), output.pixels, geometry.width, geometry.height);
        advance(stage, CycleStage::Written);

        advance(stage, CycleStage::Done);
        Ok(OUTPUT_SLOT)
    }

    /// Free the loaded model and the reusable input buffer
    pub fn release(&mut self) {
        self.cache.clear();
        self.marshaler.release();
    }
}
