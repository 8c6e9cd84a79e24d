//! Host-facing operator interface
//!
//! A host drives the operator once per output frame: it pushes parameter
//! values with `configure`, asks for the output size, calls `execute`, then
//! reads the error string and info surfaces.

use crate::info::{self, GeneralInfo, InfoChannel, InfoTable, OperatorDescriptor};
use crate::params::ParameterSet;
use crate::pipeline::{ExecutionReport, FramePipeline, FrameSource, OutputTarget};
use frame_inference_common::FrameGeometry;

/// Lifecycle calls a host makes on a frame operator
pub trait FrameOperator {
    /// Apply the host's current parameter values
    fn configure(&mut self, params: ParameterSet);

    /// Output size for the given input; `None` when no input is connected
    fn output_format(&self, input: Option<&dyn FrameSource>) -> Option<FrameGeometry>;

    /// Produce one output frame
    fn execute(
        &mut self,
        input: Option<&dyn FrameSource>,
        output: &mut OutputTarget<'_>,
    ) -> ExecutionReport;

    /// Error string for the most recent execute; empty when it succeeded
    fn report_error(&self) -> String;

    /// Warning string; this operator never warns
    fn report_warning(&self) -> String {
        String::new()
    }

    fn general_info(&self) -> GeneralInfo {
        GeneralInfo::default()
    }

    fn info_channels(&self) -> Vec<InfoChannel>;

    fn info_table(&self) -> InfoTable;
}

impl FrameOperator for FramePipeline {
    fn configure(&mut self, params: ParameterSet) {
        self.set_params(params);
    }

    fn output_format(&self, input: Option<&dyn FrameSource>) -> Option<FrameGeometry> {
        input.map(|source| source.geometry())
    }

    fn execute(
        &mut self,
        input: Option<&dyn FrameSource>,
        output: &mut OutputTarget<'_>,
    ) -> ExecutionReport {
        FramePipeline::execute(self, input, output)
    }

    fn report_error(&self) -> String {
        self.state().error_message()
    }

    fn info_channels(&self) -> Vec<InfoChannel> {
        info::info_channels(self.state())
    }

    fn info_table(&self) -> InfoTable {
        info::info_table(self.state())
    }
}

/// Descriptor a host registers this operator under
pub fn operator_descriptor() -> OperatorDescriptor {
    OperatorDescriptor::frame_inference()
}
