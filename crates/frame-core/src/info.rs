//! Operator descriptor and read-only info surfaces for the host

use crate::reporter::ExecutionState;
use serde::Serialize;

/// Name of the execute counter channel and table row
pub const EXECUTE_COUNT: &str = "executeCount";

/// Pixel layout of the output frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutputPixelFormat {
    /// Four 32-bit float channels per pixel
    Rgba32Float,
}

/// Static description of the operator for host registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorDescriptor {
    /// Unique type name: capital first letter, then lowercase letters or digits
    pub op_type: &'static str,
    pub label: &'static str,
    /// Three-letter icon
    pub icon: &'static str,
    pub author_name: &'static str,
    pub min_inputs: u32,
    pub max_inputs: u32,
}

impl OperatorDescriptor {
    pub const fn frame_inference() -> Self {
        Self {
            op_type: "Frameinference",
            label: "Frame Inference",
            icon: "FIN",
            author_name: "Frame Inference Team",
            min_inputs: 1,
            max_inputs: 1,
        }
    }
}

/// Per-instance behavior the host queries before cooking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GeneralInfo {
    /// Cook only when inputs or parameters change
    pub cook_every_frame: bool,
    pub pixel_format: OutputPixelFormat,
}

impl Default for GeneralInfo {
    fn default() -> Self {
        Self {
            cook_every_frame: false,
            pixel_format: OutputPixelFormat::Rgba32Float,
        }
    }
}

/// One named numeric channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoChannel {
    pub name: String,
    pub value: f32,
}

/// Small string table, filled row by row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoTable {
    pub rows: usize,
    pub cols: usize,
    pub by_column: bool,
    pub entries: Vec<Vec<String>>,
}

/// Channels exported to an attached info channel reader
pub fn info_channels(state: &ExecutionState) -> Vec<InfoChannel> {
    vec![InfoChannel {
        name: EXECUTE_COUNT.to_string(),
        value: state.execute_count() as f32,
    }]
}

/// One row, two columns: the execute counter name and value
pub fn info_table(state: &ExecutionState) -> InfoTable {
    InfoTable {
        rows: 1,
        cols: 2,
        by_column: false,
        entries: vec![vec![
            EXECUTE_COUNT.to_string(),
            state.execute_count().to_string(),
        ]],
    }
}
