//! Execution context resolved once when a pipeline is created

use serde::{Deserialize, Serialize};

/// Environment variable overriding the ONNX Runtime intra-op thread count
pub const THREADS_ENV: &str = "FRAME_INFERENCE_THREADS";

/// Device the model runs on
///
/// Chosen at pipeline creation. Changing it requires a new pipeline; sessions
/// are never migrated between devices at runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionDevice {
    /// CoreML (macOS), then CUDA, then CPU
    #[default]
    Auto,

    /// CPU execution provider only
    Cpu,

    /// CUDA with CPU fallback for unsupported nodes
    Cuda,
}

impl std::str::FromStr for ExecutionDevice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ExecutionDevice::Auto),
            "cpu" => Ok(ExecutionDevice::Cpu),
            "cuda" => Ok(ExecutionDevice::Cuda),
            other => Err(format!("unknown execution device: {other}")),
        }
    }
}

/// Context passed to the model loader
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineContext {
    /// Execution device
    pub device: ExecutionDevice,

    /// Intra-op threads (None = environment override or physical cores)
    pub intra_threads: Option<usize>,
}

impl PipelineContext {
    /// Create a CPU-only context
    pub fn cpu() -> Self {
        Self {
            device: ExecutionDevice::Cpu,
            intra_threads: None,
        }
    }

    /// Create a context for the given device
    pub fn new(device: ExecutionDevice) -> Self {
        Self {
            device,
            intra_threads: None,
        }
    }

    /// Resolve the intra-op thread count
    pub fn resolved_threads(&self) -> usize {
        self.intra_threads
            .or_else(|| {
                std::env::var(THREADS_ENV)
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
            })
            .filter(|&n| n > 0)
            .unwrap_or_else(num_cpus::get_physical)
    }
}
