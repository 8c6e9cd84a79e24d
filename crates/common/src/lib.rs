/// Common types and utilities for per-frame inference
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Samples per pixel in both the input and output buffers (RGBA-style)
pub const PIXEL_CHANNELS: usize = 4;

/// Color channels consumed and produced by the model
pub const COLOR_CHANNELS: usize = 3;

/// Processing errors shared across the workspace
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Pixel buffer too small: {actual} samples (need {expected})")]
    BufferTooSmall { expected: usize, actual: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Other error: {0}")]
    Other(String),
}

/// Result type for processing operations
pub type Result<T> = std::result::Result<T, ProcessingError>;

/// Width and height of a frame in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
}

impl FrameGeometry {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels in the frame
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Number of samples in a 4-channel buffer of this size
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.pixel_count() * PIXEL_CHANNELS
    }

    /// Bytes per row of a 4-channel u8 buffer
    #[must_use]
    pub fn row_pitch(&self) -> usize {
        self.width as usize * PIXEL_CHANNELS
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check that a buffer holds at least one full frame
    pub fn check_buffer_len(&self, actual: usize) -> Result<()> {
        let expected = self.sample_count();
        if actual < expected {
            return Err(ProcessingError::BufferTooSmall { expected, actual });
        }
        Ok(())
    }
}

impl std::fmt::Display for FrameGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// When the host materializes the input pixel buffer in CPU memory
///
/// `Delayed` lets the host return the previous frame's download to avoid a
/// stall; the pipeline algorithm is identical for both modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DownloadMode {
    #[default]
    Instant,
    Delayed,
}

impl DownloadMode {
    /// Menu entry names in declaration order
    pub const NAMES: [&'static str; 2] = ["Instant", "Delayed"];

    /// Parse a host menu value. Anything other than `Delayed` is `Instant`.
    #[must_use]
    pub fn from_host_str(value: &str) -> Self {
        if value == "Delayed" {
            DownloadMode::Delayed
        } else {
            DownloadMode::Instant
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadMode::Instant => "Instant",
            DownloadMode::Delayed => "Delayed",
        }
    }
}

impl std::fmt::Display for DownloadMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
