//! Owned input frames

use crate::pipeline::FrameSource;
use frame_inference_common::{DownloadMode, FrameGeometry, Result};

/// A 4-channel u8 frame that owns its pixels
///
/// Always downloadable, regardless of [`DownloadMode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedFrame {
    geometry: FrameGeometry,
    pixels: Vec<u8>,
}

impl OwnedFrame {
    /// Wrap row-major RGBA samples
    ///
    /// # Errors
    /// Fails when `pixels` holds less than one full frame.
    pub fn new(geometry: FrameGeometry, pixels: Vec<u8>) -> Result<Self> {
        geometry.check_buffer_len(pixels.len())?;
        Ok(Self { geometry, pixels })
    }

    /// Frame with every sample set to `value`
    pub fn filled(geometry: FrameGeometry, value: u8) -> Self {
        Self {
            geometry,
            pixels: vec![value; geometry.sample_count()],
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

impl FrameSource for OwnedFrame {
    fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    fn download(&self, _mode: DownloadMode) -> Option<&[u8]> {
        Some(&self.pixels)
    }
}
