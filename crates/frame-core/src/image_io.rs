//! Image file I/O for driving the pipeline from still images
//!
//! Frames are read as RGBA8 and written back from the pipeline's RGBA f32
//! output, clamped to `[0, 1]` and quantized to 8 bits.

use crate::frame::OwnedFrame;
use frame_inference_common::{FrameGeometry, PIXEL_CHANNELS};
use image::RgbaImage;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during image I/O operations
#[derive(Error, Debug)]
pub enum ImageIoError {
    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Failed to encode image: {0}")]
    EncodeError(String),

    #[error("Pixel buffer holds {actual} samples, {geometry} RGBA needs {expected}")]
    SizeMismatch {
        geometry: FrameGeometry,
        expected: usize,
        actual: usize,
    },
}

/// Load an image file as an RGBA8 frame
pub fn load_frame<P: AsRef<Path>>(path: P) -> Result<OwnedFrame, ImageIoError> {
    let img = image::open(path.as_ref())
        .map_err(|e| ImageIoError::DecodeError(format!("{}: {e}", path.as_ref().display())))?
        .to_rgba8();

    let geometry = FrameGeometry::new(img.width(), img.height());
    OwnedFrame::new(geometry, img.into_raw()).map_err(|e| ImageIoError::DecodeError(e.to_string()))
}

/// Quantize an RGBA f32 frame in `[0, 1]` to RGBA8
pub fn to_rgba8(geometry: FrameGeometry, pixels: &[f32]) -> Result<RgbaImage, ImageIoError> {
    let expected = geometry.pixel_count() * PIXEL_CHANNELS;
    if pixels.len() < expected {
        return Err(ImageIoError::SizeMismatch {
            geometry,
            expected,
            actual: pixels.len(),
        });
    }

    let raw: Vec<u8> = pixels[..expected]
        .iter()
        .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();

    RgbaImage::from_raw(geometry.width, geometry.height, raw).ok_or(ImageIoError::SizeMismatch {
        geometry,
        expected,
        actual: pixels.len(),
    })
}

/// Save an RGBA f32 frame; format follows the file extension
pub fn save_frame<P: AsRef<Path>>(
    path: P,
    geometry: FrameGeometry,
    pixels: &[f32],
) -> Result<(), ImageIoError> {
    to_rgba8(geometry, pixels)?
        .save(path.as_ref())
        .map_err(|e| ImageIoError::EncodeError(format!("{}: {e}", path.as_ref().display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::FrameSource;
    use frame_inference_common::DownloadMode;

    #[test]
    fn test_quantize_clamps() {
        let geometry = FrameGeometry::new(1, 1);
        let img = to_rgba8(geometry, &[-0.5, 0.5, 2.0, 1.0]).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [0, 128, 255, 255]);
    }

    #[test]
    fn test_short_buffer_rejected() {
        let err = to_rgba8(FrameGeometry::new(2, 2), &[0.0; 4]).unwrap_err();
        assert!(matches!(err, ImageIoError::SizeMismatch { expected: 16, .. }));
    }

    #[test]
    fn test_save_and_load_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let geometry = FrameGeometry::new(3, 2);
        let pixels: Vec<f32> = (0..geometry.sample_count())
            .map(|i| if i % 4 == 3 { 1.0 } else { 200.0 / 255.0 })
            .collect();

        save_frame(&path, geometry, &pixels).unwrap();
        let frame = load_frame(&path).unwrap();

        assert_eq!(frame.geometry(), geometry);
        let samples = frame.download(DownloadMode::Instant).unwrap();
        for pixel in samples.chunks_exact(4) {
            assert_eq!(pixel, &[200, 200, 200, 255]);
        }
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_frame("no/such/frame.png"),
            Err(ImageIoError::DecodeError(_))
        ));
    }
}
