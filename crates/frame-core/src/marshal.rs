//! Conversion between 4-channel pixel buffers and model tensors
//!
//! Input frames arrive as row-major u8 samples with four channels per pixel.
//! They are copied into a reusable `[1, H, W, 4]` float tensor, narrowed to
//! three channels and permuted to channel-first `[1, 3, H, W]`. No scaling is
//! applied on the way in: the model sees raw 0-255 values.
//!
//! Model output is `[1, 3, H, W]` (already divided by 255 by the pipeline)
//! and is written back channel-last into a `[H, W, 4]` float buffer whose
//! alpha channel is forced to `1.0`.

use crate::error::MarshalError;
use frame_inference_common::{FrameGeometry, COLOR_CHANNELS, PIXEL_CHANNELS};
use ndarray::{s, Array4, ArrayView4};
use tracing::debug;

/// Channel-last `[1, H, W, 4]` → channel-first `[1, 4, H, W]` axis order
const NHWC_TO_NCHW: [usize; 4] = [0, 3, 1, 2];

/// Float copy of the most recent input frame, shaped `[1, H, W, 4]`
#[derive(Debug, Clone)]
pub struct ReusableInputBuffer {
    tensor: Array4<f32>,
}

impl ReusableInputBuffer {
    fn new(geometry: FrameGeometry) -> Self {
        Self {
            tensor: Array4::ones((
                1,
                geometry.height as usize,
                geometry.width as usize,
                PIXEL_CHANNELS,
            )),
        }
    }

    /// Geometry the buffer is currently allocated for
    pub fn geometry(&self) -> FrameGeometry {
        let (_, height, width, _) = self.tensor.dim();
        FrameGeometry::new(width as u32, height as u32)
    }

    pub fn tensor(&self) -> ArrayView4<'_, f32> {
        self.tensor.view()
    }
}

/// Owns the reusable input buffer and produces model input tensors
#[derive(Debug, Default)]
pub struct TensorMarshaler {
    buffer: Option<ReusableInputBuffer>,
    allocations: usize,
}

impl TensorMarshaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The reusable buffer, once the first frame has been marshaled
    pub fn buffer(&self) -> Option<&ReusableInputBuffer> {
        self.buffer.as_ref()
    }

    /// Number of times the input buffer has been (re)allocated
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    /// Drop the reusable buffer
    pub fn release(&mut self) {
        self.buffer = None;
    }

    /// Convert a 4-channel u8 frame into a `[1, 3, H, W]` model input
    ///
    /// The returned tensor is a strided view over the reusable buffer; the
    /// alpha channel is discarded.
    ///
    /// # Errors
    /// Fails when the geometry is empty or `src` holds less than one frame.
    pub fn to_model_input(
        &mut self,
        src: &[u8],
        geometry: FrameGeometry,
    ) -> Result<ArrayView4<'_, f32>, MarshalError> {
        if geometry.is_empty() {
            return Err(MarshalError::EmptyGeometry {
                width: geometry.width,
                height: geometry.height,
            });
        }
        geometry.check_buffer_len(src.len())?;

        let source = ArrayView4::from_shape(
            (
                1,
                geometry.height as usize,
                geometry.width as usize,
                PIXEL_CHANNELS,
            ),
            &src[..geometry.sample_count()],
        )?;

        let buffer = self.prepare_buffer(geometry);
        buffer
            .tensor
            .zip_mut_with(&source, |dst, &sample| *dst = f32::from(sample));

        Ok(buffer
            .tensor
            .slice(s![.., .., .., ..COLOR_CHANNELS])
            .permuted_axes(NHWC_TO_NCHW))
    }

    fn prepare_buffer(&mut self, geometry: FrameGeometry) -> &mut ReusableInputBuffer {
        if let Some(current) = &self.buffer {
            if current.geometry() != geometry {
                debug!(
                    "Input buffer geometry changed {} -> {}, reallocating",
                    current.geometry(),
                    geometry
                );
                self.buffer = None;
            }
        }

        let allocations = &mut self.allocations;
        self.buffer.get_or_insert_with(|| {
            *allocations += 1;
            ReusableInputBuffer::new(geometry)
        })
    }
}

/// Write a `[1, C, H, W]` tensor into a channel-last 4-channel float buffer
///
/// The first three channels are copied in the tensor's logical order
/// (channel, row, column). Every pixel's alpha is then set to exactly `1.0`.
///
/// # Panics
/// Geometry is not validated: a tensor larger than `width` x `height` or a
/// destination shorter than `width * height * 4` panics on indexing.
pub fn from_model_output(tensor: ArrayView4<'_, f32>, dst: &mut [f32], width: u32, height: u32) {
    let width = width as usize;
    let height = height as usize;

    for ((_, channel, y, x), &value) in tensor.indexed_iter() {
        if channel < COLOR_CHANNELS {
            dst[PIXEL_CHANNELS * (y * width + x) + channel] = value;
        }
    }

    for pixel in dst[..width * height * PIXEL_CHANNELS].chunks_exact_mut(PIXEL_CHANNELS) {
        pixel[PIXEL_CHANNELS - 1] = 1.0;
    }
}
