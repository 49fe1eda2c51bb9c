// src/engine/codec.rs
//
// The decode -> resample -> encode pipeline behind a trait, so the batch
// orchestrator can be exercised against scripted codecs in tests.

use crate::engine::decoder::{decode_image, probe_dimensions};
use crate::engine::memory::{
    estimate_conversion_memory, memory_semaphore, WeightedSemaphore,
    ESTIMATED_MEMORY_PER_CONVERSION,
};
use crate::engine::resample::resize_image;
use crate::engine::{encoder, MAX_DIMENSION};
use crate::error::ImgBatchError;
use crate::options::OutputFormat;
use std::sync::Arc;

/// Converts one image's bytes into encoded output at the given target size.
///
/// Implementations must be safe to call from multiple threads at once; the
/// batch orchestrator fans a window of conversions out over a rayon pool.
pub trait Codec: Send + Sync {
    fn encode_scaled(
        &self,
        bytes: &[u8],
        target_width: u32,
        target_height: u32,
        format: OutputFormat,
        quality: u8,
    ) -> Result<Vec<u8>, ImgBatchError>;
}

/// The production codec: native decoders, SIMD resampling, format-tuned
/// encoders, gated by the process-wide memory semaphore.
pub struct EngineCodec {
    memory: Arc<WeightedSemaphore>,
}

impl EngineCodec {
    pub fn new() -> Self {
        Self {
            memory: memory_semaphore(),
        }
    }

    /// Use a dedicated semaphore instead of the global one.
    pub fn with_memory_semaphore(memory: Arc<WeightedSemaphore>) -> Self {
        Self { memory }
    }
}

impl Default for EngineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for EngineCodec {
    fn encode_scaled(
        &self,
        bytes: &[u8],
        target_width: u32,
        target_height: u32,
        format: OutputFormat,
        quality: u8,
    ) -> Result<Vec<u8>, ImgBatchError> {
        // Size the permit from the header before any pixel buffer exists.
        // A corrupt header falls back to the conservative flat estimate and
        // lets decode_image produce the real error.
        let weight = match probe_dimensions(bytes) {
            Ok((w, h)) => {
                let src_format = image::guess_format(bytes).ok();
                estimate_conversion_memory(w, h, src_format, 100)
                    .saturating_add((target_width as u64 * target_height as u64) * 4)
            }
            Err(_) => ESTIMATED_MEMORY_PER_CONVERSION,
        };
        let _permit = self.memory.acquire(weight);

        let (decoded, _src_format) = decode_image(bytes)?;

        let target_width = target_width.clamp(1, MAX_DIMENSION);
        let target_height = target_height.clamp(1, MAX_DIMENSION);

        let image = if decoded.width() == target_width && decoded.height() == target_height {
            decoded
        } else {
            resize_image(decoded, target_width, target_height)?
        };

        match format {
            OutputFormat::Jpeg => encoder::encode_jpeg(&image, quality),
            OutputFormat::Webp => encoder::encode_webp(&image, quality),
            // PNG is lossless; the quality setting does not apply
            OutputFormat::Png => encoder::encode_png(&image),
        }
    }
}
