// src/engine/converter.rs
//
// Single-item conversion: source bytes in, encoded bytes out, with the
// target size derived from the header and the requested percentage.

use crate::engine::codec::Codec;
use crate::engine::decoder::probe_dimensions;
use crate::engine::resample::scaled_dimensions;
use crate::error::ImgBatchError;
use crate::model::QueuedImage;
use crate::options::ConversionOptions;
use std::sync::Arc;
use tracing::debug;

/// Result of one successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub bytes: Arc<Vec<u8>>,
    pub converted_size: usize,
}

/// Convert one queued image per the batch options.
///
/// Probes the header for dimensions, computes the percentage-scaled target,
/// and hands the bytes to the codec. Never panics on malformed input; every
/// failure comes back as an error for the orchestrator to record.
pub fn convert_one(
    codec: &dyn Codec,
    image: &QueuedImage,
    options: &ConversionOptions,
    output_file_name: &str,
) -> Result<ConversionOutput, ImgBatchError> {
    let data = image.source().load()?;
    if data.is_empty() {
        return Err(ImgBatchError::decode_failed("empty input"));
    }

    let (width, height) = probe_dimensions(&data)?;
    let (target_width, target_height) =
        scaled_dimensions(width, height, options.resize_percentage);

    debug!(
        name = %image.name(),
        output = output_file_name,
        width,
        height,
        target_width,
        target_height,
        format = options.format.as_str(),
        "converting image"
    );

    let encoded = codec.encode_scaled(
        &data,
        target_width,
        target_height,
        options.format,
        options.quality,
    )?;

    let converted_size = encoded.len();
    Ok(ConversionOutput {
        bytes: Arc::new(encoded),
        converted_size,
    })
}
