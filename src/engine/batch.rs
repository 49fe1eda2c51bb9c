// src/engine/batch.rs
//
// Batch orchestration: windowed parallel fan-out over the global thread pool.
//
// The batch is split into windows of `concurrency` items. Windows run
// strictly in order; items inside a window run in parallel on the rayon
// pool. A failed item is recorded and the batch moves on - only a batch
// where every single item failed comes back as an error.

use crate::engine::codec::Codec;
use crate::engine::converter::convert_one;
use crate::engine::pool::{self, MAX_CONCURRENCY};
use crate::error::ImgBatchError;
use crate::model::{BatchSummary, ConvertedImage, QueuedImage};
use crate::options::ConversionOptions;
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Status observer, invoked on the orchestrator thread only: once per item
/// when it enters Converting, once when it reaches Done. The index is the
/// item's position in the input order.
pub type ProgressFn<'a> = dyn FnMut(usize, &ConvertedImage) + 'a;

/// Convert a batch with the window width derived from available CPU
/// parallelism (capped at the batch length).
pub fn convert_batch(
    codec: &dyn Codec,
    images: &[QueuedImage],
    options: &ConversionOptions,
    output_file_names: &[String],
    progress: Option<&mut ProgressFn<'_>>,
) -> Result<Vec<ConvertedImage>, ImgBatchError> {
    let concurrency = pool::effective_concurrency(images.len().max(1));
    convert_batch_with_concurrency(codec, images, options, output_file_names, concurrency, progress)
}

/// Convert a batch with an explicit window width.
///
/// `output_file_names` must be index-aligned with `images` (see
/// [`crate::naming::generate_file_name`]). Returns one record per input,
/// index-aligned; every record is Done on return. Fails fast on invalid
/// options, concurrency, or name-count mismatch, and fails with
/// `AllConversionsFailed` only when no item produced output.
pub fn convert_batch_with_concurrency(
    codec: &dyn Codec,
    images: &[QueuedImage],
    options: &ConversionOptions,
    output_file_names: &[String],
    concurrency: usize,
    mut progress: Option<&mut ProgressFn<'_>>,
) -> Result<Vec<ConvertedImage>, ImgBatchError> {
    options.validate()?;
    if concurrency == 0 || concurrency > MAX_CONCURRENCY {
        return Err(ImgBatchError::invalid_options(
            "concurrency",
            concurrency.to_string(),
            format!("must be between 1 and {MAX_CONCURRENCY}"),
        ));
    }
    if images.len() != output_file_names.len() {
        return Err(ImgBatchError::invalid_options(
            "output_file_names",
            output_file_names.len().to_string(),
            format!("must match the image count ({})", images.len()),
        ));
    }
    if images.is_empty() {
        return Ok(Vec::new());
    }

    info!(
        count = images.len(),
        concurrency,
        format = options.format.as_str(),
        quality = options.quality,
        resize = options.resize_percentage,
        "starting batch conversion"
    );

    let mut records: Vec<ConvertedImage> = images
        .iter()
        .zip(output_file_names)
        .map(|(image, file_name)| {
            ConvertedImage::queued(file_name.clone(), image.name().to_string(), image.size())
        })
        .collect();

    let indices: Vec<usize> = (0..images.len()).collect();
    for window in indices.chunks(concurrency) {
        for &index in window {
            records[index].mark_converting();
            if let Some(cb) = progress.as_deref_mut() {
                cb(index, &records[index]);
            }
        }

        debug!(window = ?window, "dispatching window");
        let results: Vec<(usize, Result<_, ImgBatchError>)> = pool::get_pool().install(|| {
            window
                .par_iter()
                .map(|&index| {
                    (
                        index,
                        convert_one(codec, &images[index], options, &output_file_names[index]),
                    )
                })
                .collect()
        });

        for (index, result) in results {
            match result {
                Ok(output) => {
                    records[index].complete(output.bytes, output.converted_size as u64);
                }
                Err(e) => {
                    warn!(
                        name = %images[index].name(),
                        error = %e,
                        "conversion failed"
                    );
                    records[index].fail();
                }
            }
            if let Some(cb) = progress.as_deref_mut() {
                cb(index, &records[index]);
            }
        }
    }

    let summary = BatchSummary::from_results(&records);
    info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "batch conversion finished"
    );

    if summary.all_failed() {
        return Err(ImgBatchError::all_conversions_failed(summary.failed));
    }
    Ok(records)
}
