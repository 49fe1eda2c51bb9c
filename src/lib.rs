// lib.rs
//
// imgbatch: a batch image format converter.
//
// Design goals:
// - Decode JPEG/PNG/WebP with format-native decoders
// - Re-encode with web-optimized settings per format
// - Bounded-concurrency batch processing with per-item status tracking
// - Partial failures never abort a batch

// Memory allocator optimization - jemalloc for better performance.
// Note: jemalloc is not supported on Windows/MSVC, so we exclude it on that platform
#[cfg(all(feature = "jemalloc", not(target_env = "msvc")))]
#[global_allocator]
static ALLOC: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

pub mod engine;
pub mod error;
pub mod model;
pub mod naming;
pub mod options;

use error::ImgBatchError;
use image::ImageReader;
use std::io::{BufRead, BufReader, Cursor, Seek};

pub use engine::{convert_batch, convert_batch_with_concurrency, Codec, EngineCodec, ProgressFn};
pub use error::{ErrorCategory, Result};
pub use model::{BatchSummary, ConversionStatus, ConvertedImage, QueuedImage};
pub use naming::{calculate_savings, format_file_size, generate_file_name};
pub use options::{ConversionOptions, OutputFormat};

/// Image metadata read from header bytes only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectMetadata {
    pub width: u32,
    pub height: u32,
    pub format: Option<String>,
}

fn read_inspect_metadata<R: BufRead + Seek>(
    reader: R,
) -> std::result::Result<InspectMetadata, ImgBatchError> {
    let reader = ImageReader::new(reader)
        .with_guessed_format()
        .map_err(|e| ImgBatchError::decode_failed(format!("failed to read image header: {e}")))?;

    let format = reader.format().map(|f| format!("{:?}", f).to_lowercase());
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| ImgBatchError::decode_failed(format!("failed to read dimensions: {e}")))?;

    Ok(InspectMetadata {
        width,
        height,
        format,
    })
}

/// Inspect image metadata WITHOUT decoding pixels.
/// This reads only the header bytes - extremely fast (<1ms).
///
/// Use this to check dimensions before queuing a batch, or to reject
/// oversized images without wasting CPU on decoding.
pub fn inspect_header_from_bytes(
    data: &[u8],
) -> std::result::Result<InspectMetadata, ImgBatchError> {
    read_inspect_metadata(Cursor::new(data))
}

/// Inspect image metadata from a file path without loading the whole file.
pub fn inspect_header_from_path(
    path: &str,
) -> std::result::Result<InspectMetadata, ImgBatchError> {
    use std::fs::File;

    let file =
        File::open(path).map_err(|e| ImgBatchError::file_read_failed(path.to_string(), e))?;
    read_inspect_metadata(BufReader::new(file))
}

/// Library version.
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Formats accepted as batch input.
pub fn supported_input_formats() -> Vec<String> {
    vec![
        "jpeg".to_string(),
        "jpg".to_string(),
        "png".to_string(),
        "webp".to_string(),
    ]
}

/// Formats the batch can encode to.
pub fn supported_output_formats() -> Vec<String> {
    vec![
        "jpeg".to_string(),
        "jpg".to_string(),
        "png".to_string(),
        "webp".to_string(),
    ]
}

/// Whether the bytes look like a convertible image, judged by magic bytes
/// rather than file extension or a caller-supplied MIME string.
pub fn is_supported_input(data: &[u8]) -> bool {
    matches!(
        engine::detect_format(data),
        Some(image::ImageFormat::Jpeg | image::ImageFormat::Png | image::ImageFormat::WebP)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

    #[test]
    fn test_inspect_header_reads_dimensions_without_decode() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 30, Rgb([1, 2, 3])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        let meta = inspect_header_from_bytes(&buf).unwrap();
        assert_eq!(meta.width, 40);
        assert_eq!(meta.height, 30);
        assert_eq!(meta.format.as_deref(), Some("png"));
    }

    #[test]
    fn test_inspect_header_rejects_garbage() {
        assert!(inspect_header_from_bytes(&[0u8; 16]).is_err());
    }

    #[test]
    fn test_is_supported_input_uses_magic_bytes() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([0, 0, 0])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        assert!(is_supported_input(&buf));
        assert!(!is_supported_input(b"GIF89a"));
        assert!(!is_supported_input(&[]));
    }

    #[test]
    fn test_supported_formats_cover_the_converter_matrix() {
        for fmt in supported_output_formats() {
            if fmt != "jpg" {
                assert!(supported_input_formats().contains(&fmt));
            }
        }
    }
}
