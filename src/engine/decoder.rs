// src/engine/decoder.rs
//
// Decoder operations: JPEG (mozjpeg), PNG (zune-png), WebP (libwebp),
// with the image crate as the fallback route.

use crate::engine::{MAX_DIMENSION, MAX_PIXELS};
use crate::error::ImgBatchError;
use image::{
    DynamicImage, GrayAlphaImage, GrayImage, ImageFormat, ImageReader, RgbImage, RgbaImage,
};
use mozjpeg::Decompress;
use std::io::Cursor;
use tracing::debug;
use webp::{BitstreamFeatures, Decoder as WebPDecoder};
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_png::PngDecoder;

type DecoderResult<T> = std::result::Result<T, ImgBatchError>;

/// Run a codec closure with a panic guard. The C-backed codecs can panic on
/// pathological input; a panic must surface as an error, not tear down the
/// worker thread mid-batch.
pub(crate) fn run_guarded<T>(
    stage: &'static str,
    f: impl FnOnce() -> DecoderResult<T>,
) -> DecoderResult<T> {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(ImgBatchError::internal_bug(format!(
                "{stage} panicked: {message}"
            )))
        }
    }
}

/// Decode JPEG using mozjpeg (backed by libjpeg-turbo).
/// Significantly faster than the image crate's pure Rust decoder.
pub fn decode_jpeg(data: &[u8]) -> DecoderResult<DynamicImage> {
    run_guarded("decode:jpeg", || {
        // Truncated files without an EOI marker make libjpeg-turbo produce
        // garbage rows instead of failing; reject them up front.
        if !data.windows(2).any(|pair| pair == [0xFF, 0xD9]) {
            return Err(ImgBatchError::decode_failed(
                "jpeg: missing EOI marker (truncated file)",
            ));
        }

        let decompress = Decompress::new_mem(data)
            .map_err(|e| ImgBatchError::decode_failed(format!("jpeg: init failed: {e:?}")))?;
        let mut decompress = decompress.rgb().map_err(|e| {
            ImgBatchError::decode_failed(format!("jpeg: rgb conversion failed: {e:?}"))
        })?;

        let width = decompress.width();
        let height = decompress.height();
        if width > MAX_DIMENSION as usize || height > MAX_DIMENSION as usize {
            return Err(ImgBatchError::dimension_exceeds_limit(
                width.max(height) as u32,
                MAX_DIMENSION,
            ));
        }
        let (width, height) = (width as u32, height as u32);
        check_dimensions(width, height)?;

        let pixels: Vec<[u8; 3]> = decompress
            .read_scanlines()
            .map_err(|e| ImgBatchError::decode_failed(format!("jpeg: scanline read: {e:?}")))?;
        let flat: Vec<u8> = pixels.into_iter().flatten().collect();

        RgbImage::from_raw(width, height, flat)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| ImgBatchError::decode_failed("jpeg: raw buffer size mismatch"))
    })
}

/// Decode PNG using zune-png (SIMD decoder). 16-bit input is stripped to 8-bit.
pub fn decode_png(data: &[u8]) -> DecoderResult<DynamicImage> {
    run_guarded("decode:png", || {
        let options = DecoderOptions::default().png_set_strip_to_8bit(true);
        let mut decoder = PngDecoder::new_with_options(data, options);
        let pixels = decoder
            .decode()
            .map_err(|e| ImgBatchError::decode_failed(format!("png: decode failed: {e}")))?;

        let info = decoder
            .get_info()
            .ok_or_else(|| ImgBatchError::decode_failed("png: missing header info"))?;
        let width = info.width as u32;
        let height = info.height as u32;
        check_dimensions(width, height)?;

        let buf = match pixels {
            zune_core::result::DecodingResult::U8(v) => v,
            _ => {
                return Err(ImgBatchError::decode_failed(
                    "png: unexpected non-U8 pixel buffer",
                ))
            }
        };

        let colorspace = decoder
            .get_colorspace()
            .ok_or_else(|| ImgBatchError::decode_failed("png: missing colorspace"))?;

        let img = match colorspace {
            ColorSpace::RGB => RgbImage::from_raw(width, height, buf)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| ImgBatchError::decode_failed("png: failed to build RGB image"))?,
            ColorSpace::RGBA | ColorSpace::YCbCr | ColorSpace::BGRA | ColorSpace::ARGB => {
                RgbaImage::from_raw(width, height, buf)
                    .map(DynamicImage::ImageRgba8)
                    .ok_or_else(|| {
                        ImgBatchError::decode_failed("png: failed to build RGBA image")
                    })?
            }
            ColorSpace::Luma => GrayImage::from_raw(width, height, buf)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| ImgBatchError::decode_failed("png: failed to build Luma image"))?,
            ColorSpace::LumaA => GrayAlphaImage::from_raw(width, height, buf)
                .map(DynamicImage::ImageLumaA8)
                .ok_or_else(|| ImgBatchError::decode_failed("png: failed to build LumaA image"))?,
            other => {
                return Err(ImgBatchError::decode_failed(format!(
                    "png: unsupported colorspace {other:?}"
                )))
            }
        };
        Ok(img)
    })
}

/// Decode WebP using libwebp. Animated WebP is rejected.
pub fn decode_webp(data: &[u8]) -> DecoderResult<DynamicImage> {
    run_guarded("decode:webp", || {
        // Parse the header first to avoid allocating huge buffers for malformed files
        let features = BitstreamFeatures::new(data).ok_or_else(|| {
            ImgBatchError::decode_failed("webp: failed to read bitstream features")
        })?;

        if features.has_animation() {
            return Err(ImgBatchError::unsupported_format("webp (animated)"));
        }

        check_dimensions(features.width(), features.height())?;

        let decoded = WebPDecoder::new(data)
            .decode()
            .ok_or_else(|| ImgBatchError::decode_failed("webp: decode failed"))?;

        // The header can lie; re-check the actual decoded size
        check_dimensions(decoded.width(), decoded.height())?;

        Ok(decoded.to_image())
    })
}

/// Decode any other supported container via the image crate.
pub fn decode_fallback(data: &[u8]) -> DecoderResult<DynamicImage> {
    run_guarded("decode:image", || {
        image::load_from_memory(data)
            .map_err(|e| ImgBatchError::decode_failed(format!("decode failed: {e}")))
    })
}

/// Detect input format from magic bytes. None if unknown.
pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// Unified decode entrypoint: detect the format once, route JPEG to mozjpeg,
/// PNG to zune-png, WebP to libwebp, everything else to the image crate.
pub fn decode_image(bytes: &[u8]) -> DecoderResult<(DynamicImage, Option<ImageFormat>)> {
    let detected = detect_format(bytes);
    debug!(format = ?detected, size = bytes.len(), "decoding image");
    let img = match detected {
        Some(ImageFormat::Jpeg) => decode_jpeg(bytes)?,
        Some(ImageFormat::Png) => decode_png(bytes)?,
        Some(ImageFormat::WebP) => decode_webp(bytes)?,
        _ => decode_fallback(bytes)?,
    };
    Ok((img, detected))
}

/// Check that image dimensions are within safe limits.
/// Rejects potential decompression bombs before pixel buffers are allocated.
pub fn check_dimensions(width: u32, height: u32) -> DecoderResult<()> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(ImgBatchError::dimension_exceeds_limit(
            width.max(height),
            MAX_DIMENSION,
        ));
    }
    let pixels = width as u64 * height as u64;
    if pixels > MAX_PIXELS {
        return Err(ImgBatchError::pixel_count_exceeds_limit(pixels, MAX_PIXELS));
    }
    Ok(())
}

/// Read dimensions from the container header without decoding pixels.
/// This is how target sizes are computed without paying for a second decode.
pub fn probe_dimensions(bytes: &[u8]) -> DecoderResult<(u32, u32)> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImgBatchError::decode_failed(format!("failed to read image header: {e}")))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| ImgBatchError::decode_failed(format!("failed to read dimensions: {e}")))?;
    check_dimensions(width, height)?;
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb};

    fn encode_png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |_, _| Rgb([10, 20, 30]));
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn encode_webp_bytes(width: u32, height: u32) -> Vec<u8> {
        let rgb: Vec<u8> = std::iter::repeat([10u8, 20, 30])
            .take((width * height) as usize)
            .flatten()
            .collect();
        webp::Encoder::from_rgb(&rgb, width, height)
            .encode_lossless()
            .to_vec()
    }

    fn encode_jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([9, 8, 7]));
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
            .unwrap();
        buffer
    }

    #[test]
    fn test_decode_image_routes_by_format() {
        let (img, fmt) = decode_image(&encode_png_bytes(3, 2)).unwrap();
        assert_eq!(fmt, Some(ImageFormat::Png));
        assert_eq!(img.dimensions(), (3, 2));

        let (img, fmt) = decode_image(&encode_jpeg_bytes(2, 2)).unwrap();
        assert_eq!(fmt, Some(ImageFormat::Jpeg));
        assert_eq!(img.dimensions(), (2, 2));

        let (img, fmt) = decode_image(&encode_webp_bytes(3, 2)).unwrap();
        assert_eq!(fmt, Some(ImageFormat::WebP));
        assert_eq!(img.dimensions(), (3, 2));
    }

    #[test]
    fn test_decode_png_preserves_pixels() {
        let (img, _) = decode_image(&encode_png_bytes(3, 1)).unwrap();
        assert_eq!(img.to_rgb8().get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_image(&[0u8; 64]).unwrap_err();
        assert!(matches!(err, ImgBatchError::DecodeFailed { .. }));
    }

    #[test]
    fn test_decode_jpeg_rejects_truncation() {
        let mut jpeg = encode_jpeg_bytes(4, 4);
        jpeg.truncate(jpeg.len() / 2);
        assert!(decode_jpeg(&jpeg).is_err());
    }

    #[test]
    fn test_check_dimensions_limits() {
        assert!(check_dimensions(100, 100).is_ok());
        assert!(matches!(
            check_dimensions(MAX_DIMENSION + 1, 1).unwrap_err(),
            ImgBatchError::DimensionExceedsLimit { .. }
        ));
        assert!(matches!(
            check_dimensions(20000, 20000).unwrap_err(),
            ImgBatchError::PixelCountExceedsLimit { .. }
        ));
    }

    #[test]
    fn test_probe_dimensions_reads_header_only() {
        let png = encode_png_bytes(64, 48);
        assert_eq!(probe_dimensions(&png).unwrap(), (64, 48));
        assert!(probe_dimensions(&[1, 2, 3]).is_err());
    }
}
