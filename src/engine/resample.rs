// src/engine/resample.rs
//
// Percentage-based target dimensions and SIMD resampling via fast_image_resize,
// with an image-crate fallback when the fir path cannot run.

use crate::error::ImgBatchError;
use fast_image_resize::{self as fir, ImageBufferError, MulDiv, PixelType, ResizeOptions};
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage, RgbaImage};

type ResampleResult<T> = std::result::Result<T, ImgBatchError>;

/// Compute target dimensions for a uniform percentage scale.
/// Each axis is `round(dim * percentage / 100)`, clamped up to 1 so a
/// degenerate zero-size surface can never reach the encoders.
pub fn scaled_dimensions(width: u32, height: u32, percentage: u8) -> (u32, u32) {
    let factor = percentage as f64 / 100.0;
    let w = ((width as f64 * factor).round() as u32).max(1);
    let h = ((height as f64 * factor).round() as u32).max(1);
    (w, h)
}

fn resize_options() -> ResizeOptions {
    ResizeOptions::new().resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3))
}

/// Resize an owned image to the target dimensions (zero-copy for RGB/RGBA buffers).
/// Falls back to the image crate's resize when the SIMD path reports an error.
pub fn resize_image(
    img: DynamicImage,
    dst_width: u32,
    dst_height: u32,
) -> ResampleResult<DynamicImage> {
    let src_width = img.width();
    let src_height = img.height();

    if src_width == 0 || src_height == 0 || dst_width == 0 || dst_height == 0 {
        return Err(ImgBatchError::resize_failed(
            (src_width, src_height),
            (dst_width, dst_height),
            "invalid dimensions for resize",
        ));
    }

    // Pick the pixel layout without forcing RGBA when not needed;
    // into_raw() transfers buffer ownership instead of copying.
    let (pixel_type, src_pixels): (PixelType, Vec<u8>) = match img {
        DynamicImage::ImageRgb8(rgb) => (PixelType::U8x3, rgb.into_raw()),
        DynamicImage::ImageRgba8(rgba) => (PixelType::U8x4, rgba.into_raw()),
        other => (PixelType::U8x4, other.to_rgba8().into_raw()),
    };

    resize_pixels(
        src_width, src_height, src_pixels, pixel_type, dst_width, dst_height,
    )
}

fn resize_pixels(
    src_width: u32,
    src_height: u32,
    mut src_pixels: Vec<u8>,
    pixel_type: PixelType,
    dst_width: u32,
    dst_height: u32,
) -> ResampleResult<DynamicImage> {
    let pixel_count = (src_width as usize)
        .checked_mul(src_height as usize)
        .ok_or_else(|| {
            ImgBatchError::resize_failed(
                (src_width, src_height),
                (dst_width, dst_height),
                "dimension overflow",
            )
        })?;
    let required_bytes = pixel_count.checked_mul(pixel_type.size()).ok_or_else(|| {
        ImgBatchError::resize_failed(
            (src_width, src_height),
            (dst_width, dst_height),
            "buffer size overflow",
        )
    })?;
    if src_pixels.len() < required_bytes {
        return Err(ImgBatchError::resize_failed(
            (src_width, src_height),
            (dst_width, dst_height),
            "source buffer too small",
        ));
    }

    let fir_result = match fir::images::Image::from_slice_u8(
        src_width,
        src_height,
        src_pixels.as_mut_slice(),
        pixel_type,
    ) {
        Ok(src_image) => run_fir_resize(src_image, pixel_type, dst_width, dst_height),
        Err(ImageBufferError::InvalidBufferAlignment) => {
            // Rare, but a misaligned buffer needs a copy into fir-owned storage
            let mut aligned = fir::images::Image::new(src_width, src_height, pixel_type);
            aligned
                .buffer_mut()
                .copy_from_slice(&src_pixels[..required_bytes]);
            run_fir_resize(aligned, pixel_type, dst_width, dst_height)
        }
        Err(other) => Err(format!("fir source image error: {other:?}")),
    };

    match fir_result {
        Ok(resized) => Ok(resized),
        Err(fir_err) => resize_fallback(
            &src_pixels, src_width, src_height, pixel_type, dst_width, dst_height,
        )
        .map_err(|fallback_err| {
            ImgBatchError::resize_failed(
                (src_width, src_height),
                (dst_width, dst_height),
                format!("{fir_err}; fallback failed: {fallback_err}"),
            )
        }),
    }
}

/// Whether the alpha channel is fully opaque (premultiply can be skipped).
/// Only scanned for images >= 1MP; for smaller images the SIMD premultiply
/// is cheaper than the scan.
fn is_fully_opaque(image: &fir::images::Image, pixel_type: PixelType) -> bool {
    if pixel_type != PixelType::U8x4 {
        return true;
    }
    const THRESHOLD_PIXELS: u64 = 1_000_000;
    let pixels = image.width() as u64 * image.height() as u64;
    if pixels < THRESHOLD_PIXELS {
        return false;
    }
    image.buffer().iter().skip(3).step_by(4).all(|&a| a == 255)
}

fn run_fir_resize(
    mut src_image: fir::images::Image,
    pixel_type: PixelType,
    dst_width: u32,
    dst_height: u32,
) -> std::result::Result<DynamicImage, String> {
    let mut dst_image = fir::images::Image::new(dst_width, dst_height, pixel_type);

    // Lanczos convolution needs premultiplied alpha to avoid halos at edges
    let needs_premultiply =
        pixel_type == PixelType::U8x4 && !is_fully_opaque(&src_image, pixel_type);

    let mul_div = MulDiv::default();
    if needs_premultiply {
        mul_div
            .multiply_alpha_inplace(&mut src_image)
            .map_err(|e| format!("failed to premultiply alpha: {e}"))?;
    }

    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, &resize_options())
        .map_err(|e| format!("fir resize error: {e:?}"))?;

    if needs_premultiply {
        mul_div
            .divide_alpha_inplace(&mut dst_image)
            .map_err(|e| format!("failed to unpremultiply alpha: {e}"))?;
    }

    let dst_pixels = dst_image.into_vec();
    match pixel_type {
        PixelType::U8x3 => RgbImage::from_raw(dst_width, dst_height, dst_pixels)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| "failed to build rgb image from resized data".to_string()),
        PixelType::U8x4 => RgbaImage::from_raw(dst_width, dst_height, dst_pixels)
            .map(DynamicImage::ImageRgba8)
            .ok_or_else(|| "failed to build rgba image from resized data".to_string()),
        _ => Err("unsupported pixel type after resize".to_string()),
    }
}

fn resize_fallback(
    src_pixels: &[u8],
    src_width: u32,
    src_height: u32,
    pixel_type: PixelType,
    dst_width: u32,
    dst_height: u32,
) -> std::result::Result<DynamicImage, String> {
    let filter = FilterType::Lanczos3;
    match pixel_type {
        PixelType::U8x3 => {
            let rgb = RgbImage::from_raw(src_width, src_height, src_pixels.to_vec())
                .ok_or_else(|| "failed to build rgb image for fallback resize".to_string())?;
            Ok(DynamicImage::ImageRgb8(image::imageops::resize(
                &rgb, dst_width, dst_height, filter,
            )))
        }
        PixelType::U8x4 => {
            let rgba = RgbaImage::from_raw(src_width, src_height, src_pixels.to_vec())
                .ok_or_else(|| "failed to build rgba image for fallback resize".to_string())?;
            Ok(DynamicImage::ImageRgba8(image::imageops::resize(
                &rgba, dst_width, dst_height, filter,
            )))
        }
        _ => Err("fallback resize supports only U8x3/U8x4 pixel types".to_string()),
    }
}
