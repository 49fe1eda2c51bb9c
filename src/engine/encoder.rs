// src/engine/encoder.rs
//
// Encoder operations: JPEG (mozjpeg), WebP (libwebp), PNG (image + oxipng).

use crate::engine::decoder::run_guarded;
use crate::engine::MAX_DIMENSION;
use crate::error::ImgBatchError;
use image::{DynamicImage, ImageFormat};
use mozjpeg::{ColorSpace, Compress, ScanMode};
use std::borrow::Cow;
use std::io::Cursor;

type EncoderResult<T> = std::result::Result<T, ImgBatchError>;

/// Derives per-format encoder tuning from the 0-100 quality value.
/// Quality bands:
/// - High (>=85): visual quality first
/// - Balanced (70-84): quality/speed balance
/// - Fast (50-69): speed leaning
/// - Fastest (<50): speed first
#[derive(Debug, Clone, Copy)]
pub struct QualitySettings {
    quality: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QualityBand {
    High,
    Balanced,
    Fast,
    Fastest,
}

impl QualitySettings {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.min(100) as f32,
        }
    }

    fn band(&self) -> QualityBand {
        if self.quality >= 85.0 {
            QualityBand::High
        } else if self.quality >= 70.0 {
            QualityBand::Balanced
        } else if self.quality >= 50.0 {
            QualityBand::Fast
        } else {
            QualityBand::Fastest
        }
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// JPEG smoothing factor: more smoothing at low quality hides block noise.
    pub fn jpeg_smoothing(&self) -> u8 {
        if self.quality >= 90.0 {
            0
        } else if self.quality >= 70.0 {
            5
        } else if self.quality >= 60.0 {
            10
        } else {
            18
        }
    }

    // WebP: method 4 single-pass is the speed/quality sweet spot
    pub fn webp_method(&self) -> i32 {
        4
    }

    pub fn webp_pass(&self) -> i32 {
        1
    }

    pub fn webp_sns_strength(&self) -> i32 {
        match self.band() {
            QualityBand::High => 50,
            QualityBand::Balanced => 70,
            QualityBand::Fast | QualityBand::Fastest => 80,
        }
    }

    pub fn webp_filter_strength(&self) -> i32 {
        if self.quality >= 80.0 {
            20
        } else if self.quality >= 60.0 {
            30
        } else {
            40
        }
    }

    pub fn webp_filter_sharpness(&self) -> i32 {
        match self.band() {
            QualityBand::High => 2,
            _ => 0,
        }
    }
}

/// Encode to JPEG using mozjpeg with web-optimized settings
/// (progressive scan, optimized coding, quality-banded smoothing).
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> EncoderResult<Vec<u8>> {
    run_guarded("encode:jpeg", || {
        let quality = quality.min(100);

        // Avoid a conversion pass when the image is already RGB8
        let rgb: Cow<'_, image::RgbImage> = match img {
            DynamicImage::ImageRgb8(rgb_img) => Cow::Borrowed(rgb_img),
            _ => Cow::Owned(img.to_rgb8()),
        };
        let (w, h) = rgb.dimensions();
        let pixels: &[u8] = rgb.as_raw();

        if w == 0 || h == 0 {
            return Err(ImgBatchError::encode_failed(
                "jpeg",
                "zero-sized image cannot be encoded",
            ));
        }
        if w > MAX_DIMENSION || h > MAX_DIMENSION {
            return Err(ImgBatchError::dimension_exceeds_limit(
                w.max(h),
                MAX_DIMENSION,
            ));
        }
        let expected_len = (w as usize) * (h as usize) * 3;
        if pixels.len() != expected_len {
            return Err(ImgBatchError::corrupted_image());
        }

        let settings = QualitySettings::new(quality);
        let mut comp = Compress::new(ColorSpace::JCS_RGB);
        comp.set_size(w as usize, h as usize);
        comp.set_color_space(ColorSpace::JCS_YCbCr);
        comp.set_quality(settings.quality());
        comp.set_chroma_sampling_pixel_sizes((2, 2), (2, 2));
        comp.set_progressive_mode();
        comp.set_optimize_coding(true);
        comp.set_optimize_scans(true);
        comp.set_scan_optimization_mode(ScanMode::AllComponentsTogether);
        comp.set_smoothing_factor(settings.jpeg_smoothing());

        let estimated_size = (w as usize * h as usize * 3 / 10).max(4096);
        let mut output = Vec::with_capacity(estimated_size);

        let mut writer = comp.start_compress(&mut output).map_err(|e| {
            ImgBatchError::encode_failed("jpeg", format!("failed to start compress: {e:?}"))
        })?;

        let stride = w as usize * 3;
        for row in pixels.chunks(stride) {
            writer.write_scanlines(row).map_err(|e| {
                ImgBatchError::encode_failed("jpeg", format!("failed to write scanlines: {e:?}"))
            })?;
        }

        writer
            .finish()
            .map_err(|e| ImgBatchError::encode_failed("jpeg", format!("failed to finish: {e:?}")))?;

        Ok(output)
    })
}

/// Encode to PNG via the image crate, then recompress losslessly with oxipng.
///
/// Deliberately takes no quality parameter: PNG is lossless and the output
/// must not vary with the batch quality setting.
pub fn encode_png(img: &DynamicImage) -> EncoderResult<Vec<u8>> {
    run_guarded("encode:png", || {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| ImgBatchError::encode_failed("png", format!("PNG encode failed: {e}")))?;

        let options = oxipng::Options::from_preset(4);
        oxipng::optimize_from_memory(&buf, &options).map_err(|e| {
            ImgBatchError::encode_failed("png", format!("oxipng optimization failed: {e}"))
        })
    })
}

/// Encode to WebP with quality-banded settings.
/// Drops the alpha channel when absent to reduce file size.
pub fn encode_webp(img: &DynamicImage, quality: u8) -> EncoderResult<Vec<u8>> {
    run_guarded("encode:webp", || {
        let rgb: Cow<'_, image::RgbImage> = match img {
            DynamicImage::ImageRgb8(rgb_img) => Cow::Borrowed(rgb_img),
            _ => Cow::Owned(img.to_rgb8()),
        };
        let (w, h) = rgb.dimensions();
        let encoder = webp::Encoder::from_rgb(&rgb, w, h);

        let mut config = webp::WebPConfig::new()
            .map_err(|_| ImgBatchError::encode_failed("webp", "failed to create WebPConfig"))?;

        let settings = QualitySettings::new(quality);
        config.quality = settings.quality();
        config.method = settings.webp_method();
        config.pass = settings.webp_pass();
        config.preprocessing = 0;
        config.sns_strength = settings.webp_sns_strength();
        config.autofilter = 1;
        config.filter_strength = settings.webp_filter_strength();
        config.filter_sharpness = settings.webp_filter_sharpness();

        let mem = encoder
            .encode_advanced(&config)
            .map_err(|e| ImgBatchError::encode_failed("webp", format!("encode failed: {e:?}")))?;

        Ok(mem.to_vec())
    })
}
