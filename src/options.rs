// src/options.rs
//
// Output format and per-batch conversion configuration.
// Options are cheap to create and copy - the expensive work happens in the engine.

use crate::error::ImgBatchError;

/// Target encoding format for a conversion batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Webp,
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn from_str(format: &str) -> Result<Self, ImgBatchError> {
        match format.to_lowercase().as_str() {
            "webp" => Ok(Self::Webp),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            other => Err(ImgBatchError::unsupported_format(other.to_string())),
        }
    }

    /// File extension for output names. JPEG maps to "jpg", others pass through.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Webp => "image/webp",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Whether the quality setting influences encoding.
    /// PNG is lossless; quality is accepted but has no effect.
    pub fn is_lossy(&self) -> bool {
        !matches!(self, Self::Png)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }
}

/// Configuration snapshot for one conversion batch.
///
/// `quality` is only meaningful for lossy formats (WebP, JPEG); PNG encoding
/// never reads it. `resize_percentage` scales width and height proportionally.
/// When `prefix` is non-empty, output names are `{prefix}{1-based index}.{ext}`;
/// otherwise the original base name is reused with the new extension.
#[derive(Clone, Debug)]
pub struct ConversionOptions {
    pub format: OutputFormat,
    pub quality: u8,
    pub resize_percentage: u8,
    pub prefix: String,
}

impl ConversionOptions {
    pub fn new(format: OutputFormat, quality: u8, resize_percentage: u8) -> Self {
        Self {
            format,
            quality,
            resize_percentage,
            prefix: String::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Reject out-of-range settings before a batch starts.
    pub fn validate(&self) -> Result<(), ImgBatchError> {
        if self.quality > 100 {
            return Err(ImgBatchError::invalid_options(
                "quality",
                self.quality.to_string(),
                "must be in 0-100",
            ));
        }
        if self.resize_percentage == 0 || self.resize_percentage > 100 {
            return Err(ImgBatchError::invalid_options(
                "resize_percentage",
                self.resize_percentage.to_string(),
                "must be in 1-100",
            ));
        }
        Ok(())
    }
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Webp,
            quality: 80,
            resize_percentage: 100,
            prefix: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str_accepts_jpg_alias() {
        assert_eq!(OutputFormat::from_str("jpg").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_str("JPEG").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_str("webp").unwrap(), OutputFormat::Webp);
        assert!(OutputFormat::from_str("avif").is_err());
    }

    #[test]
    fn test_extension_maps_jpeg_to_jpg() {
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert_eq!(OutputFormat::Webp.extension(), "webp");
        assert_eq!(OutputFormat::Png.extension(), "png");
    }

    #[test]
    fn test_png_is_not_lossy() {
        assert!(!OutputFormat::Png.is_lossy());
        assert!(OutputFormat::Jpeg.is_lossy());
        assert!(OutputFormat::Webp.is_lossy());
    }

    #[test]
    fn test_validate_bounds() {
        assert!(ConversionOptions::new(OutputFormat::Webp, 80, 50)
            .validate()
            .is_ok());
        assert!(ConversionOptions::new(OutputFormat::Webp, 101, 50)
            .validate()
            .is_err());
        assert!(ConversionOptions::new(OutputFormat::Webp, 80, 0)
            .validate()
            .is_err());
        assert!(ConversionOptions::new(OutputFormat::Webp, 80, 101)
            .validate()
            .is_err());
        // Boundary values are valid
        assert!(ConversionOptions::new(OutputFormat::Png, 0, 1)
            .validate()
            .is_ok());
        assert!(ConversionOptions::new(OutputFormat::Png, 100, 100)
            .validate()
            .is_ok());
    }
}
