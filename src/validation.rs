//! Validation gate for raw upload bytes.
//!
//! Runs before any mask computation: segmentation is the expensive step and
//! must never be attempted on input that will be rejected anyway.

use std::io::Cursor;

use image::{ImageFormat, ImageReader, RgbImage};

use crate::config::{Config, DEFAULT_MAX_FILE_SIZE_BYTES};
use crate::error::ValidationError;

/// Smallest accepted width and height
pub const MIN_DIMENSION: u32 = 10;

/// Largest accepted width and height
pub const MAX_DIMENSION: u32 = 4096;

/// Containers accepted as input
pub const SUPPORTED_FORMATS: [ImageFormat; 3] =
    [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::WebP];

/// Image that passed every check, decoded to RGB
#[derive(Debug, Clone)]
pub struct ValidatedImage {
    pub format: ImageFormat,
    pub image: RgbImage,
}

/// Pure predicate over raw bytes and image metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationGate {
    max_file_size_bytes: u64,
}

impl Default for ValidationGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_SIZE_BYTES)
    }
}

impl ValidationGate {
    pub fn new(max_file_size_bytes: u64) -> Self {
        Self {
            max_file_size_bytes,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_file_size_bytes)
    }

    /// Checks size, format and dimensions without decoding pixel data
    ///
    /// Checks run in order and stop at the first failure:
    /// byte length, container format, minimum side, maximum side.
    ///
    /// # Errors
    ///
    /// * `ValidationError::FileTooLarge` - When the byte length exceeds the limit
    /// * `ValidationError::UnsupportedFormat` - When the container is not JPEG, PNG or WebP
    /// * `ValidationError::Corrupt` - When the header cannot be read
    /// * `ValidationError::TooSmall` - When either side is below [`MIN_DIMENSION`]
    /// * `ValidationError::DimensionsTooLarge` - When either side is above [`MAX_DIMENSION`]
    pub fn inspect(&self, bytes: &[u8]) -> Result<(ImageFormat, (u32, u32)), ValidationError> {
        if bytes.len() as u64 > self.max_file_size_bytes {
            return Err(ValidationError::FileTooLarge {
                size: bytes.len(),
                limit: self.max_file_size_bytes,
            });
        }

        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| ValidationError::Corrupt(e.to_string()))?;

        let format = match reader.format() {
            Some(format) if SUPPORTED_FORMATS.contains(&format) => format,
            other => return Err(ValidationError::UnsupportedFormat(other)),
        };

        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| ValidationError::Corrupt(e.to_string()))?;

        if width < MIN_DIMENSION || height < MIN_DIMENSION {
            return Err(ValidationError::TooSmall {
                width,
                height,
                min: MIN_DIMENSION,
            });
        }

        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(ValidationError::DimensionsTooLarge {
                width,
                height,
                max: MAX_DIMENSION,
            });
        }

        Ok((format, (width, height)))
    }

    /// Runs every check and decodes the image to RGB
    ///
    /// # Errors
    ///
    /// Everything [`inspect`](Self::inspect) reports, plus
    /// `ValidationError::Corrupt` when the pixel data fails to decode.
    pub fn validate(&self, bytes: &[u8]) -> Result<ValidatedImage, ValidationError> {
        let (format, (width, height)) = self.inspect(bytes).inspect_err(|error| {
            tracing::warn!("Rejected upload of {} bytes: {error}", bytes.len());
        })?;

        let image = ImageReader::with_format(Cursor::new(bytes), format)
            .decode()
            .map_err(|e| {
                tracing::warn!("Failed to decode {format:?} upload: {e}");
                ValidationError::Corrupt(e.to_string())
            })?
            .into_rgb8();

        tracing::debug!("Validated {format:?} image of {width}x{height}");

        Ok(ValidatedImage { format, image })
    }
}
