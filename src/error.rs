use std::time::Duration;

use image::ImageFormat;
use thiserror::Error;

/// Error type for the validation gate
///
/// Every variant is reported to the caller as-is and is never retried.
/// The checks run in a fixed order, so the first violated constraint wins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The raw byte stream exceeds the configured maximum size
    #[error("File too large: {size} bytes exceeds the limit of {limit} bytes")]
    FileTooLarge { size: usize, limit: u64 },

    /// The container is not one of JPEG, PNG or WebP
    ///
    /// `None` means no known container signature was found at all.
    #[error("Unsupported image format: {}", .0.map_or("unknown".to_string(), |format| format!("{format:?}")))]
    UnsupportedFormat(Option<ImageFormat>),

    /// The container was recognized but its contents could not be read
    #[error("Corrupt image data: {0}")]
    Corrupt(String),

    /// At least one side is below the minimum
    #[error("Image too small: {width}x{height}, minimum side is {min} pixels")]
    TooSmall { width: u32, height: u32, min: u32 },

    /// At least one side is above the maximum
    ///
    /// Distinct from `FileTooLarge`, which concerns the encoded byte length.
    #[error("Image dimensions too large: {width}x{height}, maximum side is {max} pixels")]
    DimensionsTooLarge { width: u32, height: u32, max: u32 },
}

/// Error type for mask providers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The provider could not be constructed or invoked
    #[error("Mask provider unavailable: {0}")]
    Unavailable(String),

    /// The provider ran but produced output that cannot be used
    #[error("Mask provider returned unusable output: {0}")]
    InvalidOutput(String),
}

/// Error type for effect synthesis
///
/// Once a mask is in hand the engine has no partial-failure path; these
/// variants signal broken invariants between the image and its mask.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EffectError {
    /// Image and mask dimensions do not match
    #[error("Image and mask dimensions do not match: expected {expected:?}, actual {actual:?}")]
    DimensionMismatch {
        /// Expected dimensions (width, height)
        expected: (u32, u32),
        /// Actual dimensions (width, height)
        actual: (u32, u32),
    },

    /// Failed to create ImageBuffer from processed pixels
    #[error("Failed to create ImageBuffer from processed pixels")]
    ImageBufferCreationFailed,
}

/// Error type for effect mode names and opacity values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeError {
    #[error("Unknown mode '{0}'")]
    UnknownMode(String),

    #[error("Opacity must be between 1 and 99, got {0}")]
    OpacityOutOfRange(u32),

    #[error("Invalid opacity value '{0}'")]
    InvalidOpacity(String),
}

/// Error type for loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Failure of one end-to-end processing request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The mask provider threw or returned unusable output
    #[error(transparent)]
    ModelUnavailable(#[from] ProviderError),

    /// The deadline elapsed before the job finished
    ///
    /// The job itself may still be running; its result is discarded.
    #[error("Processing did not finish within {deadline:?}")]
    TimedOut { deadline: Duration },

    #[error(transparent)]
    Effect(#[from] EffectError),

    #[error("Failed to encode PNG output: {0}")]
    Encode(String),

    /// The worker running the job panicked or was torn down
    #[error("Processing worker failed: {0}")]
    Worker(String),
}

impl ProcessError {
    /// The message shown to the requesting user
    ///
    /// Each failure maps to one of a fixed set of messages; internal
    /// invariant violations fall back to the generic processing error.
    pub fn user_message(&self) -> String {
        let message = match self {
            Self::Validation(ValidationError::FileTooLarge { limit, .. }) => {
                return format!(
                    "File too large! Maximum size is {}MB.",
                    limit / (1024 * 1024)
                );
            }
            Self::Validation(ValidationError::UnsupportedFormat(_)) => {
                "Unsupported format! Please send: .jpg, .jpeg, .png, .webp"
            }
            Self::Validation(ValidationError::Corrupt(_)) => {
                "Invalid image file. Please send a valid image."
            }
            Self::Validation(ValidationError::TooSmall { .. }) => {
                "Image too small. Minimum size is 10x10 pixels."
            }
            Self::Validation(ValidationError::DimensionsTooLarge { .. }) => {
                "Image too large. Maximum size is 4096x4096 pixels."
            }
            Self::TimedOut { .. } => "Processing timeout. Please try with a smaller image.",
            Self::ModelUnavailable(_) | Self::Effect(_) | Self::Encode(_) => {
                "Error processing image. Please try again with a different image."
            }
            Self::Worker(_) => "An unexpected error occurred. Please try again later.",
        };
        message.to_string()
    }

    /// Whether the failure came from the validation gate
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
