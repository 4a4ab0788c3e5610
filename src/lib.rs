//! Mask-driven transparency effects.
//!
//! An RGB image and a segmentation mask of the same size go in; an RGBA
//! image comes out whose colour channels are untouched and whose alpha
//! channel is synthesized by one of five [`EffectMode`]s. Around the engine
//! sit an upload [`ValidationGate`], a [`MaskProvider`] seam for the
//! segmentation model, a deadline-bounded [`BoundedExecutor`] and the
//! [`Processor`] that ties them together.

pub mod config;
pub mod effects;
pub mod error;
pub mod execution;
pub mod processor;
pub mod provider;
pub mod session;
pub mod validation;

#[cfg(test)]
mod test_utils;

use image::{ImageBuffer, Pixel};

pub use config::{Config, ModelMode, ModelOptions, ResizeMode};
pub use effects::alpha_mask::{alpha_channel, ApplyAlphaMask};
pub use effects::alpha_rule::{
    alpha_from_percent, AlphaRule, FOREGROUND_THRESHOLD, SEMI_BACKGROUND_PERCENT,
    SOFT_EDGE_SIGMA, SUBJECT_PERCENT,
};
pub use effects::engine::{apply, TransparencyEffect};
pub use effects::feather::feather_mask;
pub use effects::mode::{EffectMode, ModeKind, Opacity};
pub use error::{
    ConfigError, EffectError, ModeError, ProcessError, ProviderError, ValidationError,
};
pub use execution::{run_with_deadline, BoundedExecutor};
pub use processor::{encode_png, ProcessedImage, Processor};
pub use provider::{MaskProvider, PrecomputedMask, ProviderHandle, Segmentation};
pub use session::command::Command;
pub use session::rate_limit::RateLimiter;
pub use session::settings::{SettingsStore, UserSettings};
pub use session::UserId;
pub use validation::{ValidatedImage, ValidationGate, MAX_DIMENSION, MIN_DIMENSION};

pub type Image<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;
