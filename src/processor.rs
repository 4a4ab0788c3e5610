use std::time::Instant;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use crate::config::Config;
use crate::effects::engine::TransparencyEffect;
use crate::effects::mode::EffectMode;
use crate::error::ProcessError;
use crate::execution::BoundedExecutor;
use crate::provider::ProviderHandle;
use crate::validation::ValidationGate;

/// Encoded result of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub png: Vec<u8>,
    pub file_name: String,
    pub mode: EffectMode,
    pub width: u32,
    pub height: u32,
}

/// End-to-end pipeline: validation, segmentation, effect, PNG encoding
///
/// Cheap to clone; clones share the provider and the abandoned-job count.
#[derive(Debug, Clone)]
pub struct Processor {
    gate: ValidationGate,
    provider: ProviderHandle,
    executor: BoundedExecutor,
}

impl Processor {
    pub fn new(config: &Config, provider: ProviderHandle) -> Self {
        Self {
            gate: ValidationGate::from_config(config),
            provider,
            executor: BoundedExecutor::new(config.processing_timeout()),
        }
    }

    pub fn executor(&self) -> &BoundedExecutor {
        &self.executor
    }

    /// Processes one upload
    ///
    /// Validation runs on the calling task and short-circuits before the
    /// provider is touched. Segmentation, synthesis and encoding run
    /// together under the deadline.
    ///
    /// # Errors
    ///
    /// * `ProcessError::Validation` - When the upload is rejected
    /// * `ProcessError::ModelUnavailable` - When segmentation fails
    /// * `ProcessError::TimedOut` - When the deadline elapses
    /// * `ProcessError::Effect` - When the provider breaks the mask size contract
    /// * `ProcessError::Encode` - When PNG encoding fails
    pub async fn process(
        &self,
        bytes: &[u8],
        mode: EffectMode,
    ) -> Result<ProcessedImage, ProcessError> {
        let started = Instant::now();
        let validated = self.gate.validate(bytes)?;
        let (width, height) = validated.image.dimensions();
        tracing::info!(
            "Processing {:?} image of size {width}x{height} with {mode} mode",
            validated.format
        );

        let provider = self.provider.clone();
        let png = self
            .executor
            .run(move || -> Result<Vec<u8>, ProcessError> {
                let segmentation = provider.segment(&validated.image)?;
                let rgba = validated
                    .image
                    .apply_segmented_effect(&segmentation, mode)?;
                encode_png(&rgba)
            })
            .await?;

        tracing::info!(
            "Successfully processed image. Output size: {} bytes in {:.1}ms",
            png.len(),
            started.elapsed().as_secs_f64() * 1000.0
        );

        Ok(ProcessedImage {
            png,
            file_name: mode.output_file_name(),
            mode,
            width,
            height,
        })
    }
}

/// Serializes an RGBA image as PNG
///
/// # Errors
///
/// * `ProcessError::Encode` - When the encoder rejects the buffer
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ProcessError> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| ProcessError::Encode(e.to_string()))?;
    Ok(bytes)
}
