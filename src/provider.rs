//! Boundary to the external segmentation model.
//!
//! The model itself is opaque: the crate only sees something that, given an
//! RGB image, returns a grayscale mask and possibly a finished cutout.

use std::fmt;
use std::sync::{Arc, Mutex};

use image::{GrayImage, RgbImage, RgbaImage};

use crate::config::ModelOptions;
use crate::error::ProviderError;

/// Output of one segmentation call
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    /// Foreground intensity, 0 = background, 255 = subject
    pub mask: GrayImage,
    /// RGBA image whose background alpha is already forced to zero
    pub cutout: Option<RgbaImage>,
}

impl Segmentation {
    pub fn from_mask(mask: GrayImage) -> Self {
        Self { mask, cutout: None }
    }

    pub fn with_cutout(mut self, cutout: RgbaImage) -> Self {
        self.cutout = Some(cutout);
        self
    }
}

/// Trait for segmentation backends
///
/// Calls block for an unspecified, seconds-scale duration. Implementations
/// must be safe to share between threads; a backend that cannot run two
/// inferences at once should be wrapped with [`ProviderHandle::serialized`].
pub trait MaskProvider: Send + Sync {
    /// Segments `image` into subject and background
    ///
    /// # Errors
    ///
    /// * `ProviderError::Unavailable` - When the model cannot be invoked
    /// * `ProviderError::InvalidOutput` - When the model output is unusable
    fn segment(&self, image: &RgbImage) -> Result<Segmentation, ProviderError>;
}

impl<F> MaskProvider for F
where
    F: Fn(&RgbImage) -> Result<Segmentation, ProviderError> + Send + Sync,
{
    fn segment(&self, image: &RgbImage) -> Result<Segmentation, ProviderError> {
        self(image)
    }
}

/// Provider returning a mask computed ahead of time
///
/// Used when the segmentation already happened elsewhere, e.g. a mask file
/// written next to the source image.
#[derive(Debug, Clone)]
pub struct PrecomputedMask {
    segmentation: Segmentation,
}

impl PrecomputedMask {
    pub fn new(mask: GrayImage) -> Self {
        Self {
            segmentation: Segmentation::from_mask(mask),
        }
    }

    pub fn with_cutout(mut self, cutout: RgbaImage) -> Self {
        self.segmentation.cutout = Some(cutout);
        self
    }
}

impl MaskProvider for PrecomputedMask {
    fn segment(&self, _image: &RgbImage) -> Result<Segmentation, ProviderError> {
        Ok(self.segmentation.clone())
    }
}

/// Queues calls to a provider that is not re-entrant
struct Serialized<P> {
    inner: Mutex<P>,
}

impl<P: MaskProvider> MaskProvider for Serialized<P> {
    fn segment(&self, image: &RgbImage) -> Result<Segmentation, ProviderError> {
        let provider = self
            .inner
            .lock()
            .map_err(|_| ProviderError::Unavailable("provider lock poisoned".to_string()))?;
        provider.segment(image)
    }
}

/// Process-wide handle to the single mask provider
///
/// Built once at startup and cloned into every request; clones share the
/// same provider instance.
#[derive(Clone)]
pub struct ProviderHandle {
    provider: Arc<dyn MaskProvider>,
}

impl ProviderHandle {
    /// Wraps a provider whose `segment` may run concurrently
    pub fn new<P: MaskProvider + 'static>(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Wraps a provider so that at most one `segment` call runs at a time
    pub fn serialized<P: MaskProvider + 'static>(provider: P) -> Self {
        Self {
            provider: Arc::new(Serialized {
                inner: Mutex::new(provider),
            }),
        }
    }

    /// Constructs the provider from its model options, failing fast
    ///
    /// # Errors
    ///
    /// Returns whatever the factory returns; nothing is retried.
    pub fn init<P, F>(options: &ModelOptions, factory: F) -> Result<Self, ProviderError>
    where
        P: MaskProvider + 'static,
        F: FnOnce(&ModelOptions) -> Result<P, ProviderError>,
    {
        tracing::info!(
            mode = %options.mode,
            use_jit = options.use_jit,
            resize_mode = %options.resize_mode,
            "Initializing mask provider"
        );
        match factory(options) {
            Ok(provider) => {
                tracing::info!("Mask provider initialized successfully");
                Ok(Self::new(provider))
            }
            Err(error) => {
                tracing::error!("Failed to initialize mask provider: {error}");
                Err(error)
            }
        }
    }

    pub fn segment(&self, image: &RgbImage) -> Result<Segmentation, ProviderError> {
        let _span = tracing::debug_span!("segment", width = image.width(), height = image.height())
            .entered();
        self.provider.segment(image)
    }
}

impl fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderHandle").finish_non_exhaustive()
    }
}
