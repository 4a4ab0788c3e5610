use image::{Luma, Rgb, Rgba};

use super::alpha_mask::{alpha_channel, validate_dimensions, ApplyAlphaMask};
use super::alpha_rule::AlphaRule;
use super::feather::feather_mask;
use super::mode::EffectMode;
use crate::error::EffectError;
use crate::provider::Segmentation;
use crate::Image;

/// Trait providing transparency effects on RGB images
///
/// Output has the same dimensions as the input, the same RGB values at
/// every pixel, and an alpha channel synthesized according to the mode.
/// The operation is pure: identical inputs give byte-identical output.
pub trait TransparencyEffect {
    /// Applies `mode` using `mask` as the subject/background map
    ///
    /// # Errors
    ///
    /// * `EffectError::DimensionMismatch` - When image and mask dimensions don't match
    ///
    /// # Examples
    ///
    /// ```
    /// use transparency_fx::{EffectMode, Image, TransparencyEffect};
    /// use image::{Luma, Rgb};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let image: Image<Rgb<u8>> = Image::from_pixel(16, 16, Rgb([0, 0, 255]));
    /// let mask: Image<Luma<u8>> = Image::from_fn(16, 16, |x, _| Luma([if x < 8 { 0 } else { 255 }]));
    ///
    /// let semi = image.apply_effect(&mask, EffectMode::Semi)?;
    /// assert_eq!(semi.get_pixel(0, 0)[3], 127);
    /// assert_eq!(semi.get_pixel(15, 0)[3], 255);
    /// # Ok(())
    /// # }
    /// # example().unwrap();
    /// ```
    fn apply_effect(
        &self,
        mask: &Image<Luma<u8>>,
        mode: EffectMode,
    ) -> Result<Image<Rgba<u8>>, EffectError>;

    /// Applies `mode` to the full output of a mask provider
    ///
    /// Identical to [`apply_effect`](Self::apply_effect) except for `Full`,
    /// which takes the subject from the cutout's alpha when one is present.
    ///
    /// # Errors
    ///
    /// * `EffectError::DimensionMismatch` - When the mask or cutout size differs from the image
    fn apply_segmented_effect(
        &self,
        segmentation: &Segmentation,
        mode: EffectMode,
    ) -> Result<Image<Rgba<u8>>, EffectError>;
}

impl TransparencyEffect for Image<Rgb<u8>> {
    fn apply_effect(
        &self,
        mask: &Image<Luma<u8>>,
        mode: EffectMode,
    ) -> Result<Image<Rgba<u8>>, EffectError> {
        let _span = tracing::debug_span!("apply_effect", %mode).entered();
        validate_dimensions(self, mask)?;

        match mode.alpha_rule() {
            AlphaRule::Feathered { sigma } => self.apply_alpha_mask(&feather_mask(mask, sigma)),
            rule => self.apply_alpha_mask_with(mask, |intensity| rule.alpha_for(intensity)),
        }
    }

    fn apply_segmented_effect(
        &self,
        segmentation: &Segmentation,
        mode: EffectMode,
    ) -> Result<Image<Rgba<u8>>, EffectError> {
        match (&segmentation.cutout, mode) {
            (Some(cutout), EffectMode::Full) => {
                validate_dimensions(self, cutout)?;
                let _span = tracing::debug_span!("apply_effect", mode = "full", source = "cutout")
                    .entered();
                let subject = alpha_channel(cutout)?;
                let rule = mode.alpha_rule();
                self.apply_alpha_mask_with(&subject, |intensity| rule.alpha_for(intensity))
            }
            _ => self.apply_effect(&segmentation.mask, mode),
        }
    }
}

/// Applies a transparency effect to `image` using `mask`
///
/// Free-function form of [`TransparencyEffect::apply_effect`].
///
/// # Errors
///
/// * `EffectError::DimensionMismatch` - When image and mask dimensions don't match
pub fn apply(
    image: &Image<Rgb<u8>>,
    mask: &Image<Luma<u8>>,
    mode: EffectMode,
) -> Result<Image<Rgba<u8>>, EffectError> {
    image.apply_effect(mask, mode)
}
