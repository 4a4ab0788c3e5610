use image::{GenericImageView, ImageBuffer, Luma, Rgb, Rgba};
#[cfg(not(feature = "rayon"))]
use itertools::izip;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::error::EffectError;
use crate::Image;

/// Trait providing functionality to attach a mask-derived alpha channel to RGB images
///
/// The colour channels are copied unchanged; only alpha is synthesized. The
/// whole image is produced in one pass over the raw buffers rather than with
/// per-pixel indexed access.
pub trait ApplyAlphaMask {
    /// Uses the mask intensities directly as the alpha channel
    ///
    /// # Errors
    ///
    /// * `EffectError::DimensionMismatch` - When image and mask dimensions don't match
    ///
    /// # Examples
    ///
    /// ```
    /// use transparency_fx::{ApplyAlphaMask, Image};
    /// use image::{Luma, Rgb, Rgba};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let image: Image<Rgb<u8>> = Image::from_pixel(4, 4, Rgb([10, 20, 30]));
    /// let mask: Image<Luma<u8>> = Image::from_pixel(4, 4, Luma([64]));
    ///
    /// let rgba = image.apply_alpha_mask(&mask)?;
    /// assert_eq!(rgba.get_pixel(0, 0), &Rgba([10, 20, 30, 64]));
    /// # Ok(())
    /// # }
    /// # example().unwrap();
    /// ```
    fn apply_alpha_mask(&self, mask: &Image<Luma<u8>>) -> Result<Image<Rgba<u8>>, EffectError> {
        self.apply_alpha_mask_with(mask, |intensity| intensity)
    }

    /// Maps each mask intensity through `rule` to produce the alpha channel
    ///
    /// # Errors
    ///
    /// * `EffectError::DimensionMismatch` - When image and mask dimensions don't match
    /// * `EffectError::ImageBufferCreationFailed` - When the result buffer cannot be built
    fn apply_alpha_mask_with<F>(
        &self,
        mask: &Image<Luma<u8>>,
        rule: F,
    ) -> Result<Image<Rgba<u8>>, EffectError>
    where
        F: Fn(u8) -> u8 + Sync;
}

impl ApplyAlphaMask for Image<Rgb<u8>> {
    fn apply_alpha_mask_with<F>(
        &self,
        mask: &Image<Luma<u8>>,
        rule: F,
    ) -> Result<Image<Rgba<u8>>, EffectError>
    where
        F: Fn(u8) -> u8 + Sync,
    {
        validate_dimensions(self, mask)?;

        let (width, height) = self.dimensions();
        let mut buffer = vec![0u8; width as usize * height as usize * 4];

        #[cfg(not(feature = "rayon"))]
        {
            izip!(
                buffer.chunks_exact_mut(4),
                self.as_raw().chunks_exact(3),
                mask.as_raw().iter()
            )
            .for_each(|(out, rgb, &intensity)| {
                out[..3].copy_from_slice(rgb);
                out[3] = rule(intensity);
            });
        }

        #[cfg(feature = "rayon")]
        {
            buffer
                .par_chunks_exact_mut(4)
                .zip(self.as_raw().par_chunks_exact(3))
                .zip(mask.as_raw().par_iter())
                .for_each(|((out, rgb), &intensity)| {
                    out[..3].copy_from_slice(rgb);
                    out[3] = rule(intensity);
                });
        }

        ImageBuffer::from_raw(width, height, buffer).ok_or(EffectError::ImageBufferCreationFailed)
    }
}

/// Extracts the alpha channel of an RGBA image as a grayscale mask
///
/// # Errors
///
/// * `EffectError::ImageBufferCreationFailed` - When the mask buffer cannot be built
pub fn alpha_channel(image: &Image<Rgba<u8>>) -> Result<Image<Luma<u8>>, EffectError> {
    let (width, height) = image.dimensions();
    let alpha = image.as_raw().chunks_exact(4).map(|pixel| pixel[3]).collect();
    ImageBuffer::from_raw(width, height, alpha).ok_or(EffectError::ImageBufferCreationFailed)
}

/// Checks that `other` has the same width and height as `image`
#[inline]
pub(crate) fn validate_dimensions<I1, I2>(image: &I1, other: &I2) -> Result<(), EffectError>
where
    I1: GenericImageView,
    I2: GenericImageView,
{
    let expected = image.dimensions();
    let actual = other.dimensions();
    if expected == actual {
        Ok(())
    } else {
        Err(EffectError::DimensionMismatch { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_alpha_mask, create_test_rgb_image};

    #[test]
    fn test_validate_dimensions() {
        let image: Image<Rgb<u8>> = Image::new(10, 10);
        let mask: Image<Luma<u8>> = Image::new(10, 10);

        assert!(validate_dimensions(&image, &mask).is_ok());

        let mask_wrong_size: Image<Luma<u8>> = Image::new(5, 5);
        assert_eq!(
            validate_dimensions(&image, &mask_wrong_size),
            Err(EffectError::DimensionMismatch {
                expected: (10, 10),
                actual: (5, 5),
            })
        );
    }

    #[test]
    fn test_apply_alpha_mask_copies_intensity() {
        let image = create_test_rgb_image();
        let mask = create_test_alpha_mask();

        let result = image.apply_alpha_mask(&mask).unwrap();

        assert_eq!(result.get_pixel(0, 0), &Rgba([200, 150, 100, 255]));
        assert_eq!(result.get_pixel(1, 0), &Rgba([100, 200, 150, 192]));
        assert_eq!(result.get_pixel(0, 1), &Rgba([150, 100, 200, 128]));
        assert_eq!(result.get_pixel(1, 1), &Rgba([50, 75, 25, 64]));
    }

    #[test]
    fn test_apply_alpha_mask_with_rule() {
        let image = create_test_rgb_image();
        let mask = create_test_alpha_mask();

        let result = image
            .apply_alpha_mask_with(&mask, |intensity| if intensity > 100 { 1 } else { 2 })
            .unwrap();

        let alphas: Vec<u8> = result.pixels().map(|pixel| pixel[3]).collect();
        assert_eq!(alphas, vec![1, 1, 1, 2]);
    }

    #[test]
    fn test_alpha_channel_extraction() {
        let mut rgba: Image<Rgba<u8>> = Image::new(2, 1);
        rgba.put_pixel(0, 0, Rgba([1, 2, 3, 40]));
        rgba.put_pixel(1, 0, Rgba([4, 5, 6, 250]));

        let alpha = alpha_channel(&rgba).unwrap();
        assert_eq!(alpha.dimensions(), (2, 1));
        assert_eq!(alpha.as_raw(), &vec![40, 250]);
    }
}
