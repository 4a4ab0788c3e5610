use image::Luma;
use imageproc::filter::gaussian_blur_f32;

use crate::Image;

/// Softens a hard mask boundary into a gradual ramp with a Gaussian blur
///
/// A non-positive or non-finite `sigma` leaves the mask unchanged, since the
/// underlying filter rejects it.
pub fn feather_mask(mask: &Image<Luma<u8>>, sigma: f32) -> Image<Luma<u8>> {
    if !(sigma.is_finite() && sigma > 0.0) {
        return mask.clone();
    }
    gaussian_blur_f32(mask, sigma)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half_split_mask(width: u32, height: u32) -> Image<Luma<u8>> {
        Image::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }

    #[test]
    fn uniform_mask_is_unchanged() {
        let mask: Image<Luma<u8>> = Image::from_pixel(24, 24, Luma([200]));
        let feathered = feather_mask(&mask, 3.0);
        assert!(feathered.pixels().all(|&Luma([value])| value.abs_diff(200) <= 1));
    }

    #[test]
    fn hard_edge_becomes_monotonic_ramp() {
        let mask = half_split_mask(40, 8);
        let feathered = feather_mask(&mask, 3.0);

        let row: Vec<u8> = (0..40).map(|x| feathered.get_pixel(x, 4)[0]).collect();
        assert!(row.windows(2).all(|pair| pair[0] <= pair[1]));

        // Intermediate values appear near the edge
        assert!(row.iter().any(|&value| value > 0 && value < 255));
        assert_eq!(row[0], 0);
        assert!(row[39] >= 254);
    }

    #[test]
    fn non_positive_sigma_is_identity() {
        let mask = half_split_mask(12, 12);
        assert_eq!(feather_mask(&mask, 0.0), mask);
        assert_eq!(feather_mask(&mask, f32::NAN), mask);
    }

    #[test]
    fn dimensions_are_preserved() {
        let mask = half_split_mask(31, 17);
        assert_eq!(feather_mask(&mask, 3.0).dimensions(), (31, 17));
    }
}
