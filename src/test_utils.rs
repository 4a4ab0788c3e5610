//! Fixtures for the unit tests. Only compiled under `cfg(test)`.

use image::{Luma, Rgb};

use crate::Image;

/// 2x2 RGB image with known pixel values:
/// - (0,0): [200, 150, 100]
/// - (1,0): [100, 200, 150]
/// - (0,1): [150, 100, 200]
/// - (1,1): [50, 75, 25]
pub fn create_test_rgb_image() -> Image<Rgb<u8>> {
    let mut image: Image<Rgb<u8>> = Image::new(2, 2);
    image.put_pixel(0, 0, Rgb([200, 150, 100]));
    image.put_pixel(1, 0, Rgb([100, 200, 150]));
    image.put_pixel(0, 1, Rgb([150, 100, 200]));
    image.put_pixel(1, 1, Rgb([50, 75, 25]));
    image
}

/// 2x2 mask straddling the foreground threshold:
/// - (0,0): [255]
/// - (1,0): [192]
/// - (0,1): [128]
/// - (1,1): [64]
pub fn create_test_alpha_mask() -> Image<Luma<u8>> {
    let mut mask: Image<Luma<u8>> = Image::new(2, 2);
    mask.put_pixel(0, 0, Luma([255]));
    mask.put_pixel(1, 0, Luma([192]));
    mask.put_pixel(0, 1, Luma([128]));
    mask.put_pixel(1, 1, Luma([64]));
    mask
}

/// Checkerboard RGB image of the given size
pub fn create_large_test_image(width: u32, height: u32) -> Image<Rgb<u8>> {
    Image::from_fn(width, height, |x, y| {
        if (x + y) % 2 == 0 {
            Rgb([200, 150, 100])
        } else {
            Rgb([100, 150, 200])
        }
    })
}

/// Binary mask with a filled disc of `radius` centred in the image
pub fn create_circle_mask(width: u32, height: u32, radius: f32) -> Image<Luma<u8>> {
    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;
    Image::from_fn(width, height, |x, y| {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        if dx * dx + dy * dy <= radius * radius {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_large_test_image_is_a_checkerboard() {
        let image = create_large_test_image(10, 10);
        assert_eq!(image.dimensions(), (10, 10));
        assert_eq!(image.get_pixel(0, 0), &Rgb([200, 150, 100]));
        assert_eq!(image.get_pixel(1, 0), &Rgb([100, 150, 200]));
        assert_eq!(image.get_pixel(0, 1), &Rgb([100, 150, 200]));
        assert_eq!(image.get_pixel(1, 1), &Rgb([200, 150, 100]));
    }

    #[test]
    fn create_circle_mask_fills_the_centre_only() {
        let mask = create_circle_mask(21, 21, 5.0);
        assert_eq!(mask.get_pixel(10, 10), &Luma([255]));
        assert_eq!(mask.get_pixel(15, 10), &Luma([255]));
        assert_eq!(mask.get_pixel(16, 10), &Luma([0]));
        assert_eq!(mask.get_pixel(0, 0), &Luma([0]));
    }
}
