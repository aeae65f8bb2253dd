//! Shared test utilities: synthetic source images.
//!
//! Everything here is built in memory so tests never depend on fixture files.

use crate::imaging::ImageBuffer;
use image::{Rgba, RgbaImage};

/// Opaque image whose channels vary with position, so most pixels are
/// distinct and mid-range.
pub fn gradient(width: u32, height: u32) -> ImageBuffer {
    let pixels = RgbaImage::from_fn(width, height, |x, y| {
        let r = 30 + (x * 190 / width.max(1)) as u8;
        let g = 30 + (y * 190 / height.max(1)) as u8;
        let b = 60 + ((x + y) % 130) as u8;
        Rgba([r, g, b, 255])
    });
    ImageBuffer::from_rgba(pixels, false)
}

/// Opaque single-colour image.
pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> ImageBuffer {
    let [r, g, b] = rgb;
    ImageBuffer::from_rgba(RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255])), false)
}

/// Encode `image` as PNG bytes.
pub fn png_bytes(image: &ImageBuffer) -> Vec<u8> {
    image
        .encode(image::ImageFormat::Png, crate::imaging::Quality::default())
        .unwrap()
}
