//! Deterministic pixel stages.
//!
//! Each function borrows its input and returns a new raster of the same
//! dimensions. Alpha passes through untouched except in [`transparency`].
//! Every stage is a pixel-exact no-op at its neutral value.

use super::calculations::{
    MID_GRAY, brightness_offset, contrast_factor, luma, opacity_factor, saturation_factor,
    sharpen_amount, to_channel,
};
use super::params::Sharpening;
use image::{Rgba, RgbaImage};

/// Apply `f` to the RGB part of every pixel, keeping alpha.
fn map_rgb(image: &RgbaImage, f: impl Fn([f32; 3]) -> [f32; 3]) -> RgbaImage {
    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgba([r, g, b, a]) = *image.get_pixel(x, y);
        let [r, g, b] = f([r as f32, g as f32, b as f32]);
        Rgba([to_channel(r), to_channel(g), to_channel(b), a])
    })
}

/// Shift every channel by the brightness offset.
pub fn brightness(image: &RgbaImage, amount: i32) -> RgbaImage {
    let offset = brightness_offset(amount);
    map_rgb(image, |[r, g, b]| [r + offset, g + offset, b + offset])
}

/// Scale every channel's distance from mid-gray.
pub fn contrast(image: &RgbaImage, amount: i32) -> RgbaImage {
    let factor = contrast_factor(amount);
    let scale = |v: f32| (v - MID_GRAY) * factor + MID_GRAY;
    map_rgb(image, |[r, g, b]| [scale(r), scale(g), scale(b)])
}

/// Scale chroma around each pixel's luma.
pub fn saturation(image: &RgbaImage, amount: i32) -> RgbaImage {
    let factor = saturation_factor(amount);
    map_rgb(image, |[r, g, b]| {
        let y = luma(r, g, b);
        [
            y + (r - y) * factor,
            y + (g - y) * factor,
            y + (b - y) * factor,
        ]
    })
}

/// Unsharp mask: add back `amount × (original − blurred)`.
///
/// Differences smaller than `kernel.threshold` are left alone so flat
/// regions don't pick up grain.
pub fn sharpness(image: &RgbaImage, amount: i32, kernel: Sharpening) -> RgbaImage {
    let amount = sharpen_amount(amount);
    let blurred = image::imageops::blur(image, kernel.sigma);
    let threshold = kernel.threshold.max(0) as f32;

    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgba([r, g, b, a]) = *image.get_pixel(x, y);
        let soft = blurred.get_pixel(x, y).0;
        let sharpen = |v: u8, s: u8| {
            let v = v as f32;
            let detail = v - s as f32;
            if detail.abs() < threshold {
                return to_channel(v);
            }
            to_channel(v + amount * detail)
        };
        Rgba([sharpen(r, soft[0]), sharpen(g, soft[1]), sharpen(b, soft[2]), a])
    })
}

/// Scale alpha down. Returns the raster and whether it now carries alpha.
pub fn transparency(image: &RgbaImage, amount: i32, had_alpha: bool) -> (RgbaImage, bool) {
    let factor = opacity_factor(amount);
    let pixels = RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgba([r, g, b, a]) = *image.get_pixel(x, y);
        Rgba([r, g, b, to_channel(a as f32 * factor)])
    });
    (pixels, had_alpha || amount > 0)
}
