//! Pure calculation functions: slider values to transform coefficients.
//!
//! All functions here are pure and testable without any images. Keeping the
//! mapping in one place makes the numeric behaviour of each slider easy to
//! audit and to change.

/// Mid-point of the 8-bit channel range; contrast pivots around it.
pub const MID_GRAY: f32 = 128.0;

/// Round and clamp a working value back into an 8-bit channel.
#[inline]
pub fn to_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Additive channel offset for a brightness value in -100..=100.
///
/// Linear: -100 → -255 (black), +100 → +255 (white).
pub fn brightness_offset(brightness: i32) -> f32 {
    brightness as f32 * 255.0 / 100.0
}

/// Contrast scale factor for a contrast value in -100..=100.
///
/// Uses the common `259(C + 255) / (255(259 − C))` curve with `C` rescaled to
/// -255..=255. 0 maps to exactly 1.0, -100 to 0.0 (flat mid-gray) and +100
/// to about 129.5, which pushes every channel to 0 or 255.
pub fn contrast_factor(contrast: i32) -> f32 {
    let c = contrast as f32 * 255.0 / 100.0;
    (259.0 * (c + 255.0)) / (255.0 * (259.0 - c))
}

/// Chroma scale for a saturation value in -100..=100.
///
/// -100 → 0.0 (grayscale), 0 → 1.0, +100 → 2.0.
pub fn saturation_factor(saturation: i32) -> f32 {
    1.0 + saturation as f32 / 100.0
}

/// Rec. 601 luma of an RGB triple.
#[inline]
pub fn luma(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

/// Unsharp-mask amount for a sharpness value in 0..=100.
///
/// 100 adds twice the detail layer back.
pub fn sharpen_amount(sharpness: i32) -> f32 {
    sharpness as f32 / 100.0 * 2.0
}

/// Standard deviation, in channel units, of Gaussian noise.
pub fn gaussian_sigma(intensity: f32) -> f32 {
    intensity
}

/// Fraction of pixels hit by salt-and-pepper noise.
pub fn salt_pepper_rate(intensity: f32) -> f64 {
    (intensity as f64 / 100.0).clamp(0.0, 1.0)
}

/// Scale applied to the unit normal sample in speckle noise.
pub fn speckle_scale(intensity: f32) -> f32 {
    intensity / 100.0
}

/// Alpha multiplier for a transparency value in 0..=100.
pub fn opacity_factor(transparency: i32) -> f32 {
    1.0 - transparency as f32 / 100.0
}

/// Calculate dimensions that fit within a square box, preserving aspect ratio.
///
/// Images already inside the box keep their size; nothing is upscaled. Each
/// output dimension is at least 1.
///
/// # Examples
/// ```
/// # use image_tune::imaging::calculations::fit_within;
/// assert_eq!(fit_within((1600, 1200), 800), (800, 600));
/// assert_eq!(fit_within((300, 200), 800), (300, 200));
/// ```
pub fn fit_within(source: (u32, u32), max_dimension: u32) -> (u32, u32) {
    let (w, h) = source;
    let longer = w.max(h);
    if longer <= max_dimension || longer == 0 {
        return (w, h);
    }
    let ratio = max_dimension as f64 / longer as f64;
    let fit = |v: u32| ((v as f64 * ratio).round() as u32).max(1);
    (fit(w), fit(h))
}
