//! Parameter types for image adjustments.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the editor (which owns the current slider values) and
//! the [`pipeline`](super::pipeline) (which does the pixel work).
//!
//! ## Types
//!
//! - [`AdjustmentParams`]: the full slider set. Setters clamp, never reject.
//! - [`NoiseKind`]: the noise catalogue offered by the selector.
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`Sharpening`]: Unsharp-mask kernel parameters (sigma + threshold).

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use thiserror::Error;

/// Range of the brightness, contrast and saturation sliders.
pub const SIGNED_RANGE: RangeInclusive<i32> = -100..=100;
/// Range of the sharpness and transparency sliders.
pub const UNSIGNED_RANGE: RangeInclusive<i32> = 0..=100;
/// Range of the noise intensity slider.
pub const INTENSITY_RANGE: RangeInclusive<f32> = 0.0..=100.0;

/// JPEG quality used when saving. Other output formats are lossless and
/// ignore it.
///
/// Always within [`Quality::RANGE`]: out-of-range requests are clamped, so a
/// bad config value can never reach the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub const RANGE: RangeInclusive<u32> = 1..=100;

    pub fn new(value: u32) -> Self {
        let clamped = value.clamp(*Self::RANGE.start(), *Self::RANGE.end());
        Self(clamped as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Sharpening kernel for the unsharp mask.
///
/// - `sigma`: Standard deviation of the Gaussian blur (wider = coarser detail is boosted)
/// - `threshold`: Minimum difference from the blur to sharpen (0 = sharpen all pixels)
///
/// How *much* to sharpen comes from [`AdjustmentParams::sharpness`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub sigma: f32,
    pub threshold: i32,
}

impl Default for Sharpening {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            threshold: 0,
        }
    }
}

/// Noise models the pipeline can add after sharpening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NoiseKind {
    #[default]
    None,
    /// Additive normally distributed noise.
    Gaussian,
    /// Random pixels forced to pure black or pure white.
    SaltPepper,
    /// Multiplicative noise, stronger in bright areas.
    Speckle,
}

impl NoiseKind {
    /// Every kind, in selector order.
    pub const ALL: [NoiseKind; 4] = [
        NoiseKind::None,
        NoiseKind::Gaussian,
        NoiseKind::SaltPepper,
        NoiseKind::Speckle,
    ];

    pub fn label(self) -> &'static str {
        match self {
            NoiseKind::None => "None",
            NoiseKind::Gaussian => "Gaussian",
            NoiseKind::SaltPepper => "Salt & Pepper",
            NoiseKind::Speckle => "Speckle",
        }
    }
}

impl fmt::Display for NoiseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a string names no known noise kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown noise kind: {0}")]
pub struct UnknownNoiseKind(pub String);

/// Why a parameter set was refused by [`AdjustmentParams::validate`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
    #[error("{field} must be {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl FromStr for NoiseKind {
    type Err = UnknownNoiseKind;

    /// Accepts labels and their compact forms: `"salt & pepper"`,
    /// `"salt-pepper"`, `"salt_pepper"` and `"saltpepper"` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "none" | "off" => Ok(NoiseKind::None),
            "gaussian" => Ok(NoiseKind::Gaussian),
            "saltpepper" => Ok(NoiseKind::SaltPepper),
            "speckle" => Ok(NoiseKind::Speckle),
            _ => Err(UnknownNoiseKind(s.to_string())),
        }
    }
}

/// The complete set of adjustments applied to a source image.
///
/// Fields are public so the editor can read them back into its widgets, but
/// values should go through the `with_*` setters or [`clamped`](Self::clamped),
/// which clamp to the declared ranges. The pipeline re-checks with
/// [`validate`](Self::validate) and refuses out-of-range values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AdjustmentParams {
    /// Additive brightness shift, -100..=100.
    pub brightness: i32,
    /// Contrast around mid-gray, -100..=100.
    pub contrast: i32,
    /// Chroma scale, -100 (grayscale) ..=100.
    pub saturation: i32,
    /// Unsharp-mask strength, 0..=100.
    pub sharpness: i32,
    pub noise: NoiseKind,
    /// 0..=100. Ignored when `noise` is [`NoiseKind::None`].
    pub noise_intensity: f32,
    /// Opacity reduction, 0 (opaque) ..=100 (fully transparent).
    pub transparency: i32,
}

impl AdjustmentParams {
    /// The neutral parameter set: rendering with it returns the source unchanged.
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn with_brightness(mut self, value: i32) -> Self {
        self.brightness = clamp_signed(value);
        self
    }

    pub fn with_contrast(mut self, value: i32) -> Self {
        self.contrast = clamp_signed(value);
        self
    }

    pub fn with_saturation(mut self, value: i32) -> Self {
        self.saturation = clamp_signed(value);
        self
    }

    pub fn with_sharpness(mut self, value: i32) -> Self {
        self.sharpness = clamp_unsigned(value);
        self
    }

    pub fn with_noise(mut self, kind: NoiseKind, intensity: f32) -> Self {
        self.noise = kind;
        self.noise_intensity = clamp_intensity(intensity);
        self
    }

    pub fn with_transparency(mut self, value: i32) -> Self {
        self.transparency = clamp_unsigned(value);
        self
    }

    /// Clamp every field into its declared range.
    pub fn clamped(self) -> Self {
        Self {
            brightness: clamp_signed(self.brightness),
            contrast: clamp_signed(self.contrast),
            saturation: clamp_signed(self.saturation),
            sharpness: clamp_unsigned(self.sharpness),
            noise: self.noise,
            noise_intensity: clamp_intensity(self.noise_intensity),
            transparency: clamp_unsigned(self.transparency),
        }
    }

    /// True when rendering with these params cannot change any pixel.
    pub fn is_identity(&self) -> bool {
        self.brightness == 0
            && self.contrast == 0
            && self.saturation == 0
            && self.sharpness == 0
            && (self.noise == NoiseKind::None || self.noise_intensity == 0.0)
            && self.transparency == 0
    }

    /// Check every field against its range.
    ///
    /// Reports the first offending field.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let signed = [
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("saturation", self.saturation),
        ];
        let unsigned = [
            ("sharpness", self.sharpness),
            ("transparency", self.transparency),
        ];
        let stepped = signed
            .into_iter()
            .map(|(field, value)| (field, value, &SIGNED_RANGE))
            .chain(
                unsigned
                    .into_iter()
                    .map(|(field, value)| (field, value, &UNSIGNED_RANGE)),
            );
        for (field, value, range) in stepped {
            if !range.contains(&value) {
                return Err(ParamsError::OutOfRange {
                    field,
                    value: value as f64,
                    min: *range.start() as f64,
                    max: *range.end() as f64,
                });
            }
        }
        if !INTENSITY_RANGE.contains(&self.noise_intensity) {
            return Err(ParamsError::OutOfRange {
                field: "noise_intensity",
                value: self.noise_intensity as f64,
                min: *INTENSITY_RANGE.start() as f64,
                max: *INTENSITY_RANGE.end() as f64,
            });
        }
        Ok(())
    }
}

fn clamp_signed(value: i32) -> i32 {
    value.clamp(*SIGNED_RANGE.start(), *SIGNED_RANGE.end())
}

fn clamp_unsigned(value: i32) -> i32 {
    value.clamp(*UNSIGNED_RANGE.start(), *UNSIGNED_RANGE.end())
}

fn clamp_intensity(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(*INTENSITY_RANGE.start(), *INTENSITY_RANGE.end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_90() {
        assert_eq!(Quality::default().value(), 90);
    }

    #[test]
    fn sharpening_default_values() {
        let s = Sharpening::default();
        assert_eq!(s.sigma, 1.0);
        assert_eq!(s.threshold, 0);
    }

    #[test]
    fn brightness_clamps_both_ends() {
        assert_eq!(AdjustmentParams::identity().with_brightness(150).brightness, 100);
        assert_eq!(AdjustmentParams::identity().with_brightness(-150).brightness, -100);
        assert_eq!(AdjustmentParams::identity().with_brightness(42).brightness, 42);
    }

    #[test]
    fn sharpness_and_transparency_clamp_to_unsigned() {
        let p = AdjustmentParams::identity()
            .with_sharpness(-5)
            .with_transparency(300);
        assert_eq!(p.sharpness, 0);
        assert_eq!(p.transparency, 100);
    }

    #[test]
    fn noise_intensity_clamps_and_rejects_nan() {
        let p = AdjustmentParams::identity().with_noise(NoiseKind::Gaussian, 250.0);
        assert_eq!(p.noise_intensity, 100.0);
        let p = AdjustmentParams::identity().with_noise(NoiseKind::Gaussian, f32::NAN);
        assert_eq!(p.noise_intensity, 0.0);
    }

    #[test]
    fn clamped_fixes_every_field() {
        let raw = AdjustmentParams {
            brightness: 500,
            contrast: -500,
            saturation: 101,
            sharpness: 101,
            noise: NoiseKind::Speckle,
            noise_intensity: -1.0,
            transparency: -1,
        };
        let p = raw.clamped();
        assert_eq!(p.brightness, 100);
        assert_eq!(p.contrast, -100);
        assert_eq!(p.saturation, 100);
        assert_eq!(p.sharpness, 100);
        assert_eq!(p.noise_intensity, 0.0);
        assert_eq!(p.transparency, 0);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn validate_names_offending_field() {
        let p = AdjustmentParams {
            contrast: 120,
            ..AdjustmentParams::default()
        };
        let err = p.validate().unwrap_err();
        assert_eq!(
            err,
            ParamsError::OutOfRange {
                field: "contrast",
                value: 120.0,
                min: -100.0,
                max: 100.0,
            }
        );
        assert_eq!(err.to_string(), "contrast must be -100..=100, got 120");
    }

    #[test]
    fn validate_reports_nan_intensity() {
        let p = AdjustmentParams {
            noise: NoiseKind::Speckle,
            noise_intensity: f32::NAN,
            ..AdjustmentParams::default()
        };
        assert!(matches!(
            p.validate(),
            Err(ParamsError::OutOfRange {
                field: "noise_intensity",
                ..
            })
        ));
    }

    #[test]
    fn unknown_noise_kind_message() {
        let err = "perlin".parse::<NoiseKind>().unwrap_err();
        assert_eq!(err, UnknownNoiseKind("perlin".into()));
        assert_eq!(err.to_string(), "unknown noise kind: perlin");
        // Usable as a boxed error alongside the other error types
        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn identity_detection() {
        assert!(AdjustmentParams::identity().is_identity());
        // A noise kind with zero intensity cannot change pixels
        assert!(
            AdjustmentParams::identity()
                .with_noise(NoiseKind::Gaussian, 0.0)
                .is_identity()
        );
        assert!(!AdjustmentParams::identity().with_sharpness(1).is_identity());
    }

    #[test]
    fn noise_kind_parses_labels_and_compact_forms() {
        for kind in NoiseKind::ALL {
            assert_eq!(kind.label().parse::<NoiseKind>().unwrap(), kind);
        }
        assert_eq!("salt-pepper".parse::<NoiseKind>().unwrap(), NoiseKind::SaltPepper);
        assert_eq!("GAUSSIAN".parse::<NoiseKind>().unwrap(), NoiseKind::Gaussian);
        assert!("perlin".parse::<NoiseKind>().is_err());
    }
}
