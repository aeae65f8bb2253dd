//! Noise models.
//!
//! The random source is always passed in. Production rendering hands over
//! the thread RNG; tests pass a seeded [`rand::rngs::StdRng`] so noisy output
//! is reproducible.

use super::calculations::{gaussian_sigma, salt_pepper_rate, speckle_scale, to_channel};
use super::params::NoiseKind;
use image::{Rgba, RgbaImage};
use rand::Rng;
use rand_distr::StandardNormal;

/// Add noise of `kind` at `intensity` (0..=100). [`NoiseKind::None`] clones.
pub fn apply<R: Rng + ?Sized>(
    image: &RgbaImage,
    kind: NoiseKind,
    intensity: f32,
    rng: &mut R,
) -> RgbaImage {
    match kind {
        NoiseKind::None => image.clone(),
        NoiseKind::Gaussian => gaussian(image, gaussian_sigma(intensity), rng),
        NoiseKind::SaltPepper => salt_pepper(image, salt_pepper_rate(intensity), rng),
        NoiseKind::Speckle => speckle(image, speckle_scale(intensity), rng),
    }
}

/// Additive N(0, sigma) noise, sampled independently per channel.
pub fn gaussian<R: Rng + ?Sized>(image: &RgbaImage, sigma: f32, rng: &mut R) -> RgbaImage {
    let mut out = image.clone();
    for Rgba(p) in out.pixels_mut() {
        for c in p.iter_mut().take(3) {
            let n: f32 = rng.sample(StandardNormal);
            *c = to_channel(*c as f32 + n * sigma);
        }
    }
    out
}

/// Force a `rate` fraction of pixels to pure black or pure white.
///
/// Each pixel is hit independently; a hit pixel is salt or pepper with
/// equal probability. Alpha is kept.
pub fn salt_pepper<R: Rng + ?Sized>(image: &RgbaImage, rate: f64, rng: &mut R) -> RgbaImage {
    let mut out = image.clone();
    for Rgba(p) in out.pixels_mut() {
        if !rng.random_bool(rate) {
            continue;
        }
        let v = if rng.random_bool(0.5) { 255 } else { 0 };
        p[0] = v;
        p[1] = v;
        p[2] = v;
    }
    out
}

/// Multiplicative noise: `v × (1 + n × scale)` with n ~ N(0, 1) per channel.
pub fn speckle<R: Rng + ?Sized>(image: &RgbaImage, scale: f32, rng: &mut R) -> RgbaImage {
    let mut out = image.clone();
    for Rgba(p) in out.pixels_mut() {
        for c in p.iter_mut().take(3) {
            let n: f32 = rng.sample(StandardNormal);
            *c = to_channel(*c as f32 * (1.0 + n * scale));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{gradient, solid};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn extreme_fraction(image: &RgbaImage) -> f64 {
        let hits = image
            .pixels()
            .filter(|p| p.0[..3] == [0, 0, 0] || p.0[..3] == [255, 255, 255])
            .count();
        hits as f64 / (image.width() * image.height()) as f64
    }

    #[test]
    fn none_is_identity() {
        let src = gradient(10, 10);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(&apply(src.as_rgba(), NoiseKind::None, 80.0, &mut rng), src.as_rgba());
    }

    #[test]
    fn zero_intensity_is_identity_for_every_kind() {
        let src = gradient(10, 10);
        let mut rng = StdRng::seed_from_u64(2);
        for kind in NoiseKind::ALL {
            assert_eq!(
                &apply(src.as_rgba(), kind, 0.0, &mut rng),
                src.as_rgba(),
                "{kind} changed pixels at zero intensity"
            );
        }
    }

    #[test]
    fn same_seed_same_noise() {
        let src = gradient(20, 20);
        for kind in [NoiseKind::Gaussian, NoiseKind::SaltPepper, NoiseKind::Speckle] {
            let a = apply(src.as_rgba(), kind, 40.0, &mut StdRng::seed_from_u64(7));
            let b = apply(src.as_rgba(), kind, 40.0, &mut StdRng::seed_from_u64(7));
            assert_eq!(a, b, "{kind} not reproducible");
        }
    }

    #[test]
    fn gaussian_perturbs_around_source() {
        let src = solid(64, 64, [128, 128, 128]);
        let out = gaussian(src.as_rgba(), 10.0, &mut StdRng::seed_from_u64(3));
        assert_ne!(&out, src.as_rgba());

        let samples: Vec<f64> = out.pixels().map(|p| p.0[0] as f64).collect();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / samples.len() as f64;
        assert!((mean - 128.0).abs() < 1.5, "mean drifted to {mean}");
        assert!((var.sqrt() - 10.0).abs() < 1.5, "stddev was {}", var.sqrt());
    }

    #[test]
    fn salt_pepper_hits_requested_fraction() {
        let src = solid(100, 100, [100, 150, 200]);
        let out = salt_pepper(src.as_rgba(), 0.5, &mut StdRng::seed_from_u64(4));
        let fraction = extreme_fraction(&out);
        assert!((fraction - 0.5).abs() <= 0.05, "fraction was {fraction}");
    }

    #[test]
    fn salt_pepper_produces_both_extremes() {
        let src = solid(50, 50, [100, 100, 100]);
        let out = salt_pepper(src.as_rgba(), 0.3, &mut StdRng::seed_from_u64(5));
        assert!(out.pixels().any(|p| p.0[..3] == [0, 0, 0]));
        assert!(out.pixels().any(|p| p.0[..3] == [255, 255, 255]));
    }

    #[test]
    fn salt_pepper_keeps_alpha() {
        let px = RgbaImage::from_pixel(20, 20, Rgba([100, 100, 100, 42]));
        let out = salt_pepper(&px, 1.0, &mut StdRng::seed_from_u64(6));
        assert!(out.pixels().all(|p| p.0[3] == 42));
        assert_eq!(extreme_fraction(&out), 1.0);
    }

    #[test]
    fn speckle_spares_black() {
        let src = solid(16, 16, [0, 0, 0]);
        let out = speckle(src.as_rgba(), 1.0, &mut StdRng::seed_from_u64(8));
        assert_eq!(&out, src.as_rgba());
    }

    #[test]
    fn speckle_scales_with_brightness() {
        let dark = solid(64, 64, [20, 20, 20]);
        let bright = solid(64, 64, [200, 200, 200]);
        let spread = |img: &RgbaImage, base: u8| {
            img.pixels()
                .map(|p| p.0[0].abs_diff(base) as u64)
                .sum::<u64>()
        };
        let d = speckle(dark.as_rgba(), 0.2, &mut StdRng::seed_from_u64(9));
        let b = speckle(bright.as_rgba(), 0.2, &mut StdRng::seed_from_u64(9));
        assert!(spread(&b, 200) > spread(&d, 20));
    }
}
