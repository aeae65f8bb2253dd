//! The adjustment pipeline.
//!
//! Stages run in a fixed order, each consuming the previous stage's output:
//!
//! ```text
//! brightness → contrast → saturation → sharpness → noise → transparency
//! ```
//!
//! A stage at its neutral value returns its input pixel-for-pixel, so any
//! subset of adjustments runs through the same code path. Params that cannot
//! change a pixel at all ([`AdjustmentParams::is_identity`]) skip the stages
//! and return a copy of the source.

use super::adjust;
use super::buffer::ImageBuffer;
use super::noise;
use super::params::{AdjustmentParams, ParamsError, Sharpening};
use image::RgbaImage;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Invalid adjustment parameters: {0}")]
    InvalidParams(#[from] ParamsError),
    #[error("Cannot render an empty {width}x{height} image")]
    EmptyImage { width: u32, height: u32 },
}

/// Renders a source image with a parameter set.
///
/// Holds only configuration (the sharpening kernel); nothing carries over
/// between calls.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AdjustmentPipeline {
    kernel: Sharpening,
}

impl AdjustmentPipeline {
    pub fn new(kernel: Sharpening) -> Self {
        Self { kernel }
    }

    /// Render with the thread RNG. Noise makes output vary between calls;
    /// without noise the result is deterministic.
    pub fn render(
        &self,
        source: &ImageBuffer,
        params: &AdjustmentParams,
    ) -> Result<ImageBuffer, RenderError> {
        self.render_with_rng(source, params, &mut rand::rng())
    }

    /// Render drawing noise from `rng`.
    pub fn render_with_rng<R: Rng + ?Sized>(
        &self,
        source: &ImageBuffer,
        params: &AdjustmentParams,
        rng: &mut R,
    ) -> Result<ImageBuffer, RenderError> {
        let rendered = self.render_abortable(source, params, rng, || false)?;
        // The predicate never fires, so a result is always produced.
        Ok(rendered.unwrap_or_else(|| source.clone()))
    }

    /// Render, checking `should_abort` before each stage.
    ///
    /// Returns `Ok(None)` if the predicate fired. Used by the preview
    /// renderer to drop work that a newer request has superseded.
    #[instrument(skip_all, fields(width = source.width(), height = source.height()))]
    pub fn render_abortable<R, F>(
        &self,
        source: &ImageBuffer,
        params: &AdjustmentParams,
        rng: &mut R,
        should_abort: F,
    ) -> Result<Option<ImageBuffer>, RenderError>
    where
        R: Rng + ?Sized,
        F: Fn() -> bool,
    {
        if source.is_empty() {
            return Err(RenderError::EmptyImage {
                width: source.width(),
                height: source.height(),
            });
        }
        params.validate()?;
        if params.is_identity() {
            debug!("Identity params, copying source");
            return Ok(Some(source.clone()));
        }
        debug!(?params, "Rendering");

        let stages: [&dyn Fn(&RgbaImage, &mut R) -> RgbaImage; 5] = [
            &|img, _| adjust::brightness(img, params.brightness),
            &|img, _| adjust::contrast(img, params.contrast),
            &|img, _| adjust::saturation(img, params.saturation),
            &|img, _| adjust::sharpness(img, params.sharpness, self.kernel),
            &|img, rng| noise::apply(img, params.noise, params.noise_intensity, rng),
        ];

        let mut current: Option<RgbaImage> = None;
        for stage in stages {
            if should_abort() {
                debug!("Render superseded");
                return Ok(None);
            }
            let input = current.as_ref().unwrap_or_else(|| source.as_rgba());
            current = Some(stage(input, rng));
        }

        if should_abort() {
            debug!("Render superseded");
            return Ok(None);
        }
        let input = current.as_ref().unwrap_or_else(|| source.as_rgba());
        let (pixels, has_alpha) =
            adjust::transparency(input, params.transparency, source.has_alpha());

        Ok(Some(source.derive(pixels, has_alpha)))
    }
}
