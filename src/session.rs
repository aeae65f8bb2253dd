//! The editor state a GUI binds to.
//!
//! [`EditorSession`] owns everything the window needs between events: the
//! loaded source image, the current [`AdjustmentParams`], the preview
//! renderer and the configuration. Widget callbacks call into it; it never
//! calls back out, so any toolkit can drive it.
//!
//! ## Lifecycle
//!
//! ```text
//! new(config) ──► open(path) ──► set_slider(..) / set_noise_kind(..) ──► poll_preview()
//!                    │                     │                                  │
//!                    │                     └──── request_preview() ◄──────────┘
//!                    └──► save(path, format)    (renders the full-resolution source)
//! ```
//!
//! Until an image is loaded, edits are stored but nothing renders; the GUI
//! should keep the sliders disabled ([`EditorSession::is_editable`]).
//!
//! Every failure is returned to the caller and logged; a failed open keeps the
//! previously loaded image on screen.

use crate::config::{ConfigError, EditorConfig};
use crate::imaging::{
    AdjustmentParams, AdjustmentPipeline, ImageBuffer, ImageError, NoiseKind, RenderError,
    format_for_path, is_output_format,
};
use crate::preview::{PreviewError, PreviewRenderer, RenderedPreview};
use image::ImageFormat;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No image loaded")]
    NoImage,
    #[error("Image error: {0}")]
    Image(#[from] ImageError),
    #[error("Render failed: {0}")]
    Render(#[from] RenderError),
    #[error("Preview error: {0}")]
    Preview(#[from] PreviewError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// The numeric controls exposed to the user, one per slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slider {
    Brightness,
    Contrast,
    Saturation,
    Sharpness,
    NoiseIntensity,
    Transparency,
}

impl Slider {
    /// Every slider, in panel order.
    pub const ALL: [Slider; 6] = [
        Slider::Brightness,
        Slider::Contrast,
        Slider::Saturation,
        Slider::Sharpness,
        Slider::NoiseIntensity,
        Slider::Transparency,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Slider::Brightness => "Brightness",
            Slider::Contrast => "Contrast",
            Slider::Saturation => "Saturation",
            Slider::Sharpness => "Sharpness",
            Slider::NoiseIntensity => "Noise",
            Slider::Transparency => "Transparency",
        }
    }

    /// The widget range for this slider.
    pub fn range(self) -> RangeInclusive<f64> {
        match self {
            Slider::Brightness | Slider::Contrast | Slider::Saturation => -100.0..=100.0,
            Slider::Sharpness | Slider::NoiseIntensity | Slider::Transparency => 0.0..=100.0,
        }
    }

    /// Read this slider's current position out of `params`.
    pub fn value(self, params: &AdjustmentParams) -> f64 {
        match self {
            Slider::Brightness => params.brightness as f64,
            Slider::Contrast => params.contrast as f64,
            Slider::Saturation => params.saturation as f64,
            Slider::Sharpness => params.sharpness as f64,
            Slider::NoiseIntensity => params.noise_intensity as f64,
            Slider::Transparency => params.transparency as f64,
        }
    }

    /// Write a raw widget value into `params`, rounding and clamping.
    pub fn apply(self, params: AdjustmentParams, value: f64) -> AdjustmentParams {
        // `as` saturates out-of-range floats and maps NaN to 0
        let step = value.round() as i32;
        match self {
            Slider::Brightness => params.with_brightness(step),
            Slider::Contrast => params.with_contrast(step),
            Slider::Saturation => params.with_saturation(step),
            Slider::Sharpness => params.with_sharpness(step),
            Slider::NoiseIntensity => params.with_noise(params.noise, value as f32),
            Slider::Transparency => params.with_transparency(step),
        }
    }
}

struct LoadedImage {
    full: Arc<ImageBuffer>,
    display: Arc<ImageBuffer>,
    path: Option<PathBuf>,
}

/// Editor state: one source image, one parameter set, one live preview.
pub struct EditorSession {
    config: EditorConfig,
    pipeline: AdjustmentPipeline,
    renderer: PreviewRenderer,
    loaded: Option<LoadedImage>,
    params: AdjustmentParams,
    displayed: Option<RenderedPreview>,
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let pipeline = AdjustmentPipeline::new(config.sharpening.kernel());
        let renderer = PreviewRenderer::new(pipeline)?;
        Ok(Self {
            config,
            pipeline,
            renderer,
            loaded: None,
            params: AdjustmentParams::identity(),
            displayed: None,
        })
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // -- Loading --------------------------------------------------------------

    /// Open an image file and start rendering its preview.
    ///
    /// On failure the previous image, if any, stays loaded.
    pub fn open(&mut self, path: &Path) -> Result<(), SessionError> {
        match ImageBuffer::open(path) {
            Ok(image) => {
                self.install(image, Some(path.to_path_buf()));
                Ok(())
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "Open failed, keeping current image");
                Err(err.into())
            }
        }
    }

    /// Load an image from encoded bytes (e.g. a drop or clipboard paste).
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        match ImageBuffer::load(bytes) {
            Ok(image) => {
                self.install(image, None);
                Ok(())
            }
            Err(err) => {
                warn!(%err, "Decode failed, keeping current image");
                Err(err.into())
            }
        }
    }

    fn install(&mut self, image: ImageBuffer, path: Option<PathBuf>) {
        let shown = image.resize_for_display(self.config.preview.max_dimension);
        info!(
            width = image.width(),
            height = image.height(),
            preview_w = shown.width(),
            preview_h = shown.height(),
            "Source image loaded"
        );
        self.loaded = Some(LoadedImage {
            full: Arc::new(image),
            display: Arc::new(shown),
            path,
        });
        self.displayed = None;
        self.request_preview();
    }

    /// Whether there is an image to edit.
    pub fn is_editable(&self) -> bool {
        self.loaded.is_some()
    }

    /// The full-resolution source as loaded.
    pub fn source(&self) -> Option<&ImageBuffer> {
        self.loaded.as_ref().map(|l| l.full.as_ref())
    }

    /// Path of the loaded file, if it came from disk.
    pub fn source_path(&self) -> Option<&Path> {
        self.loaded.as_ref().and_then(|l| l.path.as_deref())
    }

    // -- Parameters -----------------------------------------------------------

    pub fn params(&self) -> AdjustmentParams {
        self.params
    }

    /// Replace all parameters (clamped) and re-render.
    pub fn set_params(&mut self, params: AdjustmentParams) {
        self.params = params.clamped();
        self.request_preview();
    }

    /// Slider callback: update one value and re-render.
    pub fn set_slider(&mut self, slider: Slider, value: f64) {
        self.set_params(slider.apply(self.params, value));
    }

    /// Noise selector callback.
    pub fn set_noise_kind(&mut self, kind: NoiseKind) {
        let intensity = self.params.noise_intensity;
        self.set_params(self.params.with_noise(kind, intensity));
    }

    /// Back to identity values.
    pub fn reset(&mut self) {
        self.set_params(AdjustmentParams::identity());
    }

    // -- Preview --------------------------------------------------------------

    /// Ask for a fresh preview of the current params. Returns its generation,
    /// or `None` when no image is loaded.
    pub fn request_preview(&mut self) -> Option<u64> {
        let loaded = self.loaded.as_ref()?;
        Some(
            self.renderer
                .request(Arc::clone(&loaded.display), self.params),
        )
    }

    /// Pick up a finished preview, if any. Returns true when the displayed
    /// image changed.
    pub fn poll_preview(&mut self) -> bool {
        match self.renderer.poll() {
            Some(preview) => {
                self.displayed = Some(preview);
                true
            }
            None => false,
        }
    }

    /// Block until the preview for the current params is ready.
    pub fn wait_preview(&mut self, timeout: Duration) -> Option<&RenderedPreview> {
        if let Some(preview) = self.renderer.wait(timeout) {
            self.displayed = Some(preview);
        }
        self.displayed
            .as_ref()
            .filter(|p| p.generation == self.renderer.latest_generation())
    }

    /// The preview currently on screen.
    pub fn displayed(&self) -> Option<&RenderedPreview> {
        self.displayed.as_ref()
    }

    // -- Rendering and saving -------------------------------------------------

    /// Render the full-resolution source with the current params.
    pub fn render_full(&self) -> Result<ImageBuffer, SessionError> {
        let loaded = self.loaded.as_ref().ok_or(SessionError::NoImage)?;
        render_or_fallback(&self.pipeline, &loaded.full, &self.params)
    }

    /// Pick the save format: explicit choice, then the path's extension,
    /// then the source's own format, then the configured default.
    ///
    /// The last two apply only to paths without an extension; an extension
    /// that names no writable format is an error.
    pub fn resolve_save_format(
        &self,
        path: &Path,
        explicit: Option<ImageFormat>,
    ) -> Result<ImageFormat, SessionError> {
        let unsupported =
            |f: ImageFormat| ImageError::Encode(format!("unsupported output format: {f:?}"));

        if let Some(format) = explicit {
            return if is_output_format(format) {
                Ok(format)
            } else {
                Err(unsupported(format).into())
            };
        }
        if let Some(ext) = path.extension() {
            return match format_for_path(path) {
                Some(format) if is_output_format(format) => Ok(format),
                Some(format) => Err(unsupported(format).into()),
                None => Err(ImageError::Encode(format!(
                    "unrecognised extension '{}'",
                    ext.to_string_lossy()
                ))
                .into()),
            };
        }
        let from_source = self
            .source()
            .and_then(|s| s.source_format())
            .filter(|f| is_output_format(*f));
        from_source
            .or_else(|| self.config.output.format())
            .ok_or_else(|| {
                ImageError::Encode(format!(
                    "no usable format for {} (default '{}')",
                    path.display(),
                    self.config.output.default_format
                ))
                .into()
            })
    }

    /// Render at full resolution and write to `path`. Returns the path written.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn save(&self, path: &Path, format: Option<ImageFormat>) -> Result<PathBuf, SessionError> {
        let format = self.resolve_save_format(path, format)?;
        let rendered = self.render_full()?;
        rendered
            .save(path, format, self.config.output.quality())
            .inspect_err(|err| warn!(%err, "Save failed"))?;
        Ok(path.to_path_buf())
    }

    /// Like [`save`](Self::save), but renders and writes on the rayon pool.
    ///
    /// Format resolution happens up front so an unusable choice fails
    /// immediately. The receiver yields exactly one outcome.
    pub fn save_in_background(
        &self,
        path: &Path,
        format: Option<ImageFormat>,
    ) -> Result<Receiver<Result<PathBuf, SessionError>>, SessionError> {
        let format = self.resolve_save_format(path, format)?;
        let loaded = self.loaded.as_ref().ok_or(SessionError::NoImage)?;
        let source = Arc::clone(&loaded.full);
        let pipeline = self.pipeline;
        let params = self.params;
        let quality = self.config.output.quality();
        let path = path.to_path_buf();
        let (tx, rx) = mpsc::channel();

        rayon::spawn(move || {
            let outcome = render_or_fallback(&pipeline, &source, &params).and_then(|image| {
                image.save(&path, format, quality)?;
                Ok(path.clone())
            });
            if let Err(err) = &outcome {
                warn!(path = %path.display(), %err, "Background save failed");
            }
            let _ = tx.send(outcome);
        });
        Ok(rx)
    }
}

/// Render, treating rejected params as "no adjustment" so a logic error
/// degrades to the unedited image instead of failing the user's action.
fn render_or_fallback(
    pipeline: &AdjustmentPipeline,
    source: &ImageBuffer,
    params: &AdjustmentParams,
) -> Result<ImageBuffer, SessionError> {
    match pipeline.render(source, params) {
        Ok(image) => Ok(image),
        Err(RenderError::InvalidParams(err)) => {
            error!(%err, "Invalid params reached the pipeline, rendering source unadjusted");
            Ok(source.clone())
        }
        Err(err) => Err(err.into()),
    }
}
