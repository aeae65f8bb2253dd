//! Editor configuration module.
//!
//! Handles loading and validating the application's `config.toml`. The file
//! is optional and sparse: stock defaults are overridden by whatever keys the
//! user sets. Adjustment values are never stored here; every launch starts
//! from identity parameters.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [preview]
//! max_dimension = 800       # Longer edge of the live preview, in pixels
//!
//! [sharpening]
//! sigma = 1.0               # Blur radius of the unsharp mask
//! threshold = 0             # Minimum detail to sharpen (0 = everything)
//!
//! [output]
//! default_format = "png"    # Used when neither path nor source decide
//! jpeg_quality = 90         # JPEG quality (1-100)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Quality, Sharpening, format_for_path, is_output_format};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Editor configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Live preview settings.
    pub preview: PreviewConfig,
    /// Unsharp-mask kernel used by the sharpness slider.
    pub sharpening: SharpeningConfig,
    /// Save defaults.
    pub output: OutputConfig,
}

impl EditorConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.preview.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "preview.max_dimension must be non-zero".into(),
            ));
        }
        if !(self.sharpening.sigma.is_finite() && self.sharpening.sigma > 0.0) {
            return Err(ConfigError::Validation(
                "sharpening.sigma must be a positive number".into(),
            ));
        }
        if self.sharpening.threshold < 0 {
            return Err(ConfigError::Validation(
                "sharpening.threshold must not be negative".into(),
            ));
        }
        if !Quality::RANGE.contains(&self.output.jpeg_quality) {
            return Err(ConfigError::Validation(
                "output.jpeg_quality must be 1-100".into(),
            ));
        }
        if self.output.format().is_none() {
            return Err(ConfigError::Validation(format!(
                "output.default_format '{}' is not a writable format",
                self.output.default_format
            )));
        }
        Ok(())
    }
}

/// Live preview settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    /// The preview is downscaled so its longer edge fits this many pixels.
    pub max_dimension: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self { max_dimension: 800 }
    }
}

/// Unsharp-mask kernel settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SharpeningConfig {
    pub sigma: f32,
    pub threshold: i32,
}

impl Default for SharpeningConfig {
    fn default() -> Self {
        let kernel = Sharpening::default();
        Self {
            sigma: kernel.sigma,
            threshold: kernel.threshold,
        }
    }
}

impl SharpeningConfig {
    pub fn kernel(&self) -> Sharpening {
        Sharpening {
            sigma: self.sigma,
            threshold: self.threshold,
        }
    }
}

/// Save defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// File extension naming the fallback save format, e.g. `"png"`.
    pub default_format: String,
    pub jpeg_quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: "png".to_string(),
            jpeg_quality: Quality::default().value().into(),
        }
    }
}

impl OutputConfig {
    /// The configured fallback format, if it names a writable format.
    pub fn format(&self) -> Option<ImageFormat> {
        let probe = Path::new("probe").with_extension(&self.default_format);
        format_for_path(&probe).filter(|f| is_output_format(*f))
    }

    pub fn quality(&self) -> Quality {
        Quality::new(self.jpeg_quality)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(EditorConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Lay a sparse user table over the stock defaults.
///
/// Sections (`[preview]`, `[output]`, ...) merge key by key, so a user file
/// holding only `[output] jpeg_quality = 80` keeps every other default. Any
/// non-table value in `overlay` wins outright.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut merged), toml::Value::Table(user)) => {
            for (key, value) in user {
                let value = match merged.remove(&key) {
                    Some(stock) => merge_toml(stock, value),
                    None => value,
                };
                merged.insert(key, value);
            }
            toml::Value::Table(merged)
        }
        (_, user) => user,
    }
}

/// Read the user's `config.toml` from the application config directory.
///
/// A missing file is not an error: the editor then runs on stock defaults.
/// A file that exists but is not valid TOML is.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let content = match fs::read_to_string(dir.join("config.toml")) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    Ok(Some(toml::from_str(&content)?))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<EditorConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EditorConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the defaults.
pub fn load_config(dir: &Path) -> Result<EditorConfig, ConfigError> {
    resolve_config(load_raw_config(dir)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
pub fn stock_config_toml() -> &'static str {
    r##"# Image Tune Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.
#
# Adjustment sliders are not stored here: they reset on every launch.

# ---------------------------------------------------------------------------
# Live preview
# ---------------------------------------------------------------------------
[preview]
# The preview is rendered from a copy scaled so its longer edge fits
# this many pixels. Saving always renders the full-resolution image.
max_dimension = 800

# ---------------------------------------------------------------------------
# Sharpness slider kernel (unsharp mask)
# ---------------------------------------------------------------------------
[sharpening]
# Gaussian blur radius. Larger values emphasise coarser detail.
sigma = 1.0
# Differences from the blurred image below this value are left alone.
threshold = 0

# ---------------------------------------------------------------------------
# Saving
# ---------------------------------------------------------------------------
[output]
# Used when the save path has no recognised extension and the source
# format cannot be written. One of: png, jpg, bmp, tif, webp.
default_format = "png"
# JPEG quality (1-100).
jpeg_quality = 90
"##
}
