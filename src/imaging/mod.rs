//! Image processing in pure Rust, built on the `image` crate.
//!
//! | Stage | Operation | Implementation |
//! |---|---|---|
//! | 1 | **Brightness** | additive offset, `brightness × 2.55` |
//! | 2 | **Contrast** | scale around mid-gray 128 |
//! | 3 | **Saturation** | scale chroma around Rec. 601 luma |
//! | 4 | **Sharpness** | unsharp mask over `image::imageops::blur` |
//! | 5 | **Noise** | gaussian / salt & pepper / speckle, injected RNG |
//! | 6 | **Transparency** | alpha scale |
//!
//! The module is split into:
//! - **Calculations**: Pure functions mapping slider values to coefficients (unit testable)
//! - **Parameters**: Data structures describing the adjustments
//! - **Buffer**: [`ImageBuffer`], decoding, encoding and display resizing
//! - **Adjust / Noise**: The individual pixel stages
//! - **Pipeline**: [`AdjustmentPipeline`] chaining the stages in a fixed order

pub mod adjust;
pub mod buffer;
pub mod calculations;
pub mod noise;
mod params;
pub mod pipeline;

pub use buffer::{
    ImageBuffer, ImageError, OUTPUT_FORMATS, format_for_path, is_output_format,
    supported_input_extensions,
};
pub use params::{
    AdjustmentParams, INTENSITY_RANGE, NoiseKind, ParamsError, Quality, SIGNED_RANGE, Sharpening,
    UNSIGNED_RANGE, UnknownNoiseKind,
};
pub use pipeline::{AdjustmentPipeline, RenderError};
