//! # Image Tune
//!
//! The editing core of a small desktop image editor: open a photo, move a few
//! sliders, watch the preview follow, save the result. This crate is
//! everything below the widgets. A GUI binds its sliders and buttons to an
//! [`session::EditorSession`] and paints whatever preview it hands back.
//!
//! # Architecture: One Source, One Parameter Set, One Pipeline
//!
//! ```text
//! open()  ──►  ImageBuffer (full res) ──┬──► resize_for_display ──► PreviewRenderer ──► screen
//!                                       │                               ▲
//!                                       │            AdjustmentParams ──┤
//!                                       │                               ▼
//!                                       └──────────► AdjustmentPipeline ──► save()
//! ```
//!
//! The loaded source is never modified. Every render, preview or save, starts
//! again from the source and the current [`imaging::AdjustmentParams`], so
//! there is no edit history to corrupt and moving a slider back to its old
//! position restores the old pixels exactly.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | `ImageBuffer`, the adjustment stages, noise models and the pipeline |
//! | [`preview`] | Off-thread single-flight preview rendering |
//! | [`session`] | Editor state: load, slider updates, save with format resolution |
//! | [`config`] | `config.toml` loading, validation and stock defaults |
//!
//! # Design Decisions
//!
//! ## Fixed Stage Order
//!
//! Brightness, contrast, saturation, sharpness, noise, transparency. Every
//! stage is an exact no-op at its neutral value, so a render with only some
//! sliders moved needs no special casing. Fully neutral params skip the
//! stages and copy the source.
//!
//! ## Previews Render Small, Saves Render Full
//!
//! The preview pipeline runs on a copy scaled so its longer edge fits
//! `preview.max_dimension`. Saving always re-renders the full-resolution
//! source; a preview is never upscaled into an output file.
//!
//! ## Newest Request Wins
//!
//! Slider drags fire far more requests than a large image can render. Each
//! request gets a generation number, the worker abandons superseded work
//! between stages, and results from older generations are dropped on
//! delivery. See [`preview`].
//!
//! ## Injected Randomness
//!
//! Noise stages take their RNG as a parameter. Interactive renders use the
//! thread RNG; tests pass a seeded `StdRng` and get reproducible pixels.
//!
//! ## Pure-Rust Codecs
//!
//! Decoding and encoding go through the `image` crate only, so the editor has
//! no system library dependencies. GIF opens but does not save: palette
//! quantisation would change the rendered pixels behind the user's back.

pub mod config;
pub mod imaging;
pub mod preview;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;
