//! Decoded raster images.
//!
//! [`ImageBuffer`] is the unit every other part of the crate passes around:
//! the editor holds one for the loaded source, the pipeline consumes one and
//! produces a new one, and saving encodes one.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, BMP, GIF, TIFF, WebP, ICO, PNM) | `image::load_from_memory_with_format` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality from [`Quality`]) |
//! | Encode → PNG, BMP, TIFF, WebP | `image::DynamicImage::write_to` |
//! | Display resize | `image::imageops::resize` with `Lanczos3` filter |
//!
//! Pixels are stored as RGBA8 regardless of the source layout. Whether the
//! source carried alpha is remembered so opaque images encode back without
//! an alpha channel.

use super::calculations::fit_within;
use super::params::Quality;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Extensions whose decoders are compiled in.
const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("png", ImageFormat::Png),
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("jpe", ImageFormat::Jpeg),
    ("jfif", ImageFormat::Jpeg),
    ("bmp", ImageFormat::Bmp),
    ("gif", ImageFormat::Gif),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("ico", ImageFormat::Ico),
    ("pbm", ImageFormat::Pnm),
    ("pgm", ImageFormat::Pnm),
    ("ppm", ImageFormat::Pnm),
    ("pnm", ImageFormat::Pnm),
];

/// Formats the save path accepts.
///
/// GIF is read-only here: its palette quantisation would silently alter
/// the rendered pixels. ICO and the PNM family open but do not save.
pub const OUTPUT_FORMATS: &[ImageFormat] = &[
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
    ImageFormat::WebP,
];

/// Returns the image file extensions that can be opened.
pub fn supported_input_extensions() -> Vec<&'static str> {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
}

/// Whether `format` can be written by [`ImageBuffer::encode`].
pub fn is_output_format(format: ImageFormat) -> bool {
    OUTPUT_FORMATS.contains(&format) && format.writing_enabled()
}

/// Guess a format from a path's extension (case-insensitive).
pub fn format_for_path(path: &Path) -> Option<ImageFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    INPUT_CANDIDATES
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, fmt)| *fmt)
}

/// An 8-bit RGBA raster plus what is known about where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pixels: RgbaImage,
    has_alpha: bool,
    source_format: Option<ImageFormat>,
}

impl ImageBuffer {
    /// Wrap an RGBA raster. `has_alpha` should be false for opaque content.
    pub fn from_rgba(pixels: RgbaImage, has_alpha: bool) -> Self {
        Self {
            pixels,
            has_alpha,
            source_format: None,
        }
    }

    /// Convert any decoded image, keeping track of whether it had alpha.
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self::from_rgba(image.to_rgba8(), image.color().has_alpha())
    }

    /// Decode an encoded image held in memory.
    #[instrument(skip(bytes), fields(len = bytes.len()))]
    pub fn load(bytes: &[u8]) -> Result<Self, ImageError> {
        let format = image::guess_format(bytes)
            .map_err(|e| ImageError::Decode(format!("unrecognised container: {e}")))?;
        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| ImageError::Decode(e.to_string()))?;
        let buffer = Self::from_dynamic(&decoded).with_source_format(format);
        info!(
            width = buffer.width(),
            height = buffer.height(),
            format = ?format,
            "Image decoded"
        );
        Ok(buffer)
    }

    /// Read and decode an image file. The container is sniffed from content,
    /// not trusted from the extension.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self, ImageError> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let format = reader.format().ok_or_else(|| {
            ImageError::Decode(format!("{}: unrecognised container", path.display()))
        })?;
        let decoded = reader
            .decode()
            .map_err(|e| ImageError::Decode(format!("{}: {e}", path.display())))?;
        let buffer = Self::from_dynamic(&decoded).with_source_format(format);
        info!(
            width = buffer.width(),
            height = buffer.height(),
            format = ?format,
            "Image opened"
        );
        Ok(buffer)
    }

    pub(crate) fn with_source_format(mut self, format: ImageFormat) -> Self {
        self.source_format = Some(format);
        self
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// 4 when the image carries alpha, otherwise 3.
    pub fn channels(&self) -> usize {
        if self.has_alpha { 4 } else { 3 }
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// The container the image was decoded from, if it came from a file.
    pub fn source_format(&self) -> Option<ImageFormat> {
        self.source_format
    }

    /// Borrow the RGBA working raster.
    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Row-major samples, `channels()` per pixel.
    pub fn to_raw(&self) -> Vec<u8> {
        if self.has_alpha {
            self.pixels.as_raw().clone()
        } else {
            self.pixels
                .pixels()
                .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
                .collect()
        }
    }

    /// Convert to a `DynamicImage` in the narrowest matching layout.
    pub fn to_dynamic(&self) -> DynamicImage {
        let rgba = DynamicImage::ImageRgba8(self.pixels.clone());
        if self.has_alpha {
            rgba
        } else {
            DynamicImage::ImageRgb8(rgba.to_rgb8())
        }
    }

    /// Derive a new buffer from transformed pixels, keeping provenance.
    pub(crate) fn derive(&self, pixels: RgbaImage, has_alpha: bool) -> Self {
        debug_assert_eq!(pixels.dimensions(), self.pixels.dimensions());
        Self {
            pixels,
            has_alpha,
            source_format: self.source_format,
        }
    }

    /// Encode into `format`. `quality` only affects JPEG.
    ///
    /// JPEG has no alpha channel; transparent images are flattened by
    /// dropping alpha.
    #[instrument(skip(self), fields(width = self.width(), height = self.height()))]
    pub fn encode(&self, format: ImageFormat, quality: Quality) -> Result<Vec<u8>, ImageError> {
        if self.is_empty() {
            return Err(ImageError::Encode(format!(
                "cannot encode a {}x{} image",
                self.width(),
                self.height()
            )));
        }
        if !is_output_format(format) {
            return Err(ImageError::Encode(format!(
                "unsupported output format: {format:?}"
            )));
        }

        let mut bytes = Vec::new();
        let mut cursor = Cursor::new(&mut bytes);
        match format {
            ImageFormat::Jpeg => {
                let rgb = DynamicImage::ImageRgb8(self.to_dynamic().to_rgb8());
                let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                    &mut cursor,
                    quality.value(),
                );
                rgb.write_with_encoder(encoder)
                    .map_err(|e| ImageError::Encode(format!("JPEG encode failed: {e}")))?;
            }
            other => {
                self.to_dynamic()
                    .write_to(&mut cursor, other)
                    .map_err(|e| ImageError::Encode(format!("{other:?} encode failed: {e}")))?;
            }
        }
        debug!(bytes = bytes.len(), "Image encoded");
        Ok(bytes)
    }

    /// Encode into `format` and write to `path`.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn save(&self, path: &Path, format: ImageFormat, quality: Quality) -> Result<(), ImageError> {
        let bytes = self.encode(format, quality)?;
        std::fs::write(path, &bytes)?;
        info!(bytes = bytes.len(), format = ?format, "Image saved");
        Ok(())
    }

    /// Scaled-down copy whose longer edge is at most `max_dimension`.
    ///
    /// Only for preview rendering: the saved image is always rendered from
    /// the full-resolution source. Images already small enough are cloned.
    pub fn resize_for_display(&self, max_dimension: u32) -> Self {
        let (w, h) = fit_within(self.dimensions(), max_dimension);
        if (w, h) == self.dimensions() {
            return self.clone();
        }
        debug!(
            from_w = self.width(),
            from_h = self.height(),
            to_w = w,
            to_h = h,
            "Resizing for display"
        );
        let resized = image::imageops::resize(&self.pixels, w, h, FilterType::Lanczos3);
        Self {
            pixels: resized,
            has_alpha: self.has_alpha,
            source_format: self.source_format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{gradient, solid};
    use image::Rgba;

    #[test]
    fn supported_extensions_include_common_formats() {
        let exts = supported_input_extensions();
        for expected in &[
            "png", "jpg", "jpeg", "bmp", "gif", "tif", "webp", "ico", "ppm", "pgm", "pbm",
        ] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
    }

    #[test]
    fn format_for_path_is_case_insensitive() {
        assert_eq!(format_for_path(Path::new("a/b.PNG")), Some(ImageFormat::Png));
        assert_eq!(format_for_path(Path::new("photo.jpeg")), Some(ImageFormat::Jpeg));
        assert_eq!(format_for_path(Path::new("noext")), None);
        assert_eq!(format_for_path(Path::new("doc.pdf")), None);
    }

    #[test]
    fn icon_and_netpbm_are_read_only() {
        assert_eq!(format_for_path(Path::new("favicon.ICO")), Some(ImageFormat::Ico));
        assert_eq!(format_for_path(Path::new("scan.pgm")), Some(ImageFormat::Pnm));
        assert!(!is_output_format(ImageFormat::Ico));
        assert!(!is_output_format(ImageFormat::Pnm));
    }

    #[test]
    fn load_decodes_binary_ppm() {
        let mut bytes = b"P6\n2 1\n255\n".to_vec();
        bytes.extend_from_slice(&[255, 0, 0, 0, 0, 255]);
        let decoded = ImageBuffer::load(&bytes).unwrap();
        assert_eq!(decoded.source_format(), Some(ImageFormat::Pnm));
        assert_eq!(decoded.dimensions(), (2, 1));
        assert!(!decoded.has_alpha());
        assert_eq!(decoded.as_rgba().get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(decoded.as_rgba().get_pixel(1, 0).0, [0, 0, 255, 255]);
    }

    #[test]
    fn load_decodes_graymap_as_opaque_gray() {
        let mut bytes = b"P5\n3 1\n255\n".to_vec();
        bytes.extend_from_slice(&[0, 128, 255]);
        let decoded = ImageBuffer::load(&bytes).unwrap();
        let grays: Vec<[u8; 4]> = decoded.as_rgba().pixels().map(|p| p.0).collect();
        assert_eq!(
            grays,
            vec![[0, 0, 0, 255], [128, 128, 128, 255], [255, 255, 255, 255]]
        );
    }

    #[test]
    fn load_rejects_garbage() {
        let result = ImageBuffer::load(b"definitely not an image");
        assert!(matches!(result, Err(ImageError::Decode(_))));
    }

    #[test]
    fn load_rejects_truncated_png() {
        let bytes = gradient(16, 16)
            .encode(ImageFormat::Png, Quality::default())
            .unwrap();
        let result = ImageBuffer::load(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(ImageError::Decode(_))));
    }

    #[test]
    fn png_roundtrip_is_lossless() {
        let original = gradient(31, 17);
        let bytes = original.encode(ImageFormat::Png, Quality::default()).unwrap();
        let decoded = ImageBuffer::load(&bytes).unwrap();
        assert_eq!(decoded.as_rgba(), original.as_rgba());
        assert_eq!(decoded.source_format(), Some(ImageFormat::Png));
        assert!(!decoded.has_alpha());
    }

    #[test]
    fn png_roundtrip_keeps_alpha() {
        let mut pixels = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
        pixels.put_pixel(1, 1, Rgba([10, 20, 30, 64]));
        let original = ImageBuffer::from_rgba(pixels, true);
        let bytes = original.encode(ImageFormat::Png, Quality::default()).unwrap();
        let decoded = ImageBuffer::load(&bytes).unwrap();
        assert!(decoded.has_alpha());
        assert_eq!(decoded.as_rgba().get_pixel(1, 1).0[3], 64);
    }

    #[test]
    fn bmp_roundtrip_is_lossless() {
        let original = gradient(9, 5);
        let bytes = original.encode(ImageFormat::Bmp, Quality::default()).unwrap();
        let decoded = ImageBuffer::load(&bytes).unwrap();
        assert_eq!(decoded.as_rgba(), original.as_rgba());
        assert_eq!(decoded.source_format(), Some(ImageFormat::Bmp));
    }

    #[test]
    fn jpeg_encode_drops_alpha() {
        let original = ImageBuffer::from_rgba(
            RgbaImage::from_pixel(8, 8, Rgba([200, 100, 50, 10])),
            true,
        );
        let bytes = original.encode(ImageFormat::Jpeg, Quality::new(95)).unwrap();
        let decoded = ImageBuffer::load(&bytes).unwrap();
        assert!(!decoded.has_alpha());
        assert_eq!(decoded.source_format(), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn encode_rejects_zero_size() {
        let empty = ImageBuffer::from_rgba(RgbaImage::new(0, 5), false);
        let result = empty.encode(ImageFormat::Png, Quality::default());
        assert!(matches!(result, Err(ImageError::Encode(_))));
    }

    #[test]
    fn encode_rejects_read_only_format() {
        let result = solid(2, 2, [1, 2, 3]).encode(ImageFormat::Gif, Quality::default());
        assert!(matches!(result, Err(ImageError::Encode(_))));
    }

    #[test]
    fn channels_follow_alpha_flag() {
        let opaque = solid(3, 2, [1, 2, 3]);
        assert_eq!(opaque.channels(), 3);
        assert_eq!(opaque.to_raw().len(), 3 * 2 * 3);

        let translucent = ImageBuffer::from_rgba(RgbaImage::new(3, 2), true);
        assert_eq!(translucent.channels(), 4);
        assert_eq!(translucent.to_raw().len(), 3 * 2 * 4);
    }

    #[test]
    fn resize_for_display_preserves_aspect() {
        let big = gradient(400, 200);
        let small = big.resize_for_display(100);
        assert_eq!(small.dimensions(), (100, 50));
        // Source untouched
        assert_eq!(big.dimensions(), (400, 200));
    }

    #[test]
    fn resize_for_display_never_upscales() {
        let img = gradient(40, 20);
        let same = img.resize_for_display(800);
        assert_eq!(same, img);
    }

    #[test]
    fn open_and_save_through_filesystem() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.png");
        let original = gradient(12, 12);
        original.save(&path, ImageFormat::Png, Quality::default()).unwrap();

        let reopened = ImageBuffer::open(&path).unwrap();
        assert_eq!(reopened.as_rgba(), original.as_rgba());
    }

    #[test]
    fn open_nonexistent_file_is_io_error() {
        let result = ImageBuffer::open(Path::new("/nonexistent/image.png"));
        assert!(matches!(result, Err(ImageError::Io(_))));
    }

    #[test]
    fn open_sniffs_content_over_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("mislabelled.jpg");
        let bytes = gradient(6, 6)
            .encode(ImageFormat::Png, Quality::default())
            .unwrap();
        std::fs::write(&path, bytes).unwrap();

        let opened = ImageBuffer::open(&path).unwrap();
        assert_eq!(opened.source_format(), Some(ImageFormat::Png));
    }
}
