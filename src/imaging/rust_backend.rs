//! Pure Rust codec backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image` crate, format sniffed from file content |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Crop (`cover`) | `image::DynamicImage::crop_imm` |
//! | Pad (`contain`) | `image::imageops::overlay` onto an opaque black canvas |
//! | Encode → WebP | `webp::Encoder` (lossy, libwebp) |
//!
//! Decoding sniffs the format from the bytes rather than trusting the
//! extension: after an in-place run, `photo.png` holds WebP data, and a
//! second run must still be able to read it.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{ResizeLayout, calculate_layout};
use super::params::{ConvertParams, ResizeSpec};
use image::imageops::FilterType;
use image::{
    DynamicImage, GenericImageView, ImageFormat, ImageReader, Rgb, RgbImage, Rgba, RgbaImage,
};
use std::path::Path;
use std::sync::LazyLock;
use tracing::trace;

/// Candidate input extensions and the decoder each one needs.
const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("png", ImageFormat::Png),
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the lowercase image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` and `webp` crates.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Run the resize stage described by `spec`.
fn apply_resize(img: DynamicImage, spec: &ResizeSpec) -> DynamicImage {
    let layout = calculate_layout(img.dimensions(), spec);
    trace!(?layout, "resize layout");
    match layout {
        ResizeLayout::Unchanged => img,
        ResizeLayout::Scale { width, height } => {
            img.resize_exact(width, height, FilterType::Lanczos3)
        }
        ResizeLayout::ScaleCrop {
            scaled,
            x,
            y,
            width,
            height,
        } => img
            .resize_exact(scaled.0, scaled.1, FilterType::Lanczos3)
            .crop_imm(x, y, width, height),
        ResizeLayout::ScalePad {
            scaled,
            x,
            y,
            width,
            height,
        } => {
            let resized = img.resize_exact(scaled.0, scaled.1, FilterType::Lanczos3);
            pad(&resized, x, y, width, height)
        }
    }
}

/// Place `img` at (`x`, `y`) on an opaque black `width` x `height` canvas.
fn pad(img: &DynamicImage, x: u32, y: u32, width: u32, height: u32) -> DynamicImage {
    if img.color().has_alpha() {
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
        image::imageops::overlay(&mut canvas, &img.to_rgba8(), x as i64, y as i64);
        DynamicImage::ImageRgba8(canvas)
    } else {
        let mut canvas = RgbImage::from_pixel(width, height, Rgb([0, 0, 0]));
        image::imageops::overlay(&mut canvas, &img.to_rgb8(), x as i64, y as i64);
        DynamicImage::ImageRgb8(canvas)
    }
}

/// Encode as lossy WebP and write to `path`.
///
/// libwebp only accepts 8-bit RGB/RGBA, so other layouts (grayscale, 16-bit
/// PNG) are converted first, keeping the alpha channel when there is one.
fn save_webp(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let rgb = match img {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => None,
        other if other.color().has_alpha() => Some(DynamicImage::ImageRgba8(other.to_rgba8())),
        other => Some(DynamicImage::ImageRgb8(other.to_rgb8())),
    };
    let encodable = rgb.as_ref().unwrap_or(img);

    let encoder = webp::Encoder::from_image(encodable)
        .map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {}", e)))?;
    // `Encoder::encode` unwraps libwebp's status; oversized images must fail
    // this file, not abort the batch.
    let memory = encoder
        .encode_simple(false, quality as f32)
        .map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {:?}", e)))?;
    std::fs::write(path, &*memory).map_err(BackendError::Io)
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::open(path)
            .map_err(BackendError::Io)?
            .with_guessed_format()
            .map_err(BackendError::Io)?
            .into_dimensions()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
            })?;
        Ok(Dimensions { width, height })
    }

    fn convert(&self, params: &ConvertParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let img = match &params.resize {
            Some(spec) => apply_resize(img, spec),
            None => img,
        };
        save_webp(&img, &params.output, params.quality.value())
    }
}
