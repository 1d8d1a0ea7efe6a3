//! Image codec: decode, optional resize, lossy WebP encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Decode** | `image` (PNG, JPEG, WebP; format sniffed from content) |
//! | **Resize** | Lanczos3 + sharp-style fit/position geometry |
//! | **Encode** | `webp` (libwebp, lossy at quality 1–100) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for resize geometry (unit testable)
//! - **Parameters**: Data structures describing a conversion
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
pub mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{ResizeLayout, calculate_layout};
pub use params::{Anchor, ConvertParams, Fit, Position, Quality, ResizeSpec};
pub use rust_backend::{RustBackend, supported_input_extensions};
