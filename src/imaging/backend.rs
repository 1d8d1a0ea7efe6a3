//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the converter needs:
//! identify (read dimensions) and convert (decode → optional resize → WebP
//! encode → write).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests use the
//! [`MockBackend`](tests::MockBackend) below, which records operations and can
//! be told to fail for specific sources.

use super::params::ConvertParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image codec backends.
///
/// `Sync` so a single backend can be shared across rayon workers.
pub trait ImageBackend: Sync {
    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode `params.source`, apply the optional resize, encode as WebP at
    /// `params.quality` and write the result to `params.output`.
    fn convert(&self, params: &ConvertParams) -> Result<(), BackendError>;
}
