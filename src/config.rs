//! Run configuration.
//!
//! A run is described by one [`ConversionOptions`] value, built once at
//! startup (from the CLI in `main.rs`, or directly by library callers) and
//! passed by reference into the resolver, the path deriver and the
//! orchestrator. Nothing reads options from ambient state.
//!
//! ## Defaults
//!
//! ```text
//! target     = current working directory
//! quality    = 80
//! prefix     = ""          # appended to the slug, before ".webp"
//! overwrite  = false
//! recursive  = false
//! jobs       = none        # sequential
//! resize     = none        # width/height/fit/position all unset
//! ```
//!
//! ## Validation
//!
//! The CLI rejects bad values at parse time; [`ConversionOptions::validate`]
//! repeats the same checks for callers that construct options by hand, so an
//! out-of-range quality or a zero dimension never reaches the codec.

use crate::imaging::{Fit, Position, Quality, ResizeSpec};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Immutable settings for one conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionOptions {
    /// File or directory to convert.
    pub target: PathBuf,
    /// Target width in pixels.
    pub width: Option<u32>,
    /// Target height in pixels.
    pub height: Option<u32>,
    /// How a resize reconciles the source aspect ratio with the target box.
    pub fit: Option<Fit>,
    /// Gravity used when cropping (`cover`) or placing (`contain`).
    pub position: Option<Position>,
    /// WebP encoding quality (1-100).
    pub quality: u32,
    /// Appended to the slugified stem, before the extension.
    pub prefix: String,
    /// Replace each source file in place instead of writing `<slug>.webp`.
    pub overwrite: bool,
    /// Descend into subdirectories of a directory target.
    pub recursive: bool,
    /// Worker threads for the batch. `None` converts files one at a time.
    pub jobs: Option<usize>,
    /// Derive and report plans without touching the filesystem.
    pub dry_run: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            target: PathBuf::from("."),
            width: None,
            height: None,
            fit: None,
            position: None,
            quality: Quality::default().value(),
            prefix: String::new(),
            overwrite: false,
            recursive: false,
            jobs: None,
            dry_run: false,
        }
    }
}

impl ConversionOptions {
    /// Default options aimed at `target`.
    pub fn for_target(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::Validation("quality must be 1-100".into()));
        }
        if self.width == Some(0) {
            return Err(ConfigError::Validation(
                "width must be a positive integer".into(),
            ));
        }
        if self.height == Some(0) {
            return Err(ConfigError::Validation(
                "height must be a positive integer".into(),
            ));
        }
        if self.prefix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(format!(
                "prefix must not contain a path separator: {:?}",
                self.prefix
            )));
        }
        if self.jobs == Some(0) {
            return Err(ConfigError::Validation("jobs must be at least 1".into()));
        }
        Ok(())
    }

    /// Encoding quality as the codec's clamped type.
    pub fn quality(&self) -> Quality {
        Quality::new(self.quality)
    }

    /// The resize stage to run, if any.
    ///
    /// Returns `None` unless at least one of width, height, fit or position
    /// is set, so a plain conversion never forces an aspect transform.
    pub fn resize_spec(&self) -> Option<ResizeSpec> {
        if self.width.is_none()
            && self.height.is_none()
            && self.fit.is_none()
            && self.position.is_none()
        {
            return None;
        }
        Some(ResizeSpec {
            width: self.width,
            height: self.height,
            fit: self.fit.unwrap_or_default(),
            position: self.position.unwrap_or_default(),
        })
    }

    /// Whether the batch should be spread over a thread pool.
    pub fn is_parallel(&self) -> bool {
        self.jobs.is_some_and(|n| n > 1)
    }
}

/// Resolve the effective thread count for a parallel batch.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(jobs: Option<usize>) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    jobs.map(|n| n.min(cores)).unwrap_or(cores)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = ConversionOptions::default();
        assert_eq!(opts.target, PathBuf::from("."));
        assert_eq!(opts.quality, 80);
        assert_eq!(opts.prefix, "");
        assert!(!opts.overwrite);
        assert!(!opts.recursive);
        assert!(!opts.dry_run);
        assert_eq!(opts.jobs, None);
    }

    #[test]
    fn default_config_passes() {
        assert!(ConversionOptions::default().validate().is_ok());
    }

    #[test]
    fn for_target_keeps_other_defaults() {
        let opts = ConversionOptions::for_target("/photos");
        assert_eq!(opts.target, PathBuf::from("/photos"));
        assert_eq!(opts.quality, 80);
    }

    #[test]
    fn quality_boundaries_ok() {
        for q in [1, 100] {
            let opts = ConversionOptions {
                quality: q,
                ..ConversionOptions::default()
            };
            assert!(opts.validate().is_ok(), "quality {q} should pass");
        }
    }

    #[test]
    fn quality_out_of_range() {
        for q in [0, 101] {
            let opts = ConversionOptions {
                quality: q,
                ..ConversionOptions::default()
            };
            let err = opts.validate().unwrap_err();
            assert!(err.to_string().contains("quality"), "{err}");
        }
    }

    #[test]
    fn zero_dimensions_rejected() {
        let opts = ConversionOptions {
            width: Some(0),
            ..ConversionOptions::default()
        };
        assert!(opts.validate().unwrap_err().to_string().contains("width"));

        let opts = ConversionOptions {
            height: Some(0),
            ..ConversionOptions::default()
        };
        assert!(opts.validate().unwrap_err().to_string().contains("height"));
    }

    #[test]
    fn prefix_with_separator_rejected() {
        for prefix in ["../x", "a/b", "a\\b"] {
            let opts = ConversionOptions {
                prefix: prefix.into(),
                ..ConversionOptions::default()
            };
            assert!(opts.validate().is_err(), "prefix {prefix:?} should fail");
        }
    }

    #[test]
    fn zero_jobs_rejected() {
        let opts = ConversionOptions {
            jobs: Some(0),
            ..ConversionOptions::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn no_resize_without_resize_options() {
        assert_eq!(ConversionOptions::default().resize_spec(), None);
    }

    #[test]
    fn width_alone_enables_resize_with_default_fit() {
        let opts = ConversionOptions {
            width: Some(640),
            ..ConversionOptions::default()
        };
        let spec = opts.resize_spec().unwrap();
        assert_eq!(spec.width, Some(640));
        assert_eq!(spec.height, None);
        assert_eq!(spec.fit, Fit::Cover);
        assert_eq!(spec.position, Position::Centre);
    }

    #[test]
    fn position_alone_enables_resize() {
        let opts = ConversionOptions {
            position: Some(Position::North),
            ..ConversionOptions::default()
        };
        let spec = opts.resize_spec().unwrap();
        assert_eq!(spec.width, None);
        assert_eq!(spec.height, None);
        assert_eq!(spec.position, Position::North);
    }

    #[test]
    fn quality_accessor_clamps() {
        let opts = ConversionOptions {
            quality: 250,
            ..ConversionOptions::default()
        };
        assert_eq!(opts.quality().value(), 100);
    }

    #[test]
    fn parallel_only_above_one_job() {
        let mut opts = ConversionOptions::default();
        assert!(!opts.is_parallel());
        opts.jobs = Some(1);
        assert!(!opts.is_parallel());
        opts.jobs = Some(4);
        assert!(opts.is_parallel());
    }

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(None), cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(Some(cores + 64)), cores);
        assert_eq!(effective_threads(Some(1)), 1);
    }

    #[test]
    fn deserializes_partial_json() {
        let opts: ConversionOptions =
            serde_json::from_str(r#"{"target": "img", "quality": 60, "fit": "inside"}"#).unwrap();
        assert_eq!(opts.target, PathBuf::from("img"));
        assert_eq!(opts.quality, 60);
        assert_eq!(opts.fit, Some(Fit::Inside));
        assert!(!opts.overwrite);
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<ConversionOptions, _> = serde_json::from_str(r#"{"qualty": 60}"#);
        assert!(result.is_err());
    }
}
