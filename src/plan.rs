//! Destination and temp-swap path derivation.
//!
//! A [`ConversionPlan`] is computed from the source path and the run options
//! alone; nothing here touches the filesystem. For a source `D/<stem>.<ext>`:
//!
//! ```text
//! destination = D/<slugify(stem)><prefix>.webp
//! temp swap   = D/<slugify(stem)><prefix>-temp.webp
//! ```
//!
//! Examples (no prefix):
//! - `D/Photo.PNG` → `D/photo.webp`, temp `D/photo-temp.webp`
//! - `D/Café Déjà-vu!.jpg` → `D/cafe-deja-vu.webp`
//! - `D/photo.webp` → `D/photo.webp` is the source itself, so unless
//!   overwrite is on the plan is marked
//!   [`will_overwrite_source`](ConversionPlan::will_overwrite_source) and the
//!   orchestrator skips it.

use crate::config::ConversionOptions;
use crate::slug::slugify;
use std::path::{Path, PathBuf};

/// Extension of every converted file.
pub const OUTPUT_EXTENSION: &str = "webp";

/// Infix marking the transient file written during an in-place swap.
pub const TEMP_INFIX: &str = "-temp";

/// Where one candidate's output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionPlan {
    pub source_path: PathBuf,
    /// `<slug><prefix>.webp` next to the source.
    pub destination_path: PathBuf,
    /// `<slug><prefix>-temp.webp` next to the source. Only written when
    /// overwrite is on.
    pub temp_swap_path: PathBuf,
    /// The destination is the source itself and overwrite is off.
    pub will_overwrite_source: bool,
    /// Copied from the options so the plan alone decides the write target.
    pub overwrite: bool,
}

impl ConversionPlan {
    /// The path the codec writes to.
    pub fn write_target(&self) -> &Path {
        if self.overwrite {
            &self.temp_swap_path
        } else {
            &self.destination_path
        }
    }

    /// The path the converted image ends up at once finalized.
    pub fn final_path(&self) -> &Path {
        if self.overwrite {
            &self.source_path
        } else {
            &self.destination_path
        }
    }
}

/// Derive the plan for one source file.
pub fn plan_conversion(source: &Path, options: &ConversionOptions) -> ConversionPlan {
    let dir = source.parent().unwrap_or_else(|| Path::new(""));
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let base = format!("{}{}", slugify(&stem), options.prefix);

    let destination_path = dir.join(format!("{base}.{OUTPUT_EXTENSION}"));
    let temp_swap_path = dir.join(format!("{base}{TEMP_INFIX}.{OUTPUT_EXTENSION}"));
    let will_overwrite_source = destination_path == source && !options.overwrite;

    ConversionPlan {
        source_path: source.to_path_buf(),
        destination_path,
        temp_swap_path,
        will_overwrite_source,
        overwrite: options.overwrite,
    }
}
