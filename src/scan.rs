//! Target resolution: turn the positional `target` argument into the list of
//! candidate images.
//!
//! ## Rules
//!
//! - **File target**: must exist and carry a supported extension; it becomes
//!   the only candidate.
//! - **Directory target**: every regular file directly inside it whose
//!   extension is `png`, `jpg`, `jpeg` or `webp` (any case). Symlinks to
//!   such files count. With `recursive`, subdirectories are walked too.
//! - Anything else is a [`ScanError`], which aborts the run.
//!
//! An empty directory is not an error: [`Candidates::is_empty`] lets the
//! caller report "no images found" and exit normally.
//!
//! Candidates are sorted by path so batch order, collision resolution, and
//! console output are deterministic across platforms.

use crate::imaging::supported_input_extensions;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Target not found: {0}")]
    NotFound(PathBuf),
    #[error("Not a supported image (png, jpg, jpeg, webp): {0}")]
    UnsupportedFile(PathBuf),
    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// What the target argument resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidates {
    /// The target was a single image file.
    File(PathBuf),
    /// The target was a directory; these are the images found in it.
    Directory { root: PathBuf, files: Vec<PathBuf> },
}

impl Candidates {
    pub fn files(&self) -> &[PathBuf] {
        match self {
            Candidates::File(path) => std::slice::from_ref(path),
            Candidates::Directory { files, .. } => files,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files().is_empty()
    }

    pub fn into_files(self) -> Vec<PathBuf> {
        match self {
            Candidates::File(path) => vec![path],
            Candidates::Directory { files, .. } => files,
        }
    }
}

/// Check whether a path has a convertible image extension (case-insensitive).
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            supported_input_extensions()
                .iter()
                .any(|ext| ext.eq_ignore_ascii_case(e))
        })
        .unwrap_or(false)
}

/// Resolve `target` into candidate images.
///
/// Paths are made absolute (without resolving symlinks) so every plan and
/// report line names the same file regardless of the working directory.
pub fn resolve_target(target: &Path, recursive: bool) -> Result<Candidates, ScanError> {
    let target = std::path::absolute(target).map_err(|source| ScanError::Io {
        path: target.to_path_buf(),
        source,
    })?;
    let metadata = match std::fs::metadata(&target) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ScanError::NotFound(target));
        }
        Err(source) => return Err(ScanError::Io { path: target, source }),
    };

    if metadata.is_file() {
        if !is_image(&target) {
            return Err(ScanError::UnsupportedFile(target));
        }
        return Ok(Candidates::File(target));
    }

    let files = collect_images(&target, recursive)?;
    debug!(
        "found {} candidate image(s) in {}",
        files.len(),
        target.display()
    );
    Ok(Candidates::Directory {
        root: target,
        files,
    })
}

fn collect_images(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, ScanError> {
    let mut walker = WalkDir::new(dir).min_depth(1).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        // `path().is_file()` follows symlinks; `file_type()` would not.
        if is_image(entry.path()) && entry.path().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}
