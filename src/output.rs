//! CLI output formatting.
//!
//! The orchestrator never prints. It returns [`BatchSummary`] values and
//! sends [`ConvertEvent`]s; this module turns both into console lines.
//!
//! # Output Format
//!
//! ## Convert
//!
//! Each converted file gets an info line (source and its size) followed by a
//! success line (final name, new size, signed delta):
//!
//! ```text
//! Photo.PNG (512.30 KB)
//! → photo.webp (98.12 KB, ↓ -414.18 KB)
//! Skipped photo.webp: destination equals source; overwrite not enabled
//! Error converting broken.jpg: Image processing failed: ...
//!
//! Converted 1, skipped 1, failed 1: 512.30 KB → 98.12 KB (↓ -414.18 KB)
//! ```
//!
//! Delta direction: `↓` smaller, `=` unchanged, `↑` larger. Sizes are decimal
//! kilobytes (bytes / 1000) with two decimals.
//!
//! Info and success lines and the summary go to stdout. Skip warnings and
//! error lines go to stderr, so `towebp 2>errors.log` keeps a clean record of
//! what needs attention.
//!
//! ## Dry run
//!
//! ```text
//! Photo.PNG → photo.webp (800x600 → 400x300)
//! photo.png → photo.png (in place via photo-temp.webp)
//! Skipped photo.webp: destination equals source; overwrite not enabled
//! ```
//!
//! Paths are shown relative to the target directory when they live under it.
//!
//! # Architecture
//!
//! Every format function returns `Vec<String>` (or a `String`) so it can be
//! tested without capturing stdout; `print_*` wrappers do the writing.

use crate::convert::{
    BatchSummary, ConversionResult, ConvertEvent, PreviewEntry, SizeChange, size_delta_kb,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

// ============================================================================
// Shared helpers
// ============================================================================

/// Display `path` relative to `root` when possible.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .ok()
        .filter(|rel| !rel.as_os_str().is_empty())
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Bytes as decimal kilobytes: `1234` → `"1.23 KB"`.
pub fn format_kb(bytes: u64) -> String {
    format!("{:.2} KB", bytes as f64 / 1000.0)
}

/// Signed size change with a direction indicator.
///
/// ```text
/// ↓ -5.68 KB
/// = 0.00 KB
/// ↑ +2.50 KB
/// ```
pub fn format_delta(old_bytes: u64, new_bytes: u64) -> String {
    let kb = size_delta_kb(old_bytes, new_bytes).abs();
    match SizeChange::classify(old_bytes, new_bytes) {
        SizeChange::Decreased => format!("↓ -{:.2} KB", kb),
        SizeChange::Unchanged => format!("= {:.2} KB", kb),
        SizeChange::Increased => format!("↑ +{:.2} KB", kb),
    }
}

// ============================================================================
// Convert
// ============================================================================

/// Format one progress event.
///
/// `BatchStarted` renders nothing; the summary line closes the batch.
pub fn format_convert_event(event: &ConvertEvent, root: &Path) -> Vec<String> {
    match event {
        ConvertEvent::BatchStarted { .. } => Vec::new(),
        ConvertEvent::Converted {
            source,
            final_path,
            old_size_bytes,
            new_size_bytes,
        } => {
            let name = final_path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_else(|| final_path.display().to_string());
            vec![
                format!("{} ({})", display_path(source, root), format_kb(*old_size_bytes)),
                format!(
                    "→ {} ({}, {})",
                    name,
                    format_kb(*new_size_bytes),
                    format_delta(*old_size_bytes, *new_size_bytes)
                ),
            ]
        }
        ConvertEvent::Skipped { source, reason } => {
            vec![format!("Skipped {}: {}", display_path(source, root), reason)]
        }
        ConvertEvent::Failed {
            source,
            message,
            finalize,
        } => {
            let mut lines = vec![format!(
                "Error converting {}: {}",
                display_path(source, root),
                message
            )];
            if *finalize {
                lines.push("    Check this file by hand before running again.".to_string());
            }
            lines
        }
    }
}

/// Console stream a line is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Progress goes to stdout; skip warnings and errors go to stderr.
pub fn event_stream(event: &ConvertEvent) -> Stream {
    match event {
        ConvertEvent::Skipped { .. } | ConvertEvent::Failed { .. } => Stream::Stderr,
        ConvertEvent::BatchStarted { .. } | ConvertEvent::Converted { .. } => Stream::Stdout,
    }
}

pub fn print_convert_event(event: &ConvertEvent, root: &Path) {
    let stream = event_stream(event);
    for line in format_convert_event(event, root) {
        match stream {
            Stream::Stdout => println!("{}", line),
            Stream::Stderr => eprintln!("{}", line),
        }
    }
}

/// One-line batch total.
pub fn format_summary(summary: &BatchSummary) -> String {
    let (old, new) = summary.total_sizes();
    let counts = format!(
        "Converted {}, skipped {}, failed {}",
        summary.converted(),
        summary.skipped(),
        summary.failed()
    );
    if summary.converted() == 0 {
        return counts;
    }
    format!(
        "{}: {} → {} ({})",
        counts,
        format_kb(old),
        format_kb(new),
        format_delta(old, new)
    )
}

pub fn print_summary(summary: &BatchSummary) {
    println!();
    println!("{}", format_summary(summary));
}

pub fn format_no_images(dir: &Path) -> String {
    format!("No images to convert found in {}", dir.display())
}

// ============================================================================
// Dry run
// ============================================================================

pub fn format_preview(entries: &[PreviewEntry], root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for entry in entries {
        let plan = &entry.planned.plan;
        let source = display_path(&plan.source_path, root);
        if let Some(reason) = &entry.planned.skip {
            lines.push(format!("Skipped {}: {}", source, reason));
            continue;
        }

        let mut line = if plan.overwrite {
            format!(
                "{} → {} (in place via {}",
                source,
                display_path(plan.final_path(), root),
                display_path(&plan.temp_swap_path, root)
            )
        } else {
            format!("{} → {} (", source, display_path(plan.final_path(), root))
        };
        match (entry.source_dimensions, entry.output_dimensions) {
            (Some((sw, sh)), Some((ow, oh))) => {
                if plan.overwrite {
                    line.push_str(", ");
                }
                line.push_str(&format!("{sw}x{sh} → {ow}x{oh})"));
            }
            _ if plan.overwrite => line.push(')'),
            _ => line.push_str("unreadable)"),
        }
        lines.push(line);
    }
    lines
}

pub fn print_preview(entries: &[PreviewEntry], root: &Path) {
    for line in format_preview(entries, root) {
        println!("{}", line);
    }
}

// ============================================================================
// JSON report
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Converted,
    Skipped,
    Failed,
}

#[derive(Debug, Serialize)]
pub struct FileReport {
    pub source: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_kb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Machine-readable batch report for `--json`.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub old_size_bytes: u64,
    pub new_size_bytes: u64,
    pub files: Vec<FileReport>,
}

impl From<&BatchSummary> for BatchReport {
    fn from(summary: &BatchSummary) -> Self {
        let (old_size_bytes, new_size_bytes) = summary.total_sizes();
        let files = summary
            .outcomes
            .iter()
            .map(|outcome| {
                let mut report = FileReport {
                    source: outcome.source.clone(),
                    status: FileStatus::Converted,
                    final_path: None,
                    old_size_bytes: None,
                    new_size_bytes: None,
                    delta_kb: None,
                    reason: None,
                    error: None,
                };
                match &outcome.result {
                    ConversionResult::Success {
                        old_size_bytes,
                        new_size_bytes,
                        final_path,
                    } => {
                        report.final_path = Some(final_path.clone());
                        report.old_size_bytes = Some(*old_size_bytes);
                        report.new_size_bytes = Some(*new_size_bytes);
                        report.delta_kb = Some(size_delta_kb(*old_size_bytes, *new_size_bytes));
                    }
                    ConversionResult::Skipped { reason } => {
                        report.status = FileStatus::Skipped;
                        report.reason = Some(reason.to_string());
                    }
                    ConversionResult::Failure { error } => {
                        report.status = FileStatus::Failed;
                        report.error = Some(error.to_string());
                    }
                }
                report
            })
            .collect();

        BatchReport {
            converted: summary.converted(),
            skipped: summary.skipped(),
            failed: summary.failed(),
            old_size_bytes,
            new_size_bytes,
            files,
        }
    }
}

pub fn format_json(summary: &BatchSummary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&BatchReport::from(summary))
}
