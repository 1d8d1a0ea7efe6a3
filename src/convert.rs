//! Conversion orchestration and the file-safety protocol.
//!
//! Every candidate goes through the same per-file state machine:
//!
//! ```text
//! Pending → Deriving ─┬─ Skipped
//!                     └─ Encoding → Finalizing → Done
//!                (any step may end in Failed)
//! ```
//!
//! ## Deriving
//!
//! The plan comes from [`plan_conversion`]. A plan whose destination is the
//! source itself (overwrite off) is skipped, never written. Across the batch,
//! when two candidates derive the same destination (`a.png` and `a.jpg`), the
//! first in candidate order wins and later ones are skipped, so one output is
//! never silently replaced by another within a run.
//!
//! ## Encoding
//!
//! The codec reads `source_path` and writes the plan's
//! [`write_target`](ConversionPlan::write_target): the temp swap path in
//! overwrite mode, the destination otherwise. The resize stage only runs when
//! width, height, fit or position was given.
//!
//! In overwrite mode an existing file at the temp path fails the candidate
//! before anything is written: the swap would rename it away.
//!
//! ## Finalizing
//!
//! Without overwrite there is nothing to move; sizes are read from the source
//! and the destination. With overwrite the swap is:
//!
//! ```text
//! 1. size(source), size(temp)
//! 2. remove(source)            fails → temp removed, original untouched
//! 3. rename(temp → source)     fails → original gone, output kept at temp
//! ```
//!
//! The source is removed before the rename is issued so the protocol also
//! holds on filesystems where rename does not replace an existing file.
//!
//! ## Isolation
//!
//! Errors never escape a file: each one becomes a
//! [`ConversionResult::Failure`] and the batch moves on. With more than one
//! job, candidates run on a rayon pool; candidates whose paths overlap
//! (shared temp file, or one's output is another's input) stay in one group
//! and run in order. Events go through a channel so a single printer thread
//! owns the console.

use crate::config::{ConversionOptions, effective_threads};
use crate::imaging::{BackendError, ConvertParams, ImageBackend, calculate_layout};
use crate::plan::{ConversionPlan, plan_conversion};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, warn};

// ============================================================================
// Results
// ============================================================================

/// Why a candidate was not converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The derived destination is the source file and overwrite is off.
    DestinationIsSource,
    /// An earlier candidate in this batch already writes the same destination.
    DuplicateDestination { first: PathBuf },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DestinationIsSource => {
                write!(f, "destination equals source; overwrite not enabled")
            }
            SkipReason::DuplicateDestination { first } => {
                write!(f, "destination already produced by {}", first.display())
            }
        }
    }
}

/// Failure while moving the encoded file into place (overwrite mode).
///
/// Kept apart from codec errors because it can leave the directory in a
/// state that needs a human to look at it.
#[derive(Error, Debug)]
pub enum FinalizeError {
    #[error("could not remove original {}: {source}", original.display())]
    RemoveOriginal {
        original: PathBuf,
        source: std::io::Error,
    },
    #[error(
        "removed original {} but could not rename {} into its place: {source}; \
         the converted image is kept at {}",
        original.display(),
        temp.display(),
        temp.display()
    )]
    RenameTemp {
        original: PathBuf,
        temp: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Image processing failed: {0}")]
    Codec(#[from] BackendError),
    #[error("Could not read size of {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Temp path {} already exists; move it aside and run again", path.display())]
    TempPathExists { path: PathBuf },
    #[error("Finalize failed: {0}")]
    Finalize(#[from] FinalizeError),
}

impl ConvertError {
    /// True when the filesystem may be partially mutated.
    pub fn is_finalize(&self) -> bool {
        matches!(self, ConvertError::Finalize(_))
    }
}

/// Terminal state of one candidate.
#[derive(Debug)]
pub enum ConversionResult {
    Success {
        old_size_bytes: u64,
        new_size_bytes: u64,
        final_path: PathBuf,
    },
    Skipped {
        reason: SkipReason,
    },
    Failure {
        error: ConvertError,
    },
}

/// A result tagged with the candidate it belongs to.
#[derive(Debug)]
pub struct ConversionOutcome {
    pub source: PathBuf,
    pub result: ConversionResult,
}

/// Direction of a size change, for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeChange {
    Decreased,
    Unchanged,
    Increased,
}

impl SizeChange {
    /// Classify on the exact byte counts, so a one-byte saving is still
    /// "decreased" even though it rounds to 0.00 KB.
    pub fn classify(old_bytes: u64, new_bytes: u64) -> Self {
        match new_bytes.cmp(&old_bytes) {
            std::cmp::Ordering::Less => SizeChange::Decreased,
            std::cmp::Ordering::Equal => SizeChange::Unchanged,
            std::cmp::Ordering::Greater => SizeChange::Increased,
        }
    }
}

/// `(new - old) / 1000`, rounded to two decimals. Decimal kilobytes.
pub fn size_delta_kb(old_bytes: u64, new_bytes: u64) -> f64 {
    let diff = new_bytes as f64 - old_bytes as f64;
    let kb = (diff / 1000.0 * 100.0).round() / 100.0;
    // -0.0 → 0.0
    kb + 0.0
}

/// All outcomes of a batch, in candidate order.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<ConversionOutcome>,
}

impl BatchSummary {
    pub fn converted(&self) -> usize {
        self.count(|r| matches!(r, ConversionResult::Success { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|r| matches!(r, ConversionResult::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|r| matches!(r, ConversionResult::Failure { .. }))
    }

    /// Total (old, new) bytes over converted files.
    pub fn total_sizes(&self) -> (u64, u64) {
        self.outcomes
            .iter()
            .filter_map(|o| match o.result {
                ConversionResult::Success {
                    old_size_bytes,
                    new_size_bytes,
                    ..
                } => Some((old_size_bytes, new_size_bytes)),
                _ => None,
            })
            .fold((0, 0), |(old, new), (o, n)| (old + o, new + n))
    }

    fn count(&self, pred: impl Fn(&ConversionResult) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.result)).count()
    }
}

// ============================================================================
// Progress events
// ============================================================================

/// Progress events for the reporter, sent as each file finishes.
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertEvent {
    BatchStarted {
        total: usize,
    },
    Converted {
        source: PathBuf,
        final_path: PathBuf,
        old_size_bytes: u64,
        new_size_bytes: u64,
    },
    Skipped {
        source: PathBuf,
        reason: SkipReason,
    },
    Failed {
        source: PathBuf,
        message: String,
        /// The failure happened while swapping files, not while encoding.
        finalize: bool,
    },
}

impl From<&ConversionOutcome> for ConvertEvent {
    fn from(outcome: &ConversionOutcome) -> Self {
        let source = outcome.source.clone();
        match &outcome.result {
            ConversionResult::Success {
                old_size_bytes,
                new_size_bytes,
                final_path,
            } => ConvertEvent::Converted {
                source,
                final_path: final_path.clone(),
                old_size_bytes: *old_size_bytes,
                new_size_bytes: *new_size_bytes,
            },
            ConversionResult::Skipped { reason } => ConvertEvent::Skipped {
                source,
                reason: reason.clone(),
            },
            ConversionResult::Failure { error } => ConvertEvent::Failed {
                source,
                message: error.to_string(),
                finalize: error.is_finalize(),
            },
        }
    }
}

// ============================================================================
// Planning
// ============================================================================

/// A derived plan plus the batch-level decision to skip it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedConversion {
    pub plan: ConversionPlan,
    pub skip: Option<SkipReason>,
}

/// Derive plans for a whole batch and resolve destination collisions.
pub fn plan_batch(files: &[PathBuf], options: &ConversionOptions) -> Vec<PlannedConversion> {
    let mut writers: HashMap<PathBuf, PathBuf> = HashMap::new();
    files
        .iter()
        .map(|source| {
            let plan = plan_conversion(source, options);
            let skip = if plan.will_overwrite_source {
                Some(SkipReason::DestinationIsSource)
            } else if options.overwrite {
                None
            } else if let Some(first) = writers.get(&plan.destination_path) {
                Some(SkipReason::DuplicateDestination {
                    first: first.clone(),
                })
            } else {
                writers.insert(plan.destination_path.clone(), source.clone());
                None
            };
            PlannedConversion { plan, skip }
        })
        .collect()
}

/// Group plan indices so that plans touching a common path share a group.
///
/// Groups keep candidate order internally and are ordered by their first
/// member.
fn group_by_touched_paths(planned: &[PlannedConversion]) -> Vec<Vec<usize>> {
    let mut parent: Vec<usize> = (0..planned.len()).collect();
    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    let mut owner: HashMap<&Path, usize> = HashMap::new();
    for (i, p) in planned.iter().enumerate() {
        let touched = [p.plan.source_path.as_path(), p.plan.write_target()];
        for path in touched {
            match owner.get(path) {
                Some(&j) => {
                    let (a, b) = (find(&mut parent, i), find(&mut parent, j));
                    if a != b {
                        parent[a.max(b)] = a.min(b);
                    }
                }
                None => {
                    owner.insert(path, i);
                }
            }
        }
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut slot: HashMap<usize, usize> = HashMap::new();
    for i in 0..planned.len() {
        let root = find(&mut parent, i);
        let idx = *slot.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[idx].push(i);
    }
    groups
}

// ============================================================================
// Execution
// ============================================================================

/// Run one plan through encoding and finalizing.
///
/// The returned result is terminal; no error escapes.
pub fn convert_file(
    backend: &impl ImageBackend,
    plan: &ConversionPlan,
    options: &ConversionOptions,
) -> ConversionResult {
    if plan.will_overwrite_source {
        return ConversionResult::Skipped {
            reason: SkipReason::DestinationIsSource,
        };
    }
    match encode_and_finalize(backend, plan, options) {
        Ok((old_size_bytes, new_size_bytes)) => ConversionResult::Success {
            old_size_bytes,
            new_size_bytes,
            final_path: plan.final_path().to_path_buf(),
        },
        Err(error) => ConversionResult::Failure { error },
    }
}

fn encode_and_finalize(
    backend: &impl ImageBackend,
    plan: &ConversionPlan,
    options: &ConversionOptions,
) -> Result<(u64, u64), ConvertError> {
    let params = ConvertParams {
        source: plan.source_path.clone(),
        output: plan.write_target().to_path_buf(),
        resize: options.resize_spec(),
        quality: options.quality(),
    };
    debug!(
        "encoding {} -> {}",
        params.source.display(),
        params.output.display()
    );

    // The swap renames the temp file away, so an existing file there would
    // be lost.
    if plan.overwrite && std::fs::symlink_metadata(&plan.temp_swap_path).is_ok() {
        return Err(ConvertError::TempPathExists {
            path: plan.temp_swap_path.clone(),
        });
    }

    if let Err(e) = backend.convert(&params) {
        if plan.overwrite {
            discard_temp(&plan.temp_swap_path);
        }
        return Err(e.into());
    }

    if plan.overwrite {
        swap_into_place(plan, &StdSwap)
    } else {
        let old = file_size(&plan.source_path)?;
        let new = file_size(&plan.destination_path)?;
        Ok((old, new))
    }
}

/// The two filesystem steps of the overwrite swap.
trait SwapOps {
    fn remove_file(&self, path: &Path) -> std::io::Result<()>;
    fn rename(&self, from: &Path, to: &Path) -> std::io::Result<()>;
}

struct StdSwap;

impl SwapOps for StdSwap {
    fn remove_file(&self, path: &Path) -> std::io::Result<()> {
        std::fs::remove_file(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> std::io::Result<()> {
        std::fs::rename(from, to)
    }
}

/// Replace the source with the encoded temp file.
fn swap_into_place(
    plan: &ConversionPlan,
    ops: &impl SwapOps,
) -> Result<(u64, u64), ConvertError> {
    let sizes = file_size(&plan.source_path)
        .and_then(|old| Ok((old, file_size(&plan.temp_swap_path)?)));
    let (old, new) = match sizes {
        Ok(sizes) => sizes,
        Err(e) => {
            discard_temp(&plan.temp_swap_path);
            return Err(e);
        }
    };

    if let Err(source) = ops.remove_file(&plan.source_path) {
        discard_temp(&plan.temp_swap_path);
        return Err(FinalizeError::RemoveOriginal {
            original: plan.source_path.clone(),
            source,
        }
        .into());
    }

    ops.rename(&plan.temp_swap_path, &plan.source_path).map_err(|source| {
        FinalizeError::RenameTemp {
            original: plan.source_path.clone(),
            temp: plan.temp_swap_path.clone(),
            source,
        }
    })?;
    debug!("replaced {} in place", plan.source_path.display());
    Ok((old, new))
}

fn file_size(path: &Path) -> Result<u64, ConvertError> {
    std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|source| ConvertError::Metadata {
            path: path.to_path_buf(),
            source,
        })
}

/// Best-effort removal of a temp file that will never be swapped in.
fn discard_temp(temp: &Path) {
    match std::fs::remove_file(temp) {
        Ok(()) => debug!("removed temp file {}", temp.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("could not remove temp file {}: {}", temp.display(), e),
    }
}

/// Convert a batch of candidate files.
///
/// Returns one outcome per candidate, in candidate order. When `events` is
/// given, a [`ConvertEvent`] is sent as each file reaches a terminal state.
pub fn convert_batch(
    backend: &impl ImageBackend,
    files: &[PathBuf],
    options: &ConversionOptions,
    events: Option<Sender<ConvertEvent>>,
) -> BatchSummary {
    let planned = plan_batch(files, options);
    send(&events, ConvertEvent::BatchStarted {
        total: planned.len(),
    });

    let run_one = |i: usize| -> (usize, ConversionOutcome) {
        let PlannedConversion { plan, skip } = &planned[i];
        let result = match skip {
            Some(reason) => ConversionResult::Skipped {
                reason: reason.clone(),
            },
            None => convert_file(backend, plan, options),
        };
        let outcome = ConversionOutcome {
            source: plan.source_path.clone(),
            result,
        };
        send(&events, ConvertEvent::from(&outcome));
        (i, outcome)
    };

    let mut indexed: Vec<(usize, ConversionOutcome)> = if options.is_parallel() {
        let groups = group_by_touched_paths(&planned);
        let threads = effective_threads(options.jobs);
        debug!("{} group(s) on {} thread(s)", groups.len(), threads);
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(|| {
                groups
                    .par_iter()
                    .flat_map_iter(|group| {
                        group.iter().map(|&i| run_one(i)).collect::<Vec<_>>()
                    })
                    .collect()
            }),
            Err(e) => {
                warn!("could not start thread pool, converting sequentially: {}", e);
                (0..planned.len()).map(run_one).collect()
            }
        }
    } else {
        (0..planned.len()).map(run_one).collect()
    };

    indexed.sort_by_key(|(i, _)| *i);
    BatchSummary {
        outcomes: indexed.into_iter().map(|(_, o)| o).collect(),
    }
}

fn send(events: &Option<Sender<ConvertEvent>>, event: ConvertEvent) {
    if let Some(tx) = events {
        // The receiver only goes away when the printer is gone; results are
        // still returned to the caller.
        let _ = tx.send(event);
    }
}

/// A plan preview for `--dry-run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewEntry {
    pub planned: PlannedConversion,
    /// Source dimensions, if the codec could read them.
    pub source_dimensions: Option<(u32, u32)>,
    /// Dimensions the output would have.
    pub output_dimensions: Option<(u32, u32)>,
}

/// Derive every plan without encoding or moving anything.
pub fn preview_batch(
    backend: &impl ImageBackend,
    files: &[PathBuf],
    options: &ConversionOptions,
) -> Vec<PreviewEntry> {
    let resize = options.resize_spec();
    plan_batch(files, options)
        .into_iter()
        .map(|planned| {
            let source_dimensions = match backend.identify(&planned.plan.source_path) {
                Ok(d) => Some((d.width, d.height)),
                Err(e) => {
                    debug!(
                        "could not identify {}: {}",
                        planned.plan.source_path.display(),
                        e
                    );
                    None
                }
            };
            let output_dimensions = source_dimensions.map(|dims| match &resize {
                Some(spec) => calculate_layout(dims, spec).output_dimensions(dims),
                None => dims,
            });
            PreviewEntry {
                planned,
                source_dimensions,
                output_dimensions,
            }
        })
        .collect()
}
