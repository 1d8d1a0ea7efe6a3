//! # towebp
//!
//! Batch-convert PNG, JPEG and WebP images to lossy WebP. Output files get
//! dash-case, accent-free names derived from the source name, can be resized
//! with sharp-style fit and gravity options, and can replace the originals in
//! place.
//!
//! # Architecture
//!
//! A run is a straight line from a target path to one result per file:
//!
//! ```text
//! 1. Resolve   target        →  candidate files     (scan)
//! 2. Plan      each file     →  destination + temp  (plan, slug)
//! 3. Convert   each plan     →  result              (convert, imaging)
//! 4. Report    results       →  console / JSON      (output)
//! ```
//!
//! The orchestrator never prints: it returns typed results and sends progress
//! events, and the binary hands both to the reporter. That keeps the
//! file-safety logic testable against a mock codec and a temp directory.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Resolves the target into sorted candidate images |
//! | [`slug`] | Dash-case, ASCII-only name normalization |
//! | [`plan`] | Destination and temp-swap path derivation |
//! | [`convert`] | Per-file state machine, overwrite swap, batch isolation |
//! | [`imaging`] | Decode, resize geometry, lossy WebP encode |
//! | [`config`] | Run options, validation, thread count |
//! | [`output`] | Console lines and the `--json` report |
//!
//! # File Safety
//!
//! Without `overwrite` the source is never modified. A source whose derived
//! destination is itself is skipped, and two sources that would produce the
//! same destination in one batch are resolved first-come, first-served.
//!
//! With `overwrite` the encoder writes `<slug>-temp.webp`, then the original is
//! deleted and the temp file renamed to the original's name. If deleting the
//! original fails, the temp file is removed and the original stays. If the
//! rename fails, the converted image is left at the temp path and the error
//! names both paths.

pub mod config;
pub mod convert;
pub mod imaging;
pub mod output;
pub mod plan;
pub mod scan;
pub mod slug;

#[cfg(test)]
pub(crate) mod test_helpers;
