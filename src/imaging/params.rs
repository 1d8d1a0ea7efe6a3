//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the orchestrator (which decides which file goes where)
//! and the [`backend`](super::backend) (which does the actual pixel work).
//! This separation allows swapping backends (e.g. for testing with a mock)
//! without changing conversion logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy WebP quality (1–100, default 80). Clamped on construction.
//! - [`Fit`]: How a resize reconciles the source aspect ratio with the target box.
//! - [`Position`]: Gravity anchor for cropping (`cover`) and placement (`contain`).
//! - [`ResizeSpec`]: Optional target width/height plus fit and position.
//! - [`ConvertParams`]: Everything one conversion needs: source, output, resize, quality.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Resize policy, named after the equivalent sharp/libvips options.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Fit {
    /// Scale to cover the box, then crop the overflow at [`Position`].
    #[default]
    Cover,
    /// Scale to fit inside the box, then pad to the exact size.
    Contain,
    /// Stretch to the exact size, ignoring the aspect ratio.
    Fill,
    /// Scale to fit inside the box; the result may be smaller on one axis.
    Inside,
    /// Scale so both axes reach the box; the result may be larger on one axis.
    Outside,
}

/// Gravity anchor.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    #[value(alias = "center")]
    Centre,
    #[value(alias = "top")]
    North,
    #[value(name = "northeast", aliases = ["right-top", "top-right"])]
    NorthEast,
    #[value(alias = "right")]
    East,
    #[value(name = "southeast", aliases = ["right-bottom", "bottom-right"])]
    SouthEast,
    #[value(alias = "bottom")]
    South,
    #[value(name = "southwest", aliases = ["left-bottom", "bottom-left"])]
    SouthWest,
    #[value(alias = "left")]
    West,
    #[value(name = "northwest", aliases = ["left-top", "top-left"])]
    NorthWest,
}

/// Where an inner span sits within an outer span along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Position {
    /// Horizontal and vertical anchors for this gravity.
    pub fn anchors(self) -> (Anchor, Anchor) {
        use Anchor::*;
        match self {
            Position::Centre => (Middle, Middle),
            Position::North => (Middle, Start),
            Position::NorthEast => (End, Start),
            Position::East => (End, Middle),
            Position::SouthEast => (End, End),
            Position::South => (Middle, End),
            Position::SouthWest => (Start, End),
            Position::West => (Start, Middle),
            Position::NorthWest => (Start, Start),
        }
    }
}

/// Requested resize. At least one field was set by the user; the rest carry
/// their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeSpec {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fit: Fit,
    pub position: Position,
}

/// Parameters for one decode → (resize) → WebP encode operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// `None` skips the resize stage entirely.
    pub resize: Option<ResizeSpec>,
    pub quality: Quality,
}
