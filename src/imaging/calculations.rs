//! Pure calculation functions for resize geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! The semantics follow sharp's `resize({ width, height, fit, position })`:
//! a missing dimension is derived from the source aspect ratio, and `fit`
//! decides what happens when the two aspect ratios differ.

use super::params::{Anchor, Fit, ResizeSpec};

/// Geometry for one resize, ready for the backend to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeLayout {
    /// Output keeps the source dimensions.
    Unchanged,
    /// Scale straight to `width` x `height`.
    Scale { width: u32, height: u32 },
    /// Scale to `scaled`, then cut a `width` x `height` window at (`x`, `y`).
    ScaleCrop {
        scaled: (u32, u32),
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    /// Scale to `scaled`, then place it at (`x`, `y`) on a `width` x `height` canvas.
    ScalePad {
        scaled: (u32, u32),
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}

impl ResizeLayout {
    /// Final output dimensions for a source of the given size.
    pub fn output_dimensions(&self, source: (u32, u32)) -> (u32, u32) {
        match *self {
            ResizeLayout::Unchanged => source,
            ResizeLayout::Scale { width, height }
            | ResizeLayout::ScaleCrop { width, height, .. }
            | ResizeLayout::ScalePad { width, height, .. } => (width, height),
        }
    }
}

/// Resolve the target box from optional width and height.
///
/// A missing side follows the source aspect ratio. Returns `None` when
/// neither side is given.
pub fn target_box(
    source: (u32, u32),
    width: Option<u32>,
    height: Option<u32>,
) -> Option<(u32, u32)> {
    let (src_w, src_h) = source;
    match (width, height) {
        (Some(w), Some(h)) => Some((w, h)),
        (Some(w), None) => Some((w, scale_edge(src_h, w as f64 / src_w as f64))),
        (None, Some(h)) => Some((scale_edge(src_w, h as f64 / src_h as f64), h)),
        (None, None) => None,
    }
}

/// Scale one edge by `ratio`, rounding and never collapsing below 1px.
fn scale_edge(edge: u32, ratio: f64) -> u32 {
    ((edge as f64 * ratio).round() as u32).max(1)
}

/// Offset of an `inner` span inside an `outer` span for the given anchor.
///
/// Returns 0 when `inner` does not fit, so callers never underflow.
pub fn anchor_offset(outer: u32, inner: u32, anchor: Anchor) -> u32 {
    let free = outer.saturating_sub(inner);
    match anchor {
        Anchor::Start => 0,
        Anchor::Middle => free / 2,
        Anchor::End => free,
    }
}

/// Compute the resize layout for a source image.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `spec` - Requested width/height/fit/position
///
/// # Returns
/// * The operations the backend has to run, in order
pub fn calculate_layout(source: (u32, u32), spec: &ResizeSpec) -> ResizeLayout {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return ResizeLayout::Unchanged;
    }
    let Some((box_w, box_h)) = target_box(source, spec.width, spec.height) else {
        return ResizeLayout::Unchanged;
    };

    let scale_w = box_w as f64 / src_w as f64;
    let scale_h = box_h as f64 / src_h as f64;

    let layout = match spec.fit {
        Fit::Fill => ResizeLayout::Scale {
            width: box_w,
            height: box_h,
        },
        Fit::Inside => {
            let s = scale_w.min(scale_h);
            ResizeLayout::Scale {
                width: scale_edge(src_w, s).min(box_w),
                height: scale_edge(src_h, s).min(box_h),
            }
        }
        Fit::Outside => {
            let s = scale_w.max(scale_h);
            ResizeLayout::Scale {
                width: scale_edge(src_w, s).max(box_w),
                height: scale_edge(src_h, s).max(box_h),
            }
        }
        Fit::Cover => {
            let s = scale_w.max(scale_h);
            let scaled = (
                scale_edge(src_w, s).max(box_w),
                scale_edge(src_h, s).max(box_h),
            );
            let (h_anchor, v_anchor) = spec.position.anchors();
            ResizeLayout::ScaleCrop {
                scaled,
                x: anchor_offset(scaled.0, box_w, h_anchor),
                y: anchor_offset(scaled.1, box_h, v_anchor),
                width: box_w,
                height: box_h,
            }
        }
        Fit::Contain => {
            let s = scale_w.min(scale_h);
            let scaled = (
                scale_edge(src_w, s).min(box_w),
                scale_edge(src_h, s).min(box_h),
            );
            let (h_anchor, v_anchor) = spec.position.anchors();
            ResizeLayout::ScalePad {
                scaled,
                x: anchor_offset(box_w, scaled.0, h_anchor),
                y: anchor_offset(box_h, scaled.1, v_anchor),
                width: box_w,
                height: box_h,
            }
        }
    };

    simplify(layout, source)
}

/// Drop crop/pad steps that would be no-ops.
fn simplify(layout: ResizeLayout, source: (u32, u32)) -> ResizeLayout {
    let simplified = match layout {
        ResizeLayout::ScaleCrop {
            scaled,
            width,
            height,
            ..
        }
        | ResizeLayout::ScalePad {
            scaled,
            width,
            height,
            ..
        } if scaled == (width, height) => ResizeLayout::Scale { width, height },
        other => other,
    };
    match simplified {
        ResizeLayout::Scale { width, height } if (width, height) == source => {
            ResizeLayout::Unchanged
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Position;

    fn spec(width: Option<u32>, height: Option<u32>, fit: Fit) -> ResizeSpec {
        ResizeSpec {
            width,
            height,
            fit,
            position: Position::Centre,
        }
    }

    // =========================================================================
    // target_box
    // =========================================================================

    #[test]
    fn target_box_both_sides() {
        assert_eq!(target_box((1000, 500), Some(300), Some(300)), Some((300, 300)));
    }

    #[test]
    fn target_box_width_only_keeps_aspect() {
        assert_eq!(target_box((1000, 500), Some(400), None), Some((400, 200)));
    }

    #[test]
    fn target_box_height_only_keeps_aspect() {
        assert_eq!(target_box((1000, 500), None, Some(100)), Some((200, 100)));
    }

    #[test]
    fn target_box_none() {
        assert_eq!(target_box((1000, 500), None, None), None);
    }

    #[test]
    fn target_box_never_zero() {
        assert_eq!(target_box((10_000, 10), Some(10), None), Some((10, 1)));
    }

    // =========================================================================
    // anchor_offset
    // =========================================================================

    #[test]
    fn anchor_offsets() {
        assert_eq!(anchor_offset(100, 40, Anchor::Start), 0);
        assert_eq!(anchor_offset(100, 40, Anchor::Middle), 30);
        assert_eq!(anchor_offset(100, 40, Anchor::End), 60);
    }

    #[test]
    fn anchor_offset_inner_larger_is_zero() {
        assert_eq!(anchor_offset(40, 100, Anchor::End), 0);
    }

    // =========================================================================
    // calculate_layout
    // =========================================================================

    #[test]
    fn no_dimensions_is_unchanged() {
        let layout = calculate_layout((800, 600), &spec(None, None, Fit::Contain));
        assert_eq!(layout, ResizeLayout::Unchanged);
    }

    #[test]
    fn same_size_is_unchanged() {
        let layout = calculate_layout((800, 600), &spec(Some(800), Some(600), Fit::Cover));
        assert_eq!(layout, ResizeLayout::Unchanged);
    }

    #[test]
    fn fill_stretches() {
        let layout = calculate_layout((800, 600), &spec(Some(100), Some(100), Fit::Fill));
        assert_eq!(
            layout,
            ResizeLayout::Scale {
                width: 100,
                height: 100
            }
        );
    }

    #[test]
    fn inside_fits_within_box() {
        // 800x600 into 400x400 → limited by width: 400x300
        let layout = calculate_layout((800, 600), &spec(Some(400), Some(400), Fit::Inside));
        assert_eq!(
            layout,
            ResizeLayout::Scale {
                width: 400,
                height: 300
            }
        );
    }

    #[test]
    fn outside_covers_box_without_crop() {
        // 800x600 to at least 400x400 → limited by height: 533x400
        let layout = calculate_layout((800, 600), &spec(Some(400), Some(400), Fit::Outside));
        assert_eq!(
            layout,
            ResizeLayout::Scale {
                width: 533,
                height: 400
            }
        );
    }

    #[test]
    fn cover_crops_centre() {
        let layout = calculate_layout((800, 600), &spec(Some(400), Some(400), Fit::Cover));
        assert_eq!(
            layout,
            ResizeLayout::ScaleCrop {
                scaled: (533, 400),
                x: 66,
                y: 0,
                width: 400,
                height: 400
            }
        );
    }

    #[test]
    fn cover_crops_at_gravity() {
        let mut s = spec(Some(400), Some(400), Fit::Cover);
        s.position = Position::East;
        let layout = calculate_layout((800, 600), &s);
        assert!(matches!(layout, ResizeLayout::ScaleCrop { x: 133, y: 0, .. }));

        s.position = Position::West;
        let layout = calculate_layout((800, 600), &s);
        assert!(matches!(layout, ResizeLayout::ScaleCrop { x: 0, y: 0, .. }));
    }

    #[test]
    fn cover_portrait_crops_vertically() {
        let mut s = spec(Some(300), Some(300), Fit::Cover);
        s.position = Position::South;
        let layout = calculate_layout((600, 900), &s);
        assert_eq!(
            layout,
            ResizeLayout::ScaleCrop {
                scaled: (300, 450),
                x: 0,
                y: 150,
                width: 300,
                height: 300
            }
        );
    }

    #[test]
    fn contain_pads_centre() {
        let layout = calculate_layout((800, 600), &spec(Some(400), Some(400), Fit::Contain));
        assert_eq!(
            layout,
            ResizeLayout::ScalePad {
                scaled: (400, 300),
                x: 0,
                y: 50,
                width: 400,
                height: 400
            }
        );
    }

    #[test]
    fn contain_pads_at_gravity() {
        let mut s = spec(Some(400), Some(400), Fit::Contain);
        s.position = Position::North;
        let layout = calculate_layout((800, 600), &s);
        assert!(matches!(layout, ResizeLayout::ScalePad { x: 0, y: 0, .. }));

        s.position = Position::South;
        let layout = calculate_layout((800, 600), &s);
        assert!(matches!(layout, ResizeLayout::ScalePad { x: 0, y: 100, .. }));
    }

    #[test]
    fn single_dimension_cover_is_plain_scale() {
        // Box follows the source aspect, so there is nothing to crop.
        let layout = calculate_layout((1000, 500), &spec(Some(400), None, Fit::Cover));
        assert_eq!(
            layout,
            ResizeLayout::Scale {
                width: 400,
                height: 200
            }
        );
    }

    #[test]
    fn enlarges_small_sources() {
        let layout = calculate_layout((100, 50), &spec(Some(400), None, Fit::Inside));
        assert_eq!(
            layout,
            ResizeLayout::Scale {
                width: 400,
                height: 200
            }
        );
    }

    #[test]
    fn output_dimensions_per_layout() {
        assert_eq!(ResizeLayout::Unchanged.output_dimensions((10, 20)), (10, 20));
        let crop = calculate_layout((800, 600), &spec(Some(400), Some(400), Fit::Cover));
        assert_eq!(crop.output_dimensions((800, 600)), (400, 400));
        let pad = calculate_layout((800, 600), &spec(Some(400), Some(400), Fit::Contain));
        assert_eq!(pad.output_dimensions((800, 600)), (400, 400));
    }
}
