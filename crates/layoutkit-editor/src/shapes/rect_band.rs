//! Polyrect bands: axis-aligned rectangles in the text orientation frame.
//!
//! The baseline is rotated by `-rotation` degrees around the origin into the
//! text frame. There the band spans from the first to the last baseline x,
//! and vertically from `min_y - height * offset` to `max_y + height * (1 - offset)`.

use layoutkit_core::constants::{BAND_TOLERANCE, LENGTH_EPSILON, MAX_BAND_OFFSET};
use layoutkit_core::{rotate_points, standardize_clockwise, Point2D};

const ORIGIN: Point2D = Point2D::new(0.0, 0.0);

fn y_extent(points: &[Point2D]) -> (f64, f64) {
    points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        })
}

/// Builds the 4-point polyrect for `baseline`; empty below two points.
pub fn build_rect_band(baseline: &[Point2D], height: f64, offset: f64, rotation: f64) -> Vec<Point2D> {
    if baseline.len() < 2 {
        return Vec::new();
    }
    let offset = offset.clamp(0.0, MAX_BAND_OFFSET);
    let frame = rotate_points(baseline, -rotation, ORIGIN);
    let (min_y, max_y) = y_extent(&frame);
    let x0 = frame[0].x;
    let x1 = frame[frame.len() - 1].x;
    let top = min_y - height * offset;
    let bottom = max_y + height * (1.0 - offset);
    let rect = [
        Point2D::new(x0, top),
        Point2D::new(x1, top),
        Point2D::new(x1, bottom),
        Point2D::new(x0, bottom),
    ];
    rotate_points(&rect, rotation, ORIGIN)
}

/// Recovers `(height, offset)` when `coords` is the polyrect of `baseline`,
/// comparing in the text frame with an absolute `tolerance`.
pub fn is_rect_band(
    coords: &[Point2D],
    baseline: &[Point2D],
    rotation: f64,
    tolerance: f64,
) -> Option<(f64, f64)> {
    if coords.len() != 4 || baseline.len() < 2 {
        return None;
    }
    let line = rotate_points(baseline, -rotation, ORIGIN);
    let c = rotate_points(coords, -rotation, ORIGIN);
    let (min_y, max_y) = y_extent(&line);
    let x0 = line[0].x;
    let x1 = line[line.len() - 1].x;

    let close = |a: f64, b: f64| (a - b).abs() <= tolerance;
    if !(close(c[0].x, x0) && close(c[3].x, x0) && close(c[1].x, x1) && close(c[2].x, x1)) {
        return None;
    }
    if !(close(c[0].y, c[1].y) && close(c[2].y, c[3].y)) {
        return None;
    }

    let top = (c[0].y + c[1].y) / 2.0;
    let bottom = (c[2].y + c[3].y) / 2.0;
    if top > min_y + tolerance || bottom < max_y - tolerance {
        return None;
    }
    let height = (bottom - top) - (max_y - min_y);
    if height < LENGTH_EPSILON {
        return None;
    }
    let offset = (min_y - top) / height;
    if offset > MAX_BAND_OFFSET + BAND_TOLERANCE.max(tolerance / height) {
        return None;
    }
    Some((height, offset.clamp(0.0, MAX_BAND_OFFSET)))
}

/// A polyrect found by [`standardize_rect_band`].
#[derive(Debug, Clone, PartialEq)]
pub struct RectBandMatch {
    /// Coords reordered into canonical order.
    pub coords: Vec<Point2D>,
    pub height: f64,
    pub offset: f64,
    /// The baseline had to be reversed to match; the caller stores it reversed.
    pub baseline_reversed: bool,
}

/// Every start vertex of the clockwise traversal.
fn orderings(coords: &[Point2D]) -> Vec<Vec<Point2D>> {
    let clockwise = standardize_clockwise(coords);
    (0..clockwise.len())
        .map(|start| {
            let mut candidate = clockwise.clone();
            candidate.rotate_left(start);
            candidate
        })
        .collect()
}

/// Finds the clockwise start vertex that makes a 4-point polygon the polyrect
/// of `baseline`, first with the baseline as given and then reversed.
pub fn standardize_rect_band(
    coords: &[Point2D],
    baseline: &[Point2D],
    rotation: f64,
    tolerance: f64,
) -> Option<RectBandMatch> {
    if coords.len() != 4 {
        return None;
    }
    let mut reversed_line = baseline.to_vec();
    reversed_line.reverse();
    for (line, baseline_reversed) in [(baseline.to_vec(), false), (reversed_line, true)] {
        for candidate in orderings(coords) {
            if let Some((height, offset)) = is_rect_band(&candidate, &line, rotation, tolerance) {
                if baseline_reversed {
                    tracing::debug!("polyrect matched against the reversed baseline");
                }
                return Some(RectBandMatch {
                    coords: candidate,
                    height,
                    offset,
                    baseline_reversed,
                });
            }
        }
    }
    None
}
