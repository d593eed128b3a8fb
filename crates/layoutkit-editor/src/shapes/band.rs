//! Polystripe bands: a baseline offset along its own normals.
//!
//! For a segment with unit direction `d` the normal is `n = (-d.y, d.x)`. The
//! ascender side lies at `-n * height * offset`, the descender side at
//! `+n * height * (1 - offset)`. The polygon lists the ascender side in
//! baseline order, then the descender side reversed.

use layoutkit_core::constants::{BAND_TOLERANCE, LENGTH_EPSILON, MAX_BAND_OFFSET};
use layoutkit_core::{distance_to_line, intersection, Point2D};

/// Unit direction of every baseline segment. Degenerate segments borrow the
/// direction of the nearest usable neighbour; `None` when all are degenerate.
fn segment_directions(baseline: &[Point2D]) -> Option<Vec<Point2D>> {
    let raw: Vec<Option<Point2D>> = baseline
        .windows(2)
        .map(|w| (w[1] - w[0]).normalized())
        .collect();
    let fallback = raw.iter().flatten().next().copied()?;
    let mut last = fallback;
    Some(
        raw.into_iter()
            .map(|d| {
                if let Some(d) = d {
                    last = d;
                }
                last
            })
            .collect(),
    )
}

/// One offset side of the band, joints resolved by intersecting neighbours.
fn offset_side(baseline: &[Point2D], dirs: &[Point2D], distance: f64) -> Vec<Point2D> {
    let n = baseline.len();
    let shift = |i: usize, seg: usize| baseline[i] + dirs[seg].perpendicular() * distance;
    (0..n)
        .map(|i| {
            if i == 0 {
                shift(0, 0)
            } else if i == n - 1 {
                shift(i, n - 2)
            } else {
                intersection(shift(i - 1, i - 1), shift(i, i - 1), shift(i, i), shift(i + 1, i))
                    .unwrap_or_else(|| shift(i, i))
            }
        })
        .collect()
}

/// Builds the band polygon around `baseline`.
///
/// Returns `2 * baseline.len()` points, or nothing when the baseline has fewer
/// than two distinct points. `offset` is clamped to `[0, 0.5]`.
pub fn build_band(baseline: &[Point2D], height: f64, offset: f64) -> Vec<Point2D> {
    if baseline.len() < 2 {
        return Vec::new();
    }
    let Some(dirs) = segment_directions(baseline) else {
        return Vec::new();
    };
    let offset = offset.clamp(0.0, MAX_BAND_OFFSET);
    let ascender = offset_side(baseline, &dirs, -height * offset);
    let descender = offset_side(baseline, &dirs, height * (1.0 - offset));

    let mut band = ascender;
    band.extend(descender.into_iter().rev());
    band
}

fn collinear(a: Point2D, p: Point2D, b: Point2D) -> bool {
    match ((p - a).normalized(), (b - p).normalized()) {
        (Some(u), Some(v)) => u.cross(v).abs() < BAND_TOLERANCE && u.dot(v) > 0.0,
        _ => true,
    }
}

fn parallel(edge: Point2D, dir: Point2D) -> bool {
    match edge.normalized() {
        Some(e) => e.dot(dir) >= 1.0 - BAND_TOLERANCE,
        None => true,
    }
}

/// Recovers `(height, offset)` when `coords` is the band of `baseline`.
pub fn is_band(coords: &[Point2D], baseline: &[Point2D]) -> Option<(f64, f64)> {
    let n = baseline.len();
    if n < 2 || coords.len() != 2 * n {
        return None;
    }
    let dirs = segment_directions(baseline)?;
    let a = |i: usize| coords[i];
    let b = |i: usize| coords[2 * n - 1 - i];

    let height = a(0).distance_to(b(0));
    if height < LENGTH_EPSILON {
        return None;
    }

    for i in 0..n {
        if !collinear(a(i), baseline[i], b(i)) {
            return None;
        }
    }
    for (seg, dir) in dirs.iter().enumerate() {
        if !parallel(a(seg + 1) - a(seg), *dir) || !parallel(b(seg + 1) - b(seg), *dir) {
            return None;
        }
    }

    let across_first = (b(0) - a(0)).normalized()?;
    let across_last = (b(n - 1) - a(n - 1)).normalized()?;
    if across_first.dot(dirs[0]).abs() > BAND_TOLERANCE
        || across_last.dot(dirs[n - 2]).abs() > BAND_TOLERANCE
    {
        return None;
    }
    // the descender side must lie along +n
    if across_first.dot(dirs[0].perpendicular()) <= 0.0 {
        return None;
    }

    let ascent = a(0).distance_to(baseline[0]);
    let descent = height - ascent;
    let tolerance = BAND_TOLERANCE * height.max(1.0);
    for (seg, _) in dirs.iter().enumerate() {
        let (p, q) = (baseline[seg], baseline[seg + 1]);
        if p.distance_to(q) < LENGTH_EPSILON {
            continue;
        }
        for i in [seg, seg + 1] {
            if (distance_to_line(a(i), p, q) - ascent).abs() > tolerance
                || (distance_to_line(b(i), p, q) - descent).abs() > tolerance
            {
                return None;
            }
        }
    }

    let offset = ascent / height;
    if offset > MAX_BAND_OFFSET + BAND_TOLERANCE {
        return None;
    }
    Some((height, offset.clamp(0.0, MAX_BAND_OFFSET)))
}
