//! 2D geometry kernel.
//!
//! Pure, stateless functions over [`Point2D`] and ordered point sequences.
//! Coordinates follow the page image convention: the origin is the top-left
//! corner and y grows downwards, so a positive shoelace area is a clockwise
//! polygon on screen.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::constants::{INTERSECTION_EPSILON, LENGTH_EPSILON, SIDE_TOLERANCE};

/// A point (or vector) in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Point2D) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product.
    pub fn cross(self, other: Point2D) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn distance_to(self, other: Point2D) -> f64 {
        (other - self).length()
    }

    /// Unit vector in the same direction, `None` for a zero-length vector.
    pub fn normalized(self) -> Option<Point2D> {
        let len = self.length();
        if len < LENGTH_EPSILON {
            None
        } else {
            Some(Point2D::new(self.x / len, self.y / len))
        }
    }

    /// Perpendicular vector `(-y, x)`.
    pub fn perpendicular(self) -> Point2D {
        Point2D::new(-self.y, self.x)
    }

    pub fn midpoint(self, other: Point2D) -> Point2D {
        Point2D::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Linear interpolation, `t = 0` yields `self` and `t = 1` yields `other`.
    pub fn lerp(self, other: Point2D, t: f64) -> Point2D {
        self + (other - self) * t
    }

    /// Rotates the point by `degrees` around `origin`.
    pub fn rotated(self, degrees: f64, origin: Point2D) -> Point2D {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let d = self - origin;
        Point2D::new(
            origin.x + d.x * cos - d.y * sin,
            origin.y + d.x * sin + d.y * cos,
        )
    }

    pub fn approx_eq(self, other: Point2D, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

impl Add for Point2D {
    type Output = Point2D;

    fn add(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2D {
    type Output = Point2D;

    fn sub(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point2D {
    type Output = Point2D;

    fn mul(self, rhs: f64) -> Point2D {
        Point2D::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point2D {
    type Output = Point2D;

    fn neg(self) -> Point2D {
        Point2D::new(-self.x, -self.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for Point2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Bounding box of a point sequence, `None` when empty.
    pub fn of(points: &[Point2D]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = BoundingBox {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for p in &points[1..] {
            bbox.min_x = bbox.min_x.min(p.x);
            bbox.min_y = bbox.min_y.min(p.y);
            bbox.max_x = bbox.max_x.max(p.x);
            bbox.max_y = bbox.max_y.max(p.y);
        }
        Some(bbox)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, p: Point2D) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

/// Which side of a directed line a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Positive cross product: clockwise turn in image coordinates.
    Right,
    /// Negative cross product.
    Left,
    /// Collinear within tolerance.
    On,
}

/// Intersection of the infinite lines through `p1`-`p2` and `q1`-`q2`.
///
/// Returns `None` when the lines are parallel or either pair is degenerate.
pub fn intersection(p1: Point2D, p2: Point2D, q1: Point2D, q2: Point2D) -> Option<Point2D> {
    let r = p2 - p1;
    let s = q2 - q1;
    let denom = r.cross(s);
    if denom.abs() < INTERSECTION_EPSILON {
        return None;
    }
    let t = (q1 - p1).cross(s) / denom;
    Some(p1 + r * t)
}

/// Side of the directed line `a`->`b` that `p` lies on.
///
/// The signed area is compared against a tolerance relative to the squared
/// segment length, so collinearity does not depend on the coordinate scale.
pub fn side_of_line(p: Point2D, a: Point2D, b: Point2D) -> Side {
    let ab = b - a;
    let area = ab.cross(p - a);
    let tolerance = SIDE_TOLERANCE * ab.dot(ab).max(LENGTH_EPSILON);
    if area.abs() <= tolerance {
        Side::On
    } else if area > 0.0 {
        Side::Right
    } else {
        Side::Left
    }
}

/// True when the projection of `p` onto line `a`-`b` falls between `a` and `b`.
pub fn within_segment(p: Point2D, a: Point2D, b: Point2D) -> bool {
    let ab = b - a;
    let len2 = ab.dot(ab);
    if len2 < LENGTH_EPSILON {
        return p.approx_eq(a, SIDE_TOLERANCE);
    }
    let t = (p - a).dot(ab) / len2;
    (-SIDE_TOLERANCE..=1.0 + SIDE_TOLERANCE).contains(&t)
}

/// True when `p` lies on the segment `a`-`b`.
pub fn point_in_segment(p: Point2D, a: Point2D, b: Point2D) -> bool {
    side_of_line(p, a, b) == Side::On && within_segment(p, a, b)
}

/// Distance from `p` to the infinite line through `a` and `b`.
pub fn distance_to_line(p: Point2D, a: Point2D, b: Point2D) -> f64 {
    match (b - a).normalized() {
        Some(dir) => dir.cross(p - a).abs(),
        None => p.distance_to(a),
    }
}

/// Distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: Point2D, a: Point2D, b: Point2D) -> f64 {
    let ab = b - a;
    let len2 = ab.dot(ab);
    if len2 < LENGTH_EPSILON {
        return p.distance_to(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance_to(a + ab * t)
}

/// Shoelace signed area. Positive for clockwise winding on screen.
pub fn signed_area(polygon: &[Point2D]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let n = polygon.len();
    let twice: f64 = (0..n)
        .map(|i| polygon[i].cross(polygon[(i + 1) % n]))
        .sum();
    twice / 2.0
}

/// Returns the polygon with clockwise winding, reversing it if needed.
pub fn standardize_clockwise(polygon: &[Point2D]) -> Vec<Point2D> {
    let mut points = polygon.to_vec();
    if signed_area(&points) < 0.0 {
        tracing::trace!(points = points.len(), "reversing counter-clockwise polygon");
        points.reverse();
    }
    points
}

/// Clockwise standardization followed by a canonical start vertex.
///
/// The start moves to the vertex that begins the flattest rightward edge, which
/// puts the top-left corner first for quadrilaterals.
pub fn standardize_quad(polygon: &[Point2D]) -> Vec<Point2D> {
    let mut points = standardize_clockwise(polygon);
    let n = points.len();
    if n < 2 {
        return points;
    }

    let mut best: Option<(usize, f64)> = None;
    for i in 0..n {
        let d = points[(i + 1) % n] - points[i];
        if d.x <= 0.0 {
            continue;
        }
        let slope = (d.y / d.x).abs();
        if best.is_none_or(|(_, s)| slope < s) {
            best = Some((i, slope));
        }
    }

    if let Some((start, _)) = best {
        points.rotate_left(start);
    }
    points
}

/// Point-in-polygon test by ray casting. Points on the boundary count as inside.
pub fn point_in_polygon(p: Point2D, polygon: &[Point2D]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        if point_in_segment(p, polygon[i], polygon[(i + 1) % n]) {
            return true;
        }
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Total length of an open polyline.
pub fn polyline_length(points: &[Point2D]) -> f64 {
    points.windows(2).map(|w| w[0].distance_to(w[1])).sum()
}

/// Direction of the segment `a`->`b` in degrees, in `(-180, 180]`.
pub fn segment_angle(a: Point2D, b: Point2D) -> f64 {
    let d = b - a;
    d.y.atan2(d.x).to_degrees()
}

/// Absolute turn between two directions in degrees, in `[0, 180]`.
pub fn angle_between(first: f64, second: f64) -> f64 {
    let mut diff = (second - first) % 360.0;
    if diff > 180.0 {
        diff -= 360.0;
    } else if diff < -180.0 {
        diff += 360.0;
    }
    diff.abs()
}

/// Rotates every point by `degrees` around `origin`.
pub fn rotate_points(points: &[Point2D], degrees: f64, origin: Point2D) -> Vec<Point2D> {
    if degrees == 0.0 {
        return points.to_vec();
    }
    points.iter().map(|p| p.rotated(degrees, origin)).collect()
}

/// Translates every point by `(dx, dy)`.
pub fn translate_points(points: &[Point2D], dx: f64, dy: f64) -> Vec<Point2D> {
    let delta = Point2D::new(dx, dy);
    points.iter().map(|p| *p + delta).collect()
}
