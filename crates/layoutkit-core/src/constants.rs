//! Numeric tolerances shared by the geometry kernel and the shape layer.

/// Cross products of direction vectors below this magnitude are treated as parallel.
pub const INTERSECTION_EPSILON: f64 = 1e-8;

/// Relative area tolerance for side-of-line and collinearity tests.
pub const SIDE_TOLERANCE: f64 = 1e-3;

/// Tolerance for the band (polystripe) inverse check, on unit vectors.
pub const BAND_TOLERANCE: f64 = 1e-2;

/// Absolute tolerance, in document units, for the polyrect check.
pub const RECT_TOLERANCE: f64 = 1.0;

/// Lengths below this are treated as zero when normalizing vectors.
pub const LENGTH_EPSILON: f64 = 1e-9;

/// Largest offset ratio a derived band may carry.
pub const MAX_BAND_OFFSET: f64 = 0.5;
