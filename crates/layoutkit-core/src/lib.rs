//! # LayoutKit Core
//!
//! Core types and utilities for LayoutKit.
//! Provides the error taxonomy, numeric tolerances, the stateless 2D
//! geometry kernel, and the callback aliases used by the editing layer.

pub mod constants;
pub mod error;
pub mod geometry;
pub mod types;

pub use error::{Error, GeometryError, IoFailure, ParseError, Result, StructureError};

pub use geometry::{
    angle_between, distance_to_line, distance_to_segment, intersection, point_in_polygon,
    point_in_segment, polyline_length, rotate_points, segment_angle, side_of_line, signed_area,
    standardize_clockwise, standardize_quad, translate_points, within_segment, BoundingBox,
    Point2D, Side,
};

pub use types::{
    shared, InvalidTextCallback, NodeCallback, Predicate, ReparentCallback, Shared,
};
