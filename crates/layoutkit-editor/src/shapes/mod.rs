//! Shape derivation and validation.
//!
//! - [`band`]: polystripe construction around a baseline and its inverse check
//! - [`rect_band`]: polyrect construction, detection and standardization
//! - [`validation`]: per-element point validators

pub mod band;
pub mod rect_band;
pub mod validation;

pub use band::{build_band, is_band};
pub use rect_band::{build_rect_band, is_rect_band, standardize_rect_band, RectBandMatch};
pub use validation::{ShapeKind, Stage, ValidationLimits, Validator};
