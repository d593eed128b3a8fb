//! Table grid editor.
//!
//! - [`grid`]: the corner lattice and its constrained line and corner drags
//! - [`structure`]: table creation and row/column insertion and deletion
//! - [`mode`]: the edit behavior driving grid drags from pointer input

pub mod grid;
pub mod mode;
pub mod structure;

pub use grid::{Axis, Corner, CornerDrag, Grid, GridHandle, GridRatios};
pub use mode::TableBehavior;
pub use structure::cell_id;
