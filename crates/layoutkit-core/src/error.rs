//! Error handling for LayoutKit
//!
//! Provides the error taxonomy shared by every layer of the annotation engine:
//! - Geometry errors (a proposed point set fails a validator)
//! - Structure errors (tree or table invariants that cannot be repaired)
//! - Parse errors (malformed serialized documents)
//! - I/O failures (persistence and image providers)
//!
//! Read-only violations and guard-flag rejections live directly on [`Error`].
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Geometry error type
///
/// Raised when a proposed point set fails the validator of the element it
/// belongs to. Always recoverable: the edit is rolled back to the last valid
/// geometry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A point lies outside the page image
    #[error("Point ({x:.1}, {y:.1}) lies outside the page bounds {width}x{height}")]
    OutOfBounds {
        /// X coordinate of the offending point.
        x: f64,
        /// Y coordinate of the offending point.
        y: f64,
        /// Page image width.
        width: f64,
        /// Page image height.
        height: f64,
    },

    /// A point lies outside the parent element's polygon
    #[error("Point ({x:.1}, {y:.1}) lies outside the parent polygon of {parent}")]
    OutsideParent {
        /// X coordinate of the offending point.
        x: f64,
        /// Y coordinate of the offending point.
        y: f64,
        /// Id of the parent element.
        parent: String,
    },

    /// Not enough points for the element type
    #[error("Shape needs at least {min} points, got {got}")]
    TooFewPoints {
        /// The minimum point count.
        min: usize,
        /// The actual point count.
        got: usize,
    },

    /// Bounding box is smaller than the configured minimum
    #[error("Shape bounding box {width:.1}x{height:.1} is below the minimum {min_width:.1}x{min_height:.1}")]
    TooSmall {
        /// Bounding box width.
        width: f64,
        /// Bounding box height.
        height: f64,
        /// Configured minimum width.
        min_width: f64,
        /// Configured minimum height.
        min_height: f64,
    },

    /// Consecutive baseline segments turn too sharply
    #[error("Baseline turns {angle:.1} degrees at point {index}, maximum is {max:.1}")]
    AngleChangeTooLarge {
        /// Vertex index where the turn happens.
        index: usize,
        /// The turn angle in degrees.
        angle: f64,
        /// The configured maximum in degrees.
        max: f64,
    },

    /// First baseline segment direction is outside the allowed range
    #[error("First baseline segment angle {angle:.1} is outside [{min:.1}, {max:.1}]")]
    FirstSegmentAngle {
        /// The first segment angle in degrees.
        angle: f64,
        /// Range minimum in degrees.
        min: f64,
        /// Range maximum in degrees.
        max: f64,
    },

    /// Baseline path is shorter than the configured minimum
    #[error("Baseline length {length:.1} is below the minimum {min:.1}")]
    TooShort {
        /// Total path length.
        length: f64,
        /// Configured minimum length.
        min: f64,
    },

    /// A rectangle-restricted edit produced a non axis-aligned quadrilateral
    #[error("Shape is not an axis-aligned rectangle")]
    NotRectangular,

    /// A point deletion would leave fewer points than allowed
    #[error("Cannot delete a point: {min} points is the minimum")]
    DeletionBelowMinimum {
        /// The minimum point count.
        min: usize,
    },
}

/// Structure error type
///
/// Raised when an operation would break a tree, group or table invariant that
/// cannot be safely repaired. Checked before any state changes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructureError {
    /// No node with the given id exists
    #[error("Node not found: {id}")]
    NodeNotFound {
        /// The missing id.
        id: String,
    },

    /// A node with the given id already exists
    #[error("Duplicate node id: {id}")]
    DuplicateId {
        /// The duplicated id.
        id: String,
    },

    /// The child kind may not live under the parent kind
    #[error("A {child} cannot be placed under a {parent}")]
    InvalidParent {
        /// The child kind name.
        child: String,
        /// The parent kind name.
        parent: String,
    },

    /// The node kind carries no text
    #[error("A {kind} cannot hold text")]
    TextNotAllowed {
        /// The node kind name.
        kind: String,
    },

    /// Table cell count does not equal rows x cols
    #[error("Table {table} has {cells} cells, expected {rows}x{cols}")]
    CellCountMismatch {
        /// The table id.
        table: String,
        /// The number of cells found.
        cells: usize,
        /// Declared row count.
        rows: usize,
        /// Declared column count.
        cols: usize,
    },

    /// A table cell is missing or has a malformed polygon
    #[error("Table {table} cell {row},{col} is malformed: {reason}")]
    MalformedCell {
        /// The table id.
        table: String,
        /// Cell row (1-based).
        row: usize,
        /// Cell column (1-based).
        col: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// The table cells do not form a consistent grid
    #[error("Table {table} cells do not form a consistent grid")]
    NotAGrid {
        /// The table id.
        table: String,
    },

    /// A row or column index is out of range
    #[error("Index {index} out of range (count: {count})")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The number of items.
        count: usize,
    },

    /// The node is expected to be a group
    #[error("Node {id} is not a group")]
    NotAGroup {
        /// The node id.
        id: String,
    },

    /// The operation is not supported on this structure
    #[error("Unsupported operation: {reason}")]
    UnsupportedOperation {
        /// The reason the operation is unsupported.
        reason: String,
    },
}

/// Parse error type
///
/// A serialized document could not be turned into a node tree. No partial
/// document is ever installed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The input is not syntactically valid
    #[error("Malformed document at line {line}, column {column}: {reason}")]
    Malformed {
        /// Line of the failure (1-based).
        line: usize,
        /// Column of the failure (1-based).
        column: usize,
        /// Reason for the failure.
        reason: String,
    },

    /// The document format version is not supported
    #[error("Unsupported document version {version}")]
    UnsupportedVersion {
        /// The version string found.
        version: String,
    },

    /// The input parsed but violates a tree invariant
    #[error("Invalid document structure: {0}")]
    Structure(#[from] StructureError),
}

/// I/O failure type
///
/// Reported by persistence and image-provider collaborators. Never corrupts
/// the in-memory document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IoFailure {
    /// Reading a resource failed
    #[error("Failed to read {path}: {reason}")]
    Read {
        /// The resource path.
        path: String,
        /// The reason the read failed.
        reason: String,
    },

    /// Writing a resource failed
    #[error("Failed to write {path}: {reason}")]
    Write {
        /// The resource path.
        path: String,
        /// The reason the write failed.
        reason: String,
    },

    /// An image could not be decoded or a frame is unavailable
    #[error("Image {path} frame {frame} unavailable: {reason}")]
    Image {
        /// The image path.
        path: String,
        /// The requested frame.
        frame: usize,
        /// The reason the image is unavailable.
        reason: String,
    },
}

/// Main error type for LayoutKit
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Geometry validation failed
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Mutation attempted on a protected node
    #[error("Node {id} is read-only")]
    ReadOnly {
        /// The protected node, or the descendant that was targeted.
        id: String,
    },

    /// Structural invariant violation
    #[error(transparent)]
    Structure(#[from] StructureError),

    /// Document parse failure
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Collaborator I/O failure
    #[error(transparent)]
    Io(#[from] IoFailure),

    /// Operation rejected because a load or save is in flight
    #[error("Cannot {operation} while a document {activity} is in progress")]
    Busy {
        /// The rejected operation.
        operation: String,
        /// "load" or "save".
        activity: String,
    },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Create a read-only violation for the given node id
    pub fn read_only(id: impl Into<String>) -> Self {
        Error::ReadOnly { id: id.into() }
    }

    /// Create a not-found structure error for the given node id
    pub fn not_found(id: impl Into<String>) -> Self {
        Error::Structure(StructureError::NodeNotFound { id: id.into() })
    }

    /// Check if this is a geometry validation error
    pub fn is_geometry_error(&self) -> bool {
        matches!(self, Error::Geometry(_))
    }

    /// Check if this is a read-only violation
    pub fn is_read_only(&self) -> bool {
        matches!(self, Error::ReadOnly { .. })
    }

    /// Check if this is a structural inconsistency
    pub fn is_structure_error(&self) -> bool {
        matches!(self, Error::Structure(_))
    }

    /// Check if this is a guard-flag rejection
    pub fn is_busy(&self) -> bool {
        matches!(self, Error::Busy { .. })
    }

    /// Recoverable errors leave the document exactly as it was before the call
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Geometry(_) | Error::ReadOnly { .. } | Error::Busy { .. }
        )
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
