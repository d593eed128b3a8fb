//! # LayoutKit Editor
//!
//! Interactive vector annotation of document page images. The crate keeps a
//! tree of pages, text regions, tables, lines, words and glyphs, and lets a
//! shell edit their polygons and baselines through input-driven edit modes
//! with validation and undo.
//!
//! ## Core Components
//!
//! ### Document
//! - **Model**: the node tree, ids, properties, group members
//! - **Shapes**: band derivation from baselines and geometry validators
//! - **Scene**: the only mutation API; read-only and structural checks,
//!   validation, one history entry per change
//!
//! ### Editing
//! - **Modes**: selection, vertex editing, text, drag, draw and group
//!   behaviors composed into the preset [`EditMode`]s
//! - **Table**: grid lattice drags and row/column insertion and deletion
//! - **History/Viewport**: snapshot undo/redo and pan/zoom with fit modes
//!
//! ### Collaborators
//! - **IO**: codec, persistence and image-provider traits with file-system
//!   implementations
//! - **Serialization**: the JSON document format
//! - **Annotator**: the entry point owning the load/save guards
//!
//! ## Architecture
//!
//! ```text
//! Annotator (guards, page-image barrier)
//!   ├── EditSession (active mode)
//!   │     └── Behaviors (select, points, text, drag, draw, group, table)
//!   └── Scene
//!         ├── Document (node tree)
//!         ├── History (snapshots)
//!         └── Viewport
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use layoutkit_editor::{Annotator, EditMode, InputEvent};
//!
//! let mut annotator = Annotator::default();
//! annotator.load_document("page.json")?;
//! annotator.activate(EditMode::RegionEdit);
//! annotator.dispatch(&InputEvent::Click { pos: (10.0, 10.0).into(), time_ms: 0, additive: false })?;
//! ```

pub mod annotator;
pub mod history;
pub mod io;
pub mod model;
pub mod modes;
pub mod scene;
pub mod serialization;
pub mod shapes;
pub mod table;
pub mod viewport;

pub use annotator::Annotator;
pub use history::{ChangeType, History, HistoryEntry};
pub use io::{
    DocumentCodec, FileImageProvider, FsPersistence, ImageInfo, ImageProvider, Persistence,
    SizeMismatch, SizeMismatchPolicy,
};
pub use model::{
    Band, Coords, Document, DocumentMetadata, ElementType, Member, Node, NodeKind, NodePath,
    Property,
};
pub use modes::{Behavior, EditKey, EditMode, EditSession, Handled, InputEvent, Unwound};
pub use scene::{PointField, Scene};
pub use serialization::{JsonCodec, FILE_FORMAT_VERSION};
pub use shapes::{ShapeKind, Stage, ValidationLimits, Validator};
pub use table::{Axis, Grid, GridHandle};
pub use viewport::Viewport;
