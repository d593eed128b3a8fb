//! Scene model: nodes, coords and the document tree.

pub mod document;
pub mod node;

pub use document::{Document, DocumentMetadata};
pub use node::{
    Band, BandShape, Coords, ElementType, Member, Node, NodeIter, NodeKind, NodePath, Property,
};
