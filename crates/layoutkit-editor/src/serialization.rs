//! JSON document format.
//!
//! A document file is an envelope carrying the format version, metadata and
//! the root node. Coords are written as plain point lists; on load every
//! text line whose coords match a band or polyrect of its baseline is tagged
//! as derived again, so later baseline edits keep regenerating it.

use chrono::Utc;
use layoutkit_core::constants::RECT_TOLERANCE;
use layoutkit_core::{Error, ParseError, Result, StructureError};
use serde::{Deserialize, Serialize};

use crate::io::DocumentCodec;
use crate::model::{Band, Coords, Document, DocumentMetadata, ElementType, Node};
use crate::shapes::{is_band, standardize_rect_band};
use crate::table::Grid;

/// Current file format version
pub const FILE_FORMAT_VERSION: &str = "1.0";

/// Property holding a text line's orientation in degrees.
pub const ORIENTATION_KEY: &str = "orientation";

#[derive(Deserialize)]
struct VersionHeader {
    version: String,
}

#[derive(Serialize)]
struct DocumentFileRef<'a> {
    version: &'a str,
    metadata: &'a DocumentMetadata,
    root: &'a Node,
}

#[derive(Deserialize)]
struct DocumentFile {
    #[serde(default)]
    metadata: DocumentMetadata,
    root: Node,
}

fn malformed(err: &serde_json::Error) -> ParseError {
    ParseError::Malformed {
        line: err.line(),
        column: err.column(),
        reason: err.to_string(),
    }
}

fn major(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}

/// The reference [`DocumentCodec`], backed by `serde_json`.
#[derive(Debug, Clone, Copy)]
pub struct JsonCodec {
    rect_tolerance: f64,
    pretty: bool,
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self {
            rect_tolerance: RECT_TOLERANCE,
            pretty: true,
        }
    }
}

impl JsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tolerance used when recognising polyrect coords on load.
    pub fn with_rect_tolerance(mut self, tolerance: f64) -> Self {
        self.rect_tolerance = tolerance;
        self
    }

    /// Write compact JSON instead of the indented default.
    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    /// Tags the coords of `line` as derived when they are a band of its
    /// baseline. Returns whether a band was recognised.
    fn retag_line(&self, line: &mut Node) -> bool {
        let Some(baseline) = line.baseline.clone() else {
            return false;
        };
        let coords = line.points().to_vec();
        if let Some((height, offset)) = is_band(&coords, &baseline) {
            line.coords = Coords::Derived {
                band: Band::stripe(height, offset),
                points: coords,
            };
            return true;
        }
        let rotation = line
            .property(ORIENTATION_KEY)
            .and_then(|p| p.value.trim().parse::<f64>().ok())
            .unwrap_or(0.0);
        match standardize_rect_band(&coords, &baseline, rotation, self.rect_tolerance) {
            Some(found) => {
                if found.baseline_reversed {
                    let mut reversed = baseline;
                    reversed.reverse();
                    line.baseline = Some(reversed);
                }
                line.coords = Coords::Derived {
                    band: Band::rect(found.height, found.offset, rotation),
                    points: found.coords,
                };
                true
            }
            None => false,
        }
    }

    fn realize(&self, root: &mut Node) -> std::result::Result<(), StructureError> {
        let mut derived = 0usize;
        root.walk_mut(&mut |node| {
            if node.element_type() == ElementType::TextLine && self.retag_line(node) {
                derived += 1;
            }
        });
        tracing::debug!("{} text lines recognised as derived bands", derived);

        for table in root.iter().filter(|n| n.element_type() == ElementType::TableRegion) {
            match Grid::from_table(table) {
                Ok(_) => {}
                Err(err @ StructureError::CellCountMismatch { .. }) => return Err(err),
                Err(err) => tracing::debug!("Table {} is not a grid: {}", table.id, err),
            }
        }
        Ok(())
    }
}

impl DocumentCodec for JsonCodec {
    fn parse(&self, input: &str) -> std::result::Result<Document, ParseError> {
        let header: VersionHeader = serde_json::from_str(input).map_err(|e| malformed(&e))?;
        if major(&header.version) != major(FILE_FORMAT_VERSION) {
            return Err(ParseError::UnsupportedVersion {
                version: header.version,
            });
        }
        let file: DocumentFile = serde_json::from_str(input).map_err(|e| malformed(&e))?;
        let mut root = file.root;
        self.realize(&mut root)?;
        let mut document = Document::from_root(root)?;
        document.metadata = file.metadata;
        Ok(document)
    }

    fn serialize(&self, document: &Document) -> Result<String> {
        let mut metadata = document.metadata.clone();
        metadata.modified = Utc::now();
        let file = DocumentFileRef {
            version: FILE_FORMAT_VERSION,
            metadata: &metadata,
            root: document.root(),
        };
        let json = if self.pretty {
            serde_json::to_string_pretty(&file)
        } else {
            serde_json::to_string(&file)
        };
        json.map_err(|e| Error::other(format!("Failed to serialize document: {}", e)))
    }
}
