//! Scene tree nodes.
//!
//! A [`Node`] owns its children. Groups reference other nodes by id only, so a
//! deleted member simply stops resolving.

use std::fmt;

use layoutkit_core::{translate_points, Point2D};
use serde::{Deserialize, Serialize};

use crate::shapes::{build_band, build_rect_band};

/// Element type without the per-kind payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Document,
    Page,
    TextRegion,
    TableRegion,
    TableCell,
    TextLine,
    Word,
    Glyph,
    Group,
}

impl ElementType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Page => "page",
            Self::TextRegion => "text region",
            Self::TableRegion => "table region",
            Self::TableCell => "table cell",
            Self::TextLine => "text line",
            Self::Word => "word",
            Self::Glyph => "glyph",
            Self::Group => "group",
        }
    }

    /// Only regions, lines, words and glyphs hold text.
    pub fn carries_text(self) -> bool {
        matches!(
            self,
            Self::TextRegion | Self::TableCell | Self::TextLine | Self::Word | Self::Glyph
        )
    }

    /// Whether the element's coords form a closed polygon.
    pub fn is_polygon(self) -> bool {
        matches!(
            self,
            Self::TextRegion
                | Self::TableRegion
                | Self::TableCell
                | Self::TextLine
                | Self::Word
                | Self::Glyph
        )
    }

    /// Id prefix used when probing for a fresh id.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::Document => "doc",
            Self::Page => "page",
            Self::TextRegion => "r",
            Self::TableRegion => "t",
            Self::TableCell => "c",
            Self::TextLine => "l",
            Self::Word => "w",
            Self::Glyph => "g",
            Self::Group => "grp",
        }
    }

    /// Parent/child containment rules of the tree.
    pub fn can_contain(self, child: ElementType) -> bool {
        use ElementType::*;
        match self {
            Document => child == Page,
            Page => matches!(child, TextRegion | TableRegion | Group),
            TextRegion => matches!(child, TextRegion | TextLine),
            TableRegion => child == TableCell,
            TableCell => child == TextLine,
            TextLine => child == Word,
            Word => child == Glyph,
            Glyph | Group => false,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Node type with its per-kind attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Document,
    Page {
        width: f64,
        height: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image: Option<String>,
        #[serde(default)]
        frame: usize,
    },
    TextRegion,
    TableRegion {
        rows: usize,
        cols: usize,
    },
    /// 1-based position inside the owning table.
    TableCell {
        row: usize,
        col: usize,
    },
    TextLine,
    Word,
    Glyph,
    Group,
}

impl NodeKind {
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Document => ElementType::Document,
            Self::Page { .. } => ElementType::Page,
            Self::TextRegion => ElementType::TextRegion,
            Self::TableRegion { .. } => ElementType::TableRegion,
            Self::TableCell { .. } => ElementType::TableCell,
            Self::TextLine => ElementType::TextLine,
            Self::Word => ElementType::Word,
            Self::Glyph => ElementType::Glyph,
            Self::Group => ElementType::Group,
        }
    }

    pub fn page(width: f64, height: f64) -> Self {
        Self::Page {
            width,
            height,
            image: None,
            frame: 0,
        }
    }
}

/// How a derived band is laid out around its baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BandShape {
    /// Polystripe: every baseline segment is offset along its own normal.
    Stripe,
    /// Polyrect: an axis-aligned rectangle in the frame rotated by `rotation` degrees.
    Rect { rotation: f64 },
}

/// Derivation parameters of a band polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub height: f64,
    /// Share of the height lying on the ascender side, in `[0, 0.5]`.
    pub offset: f64,
    pub shape: BandShape,
}

impl Band {
    pub fn stripe(height: f64, offset: f64) -> Self {
        Self {
            height,
            offset: offset.clamp(0.0, 0.5),
            shape: BandShape::Stripe,
        }
    }

    pub fn rect(height: f64, offset: f64, rotation: f64) -> Self {
        Self {
            height,
            offset: offset.clamp(0.0, 0.5),
            shape: BandShape::Rect { rotation },
        }
    }

    /// Builds the band polygon for `baseline`.
    pub fn build(&self, baseline: &[Point2D]) -> Vec<Point2D> {
        match self.shape {
            BandShape::Stripe => build_band(baseline, self.height, self.offset),
            BandShape::Rect { rotation } => {
                build_rect_band(baseline, self.height, self.offset, rotation)
            }
        }
    }
}

/// The polygon of a region, line, word or glyph.
///
/// Serialized as a plain point list: the derivation tag is dropped on save and
/// recovered on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Point2D>", into = "Vec<Point2D>")]
pub enum Coords {
    Independent(Vec<Point2D>),
    Derived { band: Band, points: Vec<Point2D> },
}

impl Coords {
    pub fn points(&self) -> &[Point2D] {
        match self {
            Self::Independent(points) => points,
            Self::Derived { points, .. } => points,
        }
    }

    pub fn band(&self) -> Option<Band> {
        match self {
            Self::Independent(_) => None,
            Self::Derived { band, .. } => Some(*band),
        }
    }

    pub fn is_derived(&self) -> bool {
        matches!(self, Self::Derived { .. })
    }

    pub fn is_empty(&self) -> bool {
        self.points().is_empty()
    }

    /// Derived coords for `baseline`.
    pub fn derive(band: Band, baseline: &[Point2D]) -> Self {
        Self::Derived {
            band,
            points: band.build(baseline),
        }
    }

    fn translated(&self, dx: f64, dy: f64) -> Self {
        match self {
            Self::Independent(points) => Self::Independent(translate_points(points, dx, dy)),
            Self::Derived { band, points } => Self::Derived {
                band: *band,
                points: translate_points(points, dx, dy),
            },
        }
    }
}

impl Default for Coords {
    fn default() -> Self {
        Self::Independent(Vec::new())
    }
}

impl From<Vec<Point2D>> for Coords {
    fn from(points: Vec<Point2D>) -> Self {
        Self::Independent(points)
    }
}

impl From<Coords> for Vec<Point2D> {
    fn from(coords: Coords) -> Self {
        match coords {
            Coords::Independent(points) => points,
            Coords::Derived { points, .. } => points,
        }
    }
}

/// Keyed annotation attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_by: Option<String>,
}

impl Property {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            confidence: None,
            set_by: None,
        }
    }
}

/// Weak reference from a group to another node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Member {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            confidence: None,
        }
    }
}

/// Structural address of a node: child indices from the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NodePath(pub Vec<usize>);

impl NodePath {
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "/{}", parts.join("/"))
    }
}

/// The scene-tree unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Coords::is_empty")]
    pub coords: Coords,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<Vec<Point2D>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub protected: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Member>,
    /// Id of the word continuing this one across a hyphenation break.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_pair: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            coords: Coords::default(),
            baseline: None,
            text: None,
            properties: Vec::new(),
            protected: false,
            members: Vec::new(),
            break_pair: None,
            children: Vec::new(),
        }
    }

    pub fn with_points(mut self, points: Vec<Point2D>) -> Self {
        self.coords = Coords::Independent(points);
        self
    }

    pub fn with_baseline(mut self, baseline: Vec<Point2D>) -> Self {
        self.baseline = Some(baseline);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = split_text(text);
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn element_type(&self) -> ElementType {
        self.kind.element_type()
    }

    pub fn points(&self) -> &[Point2D] {
        self.coords.points()
    }

    /// Text lines joined with `\n`, empty when the node has no text.
    pub fn text_string(&self) -> String {
        self.text
            .as_ref()
            .map(|lines| lines.join("\n"))
            .unwrap_or_default()
    }

    pub fn property(&self, key: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.key == key)
    }

    /// Depth-first, pre-order iteration over this node and its descendants.
    pub fn iter(&self) -> NodeIter<'_> {
        NodeIter { stack: vec![self] }
    }

    pub fn find(&self, id: &str) -> Option<&Node> {
        self.iter().find(|n| n.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Node> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    /// Structural path to the descendant with `id`, relative to this node.
    pub fn path_of(&self, id: &str) -> Option<NodePath> {
        fn walk(node: &Node, id: &str, path: &mut Vec<usize>) -> bool {
            if node.id == id {
                return true;
            }
            for (i, child) in node.children.iter().enumerate() {
                path.push(i);
                if walk(child, id, path) {
                    return true;
                }
                path.pop();
            }
            false
        }
        let mut path = Vec::new();
        walk(self, id, &mut path).then_some(NodePath(path))
    }

    pub fn at_path(&self, path: &NodePath) -> Option<&Node> {
        path.0
            .iter()
            .try_fold(self, |node, &i| node.children.get(i))
    }

    /// Every id in this subtree.
    pub fn subtree_ids(&self) -> Vec<String> {
        self.iter().map(|n| n.id.clone()).collect()
    }

    /// Visits this node and every descendant, pre-order.
    pub(crate) fn walk_mut(&mut self, f: &mut dyn FnMut(&mut Node)) {
        f(self);
        for child in &mut self.children {
            child.walk_mut(f);
        }
    }

    /// Translates coords and baselines of the whole subtree.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.coords = self.coords.translated(dx, dy);
        if let Some(baseline) = &self.baseline {
            self.baseline = Some(translate_points(baseline, dx, dy));
        }
        for child in &mut self.children {
            child.translate(dx, dy);
        }
    }

    /// Renames this node and rewrites the id prefix of every descendant that
    /// was named after it. Returns the `(old, new)` pairs that changed.
    pub fn rename(&mut self, new_id: &str) -> Vec<(String, String)> {
        let old_id = std::mem::replace(&mut self.id, new_id.to_string());
        let mut renamed = vec![(old_id.clone(), new_id.to_string())];
        let old_prefix = format!("{}_", old_id);
        let new_prefix = format!("{}_", new_id);
        for child in &mut self.children {
            child.rewrite_prefix(&old_prefix, &new_prefix, &mut renamed);
        }
        renamed
    }

    fn rewrite_prefix(&mut self, old: &str, new: &str, renamed: &mut Vec<(String, String)>) {
        if let Some(rest) = self.id.strip_prefix(old) {
            let id = format!("{}{}", new, rest);
            renamed.push((std::mem::replace(&mut self.id, id.clone()), id));
        }
        for child in &mut self.children {
            child.rewrite_prefix(old, new, renamed);
        }
    }
}

/// Splits editor text into stored lines; empty text is stored as `None`.
pub(crate) fn split_text(text: &str) -> Option<Vec<String>> {
    if text.is_empty() {
        None
    } else {
        Some(text.split('\n').map(str::to_string).collect())
    }
}

/// Pre-order iterator over a subtree.
pub struct NodeIter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
