//! The scene: document, history, viewport and selection.
//!
//! All document mutations go through [`Scene`]. Each public mutating call
//! checks read-only and structural rules before touching anything, runs the
//! element's validator where geometry changes, and records one history entry
//! on success. Multi-step operations work on a copy of the document and swap
//! it in at the end, so a failure never leaves a partial change behind.

mod groups;
mod properties;

use std::collections::HashSet;

use layoutkit_core::{distance_to_segment, point_in_polygon, Error, Point2D, Result, StructureError};
use layoutkit_settings::{Config, EditingSettings};

use crate::history::{ChangeType, History};
use crate::model::node::split_text;
use crate::model::{Band, Coords, Document, ElementType, Node, NodeKind, NodePath};
use crate::shapes::{ShapeKind, Stage, ValidationLimits, Validator};
use crate::viewport::Viewport;

/// Which point list of a node an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointField {
    Coords,
    Baseline,
}

/// Live annotation state: the document plus everything needed to edit it.
#[derive(Debug, Clone)]
pub struct Scene {
    document: Document,
    history: History,
    viewport: Viewport,
    selected: Option<String>,
    limits: ValidationLimits,
    editing: EditingSettings,
    saved_serial: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Scene {
    /// An empty document configured from `config`.
    pub fn new(config: &Config) -> Self {
        Self::with_document(Document::new(), config)
    }

    pub fn with_document(document: Document, config: &Config) -> Self {
        let mut scene = Self {
            document: Document::new(),
            history: History::new(config.history.capacity),
            viewport: Viewport::with_settings(&config.viewport),
            selected: None,
            limits: ValidationLimits::from(&config.validation),
            editing: config.editing.clone(),
            saved_serial: 0,
        };
        scene.load(document);
        scene
    }

    /// Installs a freshly loaded document and restarts history from it.
    pub fn load(&mut self, document: Document) {
        self.document = document;
        self.selected = None;
        self.saved_serial = self
            .history
            .reset(self.document.clone(), self.viewport.clone(), None);
        tracing::info!("Scene loaded with {} nodes", self.document.len());
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Pan and zoom are not history commits; they are captured by the next one.
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn limits(&self) -> &ValidationLimits {
        &self.limits
    }

    pub fn editing(&self) -> &EditingSettings {
        &self.editing
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.document.node(id)
    }

    /// Handle pick radius in document units at the current zoom.
    pub fn pick_radius(&self) -> f64 {
        self.viewport
            .pixels_to_world_distance(self.editing.handle_radius)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_node(&self) -> Option<&Node> {
        self.selected.as_deref().and_then(|id| self.document.node(id))
    }

    pub fn selected_path(&self) -> Option<NodePath> {
        self.selected
            .as_deref()
            .and_then(|id| self.document.path_of(id))
    }

    /// Marks `id` as the unique selection, or clears it.
    pub fn select(&mut self, id: Option<&str>) -> Result<()> {
        if let Some(id) = id {
            self.document.get(id)?;
        }
        self.selected = id.map(str::to_string);
        Ok(())
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.history.current().map(|e| e.serial()) != Some(self.saved_serial)
    }

    pub fn mark_saved(&mut self) {
        if let Some(entry) = self.history.current() {
            self.saved_serial = entry.serial();
        }
    }

    pub(crate) fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub(crate) fn replace_document(&mut self, document: Document) {
        self.document = document;
    }

    /// Records the live state in history.
    pub(crate) fn commit(&mut self, change: ChangeType) {
        tracing::debug!(change = %change, "history commit");
        let selected = self.selected_path();
        self.history.commit(
            self.document.clone(),
            self.viewport.clone(),
            selected,
            change,
        );
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Restores the previous snapshot. Returns false at the oldest entry.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.history.undo() else {
            return false;
        };
        tracing::info!(change = %entry.change, "undo");
        self.document = entry.document.clone();
        self.viewport = entry.viewport.clone();
        let selected = entry.selected.clone();
        self.selected = self.restore_selection(selected);
        true
    }

    /// Re-applies the next snapshot. Returns false at the newest entry.
    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.history.redo() else {
            return false;
        };
        tracing::info!(change = %entry.change, "redo");
        self.document = entry.document.clone();
        self.viewport = entry.viewport.clone();
        let selected = entry.selected.clone();
        self.selected = self.restore_selection(selected);
        true
    }

    fn restore_selection(&self, path: Option<NodePath>) -> Option<String> {
        path.and_then(|p| self.document.node_at(&p))
            .map(|n| n.id.clone())
    }

    pub fn is_read_only(&self, id: &str) -> Result<bool> {
        self.document.is_read_only(id)
    }

    pub(crate) fn ensure_writable(&self, id: &str) -> Result<()> {
        if self.document.is_read_only(id)? {
            tracing::warn!("Refusing to modify read-only node {}", id);
            return Err(Error::read_only(id));
        }
        Ok(())
    }

    /// Validator for a point list of `id`, bound to its page and parent.
    pub fn validator(&self, id: &str, field: PointField) -> Result<Validator<'_>> {
        let node = self.document.get(id)?;
        let kind = match field {
            PointField::Baseline if node.element_type() == ElementType::TextLine => {
                ShapeKind::Baseline
            }
            PointField::Coords => ShapeKind::for_coords(node.element_type()).ok_or_else(|| {
                unsupported(format!("a {} has no coords", node.element_type()))
            })?,
            PointField::Baseline => {
                return Err(unsupported(format!(
                    "a {} has no baseline",
                    node.element_type()
                )))
            }
        };
        let mut validator = Validator::new(kind, &self.limits);
        if let Some((width, height)) = self.document.page_size_of(id) {
            validator = validator.with_page(width, height);
        }
        if let Some(parent) = self.document.parent_of(id) {
            validator = validator.with_parent(&parent.id, parent.points());
        }
        Ok(validator)
    }

    /// Runs the completion validators over a node's current geometry.
    pub fn validate_node(&self, id: &str) -> Result<()> {
        let node = self.document.get(id)?;
        if ShapeKind::for_coords(node.element_type()).is_some() && !node.coords.is_derived() {
            self.validator(id, PointField::Coords)?
                .validate(node.points(), Stage::Completion)?;
        }
        if let Some(baseline) = &node.baseline {
            self.validator(id, PointField::Baseline)?
                .validate(baseline, Stage::Completion)?;
        }
        Ok(())
    }

    /// Topmost node at `pos` accepted by `filter`.
    ///
    /// Polygons are hit when they contain the point, baselines when the point
    /// is within `tolerance`. Deeper nodes win, then later ones in tree order.
    pub fn hit_test(
        &self,
        pos: Point2D,
        tolerance: f64,
        filter: &dyn Fn(&Node) -> bool,
    ) -> Option<String> {
        fn walk<'a>(
            node: &'a Node,
            depth: usize,
            pos: Point2D,
            tolerance: f64,
            filter: &dyn Fn(&Node) -> bool,
            best: &mut Option<(usize, &'a Node)>,
        ) {
            let deeper = best.map_or(true, |(d, _)| depth >= d);
            if deeper && filter(node) && hits(node, pos, tolerance) {
                *best = Some((depth, node));
            }
            for child in &node.children {
                walk(child, depth + 1, pos, tolerance, filter, best);
            }
        }
        let mut best = None;
        walk(self.document.root(), 0, pos, tolerance, filter, &mut best);
        best.map(|(_, node)| node.id.clone())
    }

    /// Adds a page to the document and returns its id.
    pub fn create_page(&mut self, width: f64, height: f64, image: Option<String>) -> Result<String> {
        let id = self.document.unique_id(ElementType::Page.id_prefix());
        let page = Node::new(
            id.clone(),
            NodeKind::Page {
                width,
                height,
                image,
                frame: 0,
            },
        );
        let root = self.document.root().id.clone();
        self.document.insert(&root, page, None)?;
        self.commit(ChangeType::CreateNode);
        Ok(id)
    }

    /// Creates a region, line, word or glyph under `parent_id`.
    ///
    /// The polygon is validated as finished, wound clockwise and stored as
    /// independent coords. Returns the new id.
    pub fn create_node(
        &mut self,
        parent_id: &str,
        kind: NodeKind,
        points: Vec<Point2D>,
    ) -> Result<String> {
        let element = kind.element_type();
        if !matches!(
            element,
            ElementType::TextRegion | ElementType::TextLine | ElementType::Word | ElementType::Glyph
        ) {
            return Err(unsupported(format!("{} nodes have their own constructor", element)));
        }
        let node = Node::new(String::new(), kind)
            .with_points(layoutkit_core::standardize_clockwise(&points));
        self.insert_validated(parent_id, node)
    }

    /// Creates a text line from its baseline with a derived polystripe using
    /// the configured default height and offset.
    pub fn create_text_line(&mut self, parent_id: &str, baseline: Vec<Point2D>) -> Result<String> {
        let band = Band::stripe(
            self.editing.default_line_height,
            self.editing.default_line_offset,
        );
        let mut node = Node::new(String::new(), NodeKind::TextLine);
        node.coords = Coords::derive(band, &baseline);
        node.baseline = Some(baseline);
        self.insert_validated(parent_id, node)
    }

    fn insert_validated(&mut self, parent_id: &str, mut node: Node) -> Result<String> {
        let parent = self.document.get(parent_id)?;
        let element = node.element_type();
        if !parent.element_type().can_contain(element) {
            return Err(StructureError::InvalidParent {
                child: element.to_string(),
                parent: parent.element_type().to_string(),
            }
            .into());
        }
        self.ensure_writable(parent_id)?;

        // lines drawn from a baseline are validated on the baseline
        let (kind, points) = match &node.baseline {
            Some(baseline) => (ShapeKind::Baseline, baseline.as_slice()),
            None => (
                ShapeKind::for_coords(element).unwrap_or(ShapeKind::Region),
                node.points(),
            ),
        };
        let mut validator =
            Validator::new(kind, &self.limits).with_parent(&parent.id, parent.points());
        if let Some((width, height)) = self.document.page_size_of(parent_id) {
            validator = validator.with_page(width, height);
        }
        if let Err(err) = validator.validate(points, Stage::Completion) {
            tracing::warn!("Rejected new {} under {}: {}", element, parent_id, err);
            return Err(err.into());
        }

        let prefix = self.document.child_prefix(parent_id, element)?;
        node.id = self.document.unique_id(&prefix);
        let id = node.id.clone();
        self.document.insert(parent_id, node, None)?;
        tracing::debug!("Created {} {} under {}", element, id, parent_id);
        self.commit(ChangeType::CreateNode);
        Ok(id)
    }

    /// Deletes a node and its subtree, repairing references to it.
    ///
    /// Group memberships and word-break partners pointing into the subtree are
    /// dropped; groups left without members are deleted too. Single table
    /// cells cannot be deleted; remove a row or column instead.
    pub fn delete_node(&mut self, id: &str) -> Result<()> {
        let node = self.document.get(id)?;
        match node.element_type() {
            ElementType::Document => {
                return Err(unsupported("the document root cannot be deleted"));
            }
            ElementType::TableCell => {
                return Err(unsupported(
                    "table cells are removed with their row or column",
                ));
            }
            _ => {}
        }
        self.ensure_writable(id)?;
        if let Some(locked) = node.iter().find(|n| n.protected) {
            return Err(Error::read_only(locked.id.clone()));
        }

        let mut doc = self.document.clone();
        let removed = doc.remove(id)?;
        let mut gone: HashSet<String> = removed.subtree_ids().into_iter().collect();
        repair_references(&mut doc, &mut gone);

        if self.selected.as_ref().is_some_and(|s| gone.contains(s)) {
            self.selected = None;
        }
        self.document = doc;
        tracing::debug!("Deleted {} ({} nodes)", id, gone.len());
        self.commit(ChangeType::DeleteNode);
        Ok(())
    }

    /// Replaces the text of a region, cell, line, word or glyph.
    ///
    /// Unchanged text is not a mutation and records nothing.
    pub fn set_text(&mut self, id: &str, text: &str) -> Result<()> {
        let node = self.document.get(id)?;
        let element = node.element_type();
        if !element.carries_text() {
            return Err(StructureError::TextNotAllowed {
                kind: element.to_string(),
            }
            .into());
        }
        self.ensure_writable(id)?;
        let text = split_text(text);
        if node.text == text {
            return Ok(());
        }
        self.document.get_mut(id)?.text = text;
        self.commit(ChangeType::EditText);
        Ok(())
    }

    /// Replaces a node's coords after completion validation.
    pub fn set_geometry(&mut self, id: &str, points: Vec<Point2D>) -> Result<()> {
        self.set_points(id, PointField::Coords, points)
    }

    /// Replaces a text line's baseline and recomputes a derived band.
    pub fn set_baseline(&mut self, id: &str, points: Vec<Point2D>) -> Result<()> {
        self.set_points(id, PointField::Baseline, points)
    }

    /// Validated replacement of a point list, committed to history.
    pub fn set_points(&mut self, id: &str, field: PointField, points: Vec<Point2D>) -> Result<()> {
        self.ensure_writable(id)?;
        if let Err(err) = self.validator(id, field)?.validate(&points, Stage::Completion) {
            tracing::warn!("Rejected geometry for {}: {}", id, err);
            return Err(err.into());
        }
        self.write_points(id, field, points)?;
        self.commit(match field {
            PointField::Coords => ChangeType::EditGeometry,
            PointField::Baseline => ChangeType::EditBaseline,
        });
        Ok(())
    }

    /// Live update while a gesture is in progress: no validation, no history.
    pub fn preview_points(&mut self, id: &str, field: PointField, points: Vec<Point2D>) -> Result<()> {
        self.ensure_writable(id)?;
        self.validator(id, field)?;
        self.write_points(id, field, points)
    }

    fn write_points(&mut self, id: &str, field: PointField, points: Vec<Point2D>) -> Result<()> {
        let node = self.document.get_mut(id)?;
        match field {
            PointField::Coords => node.coords = Coords::Independent(points),
            PointField::Baseline => {
                if let Some(band) = node.coords.band() {
                    node.coords = Coords::derive(band, &points);
                }
                node.baseline = Some(points);
            }
        }
        Ok(())
    }

    /// Ties a text line's coords to its baseline as a derived band.
    pub fn set_band(&mut self, id: &str, band: Band) -> Result<()> {
        let node = self.document.get(id)?;
        let Some(baseline) = node.baseline.clone() else {
            return Err(unsupported(format!("{} has no baseline", id)));
        };
        self.ensure_writable(id)?;
        self.document.get_mut(id)?.coords = Coords::derive(band, &baseline);
        self.commit(ChangeType::EditGeometry);
        Ok(())
    }

    /// Replaces a subtree for a live drag preview.
    pub(crate) fn preview_subtree(&mut self, id: &str, subtree: Node) -> Result<()> {
        self.ensure_writable(id)?;
        *self.document.get_mut(id)? = subtree;
        Ok(())
    }

    /// Translates a subtree and optionally moves it under `new_parent`.
    ///
    /// A reparented node takes a fresh id chosen under the new parent and its
    /// descendants are renamed by prefix; references follow the rename.
    /// Returns the node's final id.
    pub fn move_node(
        &mut self,
        id: &str,
        dx: f64,
        dy: f64,
        new_parent: Option<&str>,
    ) -> Result<String> {
        self.ensure_writable(id)?;
        let node = self.document.get(id)?;
        let current_parent = self
            .document
            .parent_of(id)
            .map(|p| p.id.clone())
            .ok_or_else(|| unsupported("the document root cannot be moved"))?;
        let target_parent = new_parent.unwrap_or(&current_parent).to_string();
        let reparent = target_parent != current_parent;

        if reparent {
            self.ensure_writable(&target_parent)?;
            let parent_type = self.document.get(&target_parent)?.element_type();
            if !parent_type.can_contain(node.element_type()) {
                return Err(StructureError::InvalidParent {
                    child: node.element_type().to_string(),
                    parent: parent_type.to_string(),
                }
                .into());
            }
            if node.find(&target_parent).is_some() {
                return Err(unsupported("a node cannot be moved into itself"));
            }
        }

        let mut moved = node.clone();
        moved.translate(dx, dy);
        if let Some((width, height)) = self.document.page_size_of(&target_parent) {
            let page = Validator::new(ShapeKind::Region, &self.limits).with_page(width, height);
            for n in moved.iter() {
                page.validate(n.points(), Stage::Live)?;
                if let Some(baseline) = &n.baseline {
                    page.validate(baseline, Stage::Live)?;
                }
            }
        }

        let mut doc = self.document.clone();
        let index = doc.path_of(id).and_then(|p| p.0.last().copied());
        doc.remove(id)?;
        let final_id = if reparent {
            let prefix = doc.child_prefix(&target_parent, moved.element_type())?;
            let new_id = doc.unique_id(&prefix);
            let renamed = moved.rename(&new_id);
            doc.insert(&target_parent, moved, None)?;
            doc.rewrite_references(&renamed);
            new_id
        } else {
            doc.insert(&target_parent, moved, index)?;
            id.to_string()
        };
        self.document = doc;
        if self.selected.as_deref() == Some(id) {
            self.selected = Some(final_id.clone());
        }
        if reparent {
            tracing::debug!("Moved {} under {} as {}", id, target_parent, final_id);
            self.commit(ChangeType::Reparent);
        } else {
            self.commit(ChangeType::MoveNode);
        }
        Ok(final_id)
    }

    /// Moves a node under another parent without translating it.
    pub fn reparent(&mut self, id: &str, new_parent: &str) -> Result<String> {
        self.move_node(id, 0.0, 0.0, Some(new_parent))
    }

    /// Protects or unprotects a node. A node under a protected ancestor
    /// cannot change its own flag.
    pub fn set_protected(&mut self, id: &str, protected: bool) -> Result<()> {
        self.document.get(id)?;
        if let Some(ancestor) = self.document.ancestors(id).into_iter().find(|a| a.protected) {
            return Err(Error::read_only(ancestor.id.clone()));
        }
        let node = self.document.get_mut(id)?;
        if node.protected == protected {
            return Ok(());
        }
        node.protected = protected;
        self.commit(ChangeType::Protect);
        Ok(())
    }
}

fn hits(node: &Node, pos: Point2D, tolerance: f64) -> bool {
    let points = node.points();
    if points.len() >= 3 && point_in_polygon(pos, points) {
        return true;
    }
    node.baseline.as_ref().is_some_and(|line| {
        line.windows(2)
            .any(|w| distance_to_segment(pos, w[0], w[1]) <= tolerance)
    })
}

pub(crate) fn unsupported(reason: impl Into<String>) -> Error {
    StructureError::UnsupportedOperation {
        reason: reason.into(),
    }
    .into()
}

/// Drops references to `gone` ids; groups emptied by that are removed too.
pub(crate) fn repair_references(doc: &mut Document, gone: &mut HashSet<String>) {
    loop {
        let mut emptied = Vec::new();
        doc.root_mut().walk_mut(&mut |node| {
            if node.break_pair.as_ref().is_some_and(|p| gone.contains(p)) {
                node.break_pair = None;
            }
            if node.element_type() == ElementType::Group {
                let before = node.members.len();
                node.members.retain(|m| !gone.contains(&m.id));
                if before > 0 && node.members.is_empty() {
                    emptied.push(node.id.clone());
                }
            }
        });
        if emptied.is_empty() {
            return;
        }
        for id in emptied {
            tracing::debug!("Removing empty group {}", id);
            if let Ok(group) = doc.remove(&id) {
                gone.extend(group.subtree_ids());
            }
        }
    }
}
