//! Click-sequence creation of new elements.
//!
//! Each click adds a point while a preview point follows the pointer. A
//! second click on the last point, reaching the point limit, or
//! [`EditKey::Finish`] ends the shape. The finished points go through the
//! scene's validated constructors; a rejected shape is discarded.

use layoutkit_core::{Point2D, Result};

use super::{Behavior, EditKey, Handled, InputEvent, ModeHooks, Pending};
use crate::model::{ElementType, NodeKind};
use crate::scene::{unsupported, Scene};

/// What a draw creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawTarget {
    Region,
    /// A text line drawn as its baseline, with a derived band polygon.
    Line,
    Word,
    Glyph,
    /// A table drawn as its four outer corners.
    Table { rows: usize, cols: usize },
}

impl DrawTarget {
    /// Kinds that may own the new element, searched under the first point.
    fn parent_kinds(self) -> &'static [ElementType] {
        match self {
            Self::Region | Self::Table { .. } => &[],
            Self::Line => &[ElementType::TextRegion, ElementType::TableCell],
            Self::Word => &[ElementType::TextLine],
            Self::Glyph => &[ElementType::Word],
        }
    }

    fn point_limit(self) -> Option<usize> {
        match self {
            Self::Table { .. } => Some(4),
            _ => None,
        }
    }
}

/// Collects points for a new element.
#[derive(Debug, Clone)]
pub struct DrawBehavior {
    target: DrawTarget,
    page: Option<String>,
    limit: Option<usize>,
    points: Vec<Point2D>,
    preview: Option<Point2D>,
}

impl DrawBehavior {
    pub fn new(target: DrawTarget) -> Self {
        Self {
            target,
            page: None,
            limit: target.point_limit(),
            points: Vec::new(),
            preview: None,
        }
    }

    /// Page that receives regions and tables; defaults to the first page.
    pub fn on_page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }

    /// Ends the shape automatically once `limit` points are placed.
    pub fn with_point_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn target(&self) -> DrawTarget {
        self.target
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    /// Placed points followed by the point under the pointer.
    pub fn preview_shape(&self) -> Vec<Point2D> {
        self.points.iter().copied().chain(self.preview).collect()
    }

    fn page_id(&self, scene: &Scene) -> Result<String> {
        match &self.page {
            Some(page) => Ok(page.clone()),
            None => scene
                .document()
                .pages()
                .next()
                .map(|p| p.id.clone())
                .ok_or_else(|| unsupported("the document has no page to draw on")),
        }
    }

    fn parent_id(&self, scene: &Scene, first: Point2D) -> Result<String> {
        let kinds = self.target.parent_kinds();
        if kinds.is_empty() {
            return self.page_id(scene);
        }
        scene
            .hit_test(first, 0.0, &|node| kinds.contains(&node.element_type()))
            .ok_or_else(|| {
                unsupported(format!(
                    "no {} under the new element",
                    kinds
                        .iter()
                        .map(|k| k.name())
                        .collect::<Vec<_>>()
                        .join(" or ")
                ))
            })
    }

    fn add_point(&mut self, scene: &mut Scene, pos: Point2D, hooks: &mut ModeHooks) -> Result<Handled> {
        let close = scene.editing().close_tolerance;
        if self
            .points
            .last()
            .is_some_and(|last| last.distance_to(pos) <= close)
        {
            return self.finish(scene, hooks);
        }
        self.points.push(pos);
        tracing::debug!("Draw point {} at {}", self.points.len(), pos);
        if self.limit.is_some_and(|limit| self.points.len() >= limit) {
            return self.finish(scene, hooks);
        }
        Ok(Handled::Consumed)
    }

    fn finish(&mut self, scene: &mut Scene, hooks: &mut ModeHooks) -> Result<Handled> {
        let points = std::mem::take(&mut self.points);
        self.preview = None;
        let Some(&first) = points.first() else {
            return Ok(Handled::Ignored);
        };
        let created = self.parent_id(scene, first).and_then(|parent| match self.target {
            DrawTarget::Region => scene.create_node(&parent, NodeKind::TextRegion, points),
            DrawTarget::Line => scene.create_text_line(&parent, points),
            DrawTarget::Word => scene.create_node(&parent, NodeKind::Word, points),
            DrawTarget::Glyph => scene.create_node(&parent, NodeKind::Glyph, points),
            DrawTarget::Table { rows, cols } => scene.create_table(&parent, points, rows, cols),
        });
        match created {
            Ok(id) => {
                tracing::debug!("Draw created {}", id);
                self.select(scene, &id, hooks)?;
                Ok(Handled::Consumed)
            }
            Err(err) => {
                tracing::warn!("Discarding drawn shape: {}", err);
                Err(err)
            }
        }
    }
}

impl Behavior for DrawBehavior {
    fn name(&self) -> &'static str {
        "draw"
    }

    fn handle(
        &mut self,
        scene: &mut Scene,
        event: &InputEvent,
        hooks: &mut ModeHooks,
    ) -> Result<Handled> {
        match event {
            InputEvent::Click { pos, .. } => self.add_point(scene, *pos, hooks),
            InputEvent::PointerMove { pos, .. } if !self.points.is_empty() => {
                self.preview = Some(*pos);
                Ok(Handled::Consumed)
            }
            InputEvent::Key(EditKey::Finish) if !self.points.is_empty() => {
                self.finish(scene, hooks)
            }
            _ => Ok(Handled::Ignored),
        }
    }

    fn pending(&self) -> Option<Pending> {
        (!self.points.is_empty()).then_some(Pending::Draw)
    }

    fn cancel(&mut self, _scene: &mut Scene, what: Pending) -> bool {
        if what != Pending::Draw || self.points.is_empty() {
            return false;
        }
        tracing::debug!("Draw cancelled after {} points", self.points.len());
        self.points.clear();
        self.preview = None;
        true
    }
}
