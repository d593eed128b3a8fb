//! Vertex editing of the selected node's coords or baseline.
//!
//! Dragging a handle updates the scene live without history. On release the
//! final list goes through the scene's validated setter; when it is rejected
//! the node is restored from the snapshot taken at drag start.

use layoutkit_core::{Error, GeometryError, Point2D, Result};

use super::{Behavior, EditKey, Handled, InputEvent, ModeHooks, Pending};
use crate::model::Node;
use crate::scene::{unsupported, PointField, Scene};
use crate::shapes::{ShapeKind, Stage};

#[derive(Debug, Clone)]
struct PointDrag {
    id: String,
    field: PointField,
    index: usize,
    original: Node,
    points: Vec<Point2D>,
}

/// Vertex handles on one or more point lists of the selection.
#[derive(Debug, Clone)]
pub struct PointsBehavior {
    fields: Vec<PointField>,
    rect: bool,
    drag: Option<PointDrag>,
    active: Option<(PointField, usize)>,
}

impl PointsBehavior {
    /// Handles on the polygon.
    pub fn coords() -> Self {
        Self::with_fields(vec![PointField::Coords])
    }

    /// Handles on a text line's baseline.
    pub fn baseline() -> Self {
        Self::with_fields(vec![PointField::Baseline])
    }

    /// Baseline handles first, then polygon handles.
    pub fn line() -> Self {
        Self::with_fields(vec![PointField::Baseline, PointField::Coords])
    }

    /// Four-corner polygon editing that keeps the shape axis-aligned.
    pub fn rect() -> Self {
        Self {
            rect: true,
            ..Self::coords()
        }
    }

    fn with_fields(fields: Vec<PointField>) -> Self {
        Self {
            fields,
            rect: false,
            drag: None,
            active: None,
        }
    }

    /// The point picked for insertion or deletion.
    pub fn active_point(&self) -> Option<(PointField, usize)> {
        self.active
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    fn field_points(node: &Node, field: PointField) -> &[Point2D] {
        match field {
            PointField::Coords => node.points(),
            PointField::Baseline => node.baseline.as_deref().unwrap_or(&[]),
        }
    }

    /// Nearest vertex of the selection within the pick radius.
    fn handle_at(&self, scene: &Scene, pos: Point2D) -> Option<(String, PointField, usize)> {
        let node = scene.selected_node()?;
        let radius = scene.pick_radius();
        self.fields.iter().find_map(|&field| {
            Self::field_points(node, field)
                .iter()
                .enumerate()
                .map(|(i, p)| (i, p.distance_to(pos)))
                .filter(|(_, d)| *d <= radius)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(i, _)| (node.id.clone(), field, i))
        })
    }

    /// Moves vertex `index` to `pos`; in rectangle mode the neighbours sharing
    /// an x or y with it follow.
    fn moved(&self, original: &[Point2D], index: usize, pos: Point2D, tolerance: f64) -> Vec<Point2D> {
        let mut points = original.to_vec();
        points[index] = pos;
        if self.rect && original.len() == 4 {
            let anchor = original[index];
            for neighbour in [(index + 3) % 4, (index + 1) % 4] {
                if (original[neighbour].x - anchor.x).abs() <= tolerance {
                    points[neighbour].x = pos.x;
                }
                if (original[neighbour].y - anchor.y).abs() <= tolerance {
                    points[neighbour].y = pos.y;
                }
            }
        }
        points
    }

    fn begin_drag(&mut self, scene: &Scene, pos: Point2D) -> Result<Handled> {
        let Some((id, field, index)) = self.handle_at(scene, pos) else {
            return Ok(Handled::Ignored);
        };
        if scene.is_read_only(&id)? {
            return Err(Error::read_only(id));
        }
        let original = scene.document().get(&id)?.clone();
        let points = Self::field_points(&original, field).to_vec();
        tracing::debug!("Dragging point {} of {}", index, id);
        self.active = Some((field, index));
        self.drag = Some(PointDrag {
            id,
            field,
            index,
            original,
            points,
        });
        Ok(Handled::Consumed)
    }

    fn update_drag(&mut self, scene: &mut Scene, pos: Point2D) -> Result<Handled> {
        let Some(drag) = &self.drag else {
            return Ok(Handled::Ignored);
        };
        let tolerance = scene.editing().rect_tolerance;
        let original = Self::field_points(&drag.original, drag.field);
        let points = self.moved(original, drag.index, pos, tolerance);
        // points leaving the page are not followed
        if scene
            .validator(&drag.id, drag.field)?
            .validate(&points, Stage::Live)
            .is_err()
        {
            return Ok(Handled::Consumed);
        }
        scene.preview_points(&drag.id, drag.field, points.clone())?;
        if let Some(drag) = self.drag.as_mut() {
            drag.points = points;
        }
        Ok(Handled::Consumed)
    }

    fn end_drag(&mut self, scene: &mut Scene) -> Result<Handled> {
        let Some(drag) = self.drag.take() else {
            return Ok(Handled::Ignored);
        };
        let unchanged = drag.points == Self::field_points(&drag.original, drag.field);
        // restore first so a rejected result leaves the node untouched
        scene.preview_subtree(&drag.id, drag.original.clone())?;
        if unchanged {
            return Ok(Handled::Consumed);
        }
        if self.rect && !is_axis_aligned(&drag.points, scene.editing().rect_tolerance) {
            return Err(GeometryError::NotRectangular.into());
        }
        scene.set_points(&drag.id, drag.field, drag.points)?;
        Ok(Handled::Consumed)
    }

    fn insert_point(&mut self, scene: &mut Scene) -> Result<Handled> {
        let (Some(node), Some((field, index))) = (scene.selected_node(), self.active) else {
            return Ok(Handled::Ignored);
        };
        if self.rect {
            return Err(unsupported("rectangles keep exactly four points"));
        }
        let id = node.id.clone();
        let mut points = Self::field_points(node, field).to_vec();
        let n = points.len();
        if n < 2 || index >= n {
            return Ok(Handled::Ignored);
        }
        // polygons wrap around; a polyline's last point pairs with its predecessor
        let (a, b, at) = match field {
            PointField::Coords => (index, (index + 1) % n, index + 1),
            PointField::Baseline if index + 1 < n => (index, index + 1, index + 1),
            PointField::Baseline => (index - 1, index, index),
        };
        points.insert(at, points[a].midpoint(points[b]));
        scene.set_points(&id, field, points)?;
        self.active = Some((field, at));
        Ok(Handled::Consumed)
    }

    fn delete_point(&mut self, scene: &mut Scene) -> Result<Handled> {
        let (Some(node), Some((field, index))) = (scene.selected_node(), self.active) else {
            return Ok(Handled::Ignored);
        };
        let min = if self.rect {
            4
        } else {
            match field {
                PointField::Coords => ShapeKind::Region.min_points(),
                PointField::Baseline => ShapeKind::Baseline.min_points(),
            }
        };
        let mut points = Self::field_points(node, field).to_vec();
        if points.len() <= min {
            return Err(GeometryError::DeletionBelowMinimum { min }.into());
        }
        if index >= points.len() {
            return Ok(Handled::Ignored);
        }
        let id = node.id.clone();
        points.remove(index);
        scene.set_points(&id, field, points)?;
        self.active = None;
        Ok(Handled::Consumed)
    }

    fn pick_active(&mut self, scene: &Scene, pos: Point2D) -> Handled {
        match self.handle_at(scene, pos) {
            Some((_, field, index)) => {
                self.active = Some((field, index));
                Handled::Consumed
            }
            None => Handled::Ignored,
        }
    }
}

impl Behavior for PointsBehavior {
    fn name(&self) -> &'static str {
        if self.rect {
            "rect points"
        } else {
            "points"
        }
    }

    fn handle(
        &mut self,
        scene: &mut Scene,
        event: &InputEvent,
        _hooks: &mut ModeHooks,
    ) -> Result<Handled> {
        match event {
            InputEvent::PointerDown { pos, .. } => self.begin_drag(scene, *pos),
            InputEvent::PointerMove { pos, .. } => self.update_drag(scene, *pos),
            InputEvent::PointerUp { .. } => self.end_drag(scene),
            InputEvent::Click { pos, .. } => Ok(self.pick_active(scene, *pos)),
            InputEvent::Key(EditKey::InsertPoint) => self.insert_point(scene),
            InputEvent::Key(EditKey::DeletePoint) => self.delete_point(scene),
            _ => Ok(Handled::Ignored),
        }
    }

    fn on_unselect(&mut self, scene: &mut Scene, _id: &str, _hooks: &mut ModeHooks) -> Result<()> {
        self.cancel(scene, Pending::Edit);
        Ok(())
    }

    fn pending(&self) -> Option<Pending> {
        (self.drag.is_some() || self.active.is_some()).then_some(Pending::Edit)
    }

    fn cancel(&mut self, scene: &mut Scene, what: Pending) -> bool {
        if what != Pending::Edit || self.pending().is_none() {
            return false;
        }
        if let Some(drag) = self.drag.take() {
            if let Err(err) = scene.preview_subtree(&drag.id, drag.original) {
                tracing::warn!("Could not restore {} after cancelled drag: {}", drag.id, err);
            }
        }
        self.active = None;
        true
    }
}

/// Whether a quadrilateral has only horizontal and vertical edges.
fn is_axis_aligned(points: &[Point2D], tolerance: f64) -> bool {
    points.len() == 4
        && (0..4).all(|i| {
            let (a, b) = (points[i], points[(i + 1) % 4]);
            (a.x - b.x).abs() <= tolerance || (a.y - b.y).abs() <= tolerance
        })
}
