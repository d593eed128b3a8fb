//! Whole-subtree dragging with optional drop-target reparenting.

use std::collections::HashSet;

use layoutkit_core::{point_in_polygon, Error, Point2D, Result};

use super::{Behavior, Handled, InputEvent, ModeHooks, Pending};
use crate::model::Node;
use crate::scene::Scene;

#[derive(Debug, Clone)]
struct SubtreeDrag {
    id: String,
    start: Point2D,
    original: Node,
}

/// Moves the selected node and everything under it.
#[derive(Debug, Clone, Default)]
pub struct DragBehavior {
    reparent: bool,
    drag: Option<SubtreeDrag>,
}

impl DragBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops onto another node that may contain the dragged one move it there.
    pub fn with_reparenting() -> Self {
        Self {
            reparent: true,
            drag: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    fn grabs(node: &Node, pos: Point2D, tolerance: f64) -> bool {
        let polygon = node.points();
        if polygon.len() >= 3 && point_in_polygon(pos, polygon) {
            return true;
        }
        node.baseline.as_ref().is_some_and(|line| {
            line.windows(2)
                .any(|w| layoutkit_core::distance_to_segment(pos, w[0], w[1]) <= tolerance)
        })
    }

    /// The node a drop at `pos` would move the dragged subtree under.
    fn drop_target(&self, scene: &Scene, drag: &SubtreeDrag, pos: Point2D) -> Option<String> {
        let own: HashSet<String> = drag.original.subtree_ids().into_iter().collect();
        let kind = drag.original.element_type();
        let current = scene.document().parent_of(&drag.id).map(|p| p.id.clone());
        let target = scene.hit_test(pos, 0.0, &|node| {
            !own.contains(&node.id) && node.element_type().can_contain(kind)
        })?;
        (Some(&target) != current.as_ref()).then_some(target)
    }
}

impl Behavior for DragBehavior {
    fn name(&self) -> &'static str {
        "drag"
    }

    fn handle(
        &mut self,
        scene: &mut Scene,
        event: &InputEvent,
        hooks: &mut ModeHooks,
    ) -> Result<Handled> {
        match event {
            InputEvent::PointerDown { pos, .. } => {
                let Some(node) = scene.selected_node() else {
                    return Ok(Handled::Ignored);
                };
                if !Self::grabs(node, *pos, scene.pick_radius()) {
                    return Ok(Handled::Ignored);
                }
                if scene.is_read_only(&node.id)? {
                    return Err(Error::read_only(node.id.clone()));
                }
                tracing::debug!("Dragging {}", node.id);
                self.drag = Some(SubtreeDrag {
                    id: node.id.clone(),
                    start: *pos,
                    original: node.clone(),
                });
                Ok(Handled::Consumed)
            }
            InputEvent::PointerMove { pos, .. } => {
                let Some(drag) = self.drag.as_ref() else {
                    return Ok(Handled::Ignored);
                };
                let delta = *pos - drag.start;
                let mut moved = drag.original.clone();
                moved.translate(delta.x, delta.y);
                scene.preview_subtree(&drag.id, moved)?;
                Ok(Handled::Consumed)
            }
            InputEvent::PointerUp { pos, .. } => {
                let Some(drag) = self.drag.take() else {
                    return Ok(Handled::Ignored);
                };
                scene.preview_subtree(&drag.id, drag.original.clone())?;
                let delta = *pos - drag.start;
                let target = if self.reparent {
                    self.drop_target(scene, &drag, *pos)
                } else {
                    None
                };
                if delta.length() == 0.0 && target.is_none() {
                    return Ok(Handled::Consumed);
                }
                let id = scene.move_node(&drag.id, delta.x, delta.y, target.as_deref())?;
                if let Some(parent) = target {
                    hooks.parent_changed(&id, &parent);
                }
                Ok(Handled::Consumed)
            }
            _ => Ok(Handled::Ignored),
        }
    }

    fn on_unselect(&mut self, scene: &mut Scene, _id: &str, _hooks: &mut ModeHooks) -> Result<()> {
        self.cancel(scene, Pending::Edit);
        Ok(())
    }

    fn pending(&self) -> Option<Pending> {
        self.drag.as_ref().map(|_| Pending::Edit)
    }

    fn cancel(&mut self, scene: &mut Scene, what: Pending) -> bool {
        if what != Pending::Edit {
            return false;
        }
        let Some(drag) = self.drag.take() else {
            return false;
        };
        if let Err(err) = scene.preview_subtree(&drag.id, drag.original) {
            tracing::warn!("Could not restore {} after cancelled drag: {}", drag.id, err);
        }
        true
    }
}
