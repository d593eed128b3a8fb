//! Grid dragging for the selected table.
//!
//! When the table's cells form a perfect grid, border and corner handles
//! move whole lines. Otherwise the selected cell is edited as an
//! independent polygon.

use layoutkit_core::{Error, Point2D, Result};

use super::grid::{CornerDrag, Grid, GridHandle};
use crate::model::{ElementType, Node};
use crate::modes::{Behavior, Handled, InputEvent, ModeHooks, Pending, PointsBehavior};
use crate::scene::Scene;

#[derive(Debug, Clone)]
struct GridDrag {
    table_id: String,
    handle: GridHandle,
    start: Point2D,
    original: Node,
    start_grid: Grid,
    corner: Option<CornerDrag>,
    grid: Grid,
}

/// Grid handles on the selected table, with per-cell fallback.
#[derive(Debug, Clone)]
pub struct TableBehavior {
    drag: Option<GridDrag>,
    fallback: PointsBehavior,
}

impl Default for TableBehavior {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBehavior {
    pub fn new() -> Self {
        Self {
            drag: None,
            fallback: PointsBehavior::coords(),
        }
    }

    /// The table owning the selection, if the selection is a table or cell.
    fn selected_table(scene: &Scene) -> Option<String> {
        let node = scene.selected_node()?;
        match node.element_type() {
            ElementType::TableRegion => Some(node.id.clone()),
            ElementType::TableCell => scene.document().parent_of(&node.id).map(|p| p.id.clone()),
            _ => None,
        }
    }

    fn begin(&mut self, scene: &Scene, pos: Point2D) -> Result<Handled> {
        let Some(table_id) = Self::selected_table(scene) else {
            return Ok(Handled::Ignored);
        };
        if !scene.is_grid_table(&table_id)? {
            return Ok(Handled::Ignored);
        }
        let grid = scene.table_grid(&table_id)?;
        let Some(handle) = grid.handle_at(pos, scene.pick_radius()) else {
            return Ok(Handled::Ignored);
        };
        if scene.is_read_only(&table_id)? {
            return Err(Error::read_only(table_id));
        }
        tracing::debug!("Grid drag of {:?} on {}", handle, table_id);
        self.drag = Some(GridDrag {
            original: scene.document().get(&table_id)?.clone(),
            corner: match handle {
                GridHandle::Corner(corner) => Some(CornerDrag::begin(&grid, corner)),
                GridHandle::Line(..) => None,
            },
            table_id,
            handle,
            start: pos,
            start_grid: grid.clone(),
            grid,
        });
        Ok(Handled::Consumed)
    }

    fn update(&mut self, scene: &mut Scene, pos: Point2D) -> Result<Handled> {
        let Some(drag) = self.drag.as_mut() else {
            return Ok(Handled::Ignored);
        };
        let grid = match (&drag.corner, drag.handle) {
            (Some(corner), _) => corner.apply(pos),
            (None, GridHandle::Line(axis, index)) => {
                let mut grid = drag.start_grid.clone();
                grid.drag_line(axis, index, pos - drag.start);
                grid
            }
            (None, GridHandle::Corner(_)) => return Ok(Handled::Consumed),
        };
        scene.preview_grid(&drag.table_id, &grid)?;
        drag.grid = grid;
        Ok(Handled::Consumed)
    }

    fn end(&mut self, scene: &mut Scene) -> Result<Handled> {
        let Some(drag) = self.drag.take() else {
            return Ok(Handled::Ignored);
        };
        scene.preview_subtree(&drag.table_id, drag.original)?;
        if drag.grid != drag.start_grid {
            scene.set_grid(&drag.table_id, &drag.grid)?;
        }
        Ok(Handled::Consumed)
    }
}

impl Behavior for TableBehavior {
    fn name(&self) -> &'static str {
        "table"
    }

    fn handle(
        &mut self,
        scene: &mut Scene,
        event: &InputEvent,
        hooks: &mut ModeHooks,
    ) -> Result<Handled> {
        let handled = match event {
            InputEvent::PointerDown { pos, .. } => self.begin(scene, *pos)?,
            InputEvent::PointerMove { pos, .. } => self.update(scene, *pos)?,
            InputEvent::PointerUp { .. } => self.end(scene)?,
            _ => Handled::Ignored,
        };
        if handled.is_consumed() {
            return Ok(handled);
        }
        // cells of tables that are not perfect grids are edited one by one
        let on_cell = scene
            .selected_node()
            .is_some_and(|n| n.element_type() == ElementType::TableCell);
        if on_cell {
            return self.fallback.handle(scene, event, hooks);
        }
        Ok(Handled::Ignored)
    }

    fn on_unselect(&mut self, scene: &mut Scene, id: &str, hooks: &mut ModeHooks) -> Result<()> {
        self.cancel(scene, Pending::Edit);
        self.fallback.on_unselect(scene, id, hooks)
    }

    fn pending(&self) -> Option<Pending> {
        if self.drag.is_some() {
            Some(Pending::Edit)
        } else {
            self.fallback.pending()
        }
    }

    fn cancel(&mut self, scene: &mut Scene, what: Pending) -> bool {
        if what != Pending::Edit {
            return false;
        }
        match self.drag.take() {
            Some(drag) => {
                if let Err(err) = scene.preview_subtree(&drag.table_id, drag.original) {
                    tracing::warn!("Could not restore table {}: {}", drag.table_id, err);
                }
                true
            }
            None => self.fallback.cancel(scene, what),
        }
    }
}
