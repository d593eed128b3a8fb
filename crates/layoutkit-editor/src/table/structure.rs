//! Table creation, grid writes and row/column insertion and deletion.

use std::collections::{HashMap, HashSet};

use layoutkit_core::{standardize_quad, Error, Point2D, Result, StructureError};

use super::grid::Grid;
use crate::history::ChangeType;
use crate::model::{Coords, ElementType, Node, NodeKind};
use crate::scene::{repair_references, unsupported, Scene};
use crate::shapes::{ShapeKind, Stage, Validator};

/// Id of the 1-based cell `(row, col)` of `table_id`.
pub fn cell_id(table_id: &str, row: usize, col: usize) -> String {
    format!("{}_{}_{}", table_id, row, col)
}

impl Scene {
    /// Creates a `rows x cols` table filling a quadrilateral on `page_id`.
    pub fn create_table(
        &mut self,
        page_id: &str,
        outline: Vec<Point2D>,
        rows: usize,
        cols: usize,
    ) -> Result<String> {
        if rows == 0 || cols == 0 {
            return Err(unsupported("a table needs at least one row and one column"));
        }
        if outline.len() != 4 {
            return Err(layoutkit_core::GeometryError::TooFewPoints {
                min: 4,
                got: outline.len(),
            }
            .into());
        }
        let page = self.document().get(page_id)?;
        if page.element_type() != ElementType::Page {
            return Err(StructureError::InvalidParent {
                child: ElementType::TableRegion.to_string(),
                parent: page.element_type().to_string(),
            }
            .into());
        }
        self.ensure_writable(page_id)?;

        let quad = standardize_quad(&outline);
        let mut validator = Validator::new(ShapeKind::Region, self.limits());
        if let Some((w, h)) = self.document().page_size_of(page_id) {
            validator = validator.with_page(w, h);
        }
        validator.validate(&quad, Stage::Completion)?;

        let id = self.document().unique_id(ElementType::TableRegion.id_prefix());
        let grid = Grid::subdivide([quad[0], quad[1], quad[2], quad[3]], rows, cols);
        let mut table = Node::new(id.clone(), NodeKind::TableRegion { rows, cols })
            .with_points(grid.outline());
        for row in 1..=rows {
            for col in 1..=cols {
                table.children.push(
                    Node::new(cell_id(&id, row, col), NodeKind::TableCell { row, col })
                        .with_points(grid.cell_polygon(row, col)),
                );
            }
        }
        self.document_mut().insert(page_id, table, None)?;
        tracing::debug!("Created {}x{} table {}", rows, cols, id);
        self.commit(ChangeType::CreateNode);
        Ok(id)
    }

    /// The corner lattice of a table, without checking that cells agree.
    pub fn table_grid(&self, table_id: &str) -> Result<Grid> {
        Ok(Grid::from_table(self.document().get(table_id)?)?)
    }

    /// Whether a table's cells form a perfect grid within the configured
    /// tolerance. Tables that do not are edited cell by cell.
    pub fn is_grid_table(&self, table_id: &str) -> Result<bool> {
        let table = self.document().get(table_id)?;
        match Grid::from_table(table) {
            Ok(grid) => Ok(grid.is_consistent(table, self.editing().grid_tolerance)),
            Err(err @ StructureError::CellCountMismatch { .. }) => Err(err.into()),
            Err(_) => Ok(false),
        }
    }

    /// Writes the grid into the table's cells and outline without
    /// validation or history.
    pub fn preview_grid(&mut self, table_id: &str, grid: &Grid) -> Result<()> {
        self.ensure_writable(table_id)?;
        let table = self.document_mut().get_mut(table_id)?;
        write_grid(table, grid)
    }

    /// Validates every cell of `grid` and commits it to the table.
    pub fn set_grid(&mut self, table_id: &str, grid: &Grid) -> Result<()> {
        self.ensure_writable(table_id)?;
        let mut validator = Validator::new(ShapeKind::Cell, self.limits());
        if let Some((w, h)) = self.document().page_size_of(table_id) {
            validator = validator.with_page(w, h);
        }
        for row in 1..=grid.rows() {
            for col in 1..=grid.cols() {
                validator.validate(&grid.cell_polygon(row, col), Stage::Completion)?;
            }
        }
        let table = self.document_mut().get_mut(table_id)?;
        write_grid(table, grid)?;
        self.commit(ChangeType::TableGrid);
        Ok(())
    }

    /// Splits 1-based row `at` in two. Cells below shift down by one.
    pub fn insert_row(&mut self, table_id: &str, at: usize) -> Result<()> {
        let mut grid = self.structure_grid(table_id, at, true)?;
        grid.insert_row(at);
        self.restructure(table_id, grid, &|row, col| {
            Some((if row > at { row + 1 } else { row }, col))
        })
    }

    /// Splits 1-based column `at` in two. Cells to the right shift by one.
    pub fn insert_col(&mut self, table_id: &str, at: usize) -> Result<()> {
        let mut grid = self.structure_grid(table_id, at, false)?;
        grid.insert_col(at);
        self.restructure(table_id, grid, &|row, col| {
            Some((row, if col > at { col + 1 } else { col }))
        })
    }

    /// Deletes 1-based row `at` with its cells and their content.
    pub fn delete_row(&mut self, table_id: &str, at: usize) -> Result<()> {
        let mut grid = self.structure_grid(table_id, at, true)?;
        if grid.rows() == 1 {
            return Err(unsupported("cannot delete the last row of a table"));
        }
        grid.delete_row(at);
        self.restructure(table_id, grid, &|row, col| match row {
            r if r == at => None,
            r if r > at => Some((r - 1, col)),
            r => Some((r, col)),
        })
    }

    /// Deletes 1-based column `at` with its cells and their content.
    pub fn delete_col(&mut self, table_id: &str, at: usize) -> Result<()> {
        let mut grid = self.structure_grid(table_id, at, false)?;
        if grid.cols() == 1 {
            return Err(unsupported("cannot delete the last column of a table"));
        }
        grid.delete_col(at);
        self.restructure(table_id, grid, &|row, col| match col {
            c if c == at => None,
            c if c > at => Some((row, c - 1)),
            c => Some((row, c)),
        })
    }

    fn structure_grid(&self, table_id: &str, at: usize, rows: bool) -> Result<Grid> {
        let table = self.document().get(table_id)?;
        let grid = Grid::from_table(table)?;
        let count = if rows { grid.rows() } else { grid.cols() };
        if at == 0 || at > count {
            return Err(StructureError::IndexOutOfRange { index: at, count }.into());
        }
        self.ensure_writable(table_id)?;
        if let Some(locked) = table.iter().find(|n| n.protected) {
            return Err(Error::read_only(locked.id.clone()));
        }
        Ok(grid)
    }

    /// Rebuilds a table's cells from `grid`, moving each old cell to the
    /// position `remap` gives it (or dropping it) and renaming it and its
    /// descendants to match.
    fn restructure(
        &mut self,
        table_id: &str,
        grid: Grid,
        remap: &dyn Fn(usize, usize) -> Option<(usize, usize)>,
    ) -> Result<()> {
        let mut doc = self.document().clone();
        let table = doc.get_mut(table_id)?;
        let mut gone = HashSet::new();
        let mut renamed = Vec::new();
        let mut cells: HashMap<(usize, usize), Node> = HashMap::new();

        for mut cell in std::mem::take(&mut table.children) {
            let NodeKind::TableCell { row, col } = cell.kind else {
                continue;
            };
            match remap(row, col) {
                None => gone.extend(cell.subtree_ids()),
                Some((r, c)) => {
                    if (r, c) != (row, col) {
                        cell.kind = NodeKind::TableCell { row: r, col: c };
                        renamed.extend(cell.rename(&cell_id(table_id, r, c)));
                    }
                    cells.insert((r, c), cell);
                }
            }
        }

        for row in 1..=grid.rows() {
            for col in 1..=grid.cols() {
                let cell = cells.remove(&(row, col)).unwrap_or_else(|| {
                    Node::new(cell_id(table_id, row, col), NodeKind::TableCell { row, col })
                });
                table.children.push(cell);
            }
        }
        table.kind = NodeKind::TableRegion {
            rows: grid.rows(),
            cols: grid.cols(),
        };
        write_grid(table, &grid)?;

        repair_references(&mut doc, &mut gone);
        doc.rewrite_references(&renamed);

        let selected = self.selected().map(str::to_string);
        self.replace_document(doc);
        let reselect = selected.and_then(|id| {
            if gone.contains(&id) {
                None
            } else {
                Some(
                    renamed
                        .iter()
                        .find(|(old, _)| *old == id)
                        .map(|(_, new)| new.clone())
                        .unwrap_or(id),
                )
            }
        });
        self.select(reselect.as_deref())?;
        tracing::debug!(
            "Table {} is now {}x{}",
            table_id,
            grid.rows(),
            grid.cols()
        );
        self.commit(ChangeType::TableStructure);
        Ok(())
    }
}

fn write_grid(table: &mut Node, grid: &Grid) -> Result<()> {
    let NodeKind::TableRegion { rows, cols } = table.kind else {
        return Err(unsupported(format!("{} is not a table", table.id)));
    };
    if rows != grid.rows() || cols != grid.cols() {
        return Err(StructureError::CellCountMismatch {
            table: table.id.clone(),
            cells: grid.rows() * grid.cols(),
            rows,
            cols,
        }
        .into());
    }
    table.coords = Coords::Independent(grid.outline());
    for cell in &mut table.children {
        if let NodeKind::TableCell { row, col } = cell.kind {
            cell.coords = Coords::Independent(grid.cell_polygon(row, col));
        }
    }
    Ok(())
}
