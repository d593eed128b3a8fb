//! Corner lattice of a table and its constrained edits.
//!
//! A table with `rows x cols` cells has `(rows + 1) x (cols + 1)` grid
//! corners. Row line `i` runs through corners `(i, 0) .. (i, cols)`, column
//! line `j` through `(0, j) .. (rows, j)`. Every corner is kept on the
//! intersection of its row and column line; lines 0 and `rows`/`cols` are
//! the outer boundaries.

use layoutkit_core::{intersection, standardize_quad, Point2D, StructureError};

use crate::model::{Node, NodeKind};

/// Grid axis of a border line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Col,
}

/// One of the four outer corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

/// A draggable grid handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridHandle {
    Corner(Corner),
    /// Border line `index` of an axis, 0 being the top or left boundary.
    Line(Axis, usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    corners: Vec<Point2D>,
}

impl Grid {
    /// Evenly divided grid inside a quadrilateral given clockwise from its
    /// top-left corner.
    pub fn subdivide(outline: [Point2D; 4], rows: usize, cols: usize) -> Self {
        let [tl, tr, br, bl] = outline;
        let mut corners = Vec::with_capacity((rows + 1) * (cols + 1));
        for i in 0..=rows {
            let t = i as f64 / rows as f64;
            let left = tl.lerp(bl, t);
            let right = tr.lerp(br, t);
            for j in 0..=cols {
                corners.push(left.lerp(right, j as f64 / cols as f64));
            }
        }
        Self {
            rows,
            cols,
            corners,
        }
    }

    /// Reads the lattice from a table node's cells.
    ///
    /// Every cell must have four points. Each corner is taken from the first
    /// cell touching it; [`Grid::is_consistent`] checks the others agree.
    pub fn from_table(table: &Node) -> Result<Self, StructureError> {
        let NodeKind::TableRegion { rows, cols } = table.kind else {
            return Err(StructureError::UnsupportedOperation {
                reason: format!("{} is not a table", table.id),
            });
        };
        if table.children.len() != rows * cols || rows == 0 || cols == 0 {
            return Err(StructureError::CellCountMismatch {
                table: table.id.clone(),
                cells: table.children.len(),
                rows,
                cols,
            });
        }

        let mut corners: Vec<Option<Point2D>> = vec![None; (rows + 1) * (cols + 1)];
        let mut seen = vec![false; rows * cols];
        for cell in &table.children {
            let NodeKind::TableCell { row, col } = cell.kind else {
                return Err(StructureError::InvalidParent {
                    child: cell.element_type().to_string(),
                    parent: table.element_type().to_string(),
                });
            };
            let malformed = |reason: &str| StructureError::MalformedCell {
                table: table.id.clone(),
                row,
                col,
                reason: reason.to_string(),
            };
            if row == 0 || col == 0 || row > rows || col > cols {
                return Err(malformed("position outside the table"));
            }
            let slot = &mut seen[(row - 1) * cols + col - 1];
            if *slot {
                return Err(malformed("position used twice"));
            }
            *slot = true;
            if cell.points().len() != 4 {
                return Err(malformed("cell polygon needs exactly 4 points"));
            }
            let quad = standardize_quad(cell.points());
            let at = [(row - 1, col - 1), (row - 1, col), (row, col), (row, col - 1)];
            for ((i, j), p) in at.into_iter().zip(quad) {
                corners[i * (cols + 1) + j].get_or_insert(p);
            }
        }
        let corners = corners
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| StructureError::NotAGrid {
                table: table.id.clone(),
            })?;
        Ok(Self {
            rows,
            cols,
            corners,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn corner(&self, i: usize, j: usize) -> Point2D {
        self.corners[i * (self.cols + 1) + j]
    }

    fn set(&mut self, i: usize, j: usize, p: Point2D) {
        let cols = self.cols;
        self.corners[i * (cols + 1) + j] = p;
    }

    fn row_line(&self, i: usize) -> (Point2D, Point2D) {
        (self.corner(i, 0), self.corner(i, self.cols))
    }

    fn col_line(&self, j: usize) -> (Point2D, Point2D) {
        (self.corner(0, j), self.corner(self.rows, j))
    }

    fn outer(&self, corner: Corner) -> (usize, usize) {
        match corner {
            Corner::TopLeft => (0, 0),
            Corner::TopRight => (0, self.cols),
            Corner::BottomRight => (self.rows, self.cols),
            Corner::BottomLeft => (self.rows, 0),
        }
    }

    /// Polygon of the 1-based cell `(row, col)`, clockwise from top-left.
    pub fn cell_polygon(&self, row: usize, col: usize) -> Vec<Point2D> {
        vec![
            self.corner(row - 1, col - 1),
            self.corner(row - 1, col),
            self.corner(row, col),
            self.corner(row, col - 1),
        ]
    }

    /// The table outline, clockwise from top-left.
    pub fn outline(&self) -> Vec<Point2D> {
        vec![
            self.corner(0, 0),
            self.corner(0, self.cols),
            self.corner(self.rows, self.cols),
            self.corner(self.rows, 0),
        ]
    }

    /// Checks the cells of `table` share corners with this grid and that
    /// every interior corner sits on its row and column line, both within
    /// `tolerance`.
    pub fn is_consistent(&self, table: &Node, tolerance: f64) -> bool {
        let shared = table.children.iter().all(|cell| match cell.kind {
            NodeKind::TableCell { row, col } if cell.points().len() == 4 => {
                standardize_quad(cell.points())
                    .iter()
                    .zip(self.cell_polygon(row, col))
                    .all(|(a, b)| a.approx_eq(b, tolerance))
            }
            _ => false,
        });
        if !shared {
            return false;
        }
        (1..self.rows).all(|i| {
            (1..self.cols).all(|j| {
                let (r0, r1) = self.row_line(i);
                let (c0, c1) = self.col_line(j);
                intersection(r0, r1, c0, c1)
                    .is_some_and(|p| p.approx_eq(self.corner(i, j), tolerance))
            })
        })
    }

    /// Recomputes every corner that is not an outer-line endpoint as the
    /// intersection of its row and column line.
    pub fn refit(&mut self) {
        for i in 1..self.rows {
            for j in 1..self.cols {
                let (r0, r1) = self.row_line(i);
                let (c0, c1) = self.col_line(j);
                if let Some(p) = intersection(r0, r1, c0, c1) {
                    self.set(i, j, p);
                }
            }
        }
    }

    /// Slides border line `index` by `delta`.
    ///
    /// The moved line is re-intersected with every line of the other axis, so
    /// boundary lines stretch or shrink the crossing lines along their own
    /// direction and interior lines stay between the fixed boundaries.
    pub fn drag_line(&mut self, axis: Axis, index: usize, delta: Point2D) {
        match axis {
            Axis::Row => {
                let (a, b) = self.row_line(index);
                let (a, b) = (a + delta, b + delta);
                for j in 0..=self.cols {
                    let (c0, c1) = self.col_line(j);
                    let p = intersection(a, b, c0, c1).unwrap_or(self.corner(index, j) + delta);
                    self.set(index, j, p);
                }
            }
            Axis::Col => {
                let (a, b) = self.col_line(index);
                let (a, b) = (a + delta, b + delta);
                for i in 0..=self.rows {
                    let (r0, r1) = self.row_line(i);
                    let p = intersection(a, b, r0, r1).unwrap_or(self.corner(i, index) + delta);
                    self.set(i, index, p);
                }
            }
        }
    }

    /// Positions of the line ends on the four boundaries as fractions of the
    /// boundary length.
    pub fn ratios(&self) -> GridRatios {
        let along = |from: Point2D, to: Point2D, p: Point2D| {
            let total = from.distance_to(to);
            if total > f64::EPSILON {
                from.distance_to(p) / total
            } else {
                0.0
            }
        };
        let (r, c) = (self.rows, self.cols);
        GridRatios {
            left: (0..=r)
                .map(|i| along(self.corner(0, 0), self.corner(r, 0), self.corner(i, 0)))
                .collect(),
            right: (0..=r)
                .map(|i| along(self.corner(0, c), self.corner(r, c), self.corner(i, c)))
                .collect(),
            top: (0..=c)
                .map(|j| along(self.corner(0, 0), self.corner(0, c), self.corner(0, j)))
                .collect(),
            bottom: (0..=c)
                .map(|j| along(self.corner(r, 0), self.corner(r, c), self.corner(r, j)))
                .collect(),
        }
    }

    /// Re-derives all boundary points from the outer corners and `ratios`,
    /// then refits the interior.
    pub fn rebuild(&mut self, ratios: &GridRatios) {
        let (r, c) = (self.rows, self.cols);
        let (tl, tr, br, bl) = (
            self.corner(0, 0),
            self.corner(0, c),
            self.corner(r, c),
            self.corner(r, 0),
        );
        for i in 1..r {
            self.set(i, 0, tl.lerp(bl, ratios.left[i]));
            self.set(i, c, tr.lerp(br, ratios.right[i]));
        }
        for j in 1..c {
            self.set(0, j, tl.lerp(tr, ratios.top[j]));
            self.set(r, j, bl.lerp(br, ratios.bottom[j]));
        }
        self.refit();
    }

    /// Handle positions: the outer corners and the midpoint of every line.
    pub fn handles(&self) -> Vec<(GridHandle, Point2D)> {
        let mut handles: Vec<(GridHandle, Point2D)> = [
            Corner::TopLeft,
            Corner::TopRight,
            Corner::BottomRight,
            Corner::BottomLeft,
        ]
        .into_iter()
        .map(|corner| {
            let (i, j) = self.outer(corner);
            (GridHandle::Corner(corner), self.corner(i, j))
        })
        .collect();
        for i in 0..=self.rows {
            let (a, b) = self.row_line(i);
            handles.push((GridHandle::Line(Axis::Row, i), a.midpoint(b)));
        }
        for j in 0..=self.cols {
            let (a, b) = self.col_line(j);
            handles.push((GridHandle::Line(Axis::Col, j), a.midpoint(b)));
        }
        handles
    }

    /// Nearest handle within `radius` of `pos`; corners win ties.
    pub fn handle_at(&self, pos: Point2D, radius: f64) -> Option<GridHandle> {
        self.handles()
            .into_iter()
            .map(|(h, p)| (h, p.distance_to(pos)))
            .filter(|(_, d)| *d <= radius)
            .fold(None, |best: Option<(GridHandle, f64)>, (h, d)| match best {
                Some((_, bd)) if bd <= d => best,
                _ => Some((h, d)),
            })
            .map(|(h, _)| h)
    }

    /// Splits 1-based row `at` in two along its midline.
    pub fn insert_row(&mut self, at: usize) {
        let cols = self.cols;
        let line: Vec<Point2D> = (0..=cols)
            .map(|j| self.corner(at - 1, j).midpoint(self.corner(at, j)))
            .collect();
        let pos = at * (cols + 1);
        self.corners.splice(pos..pos, line);
        self.rows += 1;
        self.refit();
    }

    /// Splits 1-based column `at` in two along its midline.
    pub fn insert_col(&mut self, at: usize) {
        let cols = self.cols;
        let mut corners = Vec::with_capacity((self.rows + 1) * (cols + 2));
        for i in 0..=self.rows {
            for j in 0..=cols {
                if j == at {
                    corners.push(self.corner(i, at - 1).midpoint(self.corner(i, at)));
                }
                corners.push(self.corner(i, j));
            }
        }
        self.corners = corners;
        self.cols += 1;
        self.refit();
    }

    /// Removes 1-based row `at`.
    ///
    /// The neighbours of an interior row meet at its midline; removing the
    /// first or last row shrinks the table.
    pub fn delete_row(&mut self, at: usize) {
        let cols = self.cols;
        if at > 1 && at < self.rows {
            for j in 0..=cols {
                let mid = self.corner(at - 1, j).midpoint(self.corner(at, j));
                self.set(at - 1, j, mid);
            }
            self.corners.drain(at * (cols + 1)..(at + 1) * (cols + 1));
        } else {
            let line = if at == 1 { 0 } else { self.rows };
            self.corners.drain(line * (cols + 1)..(line + 1) * (cols + 1));
        }
        self.rows -= 1;
        self.refit();
    }

    /// Removes 1-based column `at`, like [`Grid::delete_row`].
    pub fn delete_col(&mut self, at: usize) {
        let cols = self.cols;
        let (keep_mid, drop) = if at > 1 && at < cols {
            (true, at)
        } else if at == 1 {
            (false, 0)
        } else {
            (false, cols)
        };
        let mut corners = Vec::with_capacity((self.rows + 1) * cols);
        for i in 0..=self.rows {
            for j in 0..=cols {
                if j == drop {
                    continue;
                }
                if keep_mid && j == at - 1 {
                    corners.push(self.corner(i, at - 1).midpoint(self.corner(i, at)));
                } else {
                    corners.push(self.corner(i, j));
                }
            }
        }
        self.corners = corners;
        self.cols -= 1;
        self.refit();
    }
}

/// Boundary ratios captured when a corner drag starts.
#[derive(Debug, Clone, PartialEq)]
pub struct GridRatios {
    left: Vec<f64>,
    right: Vec<f64>,
    top: Vec<f64>,
    bottom: Vec<f64>,
}

/// An outer-corner drag in progress.
#[derive(Debug, Clone)]
pub struct CornerDrag {
    corner: Corner,
    start: Grid,
    ratios: GridRatios,
}

impl CornerDrag {
    pub fn begin(grid: &Grid, corner: Corner) -> Self {
        Self {
            corner,
            start: grid.clone(),
            ratios: grid.ratios(),
        }
    }

    /// The grid with the dragged corner moved to `pos`.
    pub fn apply(&self, pos: Point2D) -> Grid {
        let mut grid = self.start.clone();
        let (i, j) = grid.outer(self.corner);
        grid.set(i, j, pos);
        grid.rebuild(&self.ratios);
        grid
    }
}
