use itertools::Itertools;
use thiserror::Error;

use crate::geometry::types::{Cell, Coord, Footprint, Selection};

/// Broken grid invariant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("cell {cell} fully contains footprints {footprints:?}")]
    SharedCell { cell: Cell, footprints: Vec<usize> },

    #[error("every cell contains a footprint")]
    NoEmptyCell,
}

/// Coarse grid induced by a selection
///
/// Cells are numbered row-major: row `r` lies between `h_lines[r]` and
/// `h_lines[r + 1]`, column `c` between `v_lines[c]` and `v_lines[c + 1]`,
/// and the cell index is `r * columns + c`.
#[derive(Debug, Clone, Copy)]
pub struct CoarseGrid<'a> {
    h_lines: &'a [Coord],
    v_lines: &'a [Coord],
    footprints: &'a [Footprint],
}

impl<'a> CoarseGrid<'a> {
    pub fn new(selection: &'a Selection, footprints: &'a [Footprint]) -> Self {
        Self::from_lines(&selection.h_lines, &selection.v_lines, footprints)
    }

    pub fn from_lines(
        h_lines: &'a [Coord],
        v_lines: &'a [Coord],
        footprints: &'a [Footprint],
    ) -> Self {
        Self {
            h_lines,
            v_lines,
            footprints,
        }
    }

    pub fn rows(&self) -> usize {
        self.h_lines.len().saturating_sub(1)
    }

    pub fn columns(&self) -> usize {
        self.v_lines.len().saturating_sub(1)
    }

    pub fn cell_count(&self) -> usize {
        self.rows() * self.columns()
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.h_lines.iter().tuple_windows().flat_map(move |(&y1, &y2)| {
            self.v_lines
                .iter()
                .tuple_windows()
                .map(move |(&x1, &x2)| Cell::new(x1, y1, x2, y2))
        })
    }

    pub fn cell(&self, index: usize) -> Option<Cell> {
        let columns = self.columns();
        if columns == 0 || index >= self.cell_count() {
            return None;
        }
        let (row, col) = (index / columns, index % columns);
        Some(Cell::new(
            self.v_lines[col],
            self.h_lines[row],
            self.v_lines[col + 1],
            self.h_lines[row + 1],
        ))
    }

    /// Cell holding the point. Points on an interior line belong to the
    /// upper/right cell, points on the far border to the last row/column.
    pub fn cell_index_of(&self, x: f64, y: f64) -> Option<usize> {
        let col = slot_of(self.v_lines, x)?;
        let row = slot_of(self.h_lines, y)?;
        Some(row * self.columns() + col)
    }

    /// Index of the cell that fully contains the footprint, if any
    pub fn containing_cell(&self, footprint: &Footprint) -> Option<usize> {
        let col = enclosing_slot(self.v_lines, footprint.x1, footprint.x2)?;
        let row = enclosing_slot(self.h_lines, footprint.y1, footprint.y2)?;
        Some(row * self.columns() + col)
    }

    /// Contained footprint indices per cell
    pub fn occupancy(&self) -> Vec<Vec<usize>> {
        let mut occupancy = vec![Vec::new(); self.cell_count()];
        for (i, footprint) in self.footprints.iter().enumerate() {
            if let Some(cell) = self.containing_cell(footprint) {
                occupancy[cell].push(i);
            }
        }
        occupancy
    }

    pub fn empty_cells(&self) -> Vec<Cell> {
        self.occupancy()
            .iter()
            .enumerate()
            .filter(|(_, contained)| contained.is_empty())
            .filter_map(|(i, _)| self.cell(i))
            .collect()
    }

    /// Check containment-uniqueness and emptiness
    pub fn check(&self) -> Result<(), Violation> {
        let occupancy = self.occupancy();
        for (i, contained) in occupancy.iter().enumerate() {
            if contained.len() > 1
                && let Some(cell) = self.cell(i)
            {
                return Err(Violation::SharedCell {
                    cell,
                    footprints: contained.clone(),
                });
            }
        }
        if occupancy.iter().all(|contained| !contained.is_empty()) {
            return Err(Violation::NoEmptyCell);
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.check().is_ok()
    }
}

fn slot_of(lines: &[Coord], value: f64) -> Option<usize> {
    let (&first, &last) = (lines.first()?, lines.last()?);
    if lines.len() < 2 || value < f64::from(first) || value > f64::from(last) {
        return None;
    }
    let idx = lines.partition_point(|&line| f64::from(line) <= value);
    Some(idx.saturating_sub(1).min(lines.len() - 2))
}

fn enclosing_slot(lines: &[Coord], lo: Coord, hi: Coord) -> Option<usize> {
    let slot = lines.partition_point(|&line| line <= lo).checked_sub(1)?;
    let upper = *lines.get(slot + 1)?;
    (upper >= hi).then_some(slot)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_b() -> Vec<Footprint> {
        vec![Footprint::new(0, 0, 2, 2), Footprint::new(2, 2, 4, 4)]
    }

    #[test]
    fn test_cells_are_row_major() {
        let selection = Selection::new(vec![0, 2, 4], vec![0, 1, 4]);
        let grid = CoarseGrid::new(&selection, &[]);
        let cells: Vec<Cell> = grid.cells().collect();
        assert_eq!(grid.cell_count(), 4);
        assert_eq!(cells[0], Cell::new(0, 0, 1, 2));
        assert_eq!(cells[1], Cell::new(1, 0, 4, 2));
        assert_eq!(cells[2], Cell::new(0, 2, 1, 4));
        assert_eq!(grid.cell(3), Some(cells[3]));
        assert_eq!(grid.cell(4), None);
    }

    #[test]
    fn test_cell_index_of_points() {
        let selection = Selection::new(vec![0, 2, 4], vec![0, 2, 4]);
        let grid = CoarseGrid::new(&selection, &[]);
        assert_eq!(grid.cell_index_of(0.5, 0.5), Some(0));
        assert_eq!(grid.cell_index_of(2.0, 0.5), Some(1));
        assert_eq!(grid.cell_index_of(4.0, 4.0), Some(3));
        assert_eq!(grid.cell_index_of(4.5, 1.0), None);
        assert_eq!(grid.cell_index_of(-0.1, 1.0), None);
    }

    #[test]
    fn test_straddling_footprint_is_not_contained() {
        let selection = Selection::new(vec![0, 4], vec![0, 2, 4]);
        let footprints = [Footprint::new(1, 0, 3, 2)];
        let grid = CoarseGrid::new(&selection, &footprints);
        assert_eq!(grid.containing_cell(&footprints[0]), None);
        assert_eq!(grid.empty_cells().len(), 2);
        assert!(grid.is_valid());
    }

    #[test]
    fn test_check_reports_shared_cell() {
        let selection = Selection::new(vec![0, 4], vec![0, 2, 4]);
        let footprints = scenario_b();
        let grid = CoarseGrid::new(&selection, &footprints);
        match grid.check() {
            Err(Violation::NoEmptyCell) => {}
            other => panic!("unexpected {:?}", other),
        }

        let selection = Selection::new(vec![0, 4], vec![0, 4]);
        let grid = CoarseGrid::new(&selection, &footprints);
        assert_eq!(
            grid.check(),
            Err(Violation::SharedCell {
                cell: Cell::new(0, 0, 4, 4),
                footprints: vec![0, 1],
            })
        );
    }

    #[test]
    fn test_occupancy_of_valid_grid() {
        let selection = Selection::new(vec![0, 2, 4], vec![0, 2, 4]);
        let footprints = scenario_b();
        let grid = CoarseGrid::new(&selection, &footprints);
        assert_eq!(grid.occupancy(), vec![vec![0], vec![], vec![], vec![1]]);
        assert_eq!(grid.empty_cells(), vec![Cell::new(2, 0, 4, 2), Cell::new(0, 2, 2, 4)]);
        assert!(grid.is_valid());
    }
}
