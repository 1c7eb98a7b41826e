use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid coordinate (candidate line position)
pub type Coord = u32;

/// Axis-aligned bounding box of one object projected onto the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Footprint {
    pub x1: Coord,
    pub y1: Coord,
    pub x2: Coord,
    pub y2: Coord,
}

impl Footprint {
    pub fn new(x1: Coord, y1: Coord, x2: Coord, y2: Coord) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Smallest rectangle covering both footprints
    pub fn union(&self, other: &Footprint) -> Footprint {
        Footprint {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }
}

impl fmt::Display for Footprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}

/// One rectangle of the coarse grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x1: Coord,
    pub y1: Coord,
    pub x2: Coord,
    pub y2: Coord,
}

impl Cell {
    pub fn new(x1: Coord, y1: Coord, x2: Coord, y2: Coord) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Full containment. A footprint that straddles a cell boundary is not contained.
    pub fn contains(&self, footprint: &Footprint) -> bool {
        self.x1 <= footprint.x1
            && self.x2 >= footprint.x2
            && self.y1 <= footprint.y1
            && self.y2 >= footprint.y2
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}] x [{}, {}]", self.x1, self.x2, self.y1, self.y2)
    }
}

/// Selected horizontal (y) and vertical (x) lines, ascending, borders included
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Selection {
    pub h_lines: Vec<Coord>,
    pub v_lines: Vec<Coord>,
}

impl Selection {
    pub fn new(h_lines: Vec<Coord>, v_lines: Vec<Coord>) -> Self {
        Self { h_lines, v_lines }
    }

    /// Number of selected lines that are not surface borders
    pub fn interior_count(&self) -> usize {
        self.h_lines.len().saturating_sub(2) + self.v_lines.len().saturating_sub(2)
    }

    pub fn cell_count(&self) -> usize {
        self.h_lines.len().saturating_sub(1) * self.v_lines.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_contains_requires_full_containment() {
        let cell = Cell::new(0, 0, 2, 2);
        assert!(cell.contains(&Footprint::new(0, 0, 2, 2)));
        assert!(cell.contains(&Footprint::new(1, 1, 2, 2)));
        assert!(!cell.contains(&Footprint::new(1, 1, 3, 2)));
        assert!(!cell.contains(&Footprint::new(2, 0, 4, 2)));
    }

    #[test]
    fn test_footprint_union() {
        let a = Footprint::new(0, 2, 1, 3);
        let b = Footprint::new(2, 0, 3, 1);
        assert_eq!(a.union(&b), Footprint::new(0, 0, 3, 3));
        assert_eq!(a.union(&a), a);
    }

    #[test]
    fn test_selection_counts_exclude_borders() {
        let sel = Selection::new(vec![0, 2, 4], vec![0, 4]);
        assert_eq!(sel.interior_count(), 1);
        assert_eq!(sel.cell_count(), 2);
    }
}
