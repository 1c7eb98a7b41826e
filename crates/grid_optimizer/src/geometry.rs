pub mod grid;
pub mod types;

pub use grid::{CoarseGrid, Violation};
pub use types::{Cell, Coord, Footprint, Selection};
