use serde::Serialize;
use std::fmt;

use crate::instance::Instance;
use crate::optimize::{Discretization, SearchStatus};

/// Summary of one discretization run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscretizationReport {
    pub footprints: usize,
    pub fine_cells: usize,
    pub coarse_cells: usize,
    pub interior_lines_kept: usize,
    pub interior_lines_available: usize,
    pub status: SearchStatus,
    pub nodes: u64,
    pub elapsed_ms: f64,
}

impl DiscretizationReport {
    pub fn new(instance: &Instance, result: &Discretization) -> Self {
        Self {
            footprints: instance.footprints().len(),
            fine_cells: instance.fine_cell_count(),
            coarse_cells: result.selection.cell_count(),
            interior_lines_kept: result.selection.interior_count(),
            interior_lines_available: instance.interior_line_count(),
            status: result.status,
            nodes: result.stats.nodes,
            elapsed_ms: result.stats.elapsed.as_secs_f64() * 1000.0,
        }
    }

    pub fn log(&self) {
        log::info!("=== Discretization ===");
        log::info!("Footprints: {}", self.footprints);
        log::info!("Fine cells: {}", self.fine_cells);
        log::info!("Coarse cells: {}", self.coarse_cells);
        log::info!(
            "Interior lines: {} of {}",
            self.interior_lines_kept,
            self.interior_lines_available
        );
        log::info!("Status: {} ({} nodes)", self.status, self.nodes);
        log::info!("Elapsed: {:.3} ms", self.elapsed_ms);
    }
}

impl fmt::Display for DiscretizationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "footprints:     {}", self.footprints)?;
        writeln!(f, "fine cells:     {}", self.fine_cells)?;
        writeln!(f, "coarse cells:   {}", self.coarse_cells)?;
        writeln!(
            f,
            "interior lines: {}/{}",
            self.interior_lines_kept, self.interior_lines_available
        )?;
        writeln!(f, "status:         {} ({} nodes)", self.status, self.nodes)?;
        write!(f, "elapsed:        {:.3} ms", self.elapsed_ms)
    }
}
