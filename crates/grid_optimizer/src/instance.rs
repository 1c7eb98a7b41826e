use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{GridError, Result};
use crate::geometry::{Coord, Footprint, Selection};

/// Instance file layout (TOML)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstanceFile {
    pub maxx: Coord,
    pub maxy: Coord,
    pub h_lines: Vec<Coord>,
    pub v_lines: Vec<Coord>,
    #[serde(default)]
    pub footprints: Vec<Footprint>,
}

/// Validated discretization input: surface bounds, candidate lines, footprints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    maxx: Coord,
    maxy: Coord,
    h_lines: Vec<Coord>,
    v_lines: Vec<Coord>,
    footprints: Vec<Footprint>,
}

impl Instance {
    /// Build an instance from upstream data.
    ///
    /// Candidate lines may arrive in any order and are stored ascending
    /// without duplicates. Both sets must contain their borders, and every
    /// footprint corner must lie on a candidate coordinate.
    pub fn new(
        maxx: Coord,
        maxy: Coord,
        h_lines: &[Coord],
        v_lines: &[Coord],
        footprints: &[Footprint],
    ) -> Result<Self> {
        if maxx == 0 || maxy == 0 {
            return Err(GridError::invalid(format!(
                "surface bounds must be positive, got maxx={}, maxy={}",
                maxx, maxy
            )));
        }

        let h_lines = normalize_lines("H", h_lines, maxy)?;
        let v_lines = normalize_lines("V", v_lines, maxx)?;

        for (i, fp) in footprints.iter().enumerate() {
            if fp.x1 >= fp.x2 || fp.y1 >= fp.y2 {
                return Err(GridError::invalid(format!(
                    "footprint {} {} is degenerate",
                    i, fp
                )));
            }
            if fp.x2 > maxx || fp.y2 > maxy {
                return Err(GridError::invalid(format!(
                    "footprint {} {} exceeds the surface [0, {}] x [0, {}]",
                    i, fp, maxx, maxy
                )));
            }
            let aligned = v_lines.binary_search(&fp.x1).is_ok()
                && v_lines.binary_search(&fp.x2).is_ok()
                && h_lines.binary_search(&fp.y1).is_ok()
                && h_lines.binary_search(&fp.y2).is_ok();
            if !aligned {
                return Err(GridError::invalid(format!(
                    "footprint {} {} is not aligned to candidate lines",
                    i, fp
                )));
            }
        }

        Ok(Self {
            maxx,
            maxy,
            h_lines,
            v_lines,
            footprints: footprints.to_vec(),
        })
    }

    pub fn from_file(file: &InstanceFile) -> Result<Self> {
        Self::new(
            file.maxx,
            file.maxy,
            &file.h_lines,
            &file.v_lines,
            &file.footprints,
        )
    }

    /// Read and validate a TOML instance file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: InstanceFile = toml::from_str(&content).map_err(|e| {
            GridError::invalid(format!(
                "failed to parse instance file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_file(&file)
    }

    pub fn maxx(&self) -> Coord {
        self.maxx
    }

    pub fn maxy(&self) -> Coord {
        self.maxy
    }

    /// Horizontal candidates (y values), ascending, borders included
    pub fn h_lines(&self) -> &[Coord] {
        &self.h_lines
    }

    /// Vertical candidates (x values), ascending, borders included
    pub fn v_lines(&self) -> &[Coord] {
        &self.v_lines
    }

    pub fn footprints(&self) -> &[Footprint] {
        &self.footprints
    }

    pub fn interior_line_count(&self) -> usize {
        self.h_lines.len() - 2 + self.v_lines.len() - 2
    }

    pub fn fine_cell_count(&self) -> usize {
        (self.h_lines.len() - 1) * (self.v_lines.len() - 1)
    }

    /// Selection keeping every candidate line
    pub fn full_selection(&self) -> Selection {
        Selection::new(self.h_lines.clone(), self.v_lines.clone())
    }

    /// Finest candidate cell around a reference point, as a footprint.
    /// Points on a line fall into the upper/right cell.
    pub fn footprint_around(&self, x: f64, y: f64) -> Result<Footprint> {
        let outside = || {
            GridError::invalid(format!(
                "point ({}, {}) lies outside the surface [0, {}] x [0, {}]",
                x, y, self.maxx, self.maxy
            ))
        };
        let col = fine_slot(&self.v_lines, x).ok_or_else(outside)?;
        let row = fine_slot(&self.h_lines, y).ok_or_else(outside)?;
        Ok(Footprint::new(
            self.v_lines[col],
            self.h_lines[row],
            self.v_lines[col + 1],
            self.h_lines[row + 1],
        ))
    }
}

fn normalize_lines(axis: &str, lines: &[Coord], max: Coord) -> Result<Vec<Coord>> {
    let set: BTreeSet<Coord> = lines.iter().copied().collect();
    if let Some(&last) = set.last()
        && last > max
    {
        return Err(GridError::invalid(format!(
            "{} line {} exceeds the surface bound {}",
            axis, last, max
        )));
    }
    if !set.contains(&0) || !set.contains(&max) {
        return Err(GridError::invalid(format!(
            "{} lines must contain the borders 0 and {}",
            axis, max
        )));
    }
    Ok(set.into_iter().collect())
}

fn fine_slot(lines: &[Coord], value: f64) -> Option<usize> {
    let last = *lines.last()?;
    if !(0.0..=f64::from(last)).contains(&value) {
        return None;
    }
    let idx = lines.partition_point(|&line| f64::from(line) <= value);
    Some(idx.saturating_sub(1).min(lines.len() - 2))
}
