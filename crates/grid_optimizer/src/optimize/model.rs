use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use crate::config::{OptimizerConfig, TieBreak};
use crate::error::{GridError, Result};
use crate::geometry::{Coord, Selection};
use crate::instance::Instance;

/// Footprint bounds as indices into the full candidate line lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IndexSpan {
    pub xa: usize,
    pub xb: usize,
    pub ya: usize,
    pub yb: usize,
}

/// Index form of an instance.
///
/// Interior lines are numbered in one id space: horizontal interior lines
/// ascending (`0..nh`), then vertical interior lines ascending
/// (`nh..nh + nv`). A selection is a `&[bool]` indexed by line id.
#[derive(Debug, Clone)]
pub(crate) struct LineModel {
    h_coords: Vec<Coord>,
    v_coords: Vec<Coord>,
    nh: usize,
    nv: usize,
    spans: Vec<IndexSpan>,
    /// Each clause lists lines of which at least one must be selected,
    /// otherwise two footprints end up in the same cell
    clauses: Vec<Vec<usize>>,
}

impl LineModel {
    pub fn build(instance: &Instance) -> Result<Self> {
        let h_coords = instance.h_lines().to_vec();
        let v_coords = instance.v_lines().to_vec();
        let nh = h_coords.len() - 2;
        let nv = v_coords.len() - 2;

        let index_of = |lines: &[Coord], value: Coord| {
            lines.binary_search(&value).map_err(|_| {
                GridError::invalid(format!("coordinate {} is not a candidate line", value))
            })
        };

        let spans = instance
            .footprints()
            .iter()
            .map(|fp| {
                Ok(IndexSpan {
                    xa: index_of(&v_coords, fp.x1)?,
                    xb: index_of(&v_coords, fp.x2)?,
                    ya: index_of(&h_coords, fp.y1)?,
                    yb: index_of(&h_coords, fp.y2)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut model = Self {
            h_coords,
            v_coords,
            nh,
            nv,
            spans,
            clauses: Vec::new(),
        };
        model.clauses = model.separation_clauses(instance)?;
        Ok(model)
    }

    pub fn line_count(&self) -> usize {
        self.nh + self.nv
    }

    pub fn clauses(&self) -> &[Vec<usize>] {
        &self.clauses
    }

    pub fn h_full_len(&self) -> usize {
        self.nh + 2
    }

    pub fn v_full_len(&self) -> usize {
        self.nv + 2
    }

    pub fn spans(&self) -> &[IndexSpan] {
        &self.spans
    }

    /// Line id of the horizontal line at full index `k` (interior only)
    pub fn h_id(&self, k: usize) -> usize {
        k - 1
    }

    /// Line id of the vertical line at full index `k` (interior only)
    pub fn v_id(&self, k: usize) -> usize {
        self.nh + k - 1
    }

    /// Ids of interior lines strictly inside the horizontal span `(xa, xb)`
    /// and the vertical span `(ya, yb)`
    pub fn inner_lines(&self, span: &IndexSpan) -> impl Iterator<Item = usize> {
        let ys = span.ya..span.yb.saturating_sub(1).max(span.ya);
        let xs = (self.nh + span.xa)..(self.nh + span.xb.saturating_sub(1)).max(self.nh + span.xa);
        ys.chain(xs)
    }

    /// Decision order for the given tie-break policy
    pub fn decision_order(&self, tie_break: TieBreak) -> Vec<usize> {
        match tie_break {
            TieBreak::DropLowestFirst => (0..self.line_count()).collect(),
            TieBreak::DropHighestFirst => (0..self.line_count()).rev().collect(),
        }
    }

    pub fn clauses_hit(&self, selected: &[bool]) -> bool {
        self.clauses
            .iter()
            .all(|clause| clause.iter().any(|&line| selected[line]))
    }

    /// Whether some coarse cell fully contains no footprint
    pub fn has_empty_cell(&self, selected: &[bool]) -> bool {
        let (h_rank, rows) = ranks(&selected[..self.nh], self.h_full_len());
        let (v_rank, cols) = ranks(&selected[self.nh..], self.v_full_len());
        let cells = rows * cols;
        if cells > self.spans.len() {
            return true;
        }

        let mut occupied = vec![false; cells];
        let mut count = 0;
        for span in &self.spans {
            let straddles =
                h_rank[span.yb - 1] != h_rank[span.ya] || v_rank[span.xb - 1] != v_rank[span.xa];
            if straddles {
                continue;
            }
            let cell = h_rank[span.ya] * cols + v_rank[span.xa];
            if !occupied[cell] {
                occupied[cell] = true;
                count += 1;
            }
        }
        count < cells
    }

    pub fn is_feasible(&self, selected: &[bool]) -> bool {
        self.clauses_hit(selected) && self.has_empty_cell(selected)
    }

    pub fn selection(&self, selected: &[bool]) -> Selection {
        let pick = |coords: &[Coord], offset: usize| {
            let last = coords.len() - 1;
            coords
                .iter()
                .enumerate()
                .filter(|&(k, _)| k == 0 || k == last || selected[offset + k - 1])
                .map(|(_, &c)| c)
                .collect::<Vec<_>>()
        };
        Selection::new(pick(&self.h_coords, 0), pick(&self.v_coords, self.nh))
    }

    /// One clause per footprint pair, deduplicated, supersets removed,
    /// shortest first
    fn separation_clauses(&self, instance: &Instance) -> Result<Vec<Vec<usize>>> {
        let mut unique: BTreeSet<Vec<usize>> = BTreeSet::new();
        for (i, a) in self.spans.iter().enumerate() {
            for (j, b) in self.spans.iter().enumerate().skip(i + 1) {
                let union = IndexSpan {
                    xa: a.xa.min(b.xa),
                    xb: a.xb.max(b.xb),
                    ya: a.ya.min(b.ya),
                    yb: a.yb.max(b.yb),
                };
                let clause: Vec<usize> = self.inner_lines(&union).collect();
                if clause.is_empty() {
                    let fps = instance.footprints();
                    return Err(GridError::infeasible(format!(
                        "footprints {} and {} both lie in the finest cell {}; no candidate line separates them",
                        i,
                        j,
                        fps[i].union(&fps[j])
                    )));
                }
                unique.insert(clause);
            }
        }

        let mut clauses: Vec<Vec<usize>> = unique.into_iter().collect();
        clauses.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

        let mut minimal: Vec<Vec<usize>> = Vec::with_capacity(clauses.len());
        for clause in clauses {
            let implied = minimal
                .iter()
                .any(|kept| kept.iter().all(|line| clause.binary_search(line).is_ok()));
            if !implied {
                minimal.push(clause);
            }
        }
        Ok(minimal)
    }
}

/// `rank[k]` = number of selected interior lines with full index in `1..=k`.
/// Also returns the number of slots (selected interior lines + 1).
fn ranks(selected: &[bool], full_len: usize) -> (Vec<usize>, usize) {
    let mut rank = vec![0; full_len];
    for k in 1..full_len {
        let is_selected = k < full_len - 1 && selected[k - 1];
        rank[k] = rank[k - 1] + usize::from(is_selected);
    }
    let slots = rank[full_len - 1] + 1;
    (rank, slots)
}

/// Cooperative search budget, checked at node boundaries
#[derive(Debug, Clone, Copy)]
pub(crate) struct Budget {
    started: Instant,
    deadline: Option<Instant>,
    node_limit: Option<u64>,
}

impl Budget {
    pub fn from_config(config: &OptimizerConfig, started: Instant) -> Self {
        Self {
            started,
            deadline: config.time_budget().map(|budget| started + budget),
            node_limit: config.node_limit,
        }
    }

    pub fn exhausted(&self, nodes: u64) -> bool {
        self.node_limit.is_some_and(|limit| nodes >= limit)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn timeout(&self, nodes: u64) -> GridError {
        GridError::Timeout {
            elapsed_ms: self.elapsed().as_millis(),
            nodes,
        }
    }
}

/// Raw result of one strategy
#[derive(Debug, Clone)]
pub(crate) struct SearchOutcome {
    pub selected: Vec<bool>,
    /// False when the budget ran out before optimality was proven
    pub proven: bool,
    pub nodes: u64,
    pub pruned: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Footprint;

    fn model(h: &[Coord], v: &[Coord], fps: &[Footprint]) -> Result<LineModel> {
        let maxy = *h.iter().max().unwrap();
        let maxx = *v.iter().max().unwrap();
        LineModel::build(&Instance::new(maxx, maxy, h, v, fps)?)
    }

    #[test]
    fn test_line_ids_and_inner_lines() {
        let m = model(&[0, 1, 2, 3], &[0, 1, 2], &[]).unwrap();
        assert_eq!(m.line_count(), 3);
        assert_eq!(m.h_id(1), 0);
        assert_eq!(m.h_id(2), 1);
        assert_eq!(m.v_id(1), 2);

        let span = IndexSpan {
            xa: 0,
            xb: 2,
            ya: 0,
            yb: 3,
        };
        assert_eq!(m.inner_lines(&span).collect::<Vec<_>>(), vec![0, 1, 2]);

        let span = IndexSpan {
            xa: 1,
            xb: 2,
            ya: 2,
            yb: 3,
        };
        assert_eq!(m.inner_lines(&span).count(), 0);
    }

    #[test]
    fn test_separation_clause_for_diagonal_pair() {
        let fps = [Footprint::new(0, 0, 2, 2), Footprint::new(2, 2, 4, 4)];
        let m = model(&[0, 2, 4], &[0, 2, 4], &fps).unwrap();
        assert_eq!(m.clauses(), &[vec![0, 1]]);
        assert!(m.clauses_hit(&[true, false]));
        assert!(!m.clauses_hit(&[false, false]));
    }

    #[test]
    fn test_superset_clauses_are_dropped() {
        let fps = [
            Footprint::new(0, 0, 1, 1),
            Footprint::new(1, 0, 2, 1),
            Footprint::new(2, 2, 3, 3),
        ];
        let m = model(&[0, 1, 2, 3], &[0, 1, 2, 3], &fps).unwrap();
        // {v=1} alone separates the first pair and makes the wider clauses redundant
        assert_eq!(m.clauses()[0], vec![m.v_id(1)]);
        assert!(
            m.clauses()
                .iter()
                .skip(1)
                .all(|c| !c.contains(&m.v_id(1)))
        );
    }

    #[test]
    fn test_inseparable_pair_is_infeasible() {
        let fps = [Footprint::new(0, 0, 2, 2), Footprint::new(0, 0, 2, 2)];
        let err = model(&[0, 2, 4], &[0, 2, 4], &fps).unwrap_err();
        assert!(err.is_infeasible());

        // nested footprints inside one finest cell report that cell
        let fps = [Footprint::new(2, 0, 4, 1), Footprint::new(2, 0, 4, 1), Footprint::new(0, 0, 2, 1)];
        let err = model(&[0, 1, 4], &[0, 2, 4], &fps).unwrap_err();
        assert!(err.to_string().contains("footprints 0 and 1"));
        assert!(err.to_string().contains("(2, 0, 4, 1)"));
    }

    #[test]
    fn test_has_empty_cell() {
        let fps = [Footprint::new(0, 0, 2, 2), Footprint::new(2, 2, 4, 4)];
        let m = model(&[0, 2, 4], &[0, 2, 4], &fps).unwrap();
        assert!(m.has_empty_cell(&[true, true]));
        assert!(!m.has_empty_cell(&[true, false]));
        assert!(!m.has_empty_cell(&[false, true]));
        // both footprints share the single cell, so no cell is empty
        assert!(!m.has_empty_cell(&[false, false]));
    }

    #[test]
    fn test_straddling_footprint_leaves_cells_empty() {
        let fps = [Footprint::new(0, 0, 4, 4)];
        let m = model(&[0, 2, 4], &[0, 2, 4], &fps).unwrap();
        assert!(!m.has_empty_cell(&[false, false]));
        assert!(m.has_empty_cell(&[false, true]));
    }

    #[test]
    fn test_selection_keeps_borders() {
        let m = model(&[0, 1, 2, 3], &[0, 5, 9], &[]).unwrap();
        let sel = m.selection(&[false, true, false]);
        assert_eq!(sel.h_lines, vec![0, 2, 3]);
        assert_eq!(sel.v_lines, vec![0, 9]);
    }

    #[test]
    fn test_node_budget() {
        let config = OptimizerConfig::default().with_node_limit(3);
        let budget = Budget::from_config(&config, Instant::now());
        assert!(!budget.exhausted(2));
        assert!(budget.exhausted(3));
        assert!(budget.timeout(3).is_timeout());
    }
}
