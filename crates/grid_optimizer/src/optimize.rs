pub(crate) mod exhaustive;
pub(crate) mod milp;
pub(crate) mod model;
pub(crate) mod search;

use serde::Serialize;
use std::time::{Duration, Instant};
use strum_macros::Display;

use crate::config::{OptimizerConfig, SearchStrategy};
use crate::error::{GridError, Result};
use crate::geometry::{CoarseGrid, Coord, Footprint, Selection};
use crate::instance::Instance;
use model::{Budget, LineModel, SearchOutcome};
use search::BranchAndBound;

/// Whether the returned selection is a proven optimum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SearchStatus {
    Optimal,
    /// Budget ran out after a valid selection was found
    Feasible,
}

#[derive(Debug, Clone, Default)]
pub struct SearchStats {
    /// Search nodes, subsets or solver calls, depending on the strategy
    pub nodes: u64,
    pub pruned: u64,
    pub clauses: usize,
    pub elapsed: Duration,
}

/// Result of one optimizer call
#[derive(Debug, Clone)]
pub struct Discretization {
    pub selection: Selection,
    pub status: SearchStatus,
    pub stats: SearchStats,
}

impl Discretization {
    pub fn grid<'a>(&'a self, footprints: &'a [Footprint]) -> CoarseGrid<'a> {
        CoarseGrid::new(&self.selection, footprints)
    }
}

/// Choose the smallest subset of candidate lines (borders always kept) such
/// that no coarse cell fully contains two footprints and at least one cell
/// contains none.
///
/// Among optima of equal size the configured [`crate::TieBreak`] decides.
pub fn optimize(instance: &Instance, config: &OptimizerConfig) -> Result<Discretization> {
    config.validate()?;
    let started = Instant::now();
    log::info!(
        "Optimizing {} interior lines for {} footprints ({})",
        instance.interior_line_count(),
        instance.footprints().len(),
        config.strategy
    );

    let model = LineModel::build(instance)?;
    log::debug!(
        "{} separation clauses over {} lines",
        model.clauses().len(),
        model.line_count()
    );

    if !model.has_empty_cell(&vec![true; model.line_count()]) {
        return Err(GridError::infeasible(
            "every cell of the finest grid contains a footprint",
        ));
    }

    let outcome = if model.line_count() == 0 {
        SearchOutcome {
            selected: Vec::new(),
            proven: true,
            nodes: 0,
            pruned: 0,
        }
    } else {
        run_strategy(&model, config, started)?
    };

    let status = if outcome.proven {
        SearchStatus::Optimal
    } else {
        log::warn!("Search budget exhausted; returning best selection found (not proven optimal)");
        SearchStatus::Feasible
    };

    let selection = model.selection(&outcome.selected);
    debug_assert!(CoarseGrid::new(&selection, instance.footprints()).is_valid());

    let stats = SearchStats {
        nodes: outcome.nodes,
        pruned: outcome.pruned,
        clauses: model.clauses().len(),
        elapsed: started.elapsed(),
    };
    log::info!(
        "Kept {} of {} interior lines ({}, {} nodes, {:.3} ms)",
        selection.interior_count(),
        instance.interior_line_count(),
        status,
        stats.nodes,
        stats.elapsed.as_secs_f64() * 1000.0
    );

    Ok(Discretization {
        selection,
        status,
        stats,
    })
}

/// Validate raw upstream data and optimize it
pub fn discretize(
    maxx: Coord,
    maxy: Coord,
    h_lines: &[Coord],
    v_lines: &[Coord],
    footprints: &[Footprint],
    config: &OptimizerConfig,
) -> Result<Discretization> {
    let instance = Instance::new(maxx, maxy, h_lines, v_lines, footprints)?;
    optimize(&instance, config)
}

fn run_strategy(
    model: &LineModel,
    config: &OptimizerConfig,
    started: Instant,
) -> Result<SearchOutcome> {
    let order = model.decision_order(config.tie_break);
    let budget = Budget::from_config(config, started);
    match config.strategy {
        SearchStrategy::BranchAndBound => BranchAndBound::new(model, order, budget).run(),
        SearchStrategy::Exhaustive => exhaustive::enumerate(model, &order, &budget),
        SearchStrategy::Milp => {
            if config.time_budget_ms.is_some() || config.node_limit.is_some() {
                log::warn!("milp strategy does not honor the search budget");
            }
            milp::solve(model, &order)
        }
    }
}
