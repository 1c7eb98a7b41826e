use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, microlp,
    variable,
};

use crate::constants::{MILP_MAX_RECTANGLES, SOLUTION_THRESHOLD};
use crate::error::{GridError, Result};
use crate::optimize::model::{IndexSpan, LineModel, SearchOutcome};

/// Boolean program over line variables.
///
/// Variables:
/// - s_l ∈ {0,1}: interior line l is kept
/// - e_R ∈ {0,1}: footprint-free candidate rectangle R is a cell of the grid
///
/// min Σ s_l subject to
/// - Σ_{l∈C} s_l ≥ 1 for every separation clause C
/// - e_R ≤ s_l for every interior line l bounding R
/// - Σ_{l inside R} s_l + m_R e_R ≤ m_R (no kept line cuts R)
/// - Σ_R e_R ≥ 1
///
/// The minimum count is solved first, then lines are fixed one at a time in
/// `order`, dropping each one whenever the count can still be met.
pub(crate) fn solve(model: &LineModel, order: &[usize]) -> Result<SearchOutcome> {
    let rectangles = empty_rectangles(model)?;
    log::debug!(
        "milp: {} line variables, {} clauses, {} empty rectangles",
        model.line_count(),
        model.clauses().len(),
        rectangles.len()
    );
    if rectangles.is_empty() {
        return Err(GridError::infeasible(
            "every candidate rectangle contains a footprint",
        ));
    }

    let n = model.line_count();
    let mut fixed: Vec<Option<bool>> = vec![None; n];
    let mut solves = 1u64;
    let mut current = solve_fixed(model, &rectangles, &fixed, None)?.ok_or_else(|| {
        GridError::infeasible("no line subset satisfies both grid invariants")
    })?;
    let target = current.iter().filter(|&&s| s).count();
    log::debug!("milp: minimum keeps {} interior lines", target);

    for &line in order {
        if !current[line] {
            fixed[line] = Some(false);
            continue;
        }
        fixed[line] = Some(false);
        solves += 1;
        match solve_fixed(model, &rectangles, &fixed, Some(target))? {
            Some(selected) => current = selected,
            None => fixed[line] = Some(true),
        }
    }

    if !model.is_feasible(&current) {
        return Err(GridError::Solver(
            "solver returned a selection that violates the grid invariants".to_string(),
        ));
    }

    Ok(SearchOutcome {
        selected: current,
        proven: true,
        nodes: solves,
        pruned: 0,
    })
}

fn solve_fixed(
    model: &LineModel,
    rectangles: &[IndexSpan],
    fixed: &[Option<bool>],
    target: Option<usize>,
) -> Result<Option<Vec<bool>>> {
    let mut vars = ProblemVariables::new();
    let s_vars: Vec<Variable> = (0..model.line_count())
        .map(|_| vars.add(variable().binary()))
        .collect();
    let e_vars: Vec<Variable> = (0..rectangles.len())
        .map(|_| vars.add(variable().binary()))
        .collect();

    let objective: Expression = s_vars.iter().copied().sum();
    let mut problem = vars.minimise(objective.clone()).using(microlp);

    // Separation: Σ_{l∈C} s_l ≥ 1
    for clause in model.clauses() {
        let sum: Expression = clause.iter().map(|&line| s_vars[line]).sum();
        problem = problem.with(sum.geq(1.0));
    }

    // Emptiness: some footprint-free rectangle is exactly a cell
    for (rect, &e_r) in rectangles.iter().zip(&e_vars) {
        for line in boundary_lines(model, rect) {
            problem = problem.with(Expression::from(e_r).leq(s_vars[line]));
        }
        let inside: Vec<usize> = model.inner_lines(rect).collect();
        if !inside.is_empty() {
            let m_r = inside.len() as f64;
            let cut: Expression = inside.iter().map(|&line| s_vars[line]).sum();
            problem = problem.with((cut + m_r * e_r).leq(m_r));
        }
    }
    let any_empty: Expression = e_vars.iter().copied().sum();
    problem = problem.with(any_empty.geq(1.0));

    for (line, value) in fixed.iter().enumerate() {
        if let Some(keep) = value {
            let bound = if *keep { 1.0 } else { 0.0 };
            problem = problem.with(Expression::from(s_vars[line]).eq(bound));
        }
    }
    if let Some(target) = target {
        problem = problem.with(objective.eq(target as f64));
    }

    match problem.solve() {
        Ok(solution) => Ok(Some(
            s_vars
                .iter()
                .map(|&s| solution.value(s) > SOLUTION_THRESHOLD)
                .collect(),
        )),
        Err(ResolutionError::Infeasible) => Ok(None),
        Err(e) => Err(GridError::Solver(format!("failed to solve: {}", e))),
    }
}

/// Candidate rectangles (pairs of lines on each axis) that fully contain no
/// footprint
fn empty_rectangles(model: &LineModel) -> Result<Vec<IndexSpan>> {
    let mut rectangles = Vec::new();
    for xa in 0..model.v_full_len() {
        for xb in xa + 1..model.v_full_len() {
            for ya in 0..model.h_full_len() {
                for yb in ya + 1..model.h_full_len() {
                    let rect = IndexSpan { xa, xb, ya, yb };
                    let occupied = model.spans().iter().any(|span| {
                        span.xa >= xa && span.xb <= xb && span.ya >= ya && span.yb <= yb
                    });
                    if occupied {
                        continue;
                    }
                    rectangles.push(rect);
                    if rectangles.len() > MILP_MAX_RECTANGLES {
                        return Err(GridError::invalid(format!(
                            "instance is too large for the milp strategy (more than {} candidate cells)",
                            MILP_MAX_RECTANGLES
                        )));
                    }
                }
            }
        }
    }
    Ok(rectangles)
}

/// Interior lines on the rectangle boundary (borders are always kept)
fn boundary_lines(model: &LineModel, rect: &IndexSpan) -> Vec<usize> {
    let mut lines = Vec::with_capacity(4);
    for k in [rect.ya, rect.yb] {
        if k > 0 && k < model.h_full_len() - 1 {
            lines.push(model.h_id(k));
        }
    }
    for k in [rect.xa, rect.xb] {
        if k > 0 && k < model.v_full_len() - 1 {
            lines.push(model.v_id(k));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TieBreak;
    use crate::geometry::Footprint;
    use crate::instance::Instance;

    fn solve_instance(inst: &Instance, tie_break: TieBreak) -> Result<SearchOutcome> {
        let model = LineModel::build(inst)?;
        solve(&model, &model.decision_order(tie_break))
    }

    #[test]
    fn test_boundary_lines_skip_borders() {
        let inst = Instance::new(4, 4, &[0, 2, 4], &[0, 2, 4], &[]).unwrap();
        let model = LineModel::build(&inst).unwrap();
        let rect = IndexSpan {
            xa: 0,
            xb: 1,
            ya: 1,
            yb: 2,
        };
        assert_eq!(boundary_lines(&model, &rect), vec![0, 1]);
    }

    #[test]
    fn test_empty_rectangles_exclude_occupied() {
        let inst =
            Instance::new(4, 4, &[0, 2, 4], &[0, 2, 4], &[Footprint::new(0, 0, 2, 2)]).unwrap();
        let model = LineModel::build(&inst).unwrap();
        let rects = empty_rectangles(&model).unwrap();
        // 9 rectangles in a 3x3 line grid, 4 of them contain the lower-left cell
        assert_eq!(rects.len(), 5);
    }

    #[test]
    fn test_milp_single_footprint() {
        let inst =
            Instance::new(4, 4, &[0, 2, 4], &[0, 2, 4], &[Footprint::new(0, 0, 2, 2)]).unwrap();
        let outcome = solve_instance(&inst, TieBreak::DropLowestFirst).unwrap();
        assert_eq!(outcome.selected, vec![false, true]);
        let outcome = solve_instance(&inst, TieBreak::DropHighestFirst).unwrap();
        assert_eq!(outcome.selected, vec![true, false]);
    }

    #[test]
    fn test_milp_diagonal_pair() {
        let fps = [Footprint::new(0, 0, 2, 2), Footprint::new(2, 2, 4, 4)];
        let inst = Instance::new(4, 4, &[0, 2, 4], &[0, 2, 4], &fps).unwrap();
        let outcome = solve_instance(&inst, TieBreak::DropLowestFirst).unwrap();
        assert_eq!(outcome.selected, vec![true, true]);
        assert!(outcome.proven);
    }
}
