use itertools::Itertools;

use crate::constants::EXHAUSTIVE_MAX_LINES;
use crate::error::{GridError, Result};
use crate::optimize::model::{Budget, LineModel, SearchOutcome};

/// Try every subset, smallest first. Within one size the lexicographically
/// first selection in `order` wins.
pub(crate) fn enumerate(
    model: &LineModel,
    order: &[usize],
    budget: &Budget,
) -> Result<SearchOutcome> {
    let n = order.len();
    if n > EXHAUSTIVE_MAX_LINES {
        return Err(GridError::invalid(format!(
            "exhaustive search supports at most {} interior lines, instance has {}",
            EXHAUSTIVE_MAX_LINES, n
        )));
    }

    let mut nodes = 0u64;
    for size in 0..=n {
        let mut best: Option<Vec<bool>> = None;
        for positions in (0..n).combinations(size) {
            if budget.exhausted(nodes) {
                return match best {
                    Some(selected) => Ok(SearchOutcome {
                        selected,
                        proven: false,
                        nodes,
                        pruned: 0,
                    }),
                    None => Err(budget.timeout(nodes)),
                };
            }
            nodes += 1;

            let mut selected = vec![false; model.line_count()];
            for &p in &positions {
                selected[order[p]] = true;
            }
            if !model.is_feasible(&selected) {
                continue;
            }
            if best
                .as_ref()
                .is_none_or(|current| lex_less(&selected, current, order))
            {
                best = Some(selected);
            }
        }

        if let Some(selected) = best {
            log::debug!("exhaustive: optimum keeps {} lines after {} subsets", size, nodes);
            return Ok(SearchOutcome {
                selected,
                proven: true,
                nodes,
                pruned: 0,
            });
        }
    }

    Err(GridError::infeasible(
        "no line subset satisfies both grid invariants",
    ))
}

/// Compare selections in decision order, dropped (`false`) first
fn lex_less(a: &[bool], b: &[bool], order: &[usize]) -> bool {
    order
        .iter()
        .map(|&line| a[line])
        .lt(order.iter().map(|&line| b[line]))
}
