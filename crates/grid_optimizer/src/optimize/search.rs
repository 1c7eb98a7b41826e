use crate::error::{GridError, Result};
use crate::optimize::model::{Budget, LineModel, SearchOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Open,
    Keep,
    Drop,
}

#[derive(Debug, Clone)]
struct Incumbent {
    kept: usize,
    selected: Vec<bool>,
    /// Found by the depth-first pass (lexicographically first at its cost)
    from_search: bool,
}

/// Depth-first branch-and-bound over line drop decisions.
///
/// Lines are decided in `order`, "drop" before "keep", so complete
/// selections are met in lexicographic order. Only strictly cheaper
/// selections replace an incumbent found by the search itself, which makes
/// the first optimum met the returned one.
pub(crate) struct BranchAndBound<'m> {
    model: &'m LineModel,
    order: Vec<usize>,
    budget: Budget,
    clauses_of: Vec<Vec<usize>>,
    /// Kept lines per clause
    hits: Vec<usize>,
    /// Undecided lines per clause
    open: Vec<usize>,
    /// Clauses without a kept line
    unsatisfied: usize,
    decisions: Vec<Decision>,
    scratch: Vec<bool>,
    packed: Vec<bool>,
    incumbent: Option<Incumbent>,
    nodes: u64,
    pruned: u64,
    exhausted: bool,
}

impl<'m> BranchAndBound<'m> {
    pub fn new(model: &'m LineModel, order: Vec<usize>, budget: Budget) -> Self {
        let n = model.line_count();
        let mut clauses_of = vec![Vec::new(); n];
        for (c, clause) in model.clauses().iter().enumerate() {
            for &line in clause {
                clauses_of[line].push(c);
            }
        }
        let open = model.clauses().iter().map(Vec::len).collect();

        Self {
            model,
            order,
            budget,
            clauses_of,
            hits: vec![0; model.clauses().len()],
            open,
            unsatisfied: model.clauses().len(),
            decisions: vec![Decision::Open; n],
            scratch: vec![false; n],
            packed: vec![false; n],
            incumbent: None,
            nodes: 0,
            pruned: 0,
            exhausted: false,
        }
    }

    pub fn run(mut self) -> Result<SearchOutcome> {
        self.seed_incumbent();
        if !self.exhausted {
            self.descend(0, 0);
        }
        log::debug!(
            "branch-and-bound: {} nodes, {} pruned, exhausted={}",
            self.nodes,
            self.pruned,
            self.exhausted
        );

        match self.incumbent {
            Some(incumbent) => Ok(SearchOutcome {
                selected: incumbent.selected,
                proven: !self.exhausted,
                nodes: self.nodes,
                pruned: self.pruned,
            }),
            None if self.exhausted => Err(self.budget.timeout(self.nodes)),
            None => Err(GridError::infeasible(
                "no line subset satisfies both grid invariants",
            )),
        }
    }

    /// Start from every candidate line and drop lines in decision order
    /// while the grid stays valid.
    fn seed_incumbent(&mut self) {
        let mut selected = vec![true; self.model.line_count()];
        if !self.model.is_feasible(&selected) {
            return;
        }
        for &line in &self.order {
            if self.budget.exhausted(self.nodes) {
                self.exhausted = true;
                return;
            }
            self.nodes += 1;
            selected[line] = false;
            if !self.model.is_feasible(&selected) {
                selected[line] = true;
            }
        }
        let kept = selected.iter().filter(|&&s| s).count();
        log::debug!("greedy descent keeps {} interior lines", kept);
        self.incumbent = Some(Incumbent {
            kept,
            selected,
            from_search: false,
        });
    }

    fn descend(&mut self, depth: usize, kept: usize) {
        if self.exhausted {
            return;
        }
        if self.budget.exhausted(self.nodes) {
            self.exhausted = true;
            return;
        }
        self.nodes += 1;

        // Dropping every open line is the cheapest and lexicographically
        // first completion of this node.
        if self.unsatisfied == 0 && self.completion_has_empty_cell(false) {
            self.offer(kept);
            return;
        }
        if depth == self.order.len() {
            return;
        }

        // At least one more line must be kept below this node.
        let bound = kept + self.packing_bound().max(1);
        if let Some(incumbent) = &self.incumbent {
            let dominated = if incumbent.from_search {
                bound >= incumbent.kept
            } else {
                bound > incumbent.kept
            };
            if dominated {
                self.pruned += 1;
                return;
            }
        }

        let line = self.order[depth];

        if self.drop_line(line) && self.completion_has_empty_cell(true) {
            self.descend(depth + 1, kept);
        } else {
            self.pruned += 1;
        }
        self.undrop_line(line);

        self.keep_line(line);
        self.descend(depth + 1, kept + 1);
        self.unkeep_line(line);
    }

    fn offer(&mut self, kept: usize) {
        let better = match &self.incumbent {
            None => true,
            Some(incumbent) => {
                kept < incumbent.kept || (kept == incumbent.kept && !incumbent.from_search)
            }
        };
        if better {
            self.fill_scratch(false);
            self.incumbent = Some(Incumbent {
                kept,
                selected: self.scratch.clone(),
                from_search: true,
            });
        }
    }

    /// Emptiness of the completion that sets every open line to `keep_open`
    fn completion_has_empty_cell(&mut self, keep_open: bool) -> bool {
        self.fill_scratch(keep_open);
        self.model.has_empty_cell(&self.scratch)
    }

    fn fill_scratch(&mut self, keep_open: bool) {
        for (slot, decision) in self.scratch.iter_mut().zip(&self.decisions) {
            *slot = match decision {
                Decision::Keep => true,
                Decision::Drop => false,
                Decision::Open => keep_open,
            };
        }
    }

    /// Greedy packing of unsatisfied clauses with pairwise disjoint open
    /// lines; each packed clause needs its own kept line.
    fn packing_bound(&mut self) -> usize {
        if self.unsatisfied == 0 {
            return 0;
        }
        self.packed.fill(false);
        let mut bound = 0;
        for (c, clause) in self.model.clauses().iter().enumerate() {
            if self.hits[c] > 0 {
                continue;
            }
            let open_lines = clause
                .iter()
                .filter(|&&line| self.decisions[line] == Decision::Open);
            if open_lines.clone().any(|&line| self.packed[line]) {
                continue;
            }
            for &line in open_lines {
                self.packed[line] = true;
            }
            bound += 1;
        }
        bound
    }

    fn keep_line(&mut self, line: usize) {
        self.decisions[line] = Decision::Keep;
        for &c in &self.clauses_of[line] {
            self.open[c] -= 1;
            self.hits[c] += 1;
            if self.hits[c] == 1 {
                self.unsatisfied -= 1;
            }
        }
    }

    fn unkeep_line(&mut self, line: usize) {
        for &c in &self.clauses_of[line] {
            self.hits[c] -= 1;
            if self.hits[c] == 0 {
                self.unsatisfied += 1;
            }
            self.open[c] += 1;
        }
        self.decisions[line] = Decision::Open;
    }

    /// Returns false when a clause loses its last candidate line
    fn drop_line(&mut self, line: usize) -> bool {
        self.decisions[line] = Decision::Drop;
        let mut consistent = true;
        for &c in &self.clauses_of[line] {
            self.open[c] -= 1;
            if self.hits[c] == 0 && self.open[c] == 0 {
                consistent = false;
            }
        }
        consistent
    }

    fn undrop_line(&mut self, line: usize) {
        for &c in &self.clauses_of[line] {
            self.open[c] += 1;
        }
        self.decisions[line] = Decision::Open;
    }
}
