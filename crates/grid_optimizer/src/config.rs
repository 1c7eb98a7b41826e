use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::{GridError, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

/// Search algorithm used to pick the line subset
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Deserialize,
    Serialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SearchStrategy {
    /// Greedy seed followed by depth-first branch-and-bound
    #[default]
    BranchAndBound,
    /// Enumerate subsets by size; small instances only
    Exhaustive,
    /// Boolean program solved through good_lp
    Milp,
}

/// Which equal-cost optimum is returned
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Deserialize,
    Serialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TieBreak {
    /// Interior H lines ascending, then interior V lines ascending;
    /// the lowest-indexed line is dropped first
    #[default]
    DropLowestFirst,
    /// Same order reversed
    DropHighestFirst,
}

/// Parameters injected into one optimizer call
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub strategy: SearchStrategy,
    pub tie_break: TieBreak,
    /// Wall-clock budget for the search (None = unbounded)
    pub time_budget_ms: Option<u64>,
    /// Maximum number of search nodes (None = unbounded)
    pub node_limit: Option<u64>,
}

impl OptimizerConfig {
    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Whole milliseconds, rounded up to at least 1
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        let millis = budget.as_millis() + u128::from(budget.subsec_nanos() % 1_000_000 != 0);
        self.time_budget_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX).max(1));
        self
    }

    pub fn with_node_limit(mut self, limit: u64) -> Self {
        self.node_limit = Some(limit);
        self
    }

    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        if self.time_budget_ms == Some(0) {
            return Err(GridError::Config(
                "optimizer.time_budget_ms must be positive".to_string(),
            ));
        }
        if self.node_limit == Some(0) {
            return Err(GridError::Config(
                "optimizer.node_limit must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GridError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            GridError::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.optimizer.validate()
    }
}
