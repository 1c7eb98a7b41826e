pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod instance;
pub mod optimize;
pub mod report;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{Config, OptimizerConfig, SearchStrategy, TieBreak};
pub use constants::DEFAULT_CONFIG_PATH;
pub use error::{GridError, Result};
pub use geometry::{Cell, CoarseGrid, Coord, Footprint, Selection, Violation};
pub use instance::{Instance, InstanceFile};
pub use optimize::{Discretization, SearchStats, SearchStatus, discretize, optimize};
pub use report::DiscretizationReport;
