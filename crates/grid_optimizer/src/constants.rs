/// Default configuration file used by the CLI
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Exhaustive enumeration limit (interior lines over both axes)
pub const EXHAUSTIVE_MAX_LINES: usize = 24;

/// MILP emptiness encoding limit (footprint-free candidate rectangles)
pub const MILP_MAX_RECTANGLES: usize = 20_000;

/// Binary variables above this value are read as selected
pub const SOLUTION_THRESHOLD: f64 = 0.5;
