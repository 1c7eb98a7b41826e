use thiserror::Error;

pub type Result<T> = std::result::Result<T, GridError>;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("No valid coarsening exists: {reason}")]
    Infeasible { reason: String },

    #[error("Search budget exhausted after {nodes} nodes ({elapsed_ms} ms) without a feasible selection")]
    Timeout { elapsed_ms: u128, nodes: u64 },

    #[error("Optimization solver error: {0}")]
    Solver(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GridError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        GridError::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn infeasible(reason: impl Into<String>) -> Self {
        GridError::Infeasible {
            reason: reason.into(),
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, GridError::InvalidInput { .. })
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, GridError::Infeasible { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, GridError::Timeout { .. })
    }
}

impl From<toml::de::Error> for GridError {
    fn from(err: toml::de::Error) -> Self {
        GridError::Config(format!("TOML parse error: {}", err))
    }
}
