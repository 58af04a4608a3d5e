use recur_config::ConfigError;
use recur_core::{CoreError, ErrorKind};
use thiserror::Error;

/// Errors surfaced by the application facade.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Core error classification, if this came from the core services.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            AppError::Core(err) => Some(err.kind()),
            AppError::Config(_) => None,
        }
    }
}
