use std::io;

use thiserror::Error;

/// Failures reading or writing `config/config.json`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("config file is not valid JSON: {0}")]
    Serde(String),
}
