use std::fmt;

use recur_domain::DomainError;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Entities that can be referenced by id and reported missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Template,
    Account,
    Category,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Template => "Recurring template",
            EntityKind::Account => "Account",
            EntityKind::Category => "Category",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: Uuid },
    #[error("Recurring template {0} is inactive")]
    InactiveTemplate(Uuid),
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

/// Coarse classification of [`CoreError`] used in sweep reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    InactiveTemplate,
    Persistence,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not-found",
            ErrorKind::InactiveTemplate => "inactive-template",
            ErrorKind::Persistence => "persistence",
        };
        f.write_str(label)
    }
}

impl CoreError {
    pub fn not_found(entity: EntityKind, id: Uuid) -> Self {
        CoreError::NotFound { entity, id }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::InactiveTemplate(_) => ErrorKind::InactiveTemplate,
            CoreError::Persistence(_) => ErrorKind::Persistence,
        }
    }
}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        CoreError::Validation(err.to_string())
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Persistence(err.to_string())
    }
}
