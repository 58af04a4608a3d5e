use std::fmt;

use chrono::NaiveDate;
use uuid::Uuid;

/// Errors raised by pure domain computations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Text that does not name one of the supported recurrence periods.
    InvalidPeriod(String),
    /// Text that does not name a flow type.
    InvalidFlowType(String),
    /// Calendar arithmetic left the representable date range.
    DateOutOfRange(NaiveDate),
    /// Applying a delta would overflow the account balance.
    BalanceOverflow(Uuid),
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::InvalidPeriod(raw) => write!(f, "unknown recurrence period `{raw}`"),
            DomainError::InvalidFlowType(raw) => write!(f, "unknown flow type `{raw}`"),
            DomainError::DateOutOfRange(date) => {
                write!(f, "next occurrence after {date} is out of calendar range")
            }
            DomainError::BalanceOverflow(account) => {
                write!(f, "balance of account {account} would overflow")
            }
        }
    }
}

impl std::error::Error for DomainError {}
