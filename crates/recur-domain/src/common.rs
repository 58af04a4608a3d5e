//! Shared traits and enums for ledger primitives.

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifies the user that owns templates, accounts and categories.
pub type OwnerId = Uuid;

/// Entities scoped to a single owner.
pub trait Owned {
    fn owner_id(&self) -> OwnerId;

    fn belongs_to(&self, owner: OwnerId) -> bool {
        self.owner_id() == owner
    }
}

/// Converts an entity into a user-facing display label.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// Direction of a transaction's effect on an account balance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlowType {
    Income,
    Expense,
}

impl FlowType {
    /// Returns the balance delta for `amount`: positive for income, negative for expense.
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            FlowType::Income => amount,
            FlowType::Expense => -amount,
        }
    }
}

impl fmt::Display for FlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FlowType::Income => "INCOME",
            FlowType::Expense => "EXPENSE",
        };
        f.write_str(label)
    }
}

impl FromStr for FlowType {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "INCOME" => Ok(FlowType::Income),
            "EXPENSE" => Ok(FlowType::Expense),
            other => Err(DomainError::InvalidFlowType(other.to_string())),
        }
    }
}
