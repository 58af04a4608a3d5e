use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{common::*, error::DomainError};

/// An owner's account holding a running balance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub name: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(owner_id: OwnerId, name: impl Into<String>, opening_balance: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            balance: opening_balance,
            created_at: now,
            updated_at: now,
        }
    }

    /// Adds (income) or subtracts (expense) `amount` and returns the new balance.
    pub fn apply(
        &mut self,
        flow: FlowType,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> Result<Decimal, DomainError> {
        let balance = match flow {
            FlowType::Income => self.balance.checked_add(amount),
            FlowType::Expense => self.balance.checked_sub(amount),
        }
        .ok_or(DomainError::BalanceOverflow(self.id))?;
        self.balance = balance;
        self.updated_at = at;
        Ok(balance)
    }
}

impl Owned for Account {
    fn owner_id(&self) -> OwnerId {
        self.owner_id
    }
}

impl Displayable for Account {
    fn display_label(&self) -> String {
        format!("{} ({})", self.name, self.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn apply_adds_income_and_subtracts_expense() {
        let mut account = Account::new(Uuid::new_v4(), "Checking", dec!(100.00));
        assert_eq!(
            account.apply(FlowType::Income, dec!(25.10), Utc::now()).unwrap(),
            dec!(125.10)
        );
        assert_eq!(
            account.apply(FlowType::Expense, dec!(200), Utc::now()).unwrap(),
            dec!(-74.90)
        );
    }

    #[test]
    fn overflow_leaves_balance_untouched() {
        let mut account = Account::new(Uuid::new_v4(), "Vault", Decimal::MAX);
        let err = account
            .apply(FlowType::Income, dec!(1), Utc::now())
            .unwrap_err();
        assert_eq!(err, DomainError::BalanceOverflow(account.id));
        assert_eq!(account.balance, Decimal::MAX);
    }
}
