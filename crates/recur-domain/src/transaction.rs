//! Ledger transactions materialized from recurring templates.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{common::*, template::RecurringTemplate};

/// A realized income or expense. Immutable once persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerTransaction {
    pub id: Uuid,
    pub owner_id: OwnerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<Uuid>,
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub amount: Decimal,
    pub flow: FlowType,
    pub executed_on: NaiveDate,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LedgerTransaction {
    /// Copies the template's current amount, flow, references and notes into a new
    /// transaction dated `executed_on`.
    pub fn from_template(
        template: &RecurringTemplate,
        executed_on: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: template.owner_id,
            template_id: Some(template.id),
            account_id: template.account_id,
            category_id: template.category_id,
            amount: template.amount,
            flow: template.flow,
            executed_on,
            description: template.description.clone(),
            notes: template.notes.clone(),
            created_at,
        }
    }

    /// Balance delta this transaction applies to its account.
    pub fn signed_amount(&self) -> Decimal {
        self.flow.signed(self.amount)
    }
}

impl Owned for LedgerTransaction {
    fn owner_id(&self) -> OwnerId {
        self.owner_id
    }
}

impl Displayable for LedgerTransaction {
    fn display_label(&self) -> String {
        format!(
            "{} {} {} [{}]",
            self.executed_on, self.flow, self.amount, self.description
        )
    }
}
