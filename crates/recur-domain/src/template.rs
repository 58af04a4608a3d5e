//! Recurring transaction templates.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    common::*,
    error::DomainError,
    recurrence::{next_due_date, RecurrencePeriod},
};

/// Stored definition of a repeating income or expense.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecurringTemplate {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub description: String,
    pub amount: Decimal,
    pub flow: FlowType,
    pub period: RecurrencePeriod,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub next_due_date: NaiveDate,
    pub active: bool,
    pub category_id: Uuid,
    pub account_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of moving a template past an executed occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The template stays active with a new due date.
    Advanced { next_due_date: NaiveDate },
    /// The next occurrence would fall after the end date; the template was switched off and
    /// kept its last due date.
    Deactivated { retained_due_date: NaiveDate },
}

impl Advance {
    pub fn is_deactivated(&self) -> bool {
        matches!(self, Advance::Deactivated { .. })
    }

    pub fn due_date(&self) -> NaiveDate {
        match self {
            Advance::Advanced { next_due_date } => *next_due_date,
            Advance::Deactivated { retained_due_date } => *retained_due_date,
        }
    }
}

impl RecurringTemplate {
    /// Creates an active template whose first due date is one period after `start_date`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        owner_id: OwnerId,
        description: impl Into<String>,
        amount: Decimal,
        flow: FlowType,
        period: RecurrencePeriod,
        start_date: NaiveDate,
        category_id: Uuid,
        account_id: Uuid,
    ) -> Result<Self, DomainError> {
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            owner_id,
            description: description.into(),
            amount,
            flow,
            period,
            start_date,
            end_date: None,
            next_due_date: next_due_date(start_date, period)?,
            active: true,
            category_id,
            account_id,
            notes: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Stamps both creation and update times with `at`.
    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self.updated_at = at;
        self
    }

    /// Whether a sweep running on `on` should pick this template up.
    pub fn is_due(&self, on: NaiveDate) -> bool {
        self.active && self.next_due_date <= on
    }

    /// Whether `date` lies after the configured end date.
    pub fn ends_before(&self, date: NaiveDate) -> bool {
        matches!(self.end_date, Some(end) if date > end)
    }

    /// Moves the template one period forward, or deactivates it when the next occurrence
    /// would fall after the end date. `next_due_date` is left untouched on deactivation.
    pub fn advance(&mut self, at: DateTime<Utc>) -> Result<Advance, DomainError> {
        let candidate = next_due_date(self.next_due_date, self.period)?;
        self.updated_at = at;
        if self.ends_before(candidate) {
            self.active = false;
            return Ok(Advance::Deactivated {
                retained_due_date: self.next_due_date,
            });
        }
        self.next_due_date = candidate;
        Ok(Advance::Advanced {
            next_due_date: candidate,
        })
    }

    /// Flips the active flag and returns the new value.
    pub fn toggle(&mut self, at: DateTime<Utc>) -> bool {
        self.active = !self.active;
        self.updated_at = at;
        self.active
    }
}

impl Owned for RecurringTemplate {
    fn owner_id(&self) -> OwnerId {
        self.owner_id
    }
}

impl Displayable for RecurringTemplate {
    fn display_label(&self) -> String {
        format!(
            "{} ({} {} {})",
            self.description,
            self.period.label(),
            self.flow,
            self.amount
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly_template(start: NaiveDate) -> RecurringTemplate {
        RecurringTemplate::new(
            Uuid::new_v4(),
            "Rent",
            dec!(950),
            FlowType::Expense,
            RecurrencePeriod::Monthly,
            start,
            Uuid::new_v4(),
            Uuid::new_v4(),
        )
        .unwrap()
    }

    #[test]
    fn new_template_is_due_one_period_after_start() {
        let template = monthly_template(date(2024, 1, 31));
        assert!(template.active);
        assert_eq!(template.next_due_date, date(2024, 2, 29));
        assert!(template.next_due_date >= template.start_date);
    }

    #[test]
    fn advance_moves_due_date_forward() {
        let mut template = monthly_template(date(2024, 1, 10));
        let outcome = template.advance(Utc::now()).unwrap();
        assert_eq!(
            outcome,
            Advance::Advanced {
                next_due_date: date(2024, 3, 10)
            }
        );
        assert!(template.active);
    }

    #[test]
    fn advance_past_end_date_deactivates_and_keeps_due_date() {
        let mut template = monthly_template(date(2024, 1, 1)).with_end_date(date(2024, 2, 15));
        assert_eq!(template.next_due_date, date(2024, 2, 1));

        let outcome = template.advance(Utc::now()).unwrap();
        assert!(outcome.is_deactivated());
        assert_eq!(outcome.due_date(), date(2024, 2, 1));
        assert!(!template.active);
        assert_eq!(template.next_due_date, date(2024, 2, 1));
    }

    #[test]
    fn candidate_on_end_date_stays_active() {
        let mut template = monthly_template(date(2024, 1, 1)).with_end_date(date(2024, 3, 1));
        let outcome = template.advance(Utc::now()).unwrap();
        assert_eq!(outcome.due_date(), date(2024, 3, 1));
        assert!(template.active);
    }

    #[test]
    fn toggle_only_flips_active_flag() {
        let mut template = monthly_template(date(2024, 5, 5));
        let due = template.next_due_date;
        assert!(!template.toggle(Utc::now()));
        assert!(template.toggle(Utc::now()));
        assert_eq!(template.next_due_date, due);
    }

    #[test]
    fn is_due_requires_active_and_past_due() {
        let mut template = monthly_template(date(2024, 1, 1));
        assert!(!template.is_due(date(2024, 1, 31)));
        assert!(template.is_due(date(2024, 2, 1)));
        template.active = false;
        assert!(!template.is_due(date(2024, 2, 1)));
    }

    #[test]
    fn serializes_amount_and_enums_as_text() {
        let template = monthly_template(date(2024, 1, 1)).with_notes("landlord");
        let json = serde_json::to_value(&template).unwrap();
        assert_eq!(json["amount"], "950");
        assert_eq!(json["flow"], "EXPENSE");
        assert_eq!(json["period"], "MONTHLY");
        assert!(json.get("end_date").is_none());
    }
}
