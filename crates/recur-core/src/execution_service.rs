//! Executes recurring templates: one transaction, one balance change and one schedule
//! advance, applied as a single unit.

use std::sync::Arc;

use chrono::NaiveDate;
use recur_domain::{Advance, LedgerTransaction, OwnerId, RecurringTemplate};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::EntityKind,
    storage::{
        AccountRepository, LedgerStore, TemplateRepository, TransactionRepository, UnitOfWork,
    },
    time::{Clock, SystemClock},
    CoreError,
};

/// Everything one execution changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub transaction: LedgerTransaction,
    /// Template state after the advance.
    pub template: RecurringTemplate,
    /// The due date this execution satisfied.
    pub previous_due_date: NaiveDate,
    pub account_balance: Decimal,
    pub advance: Advance,
}

impl Execution {
    pub fn deactivated(&self) -> bool {
        self.advance.is_deactivated()
    }
}

#[derive(Clone)]
pub struct ExecutionEngine {
    clock: Arc<dyn Clock>,
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl ExecutionEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Executes a template dated today.
    pub fn execute(
        &self,
        store: &dyn LedgerStore,
        template_id: Uuid,
        owner: OwnerId,
    ) -> Result<Execution, CoreError> {
        self.execute_on(store, template_id, owner, self.clock.today())
    }

    /// Executes a template dated `on` inside its own unit of work. On error nothing is
    /// committed.
    pub fn execute_on(
        &self,
        store: &dyn LedgerStore,
        template_id: Uuid,
        owner: OwnerId,
        on: NaiveDate,
    ) -> Result<Execution, CoreError> {
        let mut unit = store.begin()?;
        let execution = self.execute_in(unit.as_mut(), template_id, owner, on)?;
        unit.commit()?;
        info!(
            template = %template_id,
            transaction = %execution.transaction.id,
            due = %execution.previous_due_date,
            next_due = %execution.advance.due_date(),
            deactivated = execution.deactivated(),
            "recurring template executed"
        );
        Ok(execution)
    }

    /// Stages an execution on an open unit without committing it.
    pub fn execute_in(
        &self,
        unit: &mut dyn UnitOfWork,
        template_id: Uuid,
        owner: OwnerId,
        on: NaiveDate,
    ) -> Result<Execution, CoreError> {
        let mut template = unit
            .template(template_id, owner)?
            .ok_or(CoreError::not_found(EntityKind::Template, template_id))?;
        if !template.active {
            return Err(CoreError::InactiveTemplate(template_id));
        }
        let mut account = unit
            .account(template.account_id)?
            .ok_or(CoreError::not_found(EntityKind::Account, template.account_id))?;

        let now = self.clock.now();
        let transaction = LedgerTransaction::from_template(&template, on, now);
        let account_balance = account.apply(template.flow, template.amount, now)?;
        let previous_due_date = template.next_due_date;
        let advance = template.advance(now)?;

        unit.save_transaction(transaction.clone())?;
        unit.save_account(account)?;
        unit.save_template(template.clone())?;

        Ok(Execution {
            transaction,
            template,
            previous_due_date,
            account_balance,
            advance,
        })
    }
}
