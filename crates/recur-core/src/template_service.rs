//! Owner-scoped lifecycle operations on recurring templates.

use std::sync::Arc;

use chrono::NaiveDate;
use recur_domain::{
    next_due_date, FlowType, LedgerTransaction, OwnerId, Owned, RecurrencePeriod,
    RecurringTemplate,
};
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::EntityKind,
    execution_service::{Execution, ExecutionEngine},
    storage::{
        AccountRepository, CategoryRepository, LedgerStore, TemplateRepository,
        TransactionRepository, UnitOfWork,
    },
    time::Clock,
    CoreError,
};

/// Fields accepted when creating or replacing a template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateRequest {
    pub description: String,
    pub amount: Decimal,
    pub flow: FlowType,
    pub period: RecurrencePeriod,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub category_id: Uuid,
    pub account_id: Uuid,
}

impl TemplateRequest {
    /// Checks the request in isolation: non-blank description, positive amount and an end
    /// date that does not precede the start date.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.description.trim().is_empty() {
            return Err(CoreError::Validation("description must not be blank".into()));
        }
        if self.amount <= Decimal::ZERO {
            return Err(CoreError::Validation(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(CoreError::Validation(format!(
                    "end date {end} precedes start date {}",
                    self.start_date
                )));
            }
        }
        Ok(())
    }

    fn cleaned_notes(&self) -> Option<String> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
            .map(str::to_string)
    }
}

pub struct TemplateService {
    store: Arc<dyn LedgerStore>,
    engine: ExecutionEngine,
}

impl TemplateService {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            engine: ExecutionEngine::new(clock),
        }
    }

    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    pub fn store(&self) -> &dyn LedgerStore {
        self.store.as_ref()
    }

    /// All templates of `owner`, earliest next due date first.
    pub fn list(&self, owner: OwnerId) -> Result<Vec<RecurringTemplate>, CoreError> {
        self.store.begin()?.templates_for_owner(owner)
    }

    pub fn list_active(&self, owner: OwnerId) -> Result<Vec<RecurringTemplate>, CoreError> {
        let mut templates = self.list(owner)?;
        templates.retain(|template| template.active);
        Ok(templates)
    }

    pub fn get(&self, id: Uuid, owner: OwnerId) -> Result<RecurringTemplate, CoreError> {
        let unit = self.store.begin()?;
        Self::owned_template(unit.as_ref(), id, owner)
    }

    pub fn create(
        &self,
        owner: OwnerId,
        request: TemplateRequest,
    ) -> Result<RecurringTemplate, CoreError> {
        request.validate()?;
        let mut unit = self.store.begin()?;
        Self::ensure_references(unit.as_ref(), owner, &request)?;

        let mut template = RecurringTemplate::new(
            owner,
            request.description.trim(),
            request.amount,
            request.flow,
            request.period,
            request.start_date,
            request.category_id,
            request.account_id,
        )?
        .with_created_at(self.engine.clock().now());
        Self::ensure_within_end(template.next_due_date, request.end_date)?;
        if let Some(end) = request.end_date {
            template = template.with_end_date(end);
        }
        if let Some(notes) = request.cleaned_notes() {
            template = template.with_notes(notes);
        }
        unit.save_template(template.clone())?;
        unit.commit()?;
        info!(
            template = %template.id,
            owner = %owner,
            next_due = %template.next_due_date,
            "recurring template created"
        );
        Ok(template)
    }

    /// Replaces the editable fields. The next due date is recomputed from the new start date
    /// when the period or start date changed; otherwise it is kept.
    pub fn update(
        &self,
        id: Uuid,
        owner: OwnerId,
        request: TemplateRequest,
    ) -> Result<RecurringTemplate, CoreError> {
        request.validate()?;
        let mut unit = self.store.begin()?;
        let mut template = Self::owned_template(unit.as_ref(), id, owner)?;
        Self::ensure_references(unit.as_ref(), owner, &request)?;

        let reschedule =
            template.period != request.period || template.start_date != request.start_date;
        let next_due = if reschedule {
            next_due_date(request.start_date, request.period)?
        } else {
            template.next_due_date
        };
        Self::ensure_within_end(next_due, request.end_date)?;

        template.description = request.description.trim().to_string();
        template.amount = request.amount;
        template.flow = request.flow;
        template.period = request.period;
        template.start_date = request.start_date;
        template.end_date = request.end_date;
        template.notes = request.cleaned_notes();
        template.category_id = request.category_id;
        template.account_id = request.account_id;
        template.next_due_date = next_due;
        template.updated_at = self.engine.clock().now();

        unit.save_template(template.clone())?;
        unit.commit()?;
        debug!(template = %id, rescheduled = reschedule, "recurring template updated");
        Ok(template)
    }

    /// Deletes the template. Transactions it generated keep their back-reference.
    pub fn delete(&self, id: Uuid, owner: OwnerId) -> Result<(), CoreError> {
        let mut unit = self.store.begin()?;
        Self::owned_template(unit.as_ref(), id, owner)?;
        unit.delete_template(id)?;
        unit.commit()?;
        info!(template = %id, "recurring template deleted");
        Ok(())
    }

    /// Flips the active flag. The next due date is left as is.
    pub fn toggle(&self, id: Uuid, owner: OwnerId) -> Result<RecurringTemplate, CoreError> {
        let mut unit = self.store.begin()?;
        let mut template = Self::owned_template(unit.as_ref(), id, owner)?;
        let active = template.toggle(self.engine.clock().now());
        unit.save_template(template.clone())?;
        unit.commit()?;
        info!(template = %id, active, "recurring template toggled");
        Ok(template)
    }

    /// Executes the template immediately, dated today.
    pub fn execute_now(&self, id: Uuid, owner: OwnerId) -> Result<Execution, CoreError> {
        self.engine.execute(self.store.as_ref(), id, owner)
    }

    /// Transactions generated by the template, oldest first.
    pub fn history(&self, id: Uuid, owner: OwnerId) -> Result<Vec<LedgerTransaction>, CoreError> {
        let unit = self.store.begin()?;
        Self::owned_template(unit.as_ref(), id, owner)?;
        unit.transactions_for_template(id)
    }

    fn owned_template(
        unit: &dyn UnitOfWork,
        id: Uuid,
        owner: OwnerId,
    ) -> Result<RecurringTemplate, CoreError> {
        unit.template(id, owner)?
            .ok_or(CoreError::not_found(EntityKind::Template, id))
    }

    fn ensure_references(
        unit: &dyn UnitOfWork,
        owner: OwnerId,
        request: &TemplateRequest,
    ) -> Result<(), CoreError> {
        unit.category(request.category_id)?
            .filter(|category| category.belongs_to(owner))
            .ok_or(CoreError::not_found(EntityKind::Category, request.category_id))?;
        unit.account(request.account_id)?
            .filter(|account| account.belongs_to(owner))
            .ok_or(CoreError::not_found(EntityKind::Account, request.account_id))?;
        Ok(())
    }

    fn ensure_within_end(next_due: NaiveDate, end_date: Option<NaiveDate>) -> Result<(), CoreError> {
        match end_date {
            Some(end) if next_due > end => Err(CoreError::Validation(format!(
                "first occurrence {next_due} falls after end date {end}"
            ))),
            _ => Ok(()),
        }
    }
}
