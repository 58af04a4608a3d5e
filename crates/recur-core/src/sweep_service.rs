//! Batch sweep over every owner's due templates.
//!
//! Each execution runs in its own unit of work. A failing template is recorded in the
//! report and the sweep moves on; earlier executions stay committed.

use std::fmt;

use chrono::NaiveDate;
use recur_domain::{CatchUpPolicy, OwnerId, RecurringTemplate};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    error::ErrorKind,
    execution_service::{Execution, ExecutionEngine},
    storage::{LedgerStore, TemplateRepository},
    CoreError,
};

/// Upper bound on executions per template per sweep under [`CatchUpPolicy::UntilCurrent`].
pub const DEFAULT_MAX_CATCH_UP_PERIODS: u32 = 366;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SweepOutcome {
    Executed {
        transaction_id: Uuid,
        due_date: NaiveDate,
        next_due_date: NaiveDate,
        deactivated: bool,
    },
    Failed {
        kind: ErrorKind,
        message: String,
    },
}

/// One attempted execution, or one owner-level failure when `template_id` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepItem {
    pub owner_id: Option<OwnerId>,
    pub template_id: Option<Uuid>,
    pub outcome: SweepOutcome,
}

impl SweepItem {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, SweepOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepReport {
    pub run_date: NaiveDate,
    pub policy: CatchUpPolicy,
    pub owners_scanned: usize,
    pub items: Vec<SweepItem>,
}

impl SweepReport {
    fn new(run_date: NaiveDate, policy: CatchUpPolicy) -> Self {
        Self {
            run_date,
            policy,
            owners_scanned: 0,
            items: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| !item.is_failure()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.iter().filter(|item| item.is_failure()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &SweepItem> {
        self.items.iter().filter(|item| item.is_failure())
    }

    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }

    fn record_execution(&mut self, owner: OwnerId, execution: &Execution) {
        self.items.push(SweepItem {
            owner_id: Some(owner),
            template_id: Some(execution.template.id),
            outcome: SweepOutcome::Executed {
                transaction_id: execution.transaction.id,
                due_date: execution.previous_due_date,
                next_due_date: execution.advance.due_date(),
                deactivated: execution.deactivated(),
            },
        });
    }

    fn record_failure(
        &mut self,
        owner: Option<OwnerId>,
        template_id: Option<Uuid>,
        err: &CoreError,
    ) {
        warn!(
            owner = ?owner,
            template = ?template_id,
            kind = %err.kind(),
            error = %err,
            "recurring execution failed"
        );
        self.items.push(SweepItem {
            owner_id: owner,
            template_id,
            outcome: SweepOutcome::Failed {
                kind: err.kind(),
                message: err.to_string(),
            },
        });
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} executed, {} failed across {} owner(s)",
            self.run_date,
            self.succeeded(),
            self.failed(),
            self.owners_scanned
        )
    }
}

/// Finds and executes due templates for every owner.
#[derive(Clone)]
pub struct DueSweepScheduler {
    engine: ExecutionEngine,
    policy: CatchUpPolicy,
    max_catch_up_periods: u32,
}

impl DueSweepScheduler {
    pub fn new(engine: ExecutionEngine, policy: CatchUpPolicy) -> Self {
        Self {
            engine,
            policy,
            max_catch_up_periods: DEFAULT_MAX_CATCH_UP_PERIODS,
        }
    }

    pub fn with_max_catch_up_periods(mut self, limit: u32) -> Self {
        self.max_catch_up_periods = limit.max(1);
        self
    }

    pub fn policy(&self) -> CatchUpPolicy {
        self.policy
    }

    /// Sweeps every owner for templates due on or before `today`. Never fails as a whole;
    /// per-template and per-owner errors are collected in the report.
    pub fn process_due(&self, store: &dyn LedgerStore, today: NaiveDate) -> SweepReport {
        let mut report = SweepReport::new(today, self.policy);
        let owners = match store.begin().and_then(|unit| unit.template_owners()) {
            Ok(owners) => owners,
            Err(err) => {
                report.record_failure(None, None, &err);
                return report;
            }
        };
        report.owners_scanned = owners.len();

        for owner in owners {
            let due = match store
                .begin()
                .and_then(|unit| unit.active_due_templates(owner, today))
            {
                Ok(due) => due,
                Err(err) => {
                    report.record_failure(Some(owner), None, &err);
                    continue;
                }
            };
            debug!(owner = %owner, due = due.len(), "due templates found");
            for template in due {
                self.run_template(store, owner, &template, today, &mut report);
            }
        }

        info!(
            date = %today,
            policy = %self.policy,
            owners = report.owners_scanned,
            executed = report.succeeded(),
            failed = report.failed(),
            "recurring sweep finished"
        );
        report
    }

    fn run_template(
        &self,
        store: &dyn LedgerStore,
        owner: OwnerId,
        template: &RecurringTemplate,
        today: NaiveDate,
        report: &mut SweepReport,
    ) {
        let mut remaining = match self.policy {
            CatchUpPolicy::SinglePeriod => 1,
            CatchUpPolicy::UntilCurrent => self.max_catch_up_periods,
        };
        loop {
            match self.engine.execute_on(store, template.id, owner, today) {
                Ok(execution) => {
                    report.record_execution(owner, &execution);
                    remaining -= 1;
                    let still_due =
                        !execution.deactivated() && execution.advance.due_date() <= today;
                    if !still_due {
                        break;
                    }
                    if remaining == 0 {
                        if self.policy == CatchUpPolicy::UntilCurrent {
                            warn!(
                                template = %template.id,
                                limit = self.max_catch_up_periods,
                                "catch-up limit reached; template remains overdue"
                            );
                        }
                        break;
                    }
                }
                Err(err) => {
                    report.record_failure(Some(owner), Some(template.id), &err);
                    break;
                }
            }
        }
    }
}

/// Runs a single-period sweep with `engine`.
pub fn process_due(
    store: &dyn LedgerStore,
    engine: &ExecutionEngine,
    today: NaiveDate,
) -> SweepReport {
    DueSweepScheduler::new(engine.clone(), CatchUpPolicy::SinglePeriod).process_due(store, today)
}
