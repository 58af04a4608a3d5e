use std::sync::Mutex;

use recur_domain::{Account, Category, RecurringTemplate};

use crate::{
    storage::{lock_state, LedgerState, LedgerStore, StagedUnit, UnitOfWork},
    CoreError,
};

/// Process-local store. Committed units mutate the shared state in place.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: Mutex<LedgerState>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: LedgerState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Seeds an account directly, bypassing any unit of work.
    pub fn insert_account(&self, account: Account) -> Result<(), CoreError> {
        lock_state(&self.state)?.accounts.insert(account.id, account);
        Ok(())
    }

    pub fn insert_category(&self, category: Category) -> Result<(), CoreError> {
        lock_state(&self.state)?
            .categories
            .insert(category.id, category);
        Ok(())
    }

    pub fn insert_template(&self, template: RecurringTemplate) -> Result<(), CoreError> {
        lock_state(&self.state)?
            .templates
            .insert(template.id, template);
        Ok(())
    }

    /// Clone of the committed state.
    pub fn snapshot(&self) -> Result<LedgerState, CoreError> {
        Ok(lock_state(&self.state)?.clone())
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>, CoreError> {
        let guard = lock_state(&self.state)?;
        Ok(Box::new(StagedUnit::new(guard)))
    }
}
