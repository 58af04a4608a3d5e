//! Collaborator traits the services persist through, plus the staged unit of work shared by
//! the bundled stores.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::{Mutex, MutexGuard},
};

use chrono::NaiveDate;
use recur_domain::{Account, Category, LedgerTransaction, OwnerId, RecurringTemplate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CoreError;

/// Lookup and persistence of recurring templates.
pub trait TemplateRepository {
    /// Fetches a template only when it belongs to `owner`.
    fn template(&self, id: Uuid, owner: OwnerId) -> Result<Option<RecurringTemplate>, CoreError>;
    /// All templates of `owner`, earliest next due date first.
    fn templates_for_owner(&self, owner: OwnerId) -> Result<Vec<RecurringTemplate>, CoreError>;
    /// Active templates of `owner` whose next due date is on or before `on`.
    fn active_due_templates(
        &self,
        owner: OwnerId,
        on: NaiveDate,
    ) -> Result<Vec<RecurringTemplate>, CoreError>;
    /// Distinct owners that have at least one template.
    fn template_owners(&self) -> Result<Vec<OwnerId>, CoreError>;
    fn save_template(&mut self, template: RecurringTemplate) -> Result<(), CoreError>;
    /// Removes a template, returning whether it existed.
    fn delete_template(&mut self, id: Uuid) -> Result<bool, CoreError>;
}

/// Append-only transaction storage.
pub trait TransactionRepository {
    /// Records a new transaction. Existing transactions are never rewritten.
    fn save_transaction(&mut self, transaction: LedgerTransaction) -> Result<(), CoreError>;
    /// Transactions generated from `template_id`, oldest first.
    fn transactions_for_template(
        &self,
        template_id: Uuid,
    ) -> Result<Vec<LedgerTransaction>, CoreError>;
}

pub trait AccountRepository {
    fn account(&self, id: Uuid) -> Result<Option<Account>, CoreError>;
    fn save_account(&mut self, account: Account) -> Result<(), CoreError>;
}

pub trait CategoryRepository {
    fn category(&self, id: Uuid) -> Result<Option<Category>, CoreError>;
    fn save_category(&mut self, category: Category) -> Result<(), CoreError>;
}

/// An atomic unit spanning all four repositories. Writes become visible only after
/// [`UnitOfWork::commit`]; dropping the unit discards them.
pub trait UnitOfWork:
    TemplateRepository + TransactionRepository + AccountRepository + CategoryRepository
{
    fn commit(self: Box<Self>) -> Result<(), CoreError>;
}

/// A store able to open units of work. Units are serialized: a second `begin` blocks until
/// the first unit is committed or dropped.
pub trait LedgerStore: Send + Sync {
    fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>, CoreError>;
}

/// Full persisted state of a ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    #[serde(default)]
    pub accounts: BTreeMap<Uuid, Account>,
    #[serde(default)]
    pub categories: BTreeMap<Uuid, Category>,
    #[serde(default)]
    pub templates: BTreeMap<Uuid, RecurringTemplate>,
    #[serde(default)]
    pub transactions: Vec<LedgerTransaction>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, changes: ChangeSet) {
        self.accounts.extend(changes.accounts);
        self.categories.extend(changes.categories);
        for (id, staged) in changes.templates {
            match staged {
                Some(template) => {
                    self.templates.insert(id, template);
                }
                None => {
                    self.templates.remove(&id);
                }
            }
        }
        self.transactions.extend(changes.transactions);
    }

    fn has_transaction(&self, id: Uuid) -> bool {
        self.transactions.iter().any(|txn| txn.id == id)
    }
}

/// Writes staged by a unit of work. A `None` template entry marks a deletion.
#[derive(Debug, Default)]
pub struct ChangeSet {
    accounts: HashMap<Uuid, Account>,
    categories: HashMap<Uuid, Category>,
    templates: HashMap<Uuid, Option<RecurringTemplate>>,
    transactions: Vec<LedgerTransaction>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
            && self.categories.is_empty()
            && self.templates.is_empty()
            && self.transactions.is_empty()
    }
}

type PersistFn<'a> = Box<dyn FnOnce(&LedgerState) -> Result<(), CoreError> + 'a>;

/// Unit of work over a locked [`LedgerState`]. Reads see staged writes first. On commit the
/// optional persist hook receives the merged state and must succeed before the shared state
/// is replaced.
pub struct StagedUnit<'a> {
    base: MutexGuard<'a, LedgerState>,
    changes: ChangeSet,
    persist: Option<PersistFn<'a>>,
}

impl<'a> StagedUnit<'a> {
    pub fn new(base: MutexGuard<'a, LedgerState>) -> Self {
        Self {
            base,
            changes: ChangeSet::default(),
            persist: None,
        }
    }

    pub fn with_persistence(
        base: MutexGuard<'a, LedgerState>,
        persist: impl FnOnce(&LedgerState) -> Result<(), CoreError> + 'a,
    ) -> Self {
        Self {
            base,
            changes: ChangeSet::default(),
            persist: Some(Box::new(persist)),
        }
    }

    fn current_template(&self, id: Uuid) -> Option<&RecurringTemplate> {
        match self.changes.templates.get(&id) {
            Some(staged) => staged.as_ref(),
            None => self.base.templates.get(&id),
        }
    }

    fn merged_templates(&self) -> Vec<&RecurringTemplate> {
        let mut merged: Vec<&RecurringTemplate> = self
            .base
            .templates
            .values()
            .filter(|template| !self.changes.templates.contains_key(&template.id))
            .collect();
        merged.extend(self.changes.templates.values().flatten());
        merged
    }

    fn owned_templates(&self, owner: OwnerId) -> Vec<RecurringTemplate> {
        let mut templates: Vec<RecurringTemplate> = self
            .merged_templates()
            .into_iter()
            .filter(|template| template.owner_id == owner)
            .cloned()
            .collect();
        templates.sort_by(|a, b| {
            a.next_due_date
                .cmp(&b.next_due_date)
                .then(a.created_at.cmp(&b.created_at))
        });
        templates
    }
}

impl TemplateRepository for StagedUnit<'_> {
    fn template(&self, id: Uuid, owner: OwnerId) -> Result<Option<RecurringTemplate>, CoreError> {
        Ok(self
            .current_template(id)
            .filter(|template| template.owner_id == owner)
            .cloned())
    }

    fn templates_for_owner(&self, owner: OwnerId) -> Result<Vec<RecurringTemplate>, CoreError> {
        Ok(self.owned_templates(owner))
    }

    fn active_due_templates(
        &self,
        owner: OwnerId,
        on: NaiveDate,
    ) -> Result<Vec<RecurringTemplate>, CoreError> {
        let mut due = self.owned_templates(owner);
        due.retain(|template| template.is_due(on));
        Ok(due)
    }

    fn template_owners(&self) -> Result<Vec<OwnerId>, CoreError> {
        let owners: BTreeSet<OwnerId> = self
            .merged_templates()
            .into_iter()
            .map(|template| template.owner_id)
            .collect();
        Ok(owners.into_iter().collect())
    }

    fn save_template(&mut self, template: RecurringTemplate) -> Result<(), CoreError> {
        self.changes.templates.insert(template.id, Some(template));
        Ok(())
    }

    fn delete_template(&mut self, id: Uuid) -> Result<bool, CoreError> {
        let existed = self.current_template(id).is_some();
        if existed {
            self.changes.templates.insert(id, None);
        }
        Ok(existed)
    }
}

impl TransactionRepository for StagedUnit<'_> {
    fn save_transaction(&mut self, transaction: LedgerTransaction) -> Result<(), CoreError> {
        let duplicate = self.base.has_transaction(transaction.id)
            || self
                .changes
                .transactions
                .iter()
                .any(|txn| txn.id == transaction.id);
        if duplicate {
            return Err(CoreError::Persistence(format!(
                "transaction {} already recorded",
                transaction.id
            )));
        }
        self.changes.transactions.push(transaction);
        Ok(())
    }

    fn transactions_for_template(
        &self,
        template_id: Uuid,
    ) -> Result<Vec<LedgerTransaction>, CoreError> {
        let mut history: Vec<LedgerTransaction> = self
            .base
            .transactions
            .iter()
            .chain(self.changes.transactions.iter())
            .filter(|txn| txn.template_id == Some(template_id))
            .cloned()
            .collect();
        history.sort_by(|a, b| {
            a.executed_on
                .cmp(&b.executed_on)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(history)
    }
}

impl AccountRepository for StagedUnit<'_> {
    fn account(&self, id: Uuid) -> Result<Option<Account>, CoreError> {
        Ok(self
            .changes
            .accounts
            .get(&id)
            .or_else(|| self.base.accounts.get(&id))
            .cloned())
    }

    fn save_account(&mut self, account: Account) -> Result<(), CoreError> {
        self.changes.accounts.insert(account.id, account);
        Ok(())
    }
}

impl CategoryRepository for StagedUnit<'_> {
    fn category(&self, id: Uuid) -> Result<Option<Category>, CoreError> {
        Ok(self
            .changes
            .categories
            .get(&id)
            .or_else(|| self.base.categories.get(&id))
            .cloned())
    }

    fn save_category(&mut self, category: Category) -> Result<(), CoreError> {
        self.changes.categories.insert(category.id, category);
        Ok(())
    }
}

impl UnitOfWork for StagedUnit<'_> {
    fn commit(self: Box<Self>) -> Result<(), CoreError> {
        let StagedUnit {
            mut base,
            changes,
            persist,
        } = *self;
        if changes.is_empty() {
            return Ok(());
        }
        match persist {
            None => base.apply(changes),
            Some(persist) => {
                let mut next = base.clone();
                next.apply(changes);
                persist(&next)?;
                *base = next;
            }
        }
        Ok(())
    }
}

/// Acquires the ledger lock, mapping poisoning to a persistence failure.
pub fn lock_state(state: &Mutex<LedgerState>) -> Result<MutexGuard<'_, LedgerState>, CoreError> {
    state
        .lock()
        .map_err(|_| CoreError::Persistence("ledger state lock poisoned".into()))
}
