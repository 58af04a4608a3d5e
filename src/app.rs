//! Application facade wiring configuration, the JSON store and the core services together.

use std::{path::PathBuf, sync::Arc};

use chrono::NaiveDate;
use recur_config::{default_base_dir, Config, ConfigManager};
use recur_core::{
    storage::{AccountRepository, CategoryRepository, LedgerStore, UnitOfWork},
    Clock, CoreError, DueSweepScheduler, ExecutionEngine, SweepReport, SystemClock,
    TemplateService,
};
use recur_domain::{Account, Category, FlowType, OwnerId};
use recur_storage_json::{BackupInfo, JsonLedgerStore};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::AppError;

const PRE_SWEEP_BACKUP_NOTE: &str = "pre-sweep";

pub struct RecurringApp {
    config: Config,
    config_manager: ConfigManager,
    clock: Arc<dyn Clock>,
    store: Arc<JsonLedgerStore>,
    templates: TemplateService,
    scheduler: DueSweepScheduler,
}

impl RecurringApp {
    /// Opens the ledger under the default base directory with the system clock.
    pub fn open() -> Result<Self, AppError> {
        Self::open_at(default_base_dir(), Arc::new(SystemClock))
    }

    pub fn open_at(base: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        let manager = ConfigManager::with_base_dir(base.into())?;
        let config = manager.load()?;
        Self::with_config(manager, config, clock)
    }

    pub fn with_config(
        config_manager: ConfigManager,
        config: Config,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        let data_dir = config_manager.data_dir(&config);
        let store = Arc::new(JsonLedgerStore::with_retention(
            data_dir.clone(),
            config.backup_retention,
        )?);
        let templates = TemplateService::new(store.clone(), clock.clone());
        let scheduler = DueSweepScheduler::new(ExecutionEngine::new(clock.clone()), config.catch_up)
            .with_max_catch_up_periods(config.max_catch_up_periods);
        info!(
            data_dir = %data_dir.display(),
            catch_up = %config.catch_up,
            "recurring ledger opened"
        );
        Ok(Self {
            config,
            config_manager,
            clock,
            store,
            templates,
            scheduler,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_manager(&self) -> &ConfigManager {
        &self.config_manager
    }

    pub fn store(&self) -> &JsonLedgerStore {
        &self.store
    }

    pub fn templates(&self) -> &TemplateService {
        &self.templates
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Runs the due sweep for `today`, writing a backup first when configured to.
    pub fn sweep(&self, today: NaiveDate) -> Result<SweepReport, AppError> {
        if self.config.backup_before_sweep {
            let backup = self.store.backup(Some(PRE_SWEEP_BACKUP_NOTE))?;
            info!(backup = %backup.id, "pre-sweep backup written");
        }
        let report = self.scheduler.process_due(&*self.store, today);
        if !report.is_clean() {
            warn!(failed = report.failed(), "sweep finished with failures");
        }
        Ok(report)
    }

    pub fn add_account(
        &self,
        owner: OwnerId,
        name: &str,
        opening_balance: Decimal,
    ) -> Result<Account, AppError> {
        let name = required_name(name)?;
        let account = Account::new(owner, name, opening_balance);
        let mut unit = self.store.begin()?;
        unit.save_account(account.clone())?;
        unit.commit()?;
        info!(account = %account.id, owner = %owner, "account created");
        Ok(account)
    }

    pub fn add_category(
        &self,
        owner: OwnerId,
        name: &str,
        kind: FlowType,
    ) -> Result<Category, AppError> {
        let name = required_name(name)?;
        let category = Category::new(owner, name, kind);
        let mut unit = self.store.begin()?;
        unit.save_category(category.clone())?;
        unit.commit()?;
        info!(category = %category.id, owner = %owner, "category created");
        Ok(category)
    }

    /// Accounts of `owner`, ordered by name.
    pub fn accounts(&self, owner: OwnerId) -> Result<Vec<Account>, AppError> {
        let mut accounts: Vec<Account> = self
            .store
            .snapshot()?
            .accounts
            .into_values()
            .filter(|account| account.owner_id == owner)
            .collect();
        accounts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(accounts)
    }

    pub fn backup(&self, note: Option<&str>) -> Result<BackupInfo, AppError> {
        Ok(self.store.backup(note)?)
    }

    pub fn list_backups(&self) -> Result<Vec<BackupInfo>, AppError> {
        Ok(self.store.list_backups()?)
    }

    pub fn restore_backup(&self, id: &str) -> Result<(), AppError> {
        self.store.restore_backup(id)?;
        Ok(())
    }
}

fn required_name(name: &str) -> Result<&str, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("name must not be blank".into()));
    }
    Ok(trimmed)
}
