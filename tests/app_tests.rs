use std::sync::Arc;

use chrono::NaiveDate;
use recur_config::{Config, ConfigManager};
use recur_core::{ErrorKind, FixedClock, TemplateRequest};
use recur_domain::{CatchUpPolicy, FlowType, RecurrencePeriod};
use recurring_core::RecurringApp;
use rust_decimal_macros::dec;
use tempfile::tempdir;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn rent(account_id: Uuid, category_id: Uuid) -> TemplateRequest {
    TemplateRequest {
        description: "Rent".into(),
        amount: dec!(20),
        flow: FlowType::Expense,
        period: RecurrencePeriod::Monthly,
        start_date: date(2024, 1, 1),
        end_date: None,
        notes: None,
        category_id,
        account_id,
    }
}

#[test]
fn until_current_sweep_catches_up_and_backs_up_first() {
    let dir = tempdir().unwrap();
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
    manager
        .save(&Config {
            catch_up: CatchUpPolicy::UntilCurrent,
            ..Config::default()
        })
        .unwrap();

    let clock = Arc::new(FixedClock::on(date(2024, 4, 15)));
    let app = RecurringApp::open_at(dir.path(), clock).unwrap();
    assert_eq!(app.config().catch_up, CatchUpPolicy::UntilCurrent);

    let owner = Uuid::new_v4();
    let account = app.add_account(owner, "Checking", dec!(100)).unwrap();
    let category = app.add_category(owner, "Housing", FlowType::Expense).unwrap();
    let template = app
        .templates()
        .create(owner, rent(account.id, category.id))
        .unwrap();
    assert_eq!(template.next_due_date, date(2024, 2, 1));

    let report = app.sweep(app.today()).unwrap();
    assert!(report.is_clean());
    // Feb, Mar and Apr are all overdue on Apr 15.
    assert_eq!(report.succeeded(), 3);

    let stored = app.templates().get(template.id, owner).unwrap();
    assert_eq!(stored.next_due_date, date(2024, 5, 1));
    assert_eq!(app.accounts(owner).unwrap()[0].balance, dec!(40));

    let backups = app.list_backups().unwrap();
    assert_eq!(backups.len(), 1);
    assert!(backups[0].id.contains("pre-sweep"));
}

#[test]
fn ledger_survives_reopening_and_restore() {
    let dir = tempdir().unwrap();
    let clock = Arc::new(FixedClock::on(date(2024, 2, 1)));
    let owner = Uuid::new_v4();

    let template_id = {
        let app = RecurringApp::open_at(dir.path(), clock.clone()).unwrap();
        let account = app.add_account(owner, "Checking", dec!(50)).unwrap();
        let category = app.add_category(owner, "Housing", FlowType::Expense).unwrap();
        let template = app
            .templates()
            .create(owner, rent(account.id, category.id))
            .unwrap();
        app.sweep(date(2024, 2, 1)).unwrap();
        template.id
    };

    let app = RecurringApp::open_at(dir.path(), clock).unwrap();
    assert_eq!(app.accounts(owner).unwrap()[0].balance, dec!(30));
    assert_eq!(app.templates().history(template_id, owner).unwrap().len(), 1);

    let backup = app.list_backups().unwrap().remove(0);
    app.restore_backup(&backup.id).unwrap();
    assert_eq!(app.accounts(owner).unwrap()[0].balance, dec!(50));
    assert!(app.templates().history(template_id, owner).unwrap().is_empty());
}

#[test]
fn blank_account_name_is_rejected() {
    let dir = tempdir().unwrap();
    let app = RecurringApp::open_at(dir.path(), Arc::new(FixedClock::on(date(2024, 1, 1)))).unwrap();
    let err = app.add_account(Uuid::new_v4(), "   ", dec!(0)).unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Validation));
}
