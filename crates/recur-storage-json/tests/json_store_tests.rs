use std::{fs, sync::Arc};

use chrono::NaiveDate;
use recur_core::{
    storage::{
        AccountRepository, CategoryRepository, LedgerStore, TemplateRepository, UnitOfWork,
    },
    CoreError, DueSweepScheduler, ErrorKind, ExecutionEngine, FixedClock,
};
use recur_domain::{Account, CatchUpPolicy, Category, FlowType, RecurrencePeriod, RecurringTemplate};
use recur_storage_json::JsonLedgerStore;
use rust_decimal_macros::dec;
use tempfile::tempdir;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Commits an account, a category and a monthly template due on `due`.
fn seed(store: &JsonLedgerStore, due: NaiveDate) -> (Uuid, Uuid, Uuid) {
    let owner = Uuid::new_v4();
    let account = Account::new(owner, "Checking", dec!(1000));
    let category = Category::new(owner, "Salary", FlowType::Income);
    let mut template = RecurringTemplate::new(
        owner,
        "Salary",
        dec!(2500),
        FlowType::Income,
        RecurrencePeriod::Monthly,
        due,
        category.id,
        account.id,
    )
    .unwrap();
    template.next_due_date = due;
    let ids = (owner, account.id, template.id);

    let mut unit = store.begin().expect("begin unit");
    unit.save_account(account).unwrap();
    unit.save_category(category).unwrap();
    unit.save_template(template).unwrap();
    unit.commit().expect("commit seed");
    ids
}

#[test]
fn committed_units_survive_reopen() {
    let dir = tempdir().expect("tempdir");
    let (owner, account_id, template_id) = {
        let store = JsonLedgerStore::open(dir.path()).expect("open store");
        let ids = seed(&store, date(2024, 1, 25));
        ExecutionEngine::new(Arc::new(FixedClock::on(date(2024, 1, 25))))
            .execute(&store, ids.2, ids.0)
            .expect("execute");
        ids
    };

    let reopened = JsonLedgerStore::open(dir.path()).expect("reopen store");
    let state = reopened.snapshot().unwrap();
    assert_eq!(state.accounts[&account_id].balance, dec!(3500));
    assert_eq!(state.templates[&template_id].next_due_date, date(2024, 2, 25));
    assert_eq!(state.transactions.len(), 1);
    assert_eq!(state.transactions[0].owner_id, owner);
    assert!(reopened.ledger_path().exists());
}

#[test]
fn ledger_file_stores_amounts_as_text() {
    let dir = tempdir().expect("tempdir");
    let store = JsonLedgerStore::open(dir.path()).expect("open store");
    let (_, _, template_id) = seed(&store, date(2024, 1, 1));

    let raw = fs::read_to_string(store.ledger_path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let template = &json["templates"][template_id.to_string()];
    assert_eq!(template["amount"], "2500");
    assert_eq!(template["period"], "MONTHLY");
    assert_eq!(template["next_due_date"], "2024-01-01");
}

#[test]
fn dropped_unit_leaves_file_untouched() {
    let dir = tempdir().expect("tempdir");
    let store = JsonLedgerStore::open(dir.path()).expect("open store");
    let (owner, _, template_id) = seed(&store, date(2024, 1, 1));
    let before = fs::read_to_string(store.ledger_path()).unwrap();

    {
        let mut unit = store.begin().unwrap();
        assert!(unit.delete_template(template_id).unwrap());
        assert!(unit.template(template_id, owner).unwrap().is_none());
    }

    assert_eq!(fs::read_to_string(store.ledger_path()).unwrap(), before);
    assert!(store.snapshot().unwrap().templates.contains_key(&template_id));
}

#[test]
fn failed_write_keeps_previous_state() {
    let dir = tempdir().expect("tempdir");
    let store = JsonLedgerStore::open(dir.path()).expect("open store");
    let (owner, account_id, template_id) = seed(&store, date(2024, 1, 1));
    let before = fs::read_to_string(store.ledger_path()).unwrap();

    // A directory squatting on the temp file name makes the next write fail.
    fs::create_dir(dir.path().join("ledger.json.tmp")).unwrap();
    let err = ExecutionEngine::new(Arc::new(FixedClock::on(date(2024, 1, 1))))
        .execute(&store, template_id, owner)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert_eq!(fs::read_to_string(store.ledger_path()).unwrap(), before);
    let state = store.snapshot().unwrap();
    assert_eq!(state.accounts[&account_id].balance, dec!(1000));
    assert!(state.transactions.is_empty());
}

#[test]
fn sweep_over_json_store_reports_persistence_failures() {
    let dir = tempdir().expect("tempdir");
    let store = JsonLedgerStore::open(dir.path()).expect("open store");
    let (_, _, template_id) = seed(&store, date(2024, 1, 1));
    fs::create_dir(dir.path().join("ledger.json.tmp")).unwrap();

    let today = date(2024, 1, 1);
    let report = DueSweepScheduler::new(
        ExecutionEngine::new(Arc::new(FixedClock::on(today))),
        CatchUpPolicy::SinglePeriod,
    )
    .process_due(&store, today);

    assert_eq!(report.failed(), 1);
    assert_eq!(report.items[0].template_id, Some(template_id));
    assert_eq!(
        store.snapshot().unwrap().templates[&template_id].next_due_date,
        date(2024, 1, 1)
    );
}

#[test]
fn corrupt_ledger_file_is_a_persistence_error() {
    let dir = tempdir().expect("tempdir");
    fs::write(dir.path().join("ledger.json"), "{ not json").unwrap();

    match JsonLedgerStore::open(dir.path()) {
        Err(CoreError::Persistence(message)) => assert!(message.contains("ledger.json")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("corrupt file should not open"),
    }
}

#[test]
fn backups_are_listed_pruned_and_restorable() {
    let dir = tempdir().expect("tempdir");
    let store = JsonLedgerStore::with_retention(dir.path(), 2).expect("open store");
    let (owner, _, template_id) = seed(&store, date(2024, 1, 1));

    let first = store.backup(Some("before cleanup")).expect("backup");
    assert!(first.id.contains("before-cleanup"));
    assert!(first.created_at.is_some());
    store.backup(Some("second")).expect("backup");
    store.backup(Some("third")).expect("backup");
    assert_eq!(store.list_backups().unwrap().len(), 2);

    let keep = store.list_backups().unwrap().remove(0);
    let mut unit = store.begin().unwrap();
    unit.delete_template(template_id).unwrap();
    unit.commit().unwrap();
    assert!(store.snapshot().unwrap().templates.is_empty());

    let restored = store.restore_backup(&keep.id).expect("restore");
    assert!(restored.templates.contains_key(&template_id));
    let reopened = JsonLedgerStore::open(dir.path()).unwrap();
    let unit = reopened.begin().unwrap();
    assert!(unit.template(template_id, owner).unwrap().is_some());
    assert!(unit
        .account(restored.templates[&template_id].account_id)
        .unwrap()
        .is_some());
    drop(unit);

    let missing = store.restore_backup("ledger_19990101_000000.json").unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::Persistence);
}

#[test]
fn restore_rejects_paths_outside_backups_dir() {
    let dir = tempdir().expect("tempdir");
    let store = JsonLedgerStore::open(dir.path()).expect("open store");
    let (_, _, template_id) = seed(&store, date(2024, 1, 1));
    store.backup(None).expect("backup");

    let outside = dir.path().join("ledger.json");
    for id in ["../ledger.json", outside.to_str().unwrap(), "backups/../../ledger.json"] {
        let err = store.restore_backup(id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{id} was accepted");
    }
    assert!(store.snapshot().unwrap().templates.contains_key(&template_id));
}
