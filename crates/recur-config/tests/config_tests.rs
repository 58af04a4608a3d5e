use std::fs;

use recur_config::{Config, ConfigError, ConfigManager};
use recur_domain::CatchUpPolicy;
use tempfile::tempdir;

#[test]
fn default_config_uses_single_period_catch_up() {
    let cfg = Config::default();

    assert_eq!(cfg.catch_up, CatchUpPolicy::SinglePeriod);
    assert_eq!(cfg.max_catch_up_periods, 366);
    assert!(cfg.backup_retention > 0);
    assert!(cfg.log_filter.is_none());
}

#[test]
fn missing_config_file_loads_defaults() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");

    assert_eq!(manager.load().expect("load config"), Config::default());
    assert!(manager.config_path().starts_with(dir.path()));
}

#[test]
fn config_manager_persists_and_loads_config() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");

    let cfg = Config {
        catch_up: CatchUpPolicy::UntilCurrent,
        max_catch_up_periods: 12,
        log_filter: Some("recurring_core=debug".into()),
        ..Config::default()
    };
    manager.save(&cfg).expect("save config");

    let raw = fs::read_to_string(manager.config_path()).unwrap();
    assert!(raw.contains("\"until-current\""));
    assert_eq!(manager.load().expect("load config"), cfg);
}

#[test]
fn partial_config_fills_in_defaults() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");
    fs::write(manager.config_path(), r#"{ "data_dir": "ledgers" }"#).unwrap();

    let cfg = manager.load().expect("load config");
    assert_eq!(cfg.catch_up, CatchUpPolicy::SinglePeriod);
    assert!(cfg.backup_before_sweep);
    assert_eq!(manager.data_dir(&cfg), dir.path().join("ledgers"));
    assert_eq!(
        manager.data_dir(&Config::default()),
        dir.path().join("data")
    );
}

#[test]
fn malformed_config_is_a_serde_error() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");
    fs::write(manager.config_path(), "catch_up = true").unwrap();

    let err = manager.load().unwrap_err();
    assert!(matches!(err, ConfigError::Serde(_)));
    assert!(err.to_string().starts_with("config file is not valid JSON"));
}
