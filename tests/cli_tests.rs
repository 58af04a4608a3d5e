use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::str::contains;

const OWNER: &str = "6f1c2b7e-3d4a-4c5b-9e8f-0a1b2c3d4e5f";

fn cli(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("recurring_core_cli").unwrap();
    cmd.env("RECURRING_CORE_HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

/// Runs a command that prints `... created...: <id>` and returns the id.
fn created_id(home: &TempDir, args: &[&str]) -> String {
    let output = cli(home).args(args).output().unwrap();
    assert!(output.status.success(), "{args:?} failed: {output:?}");
    let stdout = String::from_utf8(output.stdout).unwrap();
    stdout
        .lines()
        .find(|line| line.contains("created"))
        .and_then(|line| line.split_whitespace().last())
        .unwrap_or_else(|| panic!("no id in {stdout:?}"))
        .to_string()
}

#[test]
fn version_prints_package_version() {
    let home = TempDir::new().unwrap();
    cli(&home)
        .arg("version")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_command_fails_with_suggestion() {
    let home = TempDir::new().unwrap();
    cli(&home)
        .arg("swep")
        .assert()
        .failure()
        .stdout(contains("Suggestion: `sweep`?"))
        .stdout(contains("Unknown command `swep`"));
}

#[test]
fn invalid_owner_is_reported() {
    let home = TempDir::new().unwrap();
    cli(&home)
        .args(["templates", "not-a-uuid"])
        .assert()
        .failure()
        .stdout(contains("invalid owner id `not-a-uuid`"));
}

#[test]
fn template_lifecycle_through_the_cli() {
    let home = TempDir::new().unwrap();
    let account = created_id(&home, &["add-account", OWNER, "Checking", "100"]);
    let category = created_id(&home, &["add-category", OWNER, "Rent", "expense"]);
    let template = created_id(
        &home,
        &[
            "add-template",
            OWNER,
            &account,
            &category,
            "25",
            "EXPENSE",
            "MONTHLY",
            "2024-01-01",
            "Rent",
            "--notes",
            "flat 2B",
        ],
    );

    cli(&home)
        .args(["templates", OWNER])
        .assert()
        .success()
        .stdout(contains(template.as_str()))
        .stdout(contains("next 2024-02-01"));

    cli(&home)
        .args(["sweep", "2024-02-01"])
        .assert()
        .success()
        .stdout(contains("2024-02-01: 1 executed, 0 failed across 1 owner(s)"));

    // Second sweep on the same day finds nothing due.
    cli(&home)
        .args(["sweep", "2024-02-01"])
        .assert()
        .success()
        .stdout(contains("0 executed, 0 failed"));

    cli(&home)
        .args(["accounts", OWNER])
        .assert()
        .success()
        .stdout(contains("Checking"))
        .stdout(contains("75"));

    cli(&home)
        .args(["history", OWNER, &template])
        .assert()
        .success()
        .stdout(contains("2024-02-01"))
        .stdout(contains("-25"));

    cli(&home)
        .args(["show", OWNER, &template])
        .assert()
        .success()
        .stdout(contains("next due:    2024-03-01"))
        .stdout(contains("notes:       flat 2B"));

    cli(&home)
        .args(["toggle", OWNER, &template])
        .assert()
        .success()
        .stdout(contains("is now inactive"));

    cli(&home)
        .args(["execute", OWNER, &template])
        .assert()
        .failure()
        .stdout(contains("inactive"));

    cli(&home)
        .arg("backups")
        .assert()
        .success()
        .stdout(contains("pre-sweep"));
}

#[test]
fn script_mode_keeps_going_after_errors() {
    let home = TempDir::new().unwrap();
    cli(&home)
        .write_stdin("help\nbogus\n\"unterminated\nversion\nexit\nversion\n")
        .assert()
        .success()
        .stdout(contains("=== Commands ==="))
        .stdout(contains("Unknown command `bogus`"))
        .stdout(contains("Could not parse"))
        .stdout(contains("recurring_core_cli"));
}

#[test]
fn sweep_report_renders_as_json() {
    let home = TempDir::new().unwrap();
    let output = cli(&home)
        .args(["sweep", "2024-03-01", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["run_date"], "2024-03-01");
    assert_eq!(report["policy"], "single-period");
    assert_eq!(report["owners_scanned"], 0);
    assert!(report["items"].as_array().unwrap().is_empty());
}
