use assert_cmd::Command;
use assert_fs::{prelude::*, TempDir};
use predicates::prelude::*;
use predicates::str::contains;
use regex::Regex;

fn run_script(home: &TempDir, input: &str) -> assert_cmd::assert::Assert {
    Command::cargo_bin("trip_ledger_cli")
        .unwrap()
        .env("TRIP_LEDGER_CLI_SCRIPT", "1")
        .env("TRIP_LEDGER_HOME", home.path())
        .env_remove("RUST_LOG")
        .write_stdin(input.to_string())
        .assert()
        .success()
}

fn stdout_of(assert: assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

#[test]
fn script_mode_records_and_summarises() {
    let home = TempDir::new().unwrap();
    run_script(
        &home,
        "add 1000 food lunch --date 2024-11-10\n\
         add 500 transport --date 2024-11-10\n\
         summary\n\
         list\n\
         exit\n",
    )
    .stdout(contains("ok: Added 1,000 JPY food on 2024-11-10"))
    .stdout(contains("2024-11-10  total 1,500 JPY"))
    .stdout(contains("  food: 1,000 JPY\n  transport: 500 JPY"))
    .stdout(contains("Total: 1,500 JPY"));

    home.child("store/kyotoExpenses.json")
        .assert(predicate::path::exists())
        .assert(contains("\"category\":\"transport\""));
}

#[test]
fn invalid_input_is_reported_and_the_shell_continues() {
    let home = TempDir::new().unwrap();
    run_script(&home, "add abc food\nadd 0 food\nadd 250 tea\nlist\n")
        .stdout(contains("error: Invalid amount `abc`"))
        .stdout(contains("error: Invalid amount `0`"))
        .stdout(contains("Total: 250 JPY"));
}

#[test]
fn mutations_print_running_totals() {
    let home = TempDir::new().unwrap();
    let output = stdout_of(run_script(
        &home,
        "add 1000 food lunch --date 2024-11-10\n\
         add 500 transport --date 2024-11-11\n\
         list\n\
         delete 1\n",
    ));
    assert!(output.contains("Running total: 1,000 JPY (1 expense, 1 day)"));
    assert!(output.contains("Running total: 1,500 JPY (2 expenses, 2 days)"));
    assert_eq!(output.matches("Running total:").count(), 3, "{output}");
    assert!(output.ends_with("Running total: 1,000 JPY (1 expense, 1 day)\n"));
}

#[test]
fn locale_setting_changes_number_format() {
    let home = TempDir::new().unwrap();
    run_script(&home, "config locale de-DE\nadd 1500.5 food\nconvert 1000\n")
        .stdout(contains("ok: Set locale = de-DE"))
        .stdout(contains("ok: Added 1.500,5 JPY food"))
        .stdout(contains("1.000 JPY = 220 TWD (rate 0,22)"));

    run_script(&home, "summary\nconfig locale xx\n")
        .stdout(contains("total 1.500,5 JPY"))
        .stdout(contains("error: invalid value `xx` for `locale`"));
}

#[test]
fn rate_is_saved_between_runs() {
    let home = TempDir::new().unwrap();
    run_script(&home, "rate\nrate 0.25\nrate nope\n")
        .stdout(contains("1 JPY = 0.22 TWD"))
        .stdout(contains("ok: Saved rate: 1 JPY = 0.25 TWD"))
        .stdout(contains("error: Invalid exchange rate `nope`"));

    run_script(&home, "convert 1,000\nconvert ramen\n")
        .stdout(contains("1,000 JPY = 250 TWD (rate 0.25)"))
        .stdout(contains("0 JPY = 0 TWD (rate 0.25)"));
}

#[test]
fn delete_by_short_id_in_a_later_run() {
    let home = TempDir::new().unwrap();
    let output = stdout_of(run_script(
        &home,
        "add 700 temples Kiyomizu-dera --date 2024-11-09\n",
    ));
    let short_id = Regex::new(r"\[([0-9a-f]{8})\]")
        .unwrap()
        .captures(&output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .expect("add prints the short id");

    run_script(&home, &format!("delete {short_id}\nlist\n"))
        .stdout(contains("ok: Deleted 700 JPY temples on 2024-11-09"))
        .stdout(contains("No expenses recorded yet."));
}

#[test]
fn clear_requires_explicit_confirmation_in_scripts() {
    let home = TempDir::new().unwrap();
    run_script(
        &home,
        "add 100 food\nadd 200 food\nclear\nclear --yes\nsummary\n",
    )
    .stdout(contains("error: `clear` needs `--yes` in script mode"))
    .stdout(contains("ok: Cleared 2 expenses."))
    .stdout(contains("No expenses recorded yet."));
}

#[test]
fn unknown_commands_get_suggestions() {
    let home = TempDir::new().unwrap();
    run_script(&home, "sumary\nhelp add\n")
        .stdout(contains("Unknown command `sumary`"))
        .stdout(contains("Did you mean `summary`?"))
        .stdout(contains("Usage: add <amount> <category>"));
}

#[test]
fn corrupted_store_starts_empty() {
    let home = TempDir::new().unwrap();
    home.child("store").create_dir_all().unwrap();
    home.child("store/kyotoExpenses.json")
        .write_str("[{\"date\":")
        .unwrap();
    run_script(&home, "list\n")
        .stdout(contains("Stored expenses could not be read"))
        .stdout(contains("No expenses recorded yet."));
}

#[test]
fn version_reports_package_version() {
    let home = TempDir::new().unwrap();
    run_script(&home, "version\n").stdout(contains(format!(
        "trip_ledger {}",
        env!("CARGO_PKG_VERSION")
    )));
}
