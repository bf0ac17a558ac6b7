mod common;

use std::{fs, str::FromStr, sync::Arc};

use common::{date, expense, temp_base, today};
use rust_decimal::Decimal;
use trip_ledger::{
    errors::LedgerError,
    ledger::{parse_amount, ExpenseLedger, NewExpense},
    storage::{JsonFileStore, KeyValueExpenseStore, EXPENSES_KEY},
    time::FixedClock,
};

fn open(base: &std::path::Path) -> (ExpenseLedger, JsonFileStore) {
    let store = JsonFileStore::new(base.join("store")).unwrap();
    let mut ledger = ExpenseLedger::local(KeyValueExpenseStore::new(store.clone()))
        .with_clock(Arc::new(FixedClock::on(today())));
    ledger.load().unwrap();
    (ledger, store)
}

#[test]
fn ledger_survives_restart() {
    let base = temp_base();
    let (mut ledger, _) = open(&base);
    ledger
        .add(expense("2024-11-10", 1000, "food").described("lunch"))
        .unwrap();
    ledger.add(expense("2024-11-11", 420, "bus")).unwrap();
    let expected = ledger.records().to_vec();
    drop(ledger);

    let (reopened, _) = open(&base);
    assert_eq!(reopened.records(), expected.as_slice());
    assert_eq!(reopened.grand_total(), Decimal::from(1420));
}

#[test]
fn file_holds_a_plain_json_array() {
    let base = temp_base();
    let (mut ledger, store) = open(&base);
    ledger
        .add(expense("2024-11-10", 1000, "food").described("lunch"))
        .unwrap();

    let raw = fs::read_to_string(store.path_for(EXPENSES_KEY)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let rows = value.as_array().expect("array of expenses");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["date"], "2024-11-10");
    assert_eq!(rows[0]["category"], "food");
    assert_eq!(rows[0]["description"], "lunch");
    assert_eq!(rows[0]["amount"].as_f64(), Some(1000.0));
}

#[test]
fn legacy_rows_load_with_defaults() {
    let base = temp_base();
    let store = JsonFileStore::new(base.join("store")).unwrap();
    fs::write(
        store.path_for(EXPENSES_KEY),
        r#"[
            {"date":"2024-11-10","amount":1000,"category":"food","description":"lunch"},
            {"date":"2024-11-10","amount":500,"category":"transport","description":""}
        ]"#,
    )
    .unwrap();

    let (ledger, _) = open(&base);
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger.records()[1].description, "transport");
    assert_ne!(ledger.records()[0].id, ledger.records()[1].id);
    assert_eq!(ledger.compute_summary()[0].date, date("2024-11-10"));
}

#[test]
fn corrupted_file_starts_empty_and_recovers_on_write() {
    let base = temp_base();
    let store = JsonFileStore::new(base.join("store")).unwrap();
    fs::write(store.path_for(EXPENSES_KEY), "{\"oops\"").unwrap();

    let (mut ledger, _) = open(&base);
    assert!(ledger.is_empty());

    ledger.add(expense("2024-11-12", 300, "tea")).unwrap();
    let (reopened, _) = open(&base);
    assert_eq!(reopened.len(), 1);
}

#[test]
fn precise_amounts_reload_unchanged() {
    let base = temp_base();
    let (mut ledger, _) = open(&base);
    let ryokan = parse_amount("123456789.125").unwrap();
    ledger
        .add(NewExpense::new(ryokan, "lodging").on(date("2024-11-10")))
        .unwrap();

    assert!(matches!(
        parse_amount("12345678901234567.89"),
        Err(LedgerError::InvalidAmount(_))
    ));
    let too_precise = Decimal::from_str("0.1234567890123456789").unwrap();
    assert!(matches!(
        ledger.add(NewExpense::new(too_precise, "tea")),
        Err(LedgerError::InvalidAmount(_))
    ));

    let expected = ledger.records().to_vec();
    drop(ledger);
    let (reopened, _) = open(&base);
    assert_eq!(reopened.records(), expected.as_slice());
    assert_eq!(reopened.grand_total(), ryokan);
}

#[test]
fn out_of_range_stored_amounts_are_dropped() {
    let base = temp_base();
    let store = JsonFileStore::new(base.join("store")).unwrap();
    fs::write(
        store.path_for(EXPENSES_KEY),
        r#"[
            {"date":"2024-11-10","amount":1000,"category":"food","description":"lunch"},
            {"date":"2024-11-10","amount":1e15,"category":"shopping","description":"typo"}
        ]"#,
    )
    .unwrap();

    let mut ledger = ExpenseLedger::local(KeyValueExpenseStore::new(store));
    let report = ledger.load().unwrap();
    assert_eq!(report.loaded, 1);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(ledger.grand_total(), Decimal::from(1000));
}
