mod common;

use common::{date, expense, local_ledger, FlakyStore};
use rust_decimal::Decimal;
use trip_ledger::{
    errors::LedgerError,
    ledger::{max_amount, parse_amount, CategoryTotal, LedgerStatus, NewExpense, RecordId},
    storage::{KeyValueStore, MemoryKeyValueStore, EXPENSES_KEY},
};

#[test]
fn same_day_expenses_group_by_category() {
    let mut ledger = local_ledger(MemoryKeyValueStore::new());
    ledger
        .add(expense("2024-11-10", 1000, "food").described("lunch"))
        .unwrap();
    ledger.add(expense("2024-11-10", 500, "transport")).unwrap();

    let summary = ledger.compute_summary();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].date, date("2024-11-10"));
    assert_eq!(summary[0].total, Decimal::from(1500));
    assert_eq!(
        summary[0].categories,
        vec![
            CategoryTotal {
                category: "food".into(),
                amount: Decimal::from(1000),
            },
            CategoryTotal {
                category: "transport".into(),
                amount: Decimal::from(500),
            },
        ]
    );
}

#[test]
fn negative_amount_is_rejected() {
    let mut ledger = local_ledger(MemoryKeyValueStore::new());
    let err = ledger
        .add(NewExpense::new(Decimal::from(-5), "food"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));
    assert!(ledger.is_empty());

    let err = NewExpense::from_input("", "five", "food", "").unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));
}

#[test]
fn largest_amounts_still_total() {
    let mut ledger = local_ledger(MemoryKeyValueStore::new());
    for raw in ["50000000000000000000000000000", "1000000000000.01"] {
        assert!(
            matches!(parse_amount(raw), Err(LedgerError::InvalidAmount(_))),
            "`{raw}` should be rejected"
        );
    }
    let huge = Decimal::from_i128_with_scale(50_000_000_000_000_000_000_000_000_000, 0);
    assert!(matches!(
        ledger.add(NewExpense::new(huge, "hotel")),
        Err(LedgerError::InvalidAmount(_))
    ));

    for _ in 0..2 {
        ledger
            .add(NewExpense::new(max_amount(), "hotel").on(date("2024-11-10")))
            .unwrap();
    }
    let doubled = max_amount() * Decimal::from(2);
    assert_eq!(ledger.grand_total(), doubled);
    assert_eq!(ledger.compute_summary()[0].total, doubled);
    assert_eq!(ledger.compute_summary()[0].categories[0].amount, doubled);
}

#[test]
fn newer_dates_render_first() {
    let mut ledger = local_ledger(MemoryKeyValueStore::new());
    ledger.add(expense("2024-11-09", 300, "temples")).unwrap();
    ledger.add(expense("2024-11-10", 200, "food")).unwrap();

    let order: Vec<_> = ledger.render_order().iter().map(|r| r.date).collect();
    assert_eq!(order, [date("2024-11-10"), date("2024-11-09")]);
}

#[test]
fn same_date_keeps_insertion_order_locally() {
    let mut ledger = local_ledger(MemoryKeyValueStore::new());
    ledger.add(expense("2024-11-10", 1, "first")).unwrap();
    ledger.add(expense("2024-11-11", 2, "newer day")).unwrap();
    ledger.add(expense("2024-11-10", 3, "second")).unwrap();

    let categories: Vec<_> = ledger
        .render_order()
        .iter()
        .map(|r| r.category.as_str())
        .collect();
    assert_eq!(categories, ["newer day", "first", "second"]);
}

#[test]
fn invalid_json_loads_as_empty() {
    let store = MemoryKeyValueStore::new();
    store.set(EXPENSES_KEY, "[{\"date\": ").unwrap();

    let mut ledger = local_ledger(store.clone());
    assert!(ledger.is_empty());
    let report = ledger.load().unwrap();
    assert!(report.reset);
    assert_eq!(report.loaded, 0);
    assert_eq!(ledger.status(), &LedgerStatus::Ready);
    assert!(ledger.compute_summary().is_empty());
}

#[test]
fn deleting_the_only_record_zeroes_everything() {
    let mut ledger = local_ledger(MemoryKeyValueStore::new());
    let id = ledger.add(expense("2024-11-10", 1200, "food")).unwrap();

    let removed = ledger.delete(id).unwrap();
    assert_eq!(removed.amount, Decimal::from(1200));
    assert_eq!(ledger.grand_total(), Decimal::ZERO);
    assert!(ledger.compute_summary().is_empty());
}

#[test]
fn add_grows_bucket_and_total_by_amount() {
    let mut ledger = local_ledger(MemoryKeyValueStore::new());
    ledger.add(expense("2024-11-10", 700, "food")).unwrap();
    let before_total = ledger.grand_total();

    ledger
        .add(NewExpense::new(Decimal::new(12345, 2), "food").on(date("2024-11-10")))
        .unwrap();

    let summary = ledger.compute_summary();
    assert_eq!(summary[0].categories[0].amount, Decimal::new(82345, 2));
    assert_eq!(ledger.grand_total() - before_total, Decimal::new(12345, 2));
}

#[test]
fn summary_is_idempotent() {
    let mut ledger = local_ledger(MemoryKeyValueStore::new());
    ledger.add(expense("2024-11-10", 700, "food")).unwrap();
    ledger.add(expense("2024-11-11", 300, "tea")).unwrap();
    assert_eq!(ledger.compute_summary(), ledger.compute_summary());
}

#[test]
fn persisted_collection_round_trips() {
    let store = MemoryKeyValueStore::new();
    let mut writer = local_ledger(store.clone());
    writer
        .add(expense("2024-11-10", 1000, "food").described("lunch"))
        .unwrap();
    writer.add(expense("2024-11-11", 250, "bus")).unwrap();

    let reader = local_ledger(store);
    assert_eq!(reader.records(), writer.records());
}

#[test]
fn deleting_unknown_id_changes_nothing() {
    let mut ledger = local_ledger(MemoryKeyValueStore::new());
    ledger.add(expense("2024-11-10", 900, "food")).unwrap();

    let err = ledger.delete(RecordId::new()).unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.grand_total(), Decimal::from(900));

    assert!(matches!(
        ledger.delete_at(5),
        Err(LedgerError::NotFound(_))
    ));
}

#[test]
fn delete_at_targets_the_displayed_row() {
    let mut ledger = local_ledger(MemoryKeyValueStore::new());
    ledger.add(expense("2024-11-09", 100, "older")).unwrap();
    ledger.add(expense("2024-11-10", 200, "newer")).unwrap();

    let removed = ledger.delete_at(0).unwrap();
    assert_eq!(removed.category, "newer");
    assert_eq!(ledger.records()[0].category, "older");
}

#[test]
fn clear_empties_everything() {
    let mut ledger = local_ledger(MemoryKeyValueStore::new());
    ledger.add(expense("2024-11-10", 100, "food")).unwrap();
    ledger.add(expense("2024-11-11", 200, "food")).unwrap();

    assert_eq!(ledger.clear().unwrap(), 2);
    assert!(ledger.is_empty());
    assert!(ledger.compute_summary().is_empty());
}

#[test]
fn failed_local_write_rolls_back_and_degrades() {
    let store = FlakyStore::default();
    let mut ledger = local_ledger(store.clone());
    ledger.add(expense("2024-11-10", 100, "food")).unwrap();

    store.fail_writes(true);
    let err = ledger.add(expense("2024-11-10", 50, "snack")).unwrap_err();
    assert!(matches!(err, LedgerError::PersistenceUnavailable(_)));
    assert_eq!(ledger.len(), 1);
    assert!(matches!(ledger.status(), LedgerStatus::Degraded(_)));
    assert!(ledger.clear().is_err());
    assert_eq!(ledger.len(), 1);

    store.fail_writes(false);
    ledger.add(expense("2024-11-10", 50, "snack")).unwrap();
    assert_eq!(ledger.status(), &LedgerStatus::Ready);
    assert_eq!(local_ledger(store).len(), 2);
}

#[test]
fn missing_date_uses_clock_today() {
    let mut ledger = local_ledger(MemoryKeyValueStore::new());
    let id = ledger
        .add(NewExpense::from_input(" ", "1,500", "food", "").unwrap())
        .unwrap();
    let record = ledger.get(id).unwrap();
    assert_eq!(record.date, common::today());
    assert_eq!(record.amount, Decimal::from(1500));
    assert_eq!(record.label(), "food");
}
