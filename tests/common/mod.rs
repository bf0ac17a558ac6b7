#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use tempfile::TempDir;
use trip_ledger::{
    errors::LedgerError,
    ledger::{ExpenseLedger, NewExpense},
    storage::{KeyValueExpenseStore, KeyValueStore, MemoryKeyValueStore},
    time::FixedClock,
};

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates a unique directory that outlives the calling test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid test date")
}

pub fn expense(day: &str, amount: i64, category: &str) -> NewExpense {
    NewExpense::new(Decimal::from(amount), category).on(date(day))
}

pub fn today() -> NaiveDate {
    date("2024-11-12")
}

/// Key-value store whose writes can be made to fail on demand.
#[derive(Debug, Clone, Default)]
pub struct FlakyStore {
    inner: MemoryKeyValueStore,
    failing: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &MemoryKeyValueStore {
        &self.inner
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, LedgerError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LedgerError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LedgerError::PersistenceUnavailable("quota exceeded".into()));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), LedgerError> {
        self.inner.remove(key)
    }
}

/// A loaded local ledger over `store` with the clock pinned to [`today`].
pub fn local_ledger<S: KeyValueStore + 'static>(store: S) -> ExpenseLedger {
    let mut ledger = ExpenseLedger::local(KeyValueExpenseStore::new(store))
        .with_clock(Arc::new(FixedClock::on(today())));
    ledger.load().expect("load local ledger");
    ledger
}
