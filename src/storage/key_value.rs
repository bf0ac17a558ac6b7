use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use tracing::debug;

use super::{Result, SnapshotStore};
use crate::{errors::LedgerError, ledger::ExpenseRecord};

/// Fixed key holding the JSON array of expenses.
pub const EXPENSES_KEY: &str = "kyotoExpenses";

/// Minimal string key-value storage, in the spirit of a browser's local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local key-value store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| LedgerError::PersistenceUnavailable("memory store lock poisoned".into()))
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// Stores the expense collection as one JSON array under [`EXPENSES_KEY`].
#[derive(Debug, Clone)]
pub struct KeyValueExpenseStore<S> {
    store: S,
}

impl<S: KeyValueStore> KeyValueExpenseStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }
}

impl<S: KeyValueStore> SnapshotStore for KeyValueExpenseStore<S> {
    fn read(&self) -> Result<Vec<ExpenseRecord>> {
        let Some(raw) = self.store.get(EXPENSES_KEY)? else {
            debug!("no persisted expenses under `{}`", EXPENSES_KEY);
            return Ok(Vec::new());
        };
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_all(&self, records: &[ExpenseRecord]) -> Result<()> {
        let json = serde_json::to_string(records)
            .map_err(|err| LedgerError::PersistenceUnavailable(err.to_string()))?;
        self.store.set(EXPENSES_KEY, &json)
    }
}
