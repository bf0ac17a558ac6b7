//! Persistence backends for the expense ledger.
//!
//! Two shapes are supported. A [`SnapshotStore`] keeps the whole collection
//! as one value and is rewritten on every mutation. A [`DocumentStore`]
//! behaves like a hosted document database: single-record writes and
//! deletes, plus a standing subscription that pushes full snapshots.

pub mod document;
pub mod json_file;
pub mod key_value;

use std::{
    sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError},
    time::Duration,
};

use crate::{
    errors::LedgerError,
    ledger::{ExpenseRecord, RecordId},
};

pub type Result<T> = std::result::Result<T, LedgerError>;

pub use document::InMemoryDocumentStore;
pub use json_file::JsonFileStore;
pub use key_value::{KeyValueExpenseStore, KeyValueStore, MemoryKeyValueStore, EXPENSES_KEY};

/// Backend that stores the complete collection as a single value.
pub trait SnapshotStore: Send + Sync {
    fn read(&self) -> Result<Vec<ExpenseRecord>>;
    fn write_all(&self, records: &[ExpenseRecord]) -> Result<()>;
}

/// Backend that addresses records individually and pushes snapshots.
pub trait DocumentStore: Send + Sync {
    fn read(&self) -> Result<Vec<ExpenseRecord>>;
    fn write_one(&self, record: &ExpenseRecord) -> Result<RecordId>;
    fn delete_one(&self, id: RecordId) -> Result<()>;
    /// Opens a subscription; the current snapshot is delivered immediately.
    fn subscribe(&self) -> Result<Subscription>;
}

/// One delivery on a document-store subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotEvent {
    Snapshot(Vec<ExpenseRecord>),
    Failed(LedgerError),
}

/// Receiving end of a snapshot subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    events: Receiver<SnapshotEvent>,
}

impl Subscription {
    pub fn new(events: Receiver<SnapshotEvent>) -> Self {
        Self { events }
    }

    /// Returns the next pending event without blocking.
    pub fn try_next(&self) -> Result<Option<SnapshotEvent>> {
        match self.events.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(closed()),
        }
    }

    /// Blocks up to `timeout` for the next event.
    pub fn next_timeout(&self, timeout: Duration) -> Result<Option<SnapshotEvent>> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(closed()),
        }
    }
}

fn closed() -> LedgerError {
    LedgerError::PersistenceUnavailable("snapshot subscription closed".into())
}
