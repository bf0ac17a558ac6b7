use std::{
    collections::HashMap,
    sync::{mpsc, Arc, Mutex, MutexGuard},
};

use tracing::{debug, warn};

use super::{DocumentStore, Result, SnapshotEvent, Subscription};
use crate::{
    errors::LedgerError,
    ledger::{ExpenseRecord, RecordId},
};

/// In-process document store with hosted-database semantics: records are
/// addressed by id, writes are last-write-wins, and every change pushes a
/// full snapshot to all live subscribers. Clones share state, so one handle
/// can act as a second writer or toggle availability.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    state: Arc<Mutex<DocumentState>>,
}

#[derive(Debug, Default)]
struct DocumentState {
    documents: HashMap<RecordId, ExpenseRecord>,
    subscribers: Vec<mpsc::Sender<SnapshotEvent>>,
    offline: bool,
}

impl DocumentState {
    fn snapshot(&self) -> Vec<ExpenseRecord> {
        let mut records: Vec<ExpenseRecord> = self.documents.values().cloned().collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        records
    }

    fn broadcast(&mut self, event: SnapshotEvent) {
        let before = self.subscribers.len();
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        let dropped = before - self.subscribers.len();
        if dropped > 0 {
            debug!(dropped, "pruned closed snapshot subscribers");
        }
    }

    fn publish(&mut self) {
        let snapshot = self.snapshot();
        self.broadcast(SnapshotEvent::Snapshot(snapshot));
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline {
            return Err(LedgerError::PersistenceUnavailable(
                "document store is offline".into(),
            ));
        }
        Ok(())
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates losing or regaining the connection. Going offline notifies
    /// subscribers with a failure; coming back online republishes the data.
    pub fn set_offline(&self, offline: bool) -> Result<()> {
        let mut state = self.state()?;
        state.offline = offline;
        if offline {
            warn!("document store went offline");
            state.broadcast(SnapshotEvent::Failed(LedgerError::PersistenceUnavailable(
                "document store is offline".into(),
            )));
        } else {
            state.publish();
        }
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.state()?.documents.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn subscriber_count(&self) -> Result<usize> {
        Ok(self.state()?.subscribers.len())
    }

    fn state(&self) -> Result<MutexGuard<'_, DocumentState>> {
        self.state
            .lock()
            .map_err(|_| LedgerError::PersistenceUnavailable("document store lock poisoned".into()))
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn read(&self) -> Result<Vec<ExpenseRecord>> {
        let state = self.state()?;
        state.ensure_online()?;
        Ok(state.snapshot())
    }

    fn write_one(&self, record: &ExpenseRecord) -> Result<RecordId> {
        let mut state = self.state()?;
        state.ensure_online()?;
        state.documents.insert(record.id, record.clone());
        state.publish();
        Ok(record.id)
    }

    fn delete_one(&self, id: RecordId) -> Result<()> {
        let mut state = self.state()?;
        state.ensure_online()?;
        if state.documents.remove(&id).is_none() {
            debug!(%id, "delete of absent document ignored");
        }
        state.publish();
        Ok(())
    }

    fn subscribe(&self) -> Result<Subscription> {
        let mut state = self.state()?;
        state.ensure_online()?;
        let (tx, rx) = mpsc::channel();
        tx.send(SnapshotEvent::Snapshot(state.snapshot()))
            .map_err(|_| LedgerError::PersistenceUnavailable("subscriber closed".into()))?;
        state.subscribers.push(tx);
        Ok(Subscription::new(rx))
    }
}
