use std::{collections::HashSet, fmt, sync::Arc, time::Duration};

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::{
    record::{max_amount, validate_amount, ExpenseRecord, NewExpense, RecordId},
    summary::{self, DailySummary, TieBreak},
};
use crate::{
    errors::LedgerError,
    storage::{DocumentStore, SnapshotEvent, SnapshotStore, Subscription},
    time::{Clock, SystemClock},
};

/// Where the ledger mirrors its records.
pub enum Backend {
    /// Whole collection rewritten on every mutation.
    Local(Box<dyn SnapshotStore>),
    /// Single-record writes, with snapshots pushed back over a subscription.
    Remote(Box<dyn DocumentStore>),
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Local(_) => f.write_str("Backend::Local"),
            Backend::Remote(_) => f.write_str("Backend::Remote"),
        }
    }
}

/// Caller-visible health of the persistence backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerStatus {
    Ready,
    Degraded(String),
}

/// Outcome of [`ExpenseLedger::load`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    /// True when stored data could not be parsed and the ledger started empty.
    pub reset: bool,
    pub warnings: Vec<String>,
}

/// Everything the presentation layer re-requests after a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerView {
    pub rows: Vec<ExpenseRecord>,
    pub summary: Vec<DailySummary>,
    pub total: Decimal,
}

pub type ChangeListener = Box<dyn FnMut(&LedgerView) + Send>;

enum RemoteOp {
    Write(ExpenseRecord),
    Delete(Vec<RecordId>),
}

/// Owns the expense collection and keeps it mirrored to a [`Backend`].
pub struct ExpenseLedger {
    records: Vec<ExpenseRecord>,
    backend: Backend,
    clock: Arc<dyn Clock>,
    subscription: Option<Subscription>,
    status: LedgerStatus,
    listener: Option<ChangeListener>,
}

impl fmt::Debug for ExpenseLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpenseLedger")
            .field("records", &self.records.len())
            .field("backend", &self.backend)
            .field("subscribed", &self.subscription.is_some())
            .field("status", &self.status)
            .finish()
    }
}

impl ExpenseLedger {
    pub fn new(backend: Backend) -> Self {
        Self {
            records: Vec::new(),
            backend,
            clock: Arc::new(SystemClock),
            subscription: None,
            status: LedgerStatus::Ready,
            listener: None,
        }
    }

    pub fn local(store: impl SnapshotStore + 'static) -> Self {
        Self::new(Backend::Local(Box::new(store)))
    }

    pub fn remote(store: impl DocumentStore + 'static) -> Self {
        Self::new(Backend::Remote(Box::new(store)))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Registers a callback invoked with a fresh [`LedgerView`] after every
    /// load, mutation and applied snapshot.
    pub fn on_change(&mut self, listener: impl FnMut(&LedgerView) + Send + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn records(&self) -> &[ExpenseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn status(&self) -> &LedgerStatus {
        &self.status
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.backend, Backend::Remote(_))
    }

    pub fn get(&self, id: RecordId) -> Option<&ExpenseRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Reads the persisted collection in full, replacing the in-memory one.
    ///
    /// Malformed stored data is not an error: it is logged, the ledger
    /// starts empty and the report says so. An unreachable backend is.
    pub fn load(&mut self) -> Result<LoadReport, LedgerError> {
        let read = match &self.backend {
            Backend::Local(store) => store.read(),
            Backend::Remote(store) => store.read(),
        };

        let mut report = LoadReport::default();
        match read {
            Ok(records) => {
                self.records = sanitize(records, &mut report.warnings);
            }
            Err(LedgerError::MalformedPersistedData(reason)) => {
                warn!(%reason, "persisted expenses are malformed; starting empty");
                self.records.clear();
                report.reset = true;
                report.warnings.push(format!(
                    "Stored expenses could not be read ({reason}); starting empty."
                ));
            }
            Err(err) => {
                let err = self.persistence_failed(err);
                self.notify();
                return Err(err);
            }
        }

        for warning in &report.warnings {
            warn!("{warning}");
        }
        report.loaded = self.records.len();
        self.status = LedgerStatus::Ready;
        info!(records = report.loaded, remote = self.is_remote(), "expenses loaded");
        self.notify();
        Ok(report)
    }

    /// Validates and appends a new expense, then persists it.
    pub fn add(&mut self, draft: NewExpense) -> Result<RecordId, LedgerError> {
        let amount = validate_amount(draft.amount, &draft.amount.to_string())?;
        let category = draft.category.trim().to_string();
        if category.is_empty() {
            return Err(LedgerError::Validation("category must not be empty".into()));
        }
        let description = draft
            .description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| category.clone());

        let record = ExpenseRecord {
            date: draft.date.unwrap_or_else(|| self.clock.today()),
            amount,
            category,
            description,
            id: RecordId::new(),
            created_at: Some(self.clock.now()),
        };
        let id = record.id;
        debug!(%id, date = %record.date, amount = %record.amount, "adding expense");

        let previous = self.rollback_point();
        self.records.push(record.clone());
        let assigned = self.commit(previous, RemoteOp::Write(record))?;
        Ok(assigned.unwrap_or(id))
    }

    /// Removes the record with `id`.
    pub fn delete(&mut self, id: RecordId) -> Result<ExpenseRecord, LedgerError> {
        let Some(position) = self.records.iter().position(|record| record.id == id) else {
            warn!(%id, "delete requested for unknown expense");
            return Err(LedgerError::not_found(id));
        };
        let previous = self.rollback_point();
        let removed = self.records.remove(position);
        debug!(%id, amount = %removed.amount, "deleting expense");
        self.commit(previous, RemoteOp::Delete(vec![id]))?;
        Ok(removed)
    }

    /// Removes the record shown at zero-based `position` of the current
    /// render order. The position is resolved to a stable id at call time.
    pub fn delete_at(&mut self, position: usize) -> Result<ExpenseRecord, LedgerError> {
        let id = self
            .render_order()
            .get(position)
            .map(|record| record.id)
            .ok_or_else(|| {
                warn!(position, "delete requested for a row that is not displayed");
                LedgerError::NotFound(format!("row {}", position + 1))
            })?;
        self.delete(id)
    }

    /// Destroys the whole collection. Asking the user is the caller's job.
    pub fn clear(&mut self) -> Result<usize, LedgerError> {
        let previous = self.rollback_point();
        let ids: Vec<RecordId> = self.records.iter().map(|record| record.id).collect();
        let removed = ids.len();
        self.records.clear();
        info!(removed, "clearing all expenses");
        self.commit(previous, RemoteOp::Delete(ids))?;
        Ok(removed)
    }

    pub fn compute_summary(&self) -> Vec<DailySummary> {
        summary::compute_summary(&self.records)
    }

    pub fn render_order(&self) -> Vec<&ExpenseRecord> {
        summary::render_order(&self.records, self.tie_break())
    }

    pub fn grand_total(&self) -> Decimal {
        summary::grand_total(&self.records)
    }

    pub fn view(&self) -> LedgerView {
        LedgerView {
            rows: self.render_order().into_iter().cloned().collect(),
            summary: self.compute_summary(),
            total: self.grand_total(),
        }
    }

    fn tie_break(&self) -> TieBreak {
        match self.backend {
            Backend::Local(_) => TieBreak::InsertionOrder,
            Backend::Remote(_) => TieBreak::NewestFirst,
        }
    }

    /// Opens the standing snapshot subscription of a remote backend.
    pub fn subscribe(&mut self) -> Result<(), LedgerError> {
        let subscribed = match &self.backend {
            Backend::Remote(store) => store.subscribe(),
            Backend::Local(_) => {
                return Err(LedgerError::Validation(
                    "snapshot subscriptions need a document store".into(),
                ))
            }
        };
        match subscribed {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                Ok(())
            }
            Err(err) => Err(self.persistence_failed(err)),
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Drains pending subscription events without blocking and applies
    /// them in order. Returns how many events were handled.
    pub fn poll_snapshots(&mut self) -> Result<usize, LedgerError> {
        let mut handled = 0;
        loop {
            let next = match &self.subscription {
                Some(subscription) => subscription.try_next(),
                None => return Ok(handled),
            };
            match next {
                Ok(Some(event)) => {
                    self.apply_event(event);
                    handled += 1;
                }
                Ok(None) => return Ok(handled),
                Err(err) => {
                    self.subscription = None;
                    return Err(self.persistence_failed(err));
                }
            }
        }
    }

    /// Blocks up to `timeout` for one subscription event and applies it.
    pub fn wait_for_snapshot(&mut self, timeout: Duration) -> Result<bool, LedgerError> {
        let next = match &self.subscription {
            Some(subscription) => subscription.next_timeout(timeout),
            None => return Ok(false),
        };
        match next {
            Ok(Some(event)) => {
                self.apply_event(event);
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(err) => {
                self.subscription = None;
                Err(self.persistence_failed(err))
            }
        }
    }

    /// Replaces the collection wholesale with a backend snapshot.
    pub fn apply_snapshot(&mut self, records: Vec<ExpenseRecord>) {
        let mut warnings = Vec::new();
        self.records = sanitize(records, &mut warnings);
        for warning in warnings {
            warn!("{warning}");
        }
        self.status = LedgerStatus::Ready;
        debug!(records = self.records.len(), "applied snapshot");
        self.notify();
    }

    fn apply_event(&mut self, event: SnapshotEvent) {
        match event {
            SnapshotEvent::Snapshot(records) => self.apply_snapshot(records),
            SnapshotEvent::Failed(err) => {
                self.persistence_failed(err);
                self.notify();
            }
        }
    }

    fn rollback_point(&self) -> Option<Vec<ExpenseRecord>> {
        match self.backend {
            Backend::Local(_) => Some(self.records.clone()),
            Backend::Remote(_) => None,
        }
    }

    /// Persists the mutation already applied to `self.records`.
    ///
    /// Local failures restore `previous`; remote failures keep the
    /// optimistic state until the next snapshot arrives.
    fn commit(
        &mut self,
        previous: Option<Vec<ExpenseRecord>>,
        op: RemoteOp,
    ) -> Result<Option<RecordId>, LedgerError> {
        let outcome = match &self.backend {
            Backend::Local(store) => store.write_all(&self.records).map(|_| None),
            Backend::Remote(store) => match &op {
                RemoteOp::Write(record) => store.write_one(record).map(Some),
                RemoteOp::Delete(ids) => ids
                    .iter()
                    .try_for_each(|id| store.delete_one(*id))
                    .map(|_| None),
            },
        };

        match outcome {
            Ok(assigned) => {
                if let (Some(assigned), RemoteOp::Write(record)) = (assigned, &op) {
                    if assigned != record.id {
                        if let Some(stored) = self.records.iter_mut().find(|r| r.id == record.id) {
                            stored.id = assigned;
                        }
                    }
                }
                self.status = LedgerStatus::Ready;
                self.notify();
                Ok(assigned)
            }
            Err(err) => {
                if let Some(previous) = previous {
                    self.records = previous;
                }
                let err = self.persistence_failed(err);
                self.notify();
                Err(err)
            }
        }
    }

    fn persistence_failed(&mut self, err: LedgerError) -> LedgerError {
        let err = match err {
            LedgerError::PersistenceUnavailable(_) => err,
            other => LedgerError::PersistenceUnavailable(other.to_string()),
        };
        warn!(error = %err, "expense backend unavailable");
        self.status = LedgerStatus::Degraded(err.to_string());
        err
    }

    fn notify(&mut self) {
        if let Some(mut listener) = self.listener.take() {
            let view = self.view();
            listener(&view);
            self.listener = Some(listener);
        }
    }
}

/// Drops or repairs records read back from a backend.
fn sanitize(records: Vec<ExpenseRecord>, warnings: &mut Vec<String>) -> Vec<ExpenseRecord> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(records.len());
    for mut record in records {
        if record.amount <= Decimal::ZERO || record.amount > max_amount() {
            warnings.push(format!(
                "Dropped stored expense on {} with out-of-range amount {}.",
                record.date, record.amount
            ));
            continue;
        }
        if record.description.trim().is_empty() {
            record.description = record.category.clone();
        }
        if !seen.insert(record.id) {
            record.id = RecordId::new();
            seen.insert(record.id);
        }
        kept.push(record);
    }
    kept
}
