use thiserror::Error;

use crate::ledger::RecordId;

/// Error type that captures the ledger's recoverable failure conditions.
///
/// None of these are fatal: callers turn them into a status message or a
/// rejected form action and keep going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Invalid amount `{0}`: expected a positive number")]
    InvalidAmount(String),
    #[error("Invalid date `{0}`: expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Invalid exchange rate `{0}`: expected a positive number")]
    InvalidRate(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Expense not found: {0}")]
    NotFound(String),
    #[error("Persisted data is malformed: {0}")]
    MalformedPersistedData(String),
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),
}

impl LedgerError {
    pub fn not_found(id: RecordId) -> Self {
        LedgerError::NotFound(id.to_string())
    }

    /// True for failures of the storage backend rather than of caller input.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            LedgerError::PersistenceUnavailable(_) | LedgerError::MalformedPersistedData(_)
        )
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::PersistenceUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::MalformedPersistedData(err.to_string())
    }
}
