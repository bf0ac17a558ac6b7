//! Expense records, the ledger engine that owns them, and derived views.

pub mod engine;
pub mod record;
pub mod summary;

pub use engine::{Backend, ChangeListener, ExpenseLedger, LedgerStatus, LedgerView, LoadReport};
pub use record::{
    max_amount, parse_amount, parse_date, ExpenseRecord, NewExpense, RecordId, DATE_FORMAT,
};
pub use summary::{
    compute_summary, grand_total, render_order, CategoryTotal, DailySummary, TieBreak,
};
