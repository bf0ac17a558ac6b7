use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::LedgerError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Stable identifier assigned to an expense when it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| LedgerError::NotFound(raw.trim().to_string()))
    }

    /// First eight hex digits, enough to tell records apart on screen.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One spending event. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ExpenseRecord {
    /// Label shown in listings; falls back to the category for legacy rows
    /// persisted without a description.
    pub fn label(&self) -> &str {
        if self.description.trim().is_empty() {
            &self.category
        } else {
            &self.description
        }
    }
}

/// Caller-supplied data for a new expense, before defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpense {
    pub date: Option<NaiveDate>,
    pub amount: Decimal,
    pub category: String,
    pub description: Option<String>,
}

impl NewExpense {
    pub fn new(amount: Decimal, category: impl Into<String>) -> Self {
        Self {
            date: None,
            amount,
            category: category.into(),
            description: None,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builds a draft from raw form fields. Blank date and description are
    /// left for the ledger to default.
    pub fn from_input(
        date: &str,
        amount: &str,
        category: &str,
        description: &str,
    ) -> Result<Self, LedgerError> {
        let amount = parse_amount(amount)?;
        let date = if date.trim().is_empty() {
            None
        } else {
            Some(parse_date(date)?)
        };
        let description = Some(description.trim())
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        Ok(Self {
            date,
            amount,
            category: category.trim().to_string(),
            description,
        })
    }
}

/// Parses a user-typed amount, accepting `,` as a grouping separator.
pub fn parse_amount(raw: &str) -> Result<Decimal, LedgerError> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    let amount = Decimal::from_str(&cleaned)
        .map_err(|_| LedgerError::InvalidAmount(raw.trim().to_string()))?;
    validate_amount(amount, raw)
}

/// Largest amount a single expense may carry.
pub fn max_amount() -> Decimal {
    Decimal::from(1_000_000_000_000_i64)
}

/// Accepts amounts that are positive, at most [`max_amount`], and stored as
/// JSON numbers without losing digits.
pub(crate) fn validate_amount(amount: Decimal, raw: &str) -> Result<Decimal, LedgerError> {
    if amount <= Decimal::ZERO || amount > max_amount() || !survives_float_storage(amount) {
        return Err(LedgerError::InvalidAmount(raw.trim().to_string()));
    }
    Ok(amount)
}

/// Mirrors the float round trip amounts take through the persisted JSON.
fn survives_float_storage(amount: Decimal) -> bool {
    amount
        .to_f64()
        .and_then(|value| Decimal::from_str(&value.to_string()).ok())
        == Some(amount)
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, LedgerError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| LedgerError::InvalidDate(raw.trim().to_string()))
}
