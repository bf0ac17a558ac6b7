//! Derived views over the expense collection. Everything here is pure and
//! recomputed from the full record list on every read.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::record::ExpenseRecord;

/// Spending for one category within a day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: Decimal,
}

/// Per-date aggregation. Category totals always sum to `total`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total: Decimal,
    pub categories: Vec<CategoryTotal>,
}

/// How records sharing a date are ordered in the detail list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    /// Keep the order records were added in.
    InsertionOrder,
    /// Most recently created first; records without a timestamp sort last.
    NewestFirst,
}

/// Groups records by date and then category, newest date first and
/// categories in ascending name order.
pub fn compute_summary(records: &[ExpenseRecord]) -> Vec<DailySummary> {
    let mut by_date: BTreeMap<NaiveDate, BTreeMap<&str, Decimal>> = BTreeMap::new();
    for record in records {
        let slot = by_date
            .entry(record.date)
            .or_default()
            .entry(record.category.as_str())
            .or_insert(Decimal::ZERO);
        *slot = slot.saturating_add(record.amount);
    }

    by_date
        .into_iter()
        .rev()
        .map(|(date, categories)| {
            let categories: Vec<CategoryTotal> = categories
                .into_iter()
                .map(|(category, amount)| CategoryTotal {
                    category: category.to_string(),
                    amount,
                })
                .collect();
            DailySummary {
                date,
                total: total_of(categories.iter().map(|entry| entry.amount)),
                categories,
            }
        })
        .collect()
}

/// Returns the records sorted by date descending.
pub fn render_order(records: &[ExpenseRecord], tie_break: TieBreak) -> Vec<&ExpenseRecord> {
    let mut sorted: Vec<&ExpenseRecord> = records.iter().collect();
    match tie_break {
        TieBreak::InsertionOrder => sorted.sort_by(|a, b| b.date.cmp(&a.date)),
        TieBreak::NewestFirst => sorted.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        }),
    }
    sorted
}

pub fn grand_total(records: &[ExpenseRecord]) -> Decimal {
    total_of(records.iter().map(|record| record.amount))
}

/// Saturates at `Decimal::MAX` instead of overflowing.
fn total_of(amounts: impl Iterator<Item = Decimal>) -> Decimal {
    amounts.fold(Decimal::ZERO, Decimal::saturating_add)
}
