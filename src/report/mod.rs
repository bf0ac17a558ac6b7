//! Text renderings of the ledger for the shell and for scripted output.

pub mod table;

use crate::{
    currency::{format_money_in, format_number, CurrencyCode, NumberLocale, AMOUNT_FRACTION_DIGITS},
    ledger::{grand_total, DailySummary, ExpenseRecord, DATE_FORMAT},
};

use table::{Column, TextTable};

pub const EMPTY_LEDGER: &str = "No expenses recorded yet.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Maximum line width; descriptions are truncated to fit.
    pub width: Option<usize>,
    pub plain: bool,
    pub locale: NumberLocale,
}

/// Renders rows in the order given, numbered from 1, followed by a total.
pub fn render_detail_table(
    rows: &[ExpenseRecord],
    currency: &CurrencyCode,
    options: ReportOptions,
) -> String {
    if rows.is_empty() {
        return EMPTY_LEDGER.to_string();
    }

    let mut table = TextTable::new(vec![
        Column::right("#"),
        Column::left("Date"),
        Column::left("Category"),
        Column::left("Description").flexible(),
        Column::right(format!("Amount ({})", currency.as_str())),
    ])
    .fit_to(options.width)
    .plain(options.plain);

    for (idx, record) in rows.iter().enumerate() {
        table.push(vec![
            (idx + 1).to_string(),
            record.date.format(DATE_FORMAT).to_string(),
            record.category.clone(),
            record.description.clone(),
            format_number(&options.locale, record.amount, AMOUNT_FRACTION_DIGITS),
        ]);
    }

    format!(
        "{}\nTotal: {}",
        table.render(),
        format_money_in(&options.locale, grand_total(rows), currency)
    )
}

/// Renders one block per day, newest first, with per-category subtotals.
pub fn render_daily_summary(
    summary: &[DailySummary],
    currency: &CurrencyCode,
    options: ReportOptions,
) -> String {
    if summary.is_empty() {
        return EMPTY_LEDGER.to_string();
    }

    summary
        .iter()
        .map(|day| {
            let mut block = format!(
                "{}  total {}",
                day.date.format(DATE_FORMAT),
                format_money_in(&options.locale, day.total, currency)
            );
            for entry in &day.categories {
                block.push_str(&format!(
                    "\n  {}: {}",
                    entry.category,
                    format_money_in(&options.locale, entry.amount, currency)
                ));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
