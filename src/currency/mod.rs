//! Home-currency formatting and the JPY→TWD converter with a persisted rate.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{errors::LedgerError, storage::KeyValueStore};

/// Key under which the exchange rate is stored.
pub const RATE_KEY: &str = "exchangeRate";

/// Fraction digits shown for ledger amounts.
pub const AMOUNT_FRACTION_DIGITS: u32 = 3;
/// Fraction digits shown for converted amounts.
pub const CONVERTED_FRACTION_DIGITS: u32 = 2;
/// Rates are saved with full precision; this only bounds what is shown.
pub const RATE_FRACTION_DIGITS: u32 = 6;

/// Rate used until the traveller saves one: 1 JPY = 0.22 TWD.
pub fn default_rate() -> Decimal {
    Decimal::new(22, 2)
}

/// ISO 4217 currency representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CurrencyCode(pub String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("JPY")
    }
}

/// Separators used when rendering numbers for a language tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberLocale {
    pub decimal_separator: char,
    pub grouping_separator: char,
}

impl Default for NumberLocale {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
            grouping_separator: ',',
        }
    }
}

impl NumberLocale {
    /// Language tags with known separators, e.g. `en-US` or `de-DE`.
    pub const SUPPORTED: [&'static str; 10] = [
        "en-US", "en-GB", "ja-JP", "zh-TW", "ko-KR", "de-DE", "es-ES", "it-IT", "nl-NL",
        "fr-FR",
    ];

    /// The supported spelling of `tag`, matched case-insensitively.
    pub fn canonical_tag(tag: &str) -> Option<&'static str> {
        Self::SUPPORTED
            .into_iter()
            .find(|known| known.eq_ignore_ascii_case(tag.trim()))
    }

    pub fn for_tag(tag: &str) -> Option<Self> {
        let (decimal_separator, grouping_separator) = match Self::canonical_tag(tag)? {
            "de-DE" | "es-ES" | "it-IT" | "nl-NL" => (',', '.'),
            "fr-FR" => (',', ' '),
            _ => ('.', ','),
        };
        Some(Self {
            decimal_separator,
            grouping_separator,
        })
    }
}

/// Formats `value` en-US style: thousands grouped with `,`, at most
/// `max_fraction_digits` decimals, trailing zeros dropped.
pub fn format_amount(value: Decimal, max_fraction_digits: u32) -> String {
    format_number(&NumberLocale::default(), value, max_fraction_digits)
}

/// Like [`format_amount`] with the separators of `locale`.
pub fn format_number(locale: &NumberLocale, value: Decimal, max_fraction_digits: u32) -> String {
    let rounded = value
        .round_dp_with_strategy(max_fraction_digits, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let body = rounded.abs().to_string();
    let (int_part, fraction) = match body.split_once('.') {
        Some((int_part, fraction)) => (int_part, Some(fraction)),
        None => (body.as_str(), None),
    };
    let mut out = String::new();
    if rounded.is_sign_negative() && !rounded.is_zero() {
        out.push('-');
    }
    out.push_str(&group_digits(int_part, locale.grouping_separator));
    if let Some(fraction) = fraction {
        out.push(locale.decimal_separator);
        out.push_str(fraction);
    }
    out
}

/// Amount followed by its currency code, e.g. `1,500 JPY`.
pub fn format_money(value: Decimal, code: &CurrencyCode) -> String {
    format_money_in(&NumberLocale::default(), value, code)
}

pub fn format_money_in(locale: &NumberLocale, value: Decimal, code: &CurrencyCode) -> String {
    format!(
        "{} {}",
        format_number(locale, value, AMOUNT_FRACTION_DIGITS),
        code.as_str()
    )
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::new();
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, separator);
        }
        grouped.insert(0, ch);
    }
    grouped
}

/// Result of a conversion, kept together for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub amount: Decimal,
    pub rate: Decimal,
    pub converted: Decimal,
}

impl Conversion {
    pub fn display(&self) -> String {
        self.display_in(&NumberLocale::default())
    }

    pub fn display_in(&self, locale: &NumberLocale) -> String {
        format!(
            "{} {} = {} {} (rate {})",
            format_number(locale, self.amount, AMOUNT_FRACTION_DIGITS),
            self.from.as_str(),
            format_number(locale, self.converted, CONVERTED_FRACTION_DIGITS),
            self.to.as_str(),
            format_number(locale, self.rate, RATE_FRACTION_DIGITS)
        )
    }
}

/// Converter whose rate lives in a [`KeyValueStore`] next to the expenses.
#[derive(Debug, Clone)]
pub struct RateBook<S> {
    store: S,
    from: CurrencyCode,
    to: CurrencyCode,
    fallback: Decimal,
}

impl<S: KeyValueStore> RateBook<S> {
    pub fn new(store: S, from: CurrencyCode, to: CurrencyCode) -> Self {
        Self {
            store,
            from,
            to,
            fallback: default_rate(),
        }
    }

    /// Overrides the rate used when nothing valid is stored.
    pub fn with_fallback(mut self, fallback: Decimal) -> Self {
        if fallback > Decimal::ZERO {
            self.fallback = fallback;
        }
        self
    }

    pub fn pair(&self) -> (&CurrencyCode, &CurrencyCode) {
        (&self.from, &self.to)
    }

    /// The saved rate, or the fallback when none is saved or it is unusable.
    pub fn rate(&self) -> Decimal {
        match self.store.get(RATE_KEY) {
            Ok(Some(raw)) => match Decimal::from_str(raw.trim()) {
                Ok(rate) if rate > Decimal::ZERO => rate,
                _ => {
                    warn!(%raw, "ignoring unusable stored exchange rate");
                    self.fallback
                }
            },
            Ok(None) => self.fallback,
            Err(err) => {
                warn!(error = %err, "could not read exchange rate");
                self.fallback
            }
        }
    }

    /// Validates and stores a new rate. Rejected input leaves the previous
    /// rate in place.
    pub fn set_rate(&self, raw: &str) -> Result<Decimal, LedgerError> {
        let rate = Decimal::from_str(raw.trim())
            .ok()
            .filter(|rate| *rate > Decimal::ZERO)
            .ok_or_else(|| LedgerError::InvalidRate(raw.trim().to_string()))?;
        let rate = rate.normalize();
        self.store.set(RATE_KEY, &rate.to_string())?;
        Ok(rate)
    }

    /// Fails only when the product does not fit in a `Decimal`.
    pub fn convert(&self, amount: Decimal) -> Result<Conversion, LedgerError> {
        let rate = self.rate();
        let converted = amount.checked_mul(rate).ok_or_else(|| {
            LedgerError::InvalidAmount(format!("{amount} is too large to convert at rate {rate}"))
        })?;
        Ok(Conversion {
            from: self.from.clone(),
            to: self.to.clone(),
            amount,
            rate,
            converted,
        })
    }

    /// Converts raw user input; anything that is not a number counts as zero.
    pub fn convert_input(&self, raw: &str) -> Result<Conversion, LedgerError> {
        let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
        let amount = Decimal::from_str(&cleaned).unwrap_or(Decimal::ZERO);
        self.convert(amount)
    }
}
