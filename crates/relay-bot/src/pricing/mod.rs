//! Dollar price conversion
//!
//! [`PriceRewriter`] scans a caption for `$` amounts and swaps each of them
//! for a line with the converted amount in the local currency. The live
//! exchange rate lives in [`source`].

pub mod source;

use crate::error::{Result, RelayError};
use regex::{Captures, Regex};
use std::sync::LazyLock;

pub use source::{ExchangeRateSource, PrivatBankSource};

/// Suffix appended to every converted amount
const WEIGHT_NOTE: &str = "+ вага";

/// `$` + integer part (thousands grouped with commas, or a plain digit run)
/// + optional two-digit fraction after `.` or `,`
///
/// ASCII digits only: `\d` would also admit fullwidth and other script digits.
static PRICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([0-9]{1,3}(?:,[0-9]{3})+|[0-9]+)(?:[.,]([0-9]{2}))?")
        .expect("price pattern is valid")
});

/// Rewrites dollar prices into local-currency lines
#[derive(Debug, Clone)]
pub struct PriceRewriter {
    unit: String,
}

impl Default for PriceRewriter {
    fn default() -> Self {
        Self::new("грн")
    }
}

impl PriceRewriter {
    /// Create a rewriter emitting amounts labelled with `unit`
    pub fn new(unit: impl Into<String>) -> Self {
        Self { unit: unit.into() }
    }

    /// Replace every dollar token in `text` with `"<amount> <unit> + вага\n"`
    ///
    /// Amounts are rounded half away from zero. Text without tokens is
    /// returned unchanged, and so is a token that runs on into non-ASCII
    /// digits.
    pub fn rewrite(&self, text: &str, rate: f64) -> String {
        PRICE_PATTERN
            .replace_all(text, |caps: &Captures<'_>| match dollar_value(text, caps) {
                Some(value) => {
                    let converted = (value * rate).round() as i64;
                    format!("{converted} {} {WEIGHT_NOTE}\n", self.unit)
                }
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Number of dollar tokens in `text` that [`rewrite`](Self::rewrite) converts
    pub fn count_prices(text: &str) -> usize {
        PRICE_PATTERN
            .captures_iter(text)
            .filter(|caps| dollar_value(text, caps).is_some())
            .count()
    }
}

/// Dollar amount of a matched token, `None` when the token is malformed
fn dollar_value(text: &str, caps: &Captures<'_>) -> Option<f64> {
    let end = caps.get(0).map_or(text.len(), |m| m.end());
    let runs_on = text[end..]
        .chars()
        .next()
        .is_some_and(|c| c.is_numeric() && !c.is_ascii_digit());
    if runs_on {
        return None;
    }

    let whole: String = caps[1].chars().filter(char::is_ascii_digit).collect();
    let number = match caps.get(2) {
        Some(fraction) => format!("{whole}.{}", fraction.as_str()),
        None => whole,
    };
    number.parse().ok()
}

/// Parse an operator-entered exchange rate (`40`, `40.5` or `40,5`)
pub fn parse_rate(input: &str) -> Result<f64> {
    let normalized = input.trim().replace(',', ".");
    let rate: f64 = normalized
        .parse()
        .map_err(|_| RelayError::MalformedInput(format!("not a number: {}", input.trim())))?;

    if !rate.is_finite() || rate <= 0.0 {
        return Err(RelayError::MalformedInput(format!(
            "rate must be positive: {}",
            input.trim()
        )));
    }

    Ok(rate)
}
