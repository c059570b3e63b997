//! Locale-aware parsing of numbers scraped from issuer pages.
//!
//! Issuer sites mix US ("1,234.56"), continental ("1.234,56") and Swiss
//! ("1'234.56") conventions. The separator that appears last decides which
//! one is the decimal mark; a lone separator followed by exactly three digits
//! is a thousands separator unless the field is a currency amount.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ParseNumberError;

lazy_static! {
    // A numeric token as it appears in page text: starts and ends with a digit.
    pub(crate) static ref NUMBER_TOKEN: Regex = Regex::new(r"\d(?:[\d.,'’]*\d)?").unwrap();

    static ref CURRENCY_CODE: Regex =
        Regex::new(r"(?i)^(?:usd|eur|gbp|gbx|chf|jpy|cad|aud|sek|nok|dkk|hkd|sgd)|(?:usd|eur|gbp|gbx|chf|jpy|cad|aud|sek|nok|dkk|hkd|sgd)$").unwrap();
}

/// How a pattern expects its number to be written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberFormat {
    /// Infer separators from the text
    #[default]
    Auto,

    /// Currency amount with two expected decimals; a lone separator is
    /// always the decimal mark
    Currency,
}

/// Parse a captured numeric string into an exact decimal.
pub fn parse_number(raw: &str, format: NumberFormat) -> Result<Decimal, ParseNumberError> {
    let cleaned = strip_decorations(raw);
    let (negative, body) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };
    let body = body.trim_end_matches(['.', ',']);

    if let Some(ch) = body
        .chars()
        .find(|c| !c.is_ascii_digit() && *c != '.' && *c != ',')
    {
        return Err(ParseNumberError::UnexpectedChar {
            input: raw.to_string(),
            ch,
        });
    }
    if !body.chars().any(|c| c.is_ascii_digit()) {
        return Err(ParseNumberError::NoDigits(raw.to_string()));
    }
    if body.starts_with(['.', ',']) {
        return Err(ParseNumberError::Grouping(raw.to_string()));
    }

    let canonical = canonicalize(body, format)
        .ok_or_else(|| ParseNumberError::Grouping(raw.to_string()))?;
    let canonical = if negative {
        format!("-{}", canonical)
    } else {
        canonical
    };

    Decimal::from_str(&canonical).map_err(|_| ParseNumberError::Overflow(raw.to_string()))
}

/// Remove currency symbols, currency codes, grouping spaces and apostrophes.
fn strip_decorations(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_code = CURRENCY_CODE.replace_all(trimmed, "");
    without_code
        .chars()
        .filter(|c| {
            !c.is_whitespace()
                && !matches!(
                    c,
                    '\'' | '’' | '$' | '€' | '£' | '¥' | '₣' | '\u{a0}' | '\u{202f}'
                )
        })
        .collect()
}

/// Rewrite `body` (digits and separators only) as "1234.56".
fn canonicalize(body: &str, format: NumberFormat) -> Option<String> {
    let last_dot = body.rfind('.');
    let last_comma = body.rfind(',');

    match (last_dot, last_comma) {
        (None, None) => Some(body.to_string()),
        (Some(d), Some(c)) => {
            let (decimal, thousands) = if d > c { ('.', ',') } else { (',', '.') };
            let split = d.max(c);
            let (int_part, frac_part) = (&body[..split], &body[split + 1..]);
            if frac_part.contains(decimal) || frac_part.contains(thousands) {
                return None;
            }
            if int_part.contains(decimal) {
                return None;
            }
            let int_digits = ungroup(int_part, thousands)?;
            Some(format!("{}.{}", int_digits, frac_part))
        }
        (Some(_), None) => single_separator(body, '.', format),
        (None, Some(_)) => single_separator(body, ',', format),
    }
}

/// Only one separator character is present.
fn single_separator(body: &str, sep: char, format: NumberFormat) -> Option<String> {
    let count = body.matches(sep).count();
    if count > 1 {
        return ungroup(body, sep);
    }

    let (int_part, frac_part) = body.split_once(sep)?;
    let looks_grouped = frac_part.len() == 3 && int_part != "0" && int_part.len() <= 3;

    if looks_grouped && format != NumberFormat::Currency {
        Some(format!("{}{}", int_part, frac_part))
    } else {
        Some(format!("{}.{}", int_part, frac_part))
    }
}

/// Strip thousands separators, checking that groups after the first have
/// exactly three digits.
fn ungroup(int_part: &str, sep: char) -> Option<String> {
    let groups: Vec<&str> = int_part.split(sep).collect();
    let (first, rest) = groups.split_first()?;
    if first.is_empty() || (!rest.is_empty() && first.len() > 3) {
        return None;
    }
    if rest.iter().any(|g| g.len() != 3) {
        return None;
    }
    Some(groups.concat())
}

/// Whether a value has no fractional part.
pub fn is_flat(value: Decimal) -> bool {
    value.fract().is_zero()
}
