//! Conversion between the percentage shown to the user and the fractional weight
//! stored by the backend.
//!
//! Every write path that changes a `weight` goes through [`from_display`] exactly once,
//! so the draft never holds a raw percentage.

use crate::error::{Result, RubricError};
use once_cell::sync::Lazy;
use regex::Regex;

/// Accepts `25`, `25.5`, `25,5`, `.5` and an optional trailing `%`, surrounded by blanks.
/// Signs are not accepted: a weight is never negative.
static PERCENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*((?:\d+(?:[.,]\d*)?|[.,]\d+))\s*%?\s*$")
        .expect("percent pattern is a valid regex")
});

/// Converts a stored fractional weight into the percentage shown to the user.
///
/// Example:
/// ```
/// assert_eq!(rubros_connector::weight::to_display(0.25), 25.0);
/// ```
pub fn to_display(weight: f64) -> f64 {
    weight * 100.0
}

/// Parses the text typed by the user as a percentage and returns the fractional weight.
///
/// Arguments:
/// - `percent_text`: the raw field contents, e.g. `"25"`, `"12,5"` or `"40 %"`.
///
/// Returns:
/// - `Ok(f64)`: the value divided by 100.
/// - `Err(RubricError::InvalidNumber)`: when the text is not a non-negative number.
pub fn from_display(percent_text: &str) -> Result<f64> {
    let captures = PERCENT_PATTERN
        .captures(percent_text)
        .ok_or_else(|| RubricError::InvalidNumber(percent_text.to_string()))?;
    let numeric = captures[1].replace(',', ".");
    let value: f64 = numeric
        .parse()
        .map_err(|_| RubricError::InvalidNumber(percent_text.to_string()))?;
    Ok(value / 100.0)
}

/// Renders a fractional weight as a percentage label, e.g. `1.1` → `"110%"`.
///
/// The percentage is rounded to two decimals and trailing zeros are dropped.
pub fn format_percent(weight: f64) -> String {
    let percent = (to_display(weight) * 100.0).round() / 100.0;
    let mut text = format!("{:.2}", percent);
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    if text == "-0" {
        text = "0".to_string();
    }
    format!("{}%", text)
}

/// Coerces a weight stored as text by the backend into a number.
///
/// Returns `None` when the text is not numeric; callers decide how to degrade.
pub(crate) fn parse_stored(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
