//! Non-negative number validation while typing or after data entry.

use crate::model::format_number;

/// Coerce field text to a number.
///
/// Blank (or all-whitespace) text coerces to `0`. Otherwise the trimmed text
/// may only contain ASCII digits, a sign, a decimal point and an exponent
/// marker, and must parse as an `f64`. Overflowing literals such as `1e400`
/// yield infinity; callers that need a finite value check for it.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return None;
    }
    match trimmed.parse::<f64>() {
        // -0 normalizes to 0
        Ok(v) if !v.is_nan() => Some(v + 0.0),
        _ => None,
    }
}

/// A pending change to an input field's contents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputChange {
    pub text: String,
    pub default_prevented: bool,
}

impl InputChange {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            default_prevented: false,
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }
}

/// Check the prospective value of a field for validity.
///
/// Returns `true` when the text is a number zero or greater. Otherwise the
/// text is blanked, the default action is suppressed and `false` is returned.
pub fn check_number(event: &mut InputChange) -> bool {
    match parse_number(&event.text) {
        Some(value) if value >= 0.0 && !format_number(value).is_empty() => true,
        _ => {
            event.text.clear();
            event.prevent_default();
            false
        }
    }
}
