//! Parsing of operator-entered temperatures.
//!
//! Operators type temperatures with a decimal comma (`"3,8"`). The text is
//! parsed once at the boundary into a [`Temperature`]; everything downstream
//! compares plain numbers. The verbatim text is kept by callers for display.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A measured temperature in degrees Celsius. Always finite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Temperature(f64);

impl Temperature {
  /// Returns `None` for NaN and infinities.
  pub fn from_celsius(value: f64) -> Option<Self> {
    value.is_finite().then_some(Self(value))
  }

  pub fn celsius(self) -> f64 { self.0 }
}

/// Parse operator text such as `"3,8"`, `"-18"` or `" 4.0 "`.
///
/// Accepts an optional sign, digits and a single decimal separator (comma or
/// dot). Anything else, including exponents, `inf` and thousands separators,
/// is rejected.
pub fn parse_temperature(text: &str) -> Result<Temperature> {
  let reject = || Error::UnparseableTemperature(text.to_owned());

  let trimmed = text.trim();
  let unsigned = trimmed
    .strip_prefix(['-', '+'])
    .unwrap_or(trimmed);

  let separators = unsigned.chars().filter(|c| matches!(c, ',' | '.')).count();
  let digits = unsigned.chars().filter(char::is_ascii_digit).count();
  if digits == 0
    || separators > 1
    || digits + separators != unsigned.chars().count()
  {
    return Err(reject());
  }

  let normalized = trimmed.replace(',', ".");
  let value: f64 = normalized.parse().map_err(|_| reject())?;
  Temperature::from_celsius(value).ok_or_else(reject)
}

/// Formats with a decimal comma, the way operators write it.
impl fmt::Display for Temperature {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = format!("{}", self.0);
    f.write_str(&text.replace('.', ","))
  }
}
