//! The reception evaluator: turns a measured temperature and a category into
//! an accept/reject verdict.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  rules::{AcceptanceRule, RuleTable},
  temperature::{Temperature, parse_temperature},
};

/// Outcome of a reception check.
///
/// `Unknown` means no rule could be applied (no category, or a category the
/// table does not cover). It is not a rejection and must never be counted as
/// one.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
  Accepted,
  Rejected,
  #[default]
  Unknown,
}

impl Verdict {
  /// `"accepted"`, `"rejected"`, or the empty string when no rule applied.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Accepted => "accepted",
      Self::Rejected => "rejected",
      Self::Unknown => "",
    }
  }

  /// Inverse of the stored form; the empty string and `"unknown"` both map
  /// to [`Verdict::Unknown`].
  pub fn from_stored(s: &str) -> Option<Self> {
    match s {
      "accepted" => Some(Self::Accepted),
      "rejected" => Some(Self::Rejected),
      "" | "unknown" => Some(Self::Unknown),
      _ => None,
    }
  }
}

impl fmt::Display for Verdict {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Applies a [`RuleTable`] to measured temperatures. Pure; holds no state
/// beyond the borrowed table.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
  rules: &'a RuleTable,
}

impl<'a> Evaluator<'a> {
  pub fn new(rules: &'a RuleTable) -> Self { Self { rules } }

  pub fn rule_for(&self, category: Option<&str>) -> Option<&'a AcceptanceRule> {
    category.and_then(|c| self.rules.get(c))
  }

  /// Numeric decision. The ceiling is inclusive.
  pub fn decide(&self, measured: Temperature, category: Option<&str>) -> Verdict {
    match self.rule_for(category) {
      Some(rule) if rule.accepts(measured) => Verdict::Accepted,
      Some(_) => Verdict::Rejected,
      None => Verdict::Unknown,
    }
  }

  /// Parse operator text and decide.
  ///
  /// Returns the parse failure instead of a verdict so callers can show a
  /// validation error rather than an empty result.
  pub fn check(&self, measured: &str, category: Option<&str>) -> Result<Verdict> {
    let temperature = parse_temperature(measured)?;
    Ok(self.decide(temperature, category))
  }

  /// Text-in, verdict-out form. Malformed text and missing rules both give
  /// [`Verdict::Unknown`]; use [`Evaluator::check`] to tell them apart.
  pub fn evaluate(&self, measured: &str, category: &str) -> Verdict {
    self.check(measured, Some(category)).unwrap_or(Verdict::Unknown)
  }
}
