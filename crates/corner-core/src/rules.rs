//! The acceptance rule table: per food category (GEP denomination), the
//! temperature window a delivered product must respect on reception.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{Error, Result, temperature::Temperature};

// ─── Rule ────────────────────────────────────────────────────────────────────

/// Temperature window for one category. The implicit lower bound is 0 °C and
/// takes no part in decisions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceRule {
  /// The temperature the cold chain aims for. Informational only: the
  /// reception verdict is decided by `tolerance_max` alone.
  pub target_max:    f64,
  /// Inclusive ceiling above which a delivery is rejected.
  pub tolerance_max: f64,
}

impl AcceptanceRule {
  pub const fn new(target_max: f64, tolerance_max: f64) -> Self {
    Self { target_max, tolerance_max }
  }

  /// `true` when `measured` is at or below the tolerance ceiling.
  pub fn accepts(&self, measured: Temperature) -> bool {
    measured.celsius() <= self.tolerance_max
  }
}

// ─── Normalisation ───────────────────────────────────────────────────────────

/// Lookup key for a category label: trimmed, lowercase, accents stripped,
/// inner whitespace collapsed. `"Viande Hachée "` becomes `"viande hachee"`.
pub fn normalize_category(label: &str) -> String {
  let stripped: String = label
    .nfd()
    .filter(|c| !is_combining_mark(*c))
    .collect::<String>()
    .to_lowercase();
  stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ─── Table ───────────────────────────────────────────────────────────────────

/// Categories recognised out of the box. Several spellings that show up in
/// catalogs map to the same window.
const STANDARD_RULES: &[(&str, AcceptanceRule)] = &[
  ("viande hachee", AcceptanceRule::new(2.0, 3.0)),
  ("viande", AcceptanceRule::new(3.0, 5.0)),
  ("lait", AcceptanceRule::new(4.0, 6.0)),
  ("plat cuisine", AcceptanceRule::new(3.0, 5.0)),
  ("plat cuisine frais", AcceptanceRule::new(3.0, 5.0)),
  ("patisserie", AcceptanceRule::new(3.0, 5.0)),
  ("patisserie fraiche", AcceptanceRule::new(3.0, 5.0)),
  ("legume", AcceptanceRule::new(8.0, 10.0)),
  ("legumes", AcceptanceRule::new(8.0, 10.0)),
  ("poisson", AcceptanceRule::new(2.0, 3.0)),
];

/// An immutable mapping from normalised category to [`AcceptanceRule`].
///
/// Built once and handed to the evaluator; it is never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RuleTable {
  rules: BTreeMap<String, AcceptanceRule>,
}

impl RuleTable {
  /// Build a table from `(category, rule)` pairs.
  ///
  /// Keys are normalised with [`normalize_category`]. Fails with
  /// [`Error::InvalidRule`] if any rule has `target_max > tolerance_max` or a
  /// non-finite bound.
  pub fn new<I, K>(entries: I) -> Result<Self>
  where
    I: IntoIterator<Item = (K, AcceptanceRule)>,
    K: AsRef<str>,
  {
    let mut rules = BTreeMap::new();
    for (category, rule) in entries {
      let category = category.as_ref();
      if !(rule.target_max.is_finite()
        && rule.tolerance_max.is_finite()
        && rule.target_max <= rule.tolerance_max)
      {
        return Err(Error::InvalidRule {
          category:      category.to_owned(),
          target_max:    rule.target_max,
          tolerance_max: rule.tolerance_max,
        });
      }
      rules.insert(normalize_category(category), rule);
    }
    Ok(Self { rules })
  }

  /// The hand-maintained table used by the kiosk.
  pub fn standard() -> Self {
    Self {
      rules: STANDARD_RULES
        .iter()
        .map(|(category, rule)| ((*category).to_owned(), *rule))
        .collect(),
    }
  }

  /// Look up the rule for `category`, normalising it first. Blank labels and
  /// unknown categories have no rule.
  pub fn get(&self, category: &str) -> Option<&AcceptanceRule> {
    self.rules.get(&normalize_category(category))
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &AcceptanceRule)> {
    self.rules.iter().map(|(k, v)| (k.as_str(), v))
  }

  pub fn len(&self) -> usize { self.rules.len() }

  pub fn is_empty(&self) -> bool { self.rules.is_empty() }
}
