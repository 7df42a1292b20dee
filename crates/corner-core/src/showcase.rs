//! Showcase (vitrine) traceability: items on display, their shelf life,
//! expiry alerts and duplicate detection.
//!
//! An item is active from the day it is added until it is removed. Removal
//! is a one-way transition stamped with the removal date.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Shelf life applied to every product, whatever its category.
pub const SHELF_LIFE_DAYS: u64 = 3;

/// Expiry date (DLC) for a product made on `production_date`, or `None` if
/// it falls past the last representable date.
pub fn expiry(production_date: NaiveDate) -> Option<NaiveDate> {
  production_date.checked_add_days(Days::new(SHELF_LIFE_DAYS))
}

/// Default lot identifier: `DDMMYYYY-XXX`, where `XXX` is the first three
/// characters of the product name, upper-cased.
pub fn generate_lot_id(production_date: NaiveDate, product: &str) -> String {
  let prefix: String = product.trim().chars().take(3).collect();
  format!("{}-{}", production_date.format("%d%m%Y"), prefix.to_uppercase())
}

// ─── Alerts ──────────────────────────────────────────────────────────────────

/// Expiry alert level. Orders most urgent first.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AlertBucket {
  Expired,
  Today,
  Ok,
}

pub fn alert_bucket(expiry_date: NaiveDate, today: NaiveDate) -> AlertBucket {
  match expiry_date.cmp(&today) {
    std::cmp::Ordering::Less => AlertBucket::Expired,
    std::cmp::Ordering::Equal => AlertBucket::Today,
    std::cmp::Ordering::Greater => AlertBucket::Ok,
  }
}

// ─── Item ────────────────────────────────────────────────────────────────────

/// A product on display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowcaseItem {
  pub item_id:         Uuid,
  pub product:         String,
  pub production_date: NaiveDate,
  /// Always `expiry(production_date)`; fixed at creation.
  pub expiry_date:     NaiveDate,
  pub added_on:        NaiveDate,
  pub lot_id:          String,
  pub removed_on:      Option<NaiveDate>,
}

impl ShowcaseItem {
  pub fn is_active(&self) -> bool { self.removed_on.is_none() }

  pub fn alert(&self, today: NaiveDate) -> AlertBucket {
    alert_bucket(self.expiry_date, today)
  }
}

/// `true` iff an active item in `items` has exactly `product` and
/// `production_date`.
pub fn is_duplicate(
  product: &str,
  production_date: NaiveDate,
  items: &[ShowcaseItem],
) -> bool {
  items.iter().any(|item| {
    item.is_active()
      && item.product == product
      && item.production_date == production_date
  })
}

/// Active items paired with their alert bucket, most urgent first, then by
/// expiry date and product.
pub fn alerts(
  items: &[ShowcaseItem],
  today: NaiveDate,
) -> Vec<(&ShowcaseItem, AlertBucket)> {
  let mut out: Vec<_> = items
    .iter()
    .filter(|item| item.is_active())
    .map(|item| (item, item.alert(today)))
    .collect();
  out.sort_by(|(a, ab), (b, bb)| {
    ab.cmp(bb)
      .then(a.expiry_date.cmp(&b.expiry_date))
      .then_with(|| a.product.cmp(&b.product))
  });
  out
}

// ─── Input ───────────────────────────────────────────────────────────────────

/// Input to [`crate::store::CornerStore::add_showcase_item`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewShowcaseItem {
  pub product:         String,
  pub production_date: NaiveDate,
  /// Generated with [`generate_lot_id`] when absent or blank.
  #[serde(default)]
  pub lot_id:          Option<String>,
}

impl NewShowcaseItem {
  pub fn new(product: impl Into<String>, production_date: NaiveDate) -> Self {
    Self { product: product.into(), production_date, lot_id: None }
  }

  /// Build the item to persist: trims the product name, fills the lot id and
  /// computes the expiry date. Does not check for duplicates.
  ///
  /// Fails with `EmptyProduct`, or `DateOutOfRange` when the expiry date
  /// cannot be represented.
  pub fn into_item(self, item_id: Uuid, added_on: NaiveDate) -> Result<ShowcaseItem> {
    let product = self.product.trim().to_owned();
    if product.is_empty() {
      return Err(Error::EmptyProduct);
    }
    let expiry_date = expiry(self.production_date)
      .ok_or(Error::DateOutOfRange(self.production_date))?;
    let lot_id = self
      .lot_id
      .map(|l| l.trim().to_owned())
      .filter(|l| !l.is_empty())
      .unwrap_or_else(|| generate_lot_id(self.production_date, &product));

    Ok(ShowcaseItem {
      item_id,
      expiry_date,
      production_date: self.production_date,
      product,
      added_on,
      lot_id,
      removed_on: None,
    })
  }
}
