//! Delivery temperature log.
//!
//! A delivery record is created when a unit leaves the kitchen, with its
//! departure temperature. It is completed exactly once on reception at the
//! corner, when the measured temperature is checked against the product's
//! category rule. Records are never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  catalog::CategoryResolver,
  reception::{Evaluator, Verdict},
  rules::RuleTable,
  temperature::parse_temperature,
};

/// The reception half of a delivery record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reception {
  /// Operator text, kept verbatim (decimal comma included).
  pub temperature: String,
  pub verdict:     Verdict,
  /// Opaque reference to an evidentiary photo.
  pub photo_ref:   Option<String>,
  /// Server-assigned.
  pub received_at: DateTime<Utc>,
}

/// One temperature check for one shipped unit of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
  pub delivery_id:           Uuid,
  pub product:               String,
  /// Operator text, kept verbatim.
  pub departure_temperature: String,
  /// Server-assigned; never changes after creation.
  pub departure_at:          DateTime<Utc>,
  /// Resolved once at departure. `None` when the catalog did not know the
  /// product.
  pub category:              Option<String>,
  pub reception:             Option<Reception>,
}

impl DeliveryRecord {
  pub fn is_received(&self) -> bool { self.reception.is_some() }

  /// [`Verdict::Unknown`] until the reception has been recorded.
  pub fn verdict(&self) -> Verdict {
    self
      .reception
      .as_ref()
      .map(|r| r.verdict)
      .unwrap_or_default()
  }

  /// Validate a reception for this record and compute its verdict.
  ///
  /// The category cached at departure is used; if it was blank, the product
  /// is resolved again against `resolver` so a catalog fixed in the meantime
  /// still yields a verdict.
  pub fn assess_reception(
    &self,
    input: ReceptionInput,
    resolver: &CategoryResolver,
    rules: &RuleTable,
  ) -> Result<NewReception> {
    if self.is_received() {
      return Err(Error::AlreadyReceived(self.delivery_id));
    }

    let measured = parse_temperature(&input.temperature)?;
    let category = self
      .category
      .clone()
      .or_else(|| resolver.resolve(&self.product).map(str::to_owned));
    let verdict = Evaluator::new(rules).decide(measured, category.as_deref());

    Ok(NewReception {
      temperature: input.temperature.trim().to_owned(),
      category,
      verdict,
      photo_ref: input
        .photo_ref
        .map(|p| p.trim().to_owned())
        .filter(|p| !p.is_empty()),
    })
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::CornerStore::log_departure`].
/// `departure_at` is always set by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDelivery {
  pub product:               String,
  pub departure_temperature: String,
  pub category:              Option<String>,
}

impl NewDelivery {
  /// Validate operator input and resolve the category once.
  ///
  /// The departure temperature must parse; it is stored as typed.
  pub fn prepare(
    product: &str,
    departure_temperature: &str,
    resolver: &CategoryResolver,
  ) -> Result<Self> {
    let product = product.trim();
    if product.is_empty() {
      return Err(Error::EmptyProduct);
    }
    parse_temperature(departure_temperature)?;

    Ok(Self {
      product:               product.to_owned(),
      departure_temperature: departure_temperature.trim().to_owned(),
      category:              resolver.resolve(product).map(str::to_owned),
    })
  }
}

/// What the operator supplies on reception.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReceptionInput {
  pub temperature: String,
  #[serde(default)]
  pub photo_ref:   Option<String>,
}

/// The four reception-related fields written back to a record. Only
/// [`DeliveryRecord::assess_reception`] builds one, so the verdict always
/// comes from the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReception {
  pub temperature: String,
  pub category:    Option<String>,
  pub verdict:     Verdict,
  pub photo_ref:   Option<String>,
}
