//! Supply requests sent from the corner.
//!
//! Food requests go to the kitchen, which moves them through production to
//! delivery. Non-food supply requests go to the manager.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, showcase::generate_lot_id};

/// Who a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
  /// A food product, prepared by the kitchen.
  Food,
  /// Non-food supplies (packaging, cleaning products…).
  Supplies,
}

impl RequestKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Food => "food",
      Self::Supplies => "supplies",
    }
  }

  pub fn recipient(self) -> &'static str {
    match self {
      Self::Food => "kitchen",
      Self::Supplies => "manager",
    }
  }
}

/// Progress of a request. Variants are declared in pipeline order.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
  Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
  #[default]
  Pending,
  InProduction,
  Ready,
  OutForDelivery,
}

impl RequestStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::InProduction => "in_production",
      Self::Ready => "ready",
      Self::OutForDelivery => "out_for_delivery",
    }
  }

  pub fn from_stored(s: &str) -> Option<Self> {
    match s {
      "pending" => Some(Self::Pending),
      "in_production" => Some(Self::InProduction),
      "ready" => Some(Self::Ready),
      "out_for_delivery" => Some(Self::OutForDelivery),
      _ => None,
    }
  }
}

impl fmt::Display for RequestStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Request ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyRequest {
  pub request_id:   Uuid,
  /// Server-assigned.
  pub submitted_at: DateTime<Utc>,
  /// The day the corner wants the delivery.
  pub wanted_on:    NaiveDate,
  pub product:      String,
  pub quantity:     u32,
  pub comment:      Option<String>,
  pub kind:         RequestKind,
  pub status:       RequestStatus,
  /// Assigned by the kitchen once the batch is ready.
  pub lot_id:       Option<String>,
}

/// A validated status update, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
  pub status: RequestStatus,
  pub lot_id: Option<String>,
}

impl SupplyRequest {
  /// Plan a move to `next`.
  ///
  /// Requests only move forward; skipping steps is allowed and re-applying
  /// the current status is a no-op. A request reaching `ready` without a lot
  /// gets the default lot id for its delivery date.
  pub fn plan_status_change(
    &self,
    next: RequestStatus,
    lot_id: Option<String>,
  ) -> Result<StatusChange> {
    if next < self.status {
      return Err(Error::InvalidTransition { from: self.status, to: next });
    }

    let lot_id = lot_id
      .map(|l| l.trim().to_owned())
      .filter(|l| !l.is_empty())
      .or_else(|| self.lot_id.clone())
      .or_else(|| {
        (self.kind == RequestKind::Food && next >= RequestStatus::Ready)
          .then(|| generate_lot_id(self.wanted_on, &self.product))
      });

    Ok(StatusChange { status: next, lot_id })
  }

  /// Quantity, comment and the request itself can only be changed while
  /// the kitchen has not started on it.
  pub fn ensure_pending(&self) -> Result<()> {
    if self.status != RequestStatus::Pending {
      return Err(Error::RequestLocked { id: self.request_id, status: self.status });
    }
    Ok(())
  }

  /// A food request for `date` that is ready and not yet shipped.
  pub fn is_shippable_on(&self, date: NaiveDate) -> bool {
    self.kind == RequestKind::Food
      && self.wanted_on == date
      && self.status == RequestStatus::Ready
  }
}

/// Criteria for [`crate::store::CornerStore::list_requests`]. Both fields
/// are optional; an empty filter lists everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RequestFilter {
  pub wanted_on: Option<NaiveDate>,
  pub status:    Option<RequestStatus>,
}

impl RequestFilter {
  /// Shipped requests: the delivery history.
  pub fn shipped() -> Self {
    Self { wanted_on: None, status: Some(RequestStatus::OutForDelivery) }
  }
}

/// Delivery note number for the `sequence`-th note of `date`:
/// `BL-YYYYMMDD-NNN`.
pub fn delivery_note_number(date: NaiveDate, sequence: u32) -> String {
  format!("BL-{}-{sequence:03}", date.format("%Y%m%d"))
}

// ─── Delivery note ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryNoteLine {
  pub request_id: Uuid,
  pub product:    String,
  pub quantity:   u32,
  pub lot_id:     Option<String>,
  pub comment:    Option<String>,
}

/// The list of ready food requests shipped together on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryNote {
  pub number: String,
  pub date:   NaiveDate,
  pub lines:  Vec<DeliveryNoteLine>,
}

impl DeliveryNote {
  /// The note listing `shipped`, one line per request, in order.
  pub fn compose(date: NaiveDate, sequence: u32, shipped: &[SupplyRequest]) -> Self {
    let lines = shipped
      .iter()
      .map(|r| DeliveryNoteLine {
        request_id: r.request_id,
        product:    r.product.clone(),
        quantity:   r.quantity,
        lot_id:     r.lot_id.clone(),
        comment:    r.comment.clone(),
      })
      .collect();

    Self { number: delivery_note_number(date, sequence), date, lines }
  }

  pub fn is_empty(&self) -> bool { self.lines.is_empty() }
}

// ─── Input ───────────────────────────────────────────────────────────────────

/// Input to [`crate::store::CornerStore::submit_request`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewSupplyRequest {
  pub wanted_on: NaiveDate,
  pub product:   String,
  pub quantity:  u32,
  #[serde(default)]
  pub comment:   Option<String>,
  pub kind:      RequestKind,
}

impl NewSupplyRequest {
  /// Trim text fields and check the product and quantity.
  pub fn validate(self) -> Result<Self> {
    let product = self.product.trim().to_owned();
    if product.is_empty() {
      return Err(Error::EmptyProduct);
    }
    if self.quantity == 0 {
      return Err(Error::InvalidQuantity);
    }
    Ok(Self {
      product,
      comment: self
        .comment
        .map(|c| c.trim().to_owned())
        .filter(|c| !c.is_empty()),
      ..self
    })
  }
}

/// Changes to a pending request. Absent fields are left alone; a blank
/// comment clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RequestEdit {
  #[serde(default)]
  pub quantity: Option<u32>,
  #[serde(default)]
  pub comment:  Option<String>,
}

impl RequestEdit {
  pub fn validate(self) -> Result<Self> {
    if self.quantity == Some(0) {
      return Err(Error::InvalidQuantity);
    }
    Ok(Self { comment: self.comment.map(|c| c.trim().to_owned()), ..self })
  }
}

/// A food item the kitchen adds straight to a day's delivery, already
/// `ready`, without a prior request from the corner.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewReadyItem {
  pub wanted_on: NaiveDate,
  pub product:   String,
  pub quantity:  u32,
  #[serde(default)]
  pub comment:   Option<String>,
  /// Generated with [`generate_lot_id`] when absent or blank.
  #[serde(default)]
  pub lot_id:    Option<String>,
}

impl NewReadyItem {
  pub fn into_request(
    self,
    request_id: Uuid,
    submitted_at: DateTime<Utc>,
  ) -> Result<SupplyRequest> {
    let checked = NewSupplyRequest {
      wanted_on: self.wanted_on,
      product:   self.product,
      quantity:  self.quantity,
      comment:   self.comment,
      kind:      RequestKind::Food,
    }
    .validate()?;
    let lot_id = self
      .lot_id
      .map(|l| l.trim().to_owned())
      .filter(|l| !l.is_empty())
      .unwrap_or_else(|| generate_lot_id(checked.wanted_on, &checked.product));

    Ok(SupplyRequest {
      request_id,
      submitted_at,
      wanted_on: checked.wanted_on,
      product: checked.product,
      quantity: checked.quantity,
      comment: checked.comment,
      kind: RequestKind::Food,
      status: RequestStatus::Ready,
      lot_id: Some(lot_id),
    })
  }
}
