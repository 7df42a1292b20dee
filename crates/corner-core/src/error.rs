//! Error types for `corner-core`.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::request::RequestStatus;

#[derive(Debug, Error)]
pub enum Error {
  /// Operator text that is not a number once the decimal comma is
  /// normalised. Never coerced to zero.
  #[error("unparseable temperature: {0:?}")]
  UnparseableTemperature(String),

  #[error(
    "invalid rule for {category:?}: target_max {target_max} exceeds \
     tolerance_max {tolerance_max}"
  )]
  InvalidRule {
    category:      String,
    target_max:    f64,
    tolerance_max: f64,
  },

  #[error("product name must not be empty")]
  EmptyProduct,

  #[error("quantity must be at least 1")]
  InvalidQuantity,

  /// A date whose derived dates (expiry) fall outside the calendar.
  #[error("date out of range: {0}")]
  DateOutOfRange(NaiveDate),

  #[error("delivery not found: {0}")]
  DeliveryNotFound(Uuid),

  #[error("delivery {0} has already been received")]
  AlreadyReceived(Uuid),

  #[error("showcase item not found: {0}")]
  ShowcaseItemNotFound(Uuid),

  #[error(
    "an active showcase item already exists for {product:?} produced on \
     {production_date}"
  )]
  DuplicateShowcaseItem {
    product:         String,
    production_date: NaiveDate,
  },

  #[error("showcase item {0} is already removed")]
  AlreadyRemoved(Uuid),

  #[error("supply request not found: {0}")]
  RequestNotFound(Uuid),

  #[error("cannot move a request from {from} back to {to}")]
  InvalidTransition {
    from: RequestStatus,
    to:   RequestStatus,
  },

  /// Only pending requests may be edited or withdrawn.
  #[error("request {id} is {status} and can no longer be changed")]
  RequestLocked {
    id:     Uuid,
    status: RequestStatus,
  },
}

impl Error {
  /// `true` for business-rule violations on existing state (as opposed to
  /// malformed input or missing records).
  pub fn is_conflict(&self) -> bool {
    matches!(
      self,
      Self::AlreadyReceived(_)
        | Self::DuplicateShowcaseItem { .. }
        | Self::AlreadyRemoved(_)
        | Self::InvalidTransition { .. }
        | Self::RequestLocked { .. }
    )
  }

  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::DeliveryNotFound(_)
        | Self::ShowcaseItemNotFound(_)
        | Self::RequestNotFound(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
