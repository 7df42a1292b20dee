//! The `CornerStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `corner-store-sqlite`).
//! Higher layers (`corner-api`, `corner-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  catalog::CatalogEntry,
  delivery::{DeliveryRecord, NewDelivery, NewReception},
  request::{
    NewReadyItem, NewSupplyRequest, RequestEdit, RequestFilter, StatusChange,
    SupplyRequest,
  },
  showcase::{NewShowcaseItem, ShowcaseItem},
};

/// Backend errors that may carry a domain [`crate::Error`], so callers can
/// tell a business-rule violation from an infrastructure fault.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn as_core(&self) -> Option<&crate::Error>;
}

/// Abstraction over a corner record store backend.
///
/// Delivery records and showcase items are never deleted. The only
/// mutations are the once-only transitions: filling a delivery's reception,
/// removing a showcase item, and moving a supply request forward. A supply
/// request may be edited or withdrawn only while it is still `pending`.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CornerStore: Send + Sync {
  type Error: StoreError;

  // ── Catalog ───────────────────────────────────────────────────────────

  /// Insert or replace catalog rows, keyed by trimmed product name. Returns
  /// the number of rows written.
  fn upsert_catalog(
    &self,
    entries: Vec<CatalogEntry>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn list_catalog(
    &self,
  ) -> impl Future<Output = Result<Vec<CatalogEntry>, Self::Error>> + Send + '_;

  // ── Deliveries ────────────────────────────────────────────────────────

  /// Persist a new delivery record. `departure_at` is set by the store.
  fn log_departure(
    &self,
    input: NewDelivery,
  ) -> impl Future<Output = Result<DeliveryRecord, Self::Error>> + Send + '_;

  fn get_delivery(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<DeliveryRecord>, Self::Error>> + Send + '_;

  /// Most recent first. `day` restricts to departures on that UTC date.
  fn list_deliveries(
    &self,
    day: Option<NaiveDate>,
  ) -> impl Future<Output = Result<Vec<DeliveryRecord>, Self::Error>> + Send + '_;

  /// Write the reception fields of a delivery. `received_at` is set by the
  /// store.
  ///
  /// Fails with `DeliveryNotFound` or `AlreadyReceived`.
  fn record_reception(
    &self,
    id: Uuid,
    reception: NewReception,
  ) -> impl Future<Output = Result<DeliveryRecord, Self::Error>> + Send + '_;

  // ── Showcase ──────────────────────────────────────────────────────────

  /// Add an item to the showcase.
  ///
  /// Fails with `DuplicateShowcaseItem` if an active item already has the
  /// same product and production date; nothing is written in that case.
  fn add_showcase_item(
    &self,
    input: NewShowcaseItem,
    added_on: NaiveDate,
  ) -> impl Future<Output = Result<ShowcaseItem, Self::Error>> + Send + '_;

  fn get_showcase_item(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ShowcaseItem>, Self::Error>> + Send + '_;

  /// Ordered by expiry date. `active_only` hides removed items.
  fn list_showcase(
    &self,
    active_only: bool,
  ) -> impl Future<Output = Result<Vec<ShowcaseItem>, Self::Error>> + Send + '_;

  /// Mark an item removed on `removed_on`.
  ///
  /// Fails with `ShowcaseItemNotFound` or `AlreadyRemoved`.
  fn remove_showcase_item(
    &self,
    id: Uuid,
    removed_on: NaiveDate,
  ) -> impl Future<Output = Result<ShowcaseItem, Self::Error>> + Send + '_;

  // ── Supply requests ───────────────────────────────────────────────────

  /// Persist a request with `pending` status. `submitted_at` is set by the
  /// store.
  fn submit_request(
    &self,
    input: NewSupplyRequest,
  ) -> impl Future<Output = Result<SupplyRequest, Self::Error>> + Send + '_;

  fn get_request(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<SupplyRequest>, Self::Error>> + Send + '_;

  /// Most recent delivery date first, matching every criterion set in
  /// `filter`.
  fn list_requests(
    &self,
    filter: RequestFilter,
  ) -> impl Future<Output = Result<Vec<SupplyRequest>, Self::Error>> + Send + '_;

  /// Change the quantity or comment of a pending request.
  ///
  /// Fails with `RequestNotFound`, or `RequestLocked` once the request has
  /// left `pending`.
  fn edit_request(
    &self,
    id: Uuid,
    edit: RequestEdit,
  ) -> impl Future<Output = Result<SupplyRequest, Self::Error>> + Send + '_;

  /// Delete a pending request, returning what was removed.
  ///
  /// Fails with `RequestNotFound` or `RequestLocked`.
  fn withdraw_request(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<SupplyRequest, Self::Error>> + Send + '_;

  /// Persist a food item directly as `ready`, with its lot id.
  fn add_ready_item(
    &self,
    input: NewReadyItem,
  ) -> impl Future<Output = Result<SupplyRequest, Self::Error>> + Send + '_;

  /// Move the requests shippable on `date` to `out_for_delivery` in one
  /// write and return exactly the rows that moved, in list order.
  ///
  /// With a `selection`, only those request ids are considered. A request
  /// already shipped by a concurrent call is not returned again.
  fn ship_ready_requests(
    &self,
    date: NaiveDate,
    selection: Option<Vec<Uuid>>,
  ) -> impl Future<Output = Result<Vec<SupplyRequest>, Self::Error>> + Send + '_;

  /// Apply a status change.
  ///
  /// The backend re-checks the transition against the stored status and
  /// fails with `InvalidTransition` if it would move backwards, or
  /// `RequestNotFound`.
  fn update_request_status(
    &self,
    id: Uuid,
    change: StatusChange,
  ) -> impl Future<Output = Result<SupplyRequest, Self::Error>> + Send + '_;
}
