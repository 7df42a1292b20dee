//! Handlers for `/requests` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/requests` | Optional `?wanted_on=YYYY-MM-DD&status=<status>` |
//! | `POST`   | `/requests` | Body: [`NewSupplyRequest`]; returns 201 |
//! | `GET`    | `/requests/history` | Shipped requests, most recent day first |
//! | `POST`   | `/requests/ready-item` | Body: [`NewReadyItem`]; kitchen item, already ready; returns 201 |
//! | `GET`    | `/requests/{id}` | 404 if not found |
//! | `PATCH`  | `/requests/{id}` | Body: `{"quantity"?,"comment"?}`; 409 once work has started |
//! | `DELETE` | `/requests/{id}` | Withdraws a pending request; 409 once work has started |
//! | `POST`   | `/requests/{id}/status` | Body: `{"status","lot_id"?}`; 409 on a backward move |
//! | `POST`   | `/requests/delivery-note` | Body: `{"date","sequence"?,"request_ids"?}`; ships the ready food requests |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use corner_core::{
  request::{
    DeliveryNote, NewReadyItem, NewSupplyRequest, RequestEdit, RequestFilter,
    RequestStatus, SupplyRequest,
  },
  store::CornerStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

async fn fetch<S: CornerStore>(store: &S, id: Uuid) -> Result<SupplyRequest, ApiError> {
  store
    .get_request(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| corner_core::Error::RequestNotFound(id).into())
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /requests[?wanted_on=<date>][&status=<status>]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(filter): Query<RequestFilter>,
) -> Result<Json<Vec<SupplyRequest>>, ApiError>
where
  S: CornerStore,
{
  let requests = state
    .store
    .list_requests(filter)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(requests))
}

/// `GET /requests/history`
pub async fn history<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<SupplyRequest>>, ApiError>
where
  S: CornerStore,
{
  let shipped = state
    .store
    .list_requests(RequestFilter::shipped())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(shipped))
}

// ─── Submit ───────────────────────────────────────────────────────────────────

/// `POST /requests`: returns 201 + the stored [`SupplyRequest`].
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<NewSupplyRequest>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CornerStore,
{
  let request = state
    .store
    .submit_request(body)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    request_id = %request.request_id,
    recipient = request.kind.recipient(),
    product = %request.product,
    quantity = request.quantity,
    wanted_on = %request.wanted_on,
    "supply request submitted"
  );
  Ok((StatusCode::CREATED, Json(request)))
}

// ─── Ready item ───────────────────────────────────────────────────────────────

/// `POST /requests/ready-item`: returns 201 + the stored [`SupplyRequest`].
pub async fn add_ready_item<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<NewReadyItem>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CornerStore,
{
  let item = state
    .store
    .add_ready_item(body)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    request_id = %item.request_id,
    product = %item.product,
    quantity = item.quantity,
    lot_id = item.lot_id.as_deref().unwrap_or_default(),
    "kitchen item added"
  );
  Ok((StatusCode::CREATED, Json(item)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /requests/{id}`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SupplyRequest>, ApiError>
where
  S: CornerStore,
{
  Ok(Json(fetch(&*state.store, id).await?))
}

// ─── Edit / withdraw ─────────────────────────────────────────────────────────

/// `PATCH /requests/{id}`
pub async fn edit<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RequestEdit>,
) -> Result<Json<SupplyRequest>, ApiError>
where
  S: CornerStore,
{
  fetch(&*state.store, id).await?.ensure_pending()?;

  let updated = state
    .store
    .edit_request(id, body)
    .await
    .map_err(ApiError::store)?;
  tracing::debug!(request_id = %id, quantity = updated.quantity, "request edited");
  Ok(Json(updated))
}

/// `DELETE /requests/{id}`: returns the withdrawn request.
pub async fn withdraw<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SupplyRequest>, ApiError>
where
  S: CornerStore,
{
  let removed = state
    .store
    .withdraw_request(id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(request_id = %id, product = %removed.product, "request withdrawn");
  Ok(Json(removed))
}

// ─── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: RequestStatus,
  #[serde(default)]
  pub lot_id: Option<String>,
}

/// `POST /requests/{id}/status`
pub async fn update_status<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<Json<SupplyRequest>, ApiError>
where
  S: CornerStore,
{
  let current = fetch(&*state.store, id).await?;
  let change = current.plan_status_change(body.status, body.lot_id)?;

  let updated = state
    .store
    .update_request_status(id, change)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    request_id = %id,
    from = %current.status,
    to = %updated.status,
    lot_id = updated.lot_id.as_deref().unwrap_or_default(),
    "request status changed"
  );
  Ok(Json(updated))
}

// ─── Delivery note ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DeliveryNoteBody {
  pub date:     NaiveDate,
  /// Position of this note among the day's notes, starting at 1.
  #[serde(default = "first_sequence")]
  pub sequence: u32,
  /// Restricts the note to these requests; every ready food request of the
  /// day when absent.
  #[serde(default)]
  pub request_ids: Option<Vec<Uuid>>,
}

fn first_sequence() -> u32 { 1 }

/// `POST /requests/delivery-note`: moves the day's ready food requests to
/// `out_for_delivery` and lists exactly the requests this call moved.
pub async fn delivery_note<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<DeliveryNoteBody>,
) -> Result<Json<DeliveryNote>, ApiError>
where
  S: CornerStore,
{
  let shipped = state
    .store
    .ship_ready_requests(body.date, body.request_ids)
    .await
    .map_err(ApiError::store)?;
  let note = DeliveryNote::compose(body.date, body.sequence, &shipped);

  if note.is_empty() {
    tracing::info!(date = %body.date, "no ready requests to ship");
  } else {
    tracing::info!(number = %note.number, lines = note.lines.len(), "delivery note issued");
  }
  Ok(Json(note))
}
