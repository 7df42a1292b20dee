//! Handlers for `/deliveries` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/deliveries` | Optional `?day=YYYY-MM-DD`; most recent first |
//! | `POST` | `/deliveries` | Body: `{"product","departure_temperature"}`; returns 201 |
//! | `GET`  | `/deliveries/{id}` | 404 if not found |
//! | `POST` | `/deliveries/{id}/reception` | Body: `{"temperature","photo_ref"?}`; 409 if already received |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use corner_core::{
  delivery::{DeliveryRecord, NewDelivery, ReceptionInput},
  reception::Verdict,
  store::CornerStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub day: Option<NaiveDate>,
}

/// `GET /deliveries[?day=<date>]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<DeliveryRecord>>, ApiError>
where
  S: CornerStore,
{
  let records = state
    .store
    .list_deliveries(params.day)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}

// ─── Departure ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DepartureBody {
  pub product:               String,
  pub departure_temperature: String,
}

/// `POST /deliveries`: returns 201 + the stored [`DeliveryRecord`].
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<DepartureBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CornerStore,
{
  let resolver = state
    .catalog
    .resolver(&*state.store)
    .await
    .map_err(ApiError::store)?;
  let input = NewDelivery::prepare(&body.product, &body.departure_temperature, &resolver)?;
  if input.category.is_none() {
    tracing::warn!(product = %input.product, "product has no catalog category");
  }

  let record = state
    .store
    .log_departure(input)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /deliveries/{id}`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<DeliveryRecord>, ApiError>
where
  S: CornerStore,
{
  let record = state
    .store
    .get_delivery(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(corner_core::Error::DeliveryNotFound(id))?;
  Ok(Json(record))
}

// ─── Reception ────────────────────────────────────────────────────────────────

/// `POST /deliveries/{id}/reception`. Evaluates the measured temperature
/// and writes the reception fields once.
pub async fn receive<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ReceptionInput>,
) -> Result<Json<DeliveryRecord>, ApiError>
where
  S: CornerStore,
{
  let record = state
    .store
    .get_delivery(id)
    .await
    .map_err(ApiError::store)?
    .ok_or(corner_core::Error::DeliveryNotFound(id))?;

  let resolver = state
    .catalog
    .resolver(&*state.store)
    .await
    .map_err(ApiError::store)?;
  let reception = record.assess_reception(body, &resolver, &state.rules)?;

  let updated = state
    .store
    .record_reception(id, reception)
    .await
    .map_err(ApiError::store)?;

  match updated.verdict() {
    Verdict::Rejected => tracing::warn!(
      delivery_id = %id,
      product = %updated.product,
      category = updated.category.as_deref().unwrap_or_default(),
      "delivery rejected on reception"
    ),
    Verdict::Unknown => tracing::info!(
      delivery_id = %id,
      product = %updated.product,
      "no acceptance rule for delivery"
    ),
    Verdict::Accepted => tracing::debug!(delivery_id = %id, "delivery accepted"),
  }

  Ok(Json(updated))
}
