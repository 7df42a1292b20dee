//! Handlers for `/showcase` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/showcase` | `?active=true` lists active items most urgent first; `?today=` overrides the alert date |
//! | `POST` | `/showcase` | Body: [`NewShowcaseItem`]; 409 on an active duplicate |
//! | `POST` | `/showcase/{id}/remove` | Body: `{"removed_on"?}`; 409 if already removed |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{Local, NaiveDate};
use corner_core::{
  showcase::{self, AlertBucket, NewShowcaseItem, ShowcaseItem},
  store::CornerStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

fn today() -> NaiveDate { Local::now().date_naive() }

/// A showcase item with its expiry alert. Removed items carry no alert.
#[derive(Debug, Serialize)]
pub struct ShowcaseEntry {
  #[serde(flatten)]
  pub item:  ShowcaseItem,
  pub alert: Option<AlertBucket>,
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub active: bool,
  pub today:  Option<NaiveDate>,
}

/// `GET /showcase[?active=true][&today=<date>]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<ShowcaseEntry>>, ApiError>
where
  S: CornerStore,
{
  let today = params.today.unwrap_or_else(today);
  let items = state
    .store
    .list_showcase(params.active)
    .await
    .map_err(ApiError::store)?;

  let entries = if params.active {
    showcase::alerts(&items, today)
      .into_iter()
      .map(|(item, alert)| ShowcaseEntry { item: item.clone(), alert: Some(alert) })
      .collect()
  } else {
    items
      .into_iter()
      .map(|item| {
        let alert = item.is_active().then(|| item.alert(today));
        ShowcaseEntry { item, alert }
      })
      .collect()
  };
  Ok(Json(entries))
}

// ─── Add ──────────────────────────────────────────────────────────────────────

/// `POST /showcase`: returns 201 + the stored [`ShowcaseItem`].
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<NewShowcaseItem>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CornerStore,
{
  let active = state
    .store
    .list_showcase(true)
    .await
    .map_err(ApiError::store)?;
  if showcase::is_duplicate(body.product.trim(), body.production_date, &active) {
    tracing::warn!(
      product = %body.product.trim(),
      production_date = %body.production_date,
      "duplicate showcase entry refused"
    );
    return Err(
      corner_core::Error::DuplicateShowcaseItem {
        product:         body.product.trim().to_owned(),
        production_date: body.production_date,
      }
      .into(),
    );
  }

  let item = state
    .store
    .add_showcase_item(body, today())
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(item)))
}

// ─── Remove ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RemoveBody {
  pub removed_on: Option<NaiveDate>,
}

/// `POST /showcase/{id}/remove`. `removed_on` defaults to today.
pub async fn remove<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RemoveBody>,
) -> Result<Json<ShowcaseItem>, ApiError>
where
  S: CornerStore,
{
  let removed_on = body.removed_on.unwrap_or_else(today);
  let item = state
    .store
    .remove_showcase_item(id, removed_on)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(item_id = %id, lot_id = %item.lot_id, %removed_on, "showcase item removed");
  Ok(Json(item))
}
