//! Handlers for `/catalog` endpoints, and the TTL cache that keeps a
//! [`CategoryResolver`] built from the catalog.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/catalog` | All rows, by product |
//! | `PUT`  | `/catalog` | Body: `[{"product":"…","category":"…"}]`; upserts and invalidates the cache |
//! | `GET`  | `/catalog/resolve` | `?product=…`; `category` is `null` when unknown |

use std::{sync::Arc, time::Duration};

use axum::{
  Json,
  extract::{Query, State},
};
use corner_core::{
  catalog::{CatalogEntry, CategoryResolver},
  store::CornerStore,
};
use serde::{Deserialize, Serialize};
use tokio::{sync::RwLock, time::Instant};

use crate::{ApiState, error::ApiError};

// ─── Cache ────────────────────────────────────────────────────────────────────

struct Loaded {
  resolver:  Arc<CategoryResolver>,
  loaded_at: Instant,
}

/// A [`CategoryResolver`] rebuilt from the store at most once per `ttl`.
pub struct CatalogCache {
  ttl:    Duration,
  loaded: RwLock<Option<Loaded>>,
}

impl CatalogCache {
  pub fn new(ttl: Duration) -> Self { Self { ttl, loaded: RwLock::new(None) } }

  /// The current resolver, reloading it from `store` when stale.
  pub async fn resolver<S: CornerStore>(
    &self,
    store: &S,
  ) -> Result<Arc<CategoryResolver>, S::Error> {
    if let Some(resolver) = self.fresh(&*self.loaded.read().await) {
      return Ok(resolver);
    }

    let mut slot = self.loaded.write().await;
    // Another task may have reloaded while we waited for the lock.
    if let Some(resolver) = self.fresh(&slot) {
      return Ok(resolver);
    }

    let resolver = Arc::new(CategoryResolver::from_entries(
      store.list_catalog().await?,
    ));
    tracing::debug!(products = resolver.len(), "catalog reloaded");
    *slot = Some(Loaded { resolver: resolver.clone(), loaded_at: Instant::now() });
    Ok(resolver)
  }

  /// Force the next [`CatalogCache::resolver`] call to reload.
  pub async fn invalidate(&self) { *self.loaded.write().await = None; }

  fn fresh(&self, loaded: &Option<Loaded>) -> Option<Arc<CategoryResolver>> {
    loaded
      .as_ref()
      .filter(|l| l.loaded_at.elapsed() < self.ttl)
      .map(|l| l.resolver.clone())
  }
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /catalog`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<CatalogEntry>>, ApiError>
where
  S: CornerStore,
{
  let entries = state.store.list_catalog().await.map_err(ApiError::store)?;
  Ok(Json(entries))
}

// ─── Upsert ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UpsertResponse {
  pub written: usize,
}

/// `PUT /catalog`: body: array of [`CatalogEntry`].
pub async fn upsert<S>(
  State(state): State<ApiState<S>>,
  Json(entries): Json<Vec<CatalogEntry>>,
) -> Result<Json<UpsertResponse>, ApiError>
where
  S: CornerStore,
{
  let written = state
    .store
    .upsert_catalog(entries)
    .await
    .map_err(ApiError::store)?;
  state.catalog.invalidate().await;
  tracing::info!(written, "catalog updated");
  Ok(Json(UpsertResponse { written }))
}

// ─── Resolve ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ResolveParams {
  pub product: String,
}

#[derive(Debug, Serialize)]
pub struct Resolution {
  pub product:  String,
  pub category: Option<String>,
}

/// `GET /catalog/resolve?product=<name>`
pub async fn resolve<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ResolveParams>,
) -> Result<Json<Resolution>, ApiError>
where
  S: CornerStore,
{
  let resolver = state
    .catalog
    .resolver(&*state.store)
    .await
    .map_err(ApiError::store)?;
  let category = resolver.resolve(&params.product).map(str::to_owned);
  Ok(Json(Resolution { product: params.product.trim().to_owned(), category }))
}
