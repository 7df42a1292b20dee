//! JSON REST API for the corner.
//!
//! Exposes an axum [`Router`] backed by any [`corner_core::store::CornerStore`].
//! TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", corner_api::api_router(state))
//! ```

pub mod catalog;
pub mod deliveries;
pub mod error;
pub mod evaluate;
pub mod requests;
pub mod showcase;

use std::{sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{get, post},
};
use corner_core::{rules::RuleTable, store::CornerStore};

pub use catalog::CatalogCache;
pub use error::ApiError;

/// Shared state handed to every handler.
pub struct ApiState<S> {
  pub store:   Arc<S>,
  pub rules:   Arc<RuleTable>,
  pub catalog: Arc<CatalogCache>,
}

impl<S> ApiState<S> {
  pub fn new(store: Arc<S>, rules: RuleTable, catalog_ttl: Duration) -> Self {
    Self {
      store,
      rules: Arc::new(rules),
      catalog: Arc::new(CatalogCache::new(catalog_ttl)),
    }
  }
}

// Derived `Clone` would require `S: Clone`.
impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:   self.store.clone(),
      rules:   self.rules.clone(),
      catalog: self.catalog.clone(),
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: CornerStore + 'static,
{
  Router::new()
    // Catalog and rules
    .route("/catalog", get(catalog::list::<S>).put(catalog::upsert::<S>))
    .route("/catalog/resolve", get(catalog::resolve::<S>))
    .route("/rules", get(evaluate::rules::<S>))
    .route("/evaluate", post(evaluate::evaluate::<S>))
    // Deliveries
    .route(
      "/deliveries",
      get(deliveries::list::<S>).post(deliveries::create::<S>),
    )
    .route("/deliveries/{id}", get(deliveries::get_one::<S>))
    .route("/deliveries/{id}/reception", post(deliveries::receive::<S>))
    // Showcase
    .route("/showcase", get(showcase::list::<S>).post(showcase::create::<S>))
    .route("/showcase/{id}/remove", post(showcase::remove::<S>))
    // Supply requests
    .route("/requests", get(requests::list::<S>).post(requests::create::<S>))
    .route("/requests/history", get(requests::history::<S>))
    .route("/requests/ready-item", post(requests::add_ready_item::<S>))
    .route("/requests/delivery-note", post(requests::delivery_note::<S>))
    .route(
      "/requests/{id}",
      get(requests::get_one::<S>)
        .patch(requests::edit::<S>)
        .delete(requests::withdraw::<S>),
    )
    .route("/requests/{id}/status", post(requests::update_status::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
