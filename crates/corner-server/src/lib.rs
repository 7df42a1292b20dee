//! HTTP server assembly for the corner.
//!
//! Loads [`ServerConfig`], opens the SQLite store and mounts the JSON API
//! under `/api`.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use axum::{Router, routing::get};
use corner_api::ApiState;
use corner_core::{rules::RuleTable, store::CornerStore};
use corner_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CORNER_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_store_path")]
  pub store_path:       PathBuf,
  /// How long a loaded product catalog is trusted before it is re-read.
  #[serde(default = "default_catalog_ttl_secs")]
  pub catalog_ttl_secs: u64,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("corner.db") }
fn default_catalog_ttl_secs() -> u64 { 300 }

impl ServerConfig {
  /// Layer the optional TOML file at `path` under the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("CORNER"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn catalog_ttl(&self) -> Duration { Duration::from_secs(self.catalog_ttl_secs) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router over `store`.
pub fn router<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: CornerStore + 'static,
{
  let state = ApiState::new(store, RuleTable::standard(), config.catalog_ttl());

  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", corner_api::api_router(state))
    .layer(TraceLayer::new_for_http())
}

/// Open the configured store and build the router.
pub async fn build(config: &ServerConfig) -> anyhow::Result<Router> {
  let store_path = expand_tilde(&config.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  tracing::info!(path = %store_path.display(), "store opened");

  Ok(router(Arc::new(store), config))
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
  };
  use tower::ServiceExt as _;

  fn config() -> ServerConfig {
    ServerConfig {
      host:             "127.0.0.1".to_owned(),
      port:             0,
      store_path:       PathBuf::from(":memory:"),
      catalog_ttl_secs: 60,
    }
  }

  #[test]
  fn missing_config_file_falls_back_to_defaults() {
    let cfg = ServerConfig::load(Path::new("does-not-exist.toml")).unwrap();
    assert_eq!(cfg.catalog_ttl(), Duration::from_secs(300));
    assert!(!cfg.host.is_empty());
  }

  #[test]
  fn tilde_is_expanded_only_as_prefix() {
    assert_eq!(expand_tilde(Path::new("/var/corner.db")), PathBuf::from("/var/corner.db"));
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(
        expand_tilde(Path::new("~/corner.db")),
        PathBuf::from(home).join("corner.db")
      );
    }
  }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let app = router(Arc::new(store), &config());

    let health = app
      .clone()
      .oneshot(Request::get("/health").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let response = app
      .oneshot(Request::get("/api/rules").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let rules: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(rules.get("poisson").is_some());
  }
}
