//! Router tests against an in-memory SQLite store.

use std::{sync::Arc, time::Duration};

use axum::{
  Router,
  body::{Body, to_bytes},
  http::{Method, Request, StatusCode},
};
use corner_core::rules::RuleTable;
use corner_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::{ApiState, api_router};

async fn app() -> Router {
  let store = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  let state = ApiState::new(
    Arc::new(store),
    RuleTable::standard(),
    Duration::from_secs(300),
  );
  api_router(state)
}

async fn send(
  app: &Router,
  method: Method,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let request = match body {
    Some(body) => builder
      .header("content-type", "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let response = app.clone().oneshot(request).await.unwrap();
  let status = response.status();
  let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

async fn seed_catalog(app: &Router) {
  let (status, body) = send(
    app,
    Method::PUT,
    "/catalog",
    Some(json!([
      { "product": "Moussaka", "category": "Plat cuisiné" },
      { "product": "Tzatziki", "category": "Sauce froide" },
    ])),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["written"], 2);
}

// ─── Catalog and rules ───────────────────────────────────────────────────────

#[tokio::test]
async fn catalog_resolve_after_upsert() {
  let app = app().await;
  seed_catalog(&app).await;

  let (status, body) =
    send(&app, Method::GET, "/catalog/resolve?product=%20Moussaka%20", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["product"], "Moussaka");
  assert_eq!(body["category"], "Plat cuisiné");

  let (_, body) = send(&app, Method::GET, "/catalog/resolve?product=Feta", None).await;
  assert!(body["category"].is_null());
}

#[tokio::test]
async fn upsert_invalidates_cached_resolver() {
  let app = app().await;
  seed_catalog(&app).await;
  let _ = send(&app, Method::GET, "/catalog/resolve?product=Moussaka", None).await;

  send(
    &app,
    Method::PUT,
    "/catalog",
    Some(json!([{ "product": "Moussaka", "category": "Viande hachée" }])),
  )
  .await;

  let (_, body) = send(&app, Method::GET, "/catalog/resolve?product=Moussaka", None).await;
  assert_eq!(body["category"], "Viande hachée");
}

#[tokio::test]
async fn rules_lists_standard_table() {
  let app = app().await;
  let (status, body) = send(&app, Method::GET, "/rules", None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(body.as_object().is_some_and(|rules| rules.len() == RuleTable::standard().len()));
}

#[tokio::test]
async fn evaluate_by_category_and_product() {
  let app = app().await;
  seed_catalog(&app).await;

  let (status, body) = send(
    &app,
    Method::POST,
    "/evaluate",
    Some(json!({ "temperature": "4,5", "category": "Lait" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["verdict"], "accepted");
  assert_eq!(body["rule"]["tolerance_max"], 6.0);

  let (_, body) = send(
    &app,
    Method::POST,
    "/evaluate",
    Some(json!({ "temperature": "12", "product": "Moussaka" })),
  )
  .await;
  assert_eq!(body["verdict"], "rejected");
  assert_eq!(body["category"], "Plat cuisiné");

  let (_, body) = send(
    &app,
    Method::POST,
    "/evaluate",
    Some(json!({ "temperature": "2", "product": "Tzatziki" })),
  )
  .await;
  assert_eq!(body["verdict"], "");
  assert_eq!(body["category"], "Sauce froide");
  assert!(body["rule"].is_null());
}

#[tokio::test]
async fn evaluate_rejects_unparseable_temperature() {
  let app = app().await;
  let (status, body) = send(
    &app,
    Method::POST,
    "/evaluate",
    Some(json!({ "temperature": "chaud", "category": "Sauce froide" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());
}

// ─── Deliveries ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn delivery_departure_then_reception() {
  let app = app().await;
  seed_catalog(&app).await;

  let (status, created) = send(
    &app,
    Method::POST,
    "/deliveries",
    Some(json!({ "product": "Moussaka", "departure_temperature": "2,5" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["category"], "Plat cuisiné");
  let id = created["delivery_id"].as_str().unwrap().to_owned();

  let (status, received) = send(
    &app,
    Method::POST,
    &format!("/deliveries/{id}/reception"),
    Some(json!({ "temperature": "3.1", "photo_ref": "IMG_001.jpg" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(received["reception"]["verdict"], "accepted");
  assert_eq!(received["reception"]["photo_ref"], "IMG_001.jpg");

  let (status, _) = send(
    &app,
    Method::POST,
    &format!("/deliveries/{id}/reception"),
    Some(json!({ "temperature": "3.1" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (_, list) = send(&app, Method::GET, "/deliveries", None).await;
  assert_eq!(list.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn delivery_bad_input_and_unknown_id() {
  let app = app().await;

  let (status, _) = send(
    &app,
    Method::POST,
    "/deliveries",
    Some(json!({ "product": "Moussaka", "departure_temperature": "froid" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(
    &app,
    Method::POST,
    "/deliveries",
    Some(json!({ "product": "  ", "departure_temperature": "3" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let missing = uuid::Uuid::new_v4();
  let (status, _) = send(&app, Method::GET, &format!("/deliveries/{missing}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = send(
    &app,
    Method::POST,
    &format!("/deliveries/{missing}/reception"),
    Some(json!({ "temperature": "3" })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Showcase ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn showcase_add_duplicate_and_remove() {
  let app = app().await;
  let item = json!({ "product": "Baklava", "production_date": "2024-03-01" });

  let (status, created) = send(&app, Method::POST, "/showcase", Some(item.clone())).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["expiry_date"], "2024-03-04");
  assert_eq!(created["lot_id"], "01032024-BAK");
  let id = created["item_id"].as_str().unwrap().to_owned();

  let (status, _) = send(&app, Method::POST, "/showcase", Some(item.clone())).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, removed) = send(
    &app,
    Method::POST,
    &format!("/showcase/{id}/remove"),
    Some(json!({ "removed_on": "2024-03-03" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(removed["removed_on"], "2024-03-03");

  let (status, _) = send(
    &app,
    Method::POST,
    &format!("/showcase/{id}/remove"),
    Some(json!({})),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  // Removed items no longer block a re-add.
  let (status, _) = send(&app, Method::POST, "/showcase", Some(item)).await;
  assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn showcase_active_list_is_sorted_by_alert() {
  let app = app().await;
  for (product, produced) in [
    ("Spanakopita", "2024-03-05"),
    ("Baklava", "2024-03-01"),
    ("Galaktoboureko", "2024-03-02"),
  ] {
    send(
      &app,
      Method::POST,
      "/showcase",
      Some(json!({ "product": product, "production_date": produced })),
    )
    .await;
  }

  let (status, body) =
    send(&app, Method::GET, "/showcase?active=true&today=2024-03-05", None).await;
  assert_eq!(status, StatusCode::OK);
  let alerts: Vec<(&str, &str)> = body
    .as_array()
    .unwrap()
    .iter()
    .map(|e| (e["product"].as_str().unwrap(), e["alert"].as_str().unwrap()))
    .collect();
  assert_eq!(alerts, vec![
    ("Baklava", "expired"),
    ("Galaktoboureko", "today"),
    ("Spanakopita", "ok"),
  ]);
}

// ─── Requests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn request_lifecycle_and_delivery_note() {
  let app = app().await;

  let (status, food) = send(
    &app,
    Method::POST,
    "/requests",
    Some(json!({
      "wanted_on": "2024-03-10",
      "product": "Moussaka",
      "quantity": 6,
      "kind": "food",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(food["status"], "pending");
  let food_id = food["request_id"].as_str().unwrap().to_owned();

  send(
    &app,
    Method::POST,
    "/requests",
    Some(json!({
      "wanted_on": "2024-03-10",
      "product": "Serviettes",
      "quantity": 200,
      "kind": "supplies",
    })),
  )
  .await;

  let (status, ready) = send(
    &app,
    Method::POST,
    &format!("/requests/{food_id}/status"),
    Some(json!({ "status": "ready" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(ready["lot_id"], "10032024-MOU");

  let (status, _) = send(
    &app,
    Method::POST,
    &format!("/requests/{food_id}/status"),
    Some(json!({ "status": "pending" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, note) = send(
    &app,
    Method::POST,
    "/requests/delivery-note",
    Some(json!({ "date": "2024-03-10" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(note["number"], "BL-20240310-001");
  assert_eq!(note["lines"].as_array().map(Vec::len), Some(1));
  assert_eq!(note["lines"][0]["lot_id"], "10032024-MOU");

  let (_, shipped) = send(&app, Method::GET, &format!("/requests/{food_id}"), None).await;
  assert_eq!(shipped["status"], "out_for_delivery");

  let (_, listed) = send(&app, Method::GET, "/requests?wanted_on=2024-03-10", None).await;
  assert_eq!(listed.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn request_validation_and_missing() {
  let app = app().await;

  let (status, _) = send(
    &app,
    Method::POST,
    "/requests",
    Some(json!({
      "wanted_on": "2024-03-10",
      "product": "Moussaka",
      "quantity": 0,
      "kind": "food",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let missing = uuid::Uuid::new_v4();
  let (status, _) = send(&app, Method::GET, &format!("/requests/{missing}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn showcase_rejects_date_past_calendar_end() {
  let app = app().await;
  let (status, body) = send(
    &app,
    Method::POST,
    "/showcase",
    Some(json!({ "product": "Baklava", "production_date": "+262142-12-30" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());

  let (_, list) = send(&app, Method::GET, "/showcase", None).await;
  assert_eq!(list.as_array().map(Vec::len), Some(0));
}

// ─── Kitchen workflow ────────────────────────────────────────────────────────

async fn submit_food(app: &Router, product: &str, wanted_on: &str) -> String {
  let (status, body) = send(
    app,
    Method::POST,
    "/requests",
    Some(json!({
      "wanted_on": wanted_on,
      "product": product,
      "quantity": 4,
      "kind": "food",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  body["request_id"].as_str().unwrap().to_owned()
}

async fn add_ready(app: &Router, product: &str, wanted_on: &str) -> String {
  let (status, body) = send(
    app,
    Method::POST,
    "/requests/ready-item",
    Some(json!({ "wanted_on": wanted_on, "product": product, "quantity": 3 })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["status"], "ready");
  assert_eq!(body["kind"], "food");
  body["request_id"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn pending_request_can_be_edited_and_withdrawn() {
  let app = app().await;
  let id = submit_food(&app, "Moussaka", "2024-03-10").await;

  let (status, edited) = send(
    &app,
    Method::PATCH,
    &format!("/requests/{id}"),
    Some(json!({ "quantity": 9, "comment": "sans oignon" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(edited["quantity"], 9);
  assert_eq!(edited["comment"], "sans oignon");

  let (status, _) = send(
    &app,
    Method::PATCH,
    &format!("/requests/{id}"),
    Some(json!({ "quantity": 0 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, removed) = send(&app, Method::DELETE, &format!("/requests/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(removed["request_id"], id.as_str());

  let (status, _) = send(&app, Method::GET, &format!("/requests/{id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn started_request_is_locked() {
  let app = app().await;
  let id = submit_food(&app, "Moussaka", "2024-03-10").await;
  send(
    &app,
    Method::POST,
    &format!("/requests/{id}/status"),
    Some(json!({ "status": "in_production" })),
  )
  .await;

  let (status, _) = send(
    &app,
    Method::PATCH,
    &format!("/requests/{id}"),
    Some(json!({ "quantity": 2 })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, _) = send(&app, Method::DELETE, &format!("/requests/{id}"), None).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (_, still) = send(&app, Method::GET, &format!("/requests/{id}"), None).await;
  assert_eq!(still["quantity"], 4);
}

#[tokio::test]
async fn ready_item_ships_and_appears_in_history() {
  let app = app().await;
  let id = add_ready(&app, "Pastitsio", "2024-03-10").await;
  submit_food(&app, "Moussaka", "2024-03-10").await;

  let (status, note) = send(
    &app,
    Method::POST,
    "/requests/delivery-note",
    Some(json!({ "date": "2024-03-10" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(note["lines"].as_array().map(Vec::len), Some(1));
  assert_eq!(note["lines"][0]["request_id"], id.as_str());
  assert_eq!(note["lines"][0]["lot_id"], "10032024-PAS");

  let (status, history) = send(&app, Method::GET, "/requests/history", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(history.as_array().map(Vec::len), Some(1));
  assert_eq!(history[0]["status"], "out_for_delivery");

  let (_, pending) = send(&app, Method::GET, "/requests?status=pending", None).await;
  assert_eq!(pending.as_array().map(Vec::len), Some(1));
  assert_eq!(pending[0]["product"], "Moussaka");
}

#[tokio::test]
async fn delivery_note_ships_only_selected_requests() {
  let app = app().await;
  let chosen = add_ready(&app, "Pastitsio", "2024-03-10").await;
  let left = add_ready(&app, "Tiropita", "2024-03-10").await;

  let (status, note) = send(
    &app,
    Method::POST,
    "/requests/delivery-note",
    Some(json!({ "date": "2024-03-10", "request_ids": [chosen] })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(note["lines"].as_array().map(Vec::len), Some(1));
  assert_eq!(note["lines"][0]["request_id"], chosen.as_str());

  let (_, rest) = send(&app, Method::GET, &format!("/requests/{left}"), None).await;
  assert_eq!(rest["status"], "ready");
}

#[tokio::test]
async fn concurrent_delivery_notes_ship_each_request_once() {
  let app = app().await;
  add_ready(&app, "Pastitsio", "2024-03-10").await;

  let body = json!({ "date": "2024-03-10" });
  let ((first_status, first), (second_status, second)) = tokio::join!(
    send(&app, Method::POST, "/requests/delivery-note", Some(body.clone())),
    send(&app, Method::POST, "/requests/delivery-note", Some(body)),
  );
  assert_eq!(first_status, StatusCode::OK);
  assert_eq!(second_status, StatusCode::OK);

  let lines = |note: &Value| note["lines"].as_array().map_or(0, Vec::len);
  assert_eq!(lines(&first) + lines(&second), 1);
}
