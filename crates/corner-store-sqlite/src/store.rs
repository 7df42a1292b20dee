//! [`SqliteStore`]: the SQLite implementation of [`CornerStore`].

use std::path::Path;

use chrono::{DateTime, NaiveDate, SubsecRound as _, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use corner_core::{
  catalog::CatalogEntry,
  delivery::{DeliveryRecord, NewDelivery, NewReception},
  request::{
    NewReadyItem, NewSupplyRequest, RequestEdit, RequestFilter, RequestStatus,
    StatusChange, SupplyRequest,
  },
  showcase::{NewShowcaseItem, ShowcaseItem, generate_lot_id},
  store::CornerStore,
};

use crate::{
  Error, Result,
  encode::{
    CATALOG_COLUMNS, DELIVERY_COLUMNS, REQUEST_COLUMNS, RawCatalogEntry,
    RawDelivery, RawRequest, RawShowcaseItem, SHOWCASE_COLUMNS,
    decode_request_status, encode_date, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

/// Server-assigned timestamps are truncated to the stored precision so the
/// value handed back equals the value read later.
fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

/// Carry a decoding failure out of a connection call.
fn in_call(e: Error) -> tokio_rusqlite::Error { tokio_rusqlite::Error::Other(Box::new(e)) }

/// Result of a guarded write run inside a single connection call.
enum Guarded<T> {
  Done(T),
  NotFound,
  /// The guard failed; carries the stored value that blocked the write.
  Blocked(String),
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A corner record store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn insert_request(&self, request: &SupplyRequest) -> Result<()> {
    let id_str     = encode_uuid(request.request_id);
    let at_str     = encode_dt(request.submitted_at);
    let wanted_str = encode_date(request.wanted_on);
    let product    = request.product.clone();
    let quantity   = request.quantity;
    let comment    = request.comment.clone();
    let kind_str   = request.kind.as_str();
    let status_str = request.status.as_str();
    let lot_id     = request.lot_id.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO supply_requests (
             request_id, submitted_at, wanted_on, product, quantity,
             comment, kind, status, lot_id
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str, at_str, wanted_str, product, quantity, comment, kind_str,
            status_str, lot_id,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("sqlite schema initialised");
    Ok(())
  }
}

// ─── CornerStore impl ────────────────────────────────────────────────────────

impl CornerStore for SqliteStore {
  type Error = Error;

  // ── Catalog ───────────────────────────────────────────────────────────────

  async fn upsert_catalog(&self, entries: Vec<CatalogEntry>) -> Result<usize> {
    let stamp = encode_dt(now());
    let rows: Vec<(String, String)> = entries
      .into_iter()
      .map(|e| (e.product.trim().to_owned(), e.category.trim().to_owned()))
      .filter(|(p, c)| !p.is_empty() && !c.is_empty())
      .collect();

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO catalog (product, category, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(product) DO UPDATE
               SET category = excluded.category,
                   updated_at = excluded.updated_at",
          )?;
          for (product, category) in &rows {
            stmt.execute(rusqlite::params![product, category, stamp])?;
          }
        }
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;

    Ok(written)
  }

  async fn list_catalog(&self) -> Result<Vec<CatalogEntry>> {
    let raws: Vec<RawCatalogEntry> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CATALOG_COLUMNS} FROM catalog ORDER BY product"
        ))?;
        let rows = stmt
          .query_map([], RawCatalogEntry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawCatalogEntry::into_entry).collect())
  }

  // ── Deliveries ────────────────────────────────────────────────────────────

  async fn log_departure(&self, input: NewDelivery) -> Result<DeliveryRecord> {
    let record = DeliveryRecord {
      delivery_id:           Uuid::new_v4(),
      product:               input.product,
      departure_temperature: input.departure_temperature,
      departure_at:          now(),
      category:              input.category,
      reception:             None,
    };

    let id_str      = encode_uuid(record.delivery_id);
    let product     = record.product.clone();
    let temperature = record.departure_temperature.clone();
    let at_str      = encode_dt(record.departure_at);
    let category    = record.category.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO deliveries (
             delivery_id, product, departure_temperature, departure_at, category
           ) VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, product, temperature, at_str, category],
        )?;
        Ok(())
      })
      .await?;

    Ok(record)
  }

  async fn get_delivery(&self, id: Uuid) -> Result<Option<DeliveryRecord>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawDelivery> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE delivery_id = ?1"),
            rusqlite::params![id_str],
            RawDelivery::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawDelivery::into_record).transpose()
  }

  async fn list_deliveries(&self, day: Option<NaiveDate>) -> Result<Vec<DeliveryRecord>> {
    let day_str = day.map(encode_date);

    let raws: Vec<RawDelivery> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DELIVERY_COLUMNS} FROM deliveries
           WHERE ?1 IS NULL OR substr(departure_at, 1, 10) = ?1
           ORDER BY departure_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![day_str], RawDelivery::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDelivery::into_record).collect()
  }

  async fn record_reception(
    &self,
    id:        Uuid,
    reception: NewReception,
  ) -> Result<DeliveryRecord> {
    let id_str      = encode_uuid(id);
    let at_str      = encode_dt(now());
    let verdict_str = reception.verdict.as_str();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let received: Option<Option<String>> = tx
          .query_row(
            "SELECT received_at FROM deliveries WHERE delivery_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;

        match received {
          None => return Ok(Guarded::NotFound),
          Some(Some(at)) => return Ok(Guarded::Blocked(at)),
          Some(None) => {}
        }

        tx.execute(
          "UPDATE deliveries
              SET reception_temperature = ?2,
                  category              = ?3,
                  reception_verdict     = ?4,
                  photo_ref             = ?5,
                  received_at           = ?6
            WHERE delivery_id = ?1 AND received_at IS NULL",
          rusqlite::params![
            id_str,
            reception.temperature,
            reception.category,
            verdict_str,
            reception.photo_ref,
            at_str,
          ],
        )?;
        let raw = tx.query_row(
          &format!("SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE delivery_id = ?1"),
          rusqlite::params![id_str],
          RawDelivery::from_row,
        )?;
        tx.commit()?;
        Ok(Guarded::Done(raw))
      })
      .await?;

    match outcome {
      Guarded::Done(raw) => raw.into_record(),
      Guarded::NotFound => Err(corner_core::Error::DeliveryNotFound(id).into()),
      Guarded::Blocked(_) => Err(corner_core::Error::AlreadyReceived(id).into()),
    }
  }

  // ── Showcase ──────────────────────────────────────────────────────────────

  async fn add_showcase_item(
    &self,
    input:    NewShowcaseItem,
    added_on: NaiveDate,
  ) -> Result<ShowcaseItem> {
    let item = input.into_item(Uuid::new_v4(), added_on)?;

    let id_str       = encode_uuid(item.item_id);
    let product      = item.product.clone();
    let produced_str = encode_date(item.production_date);
    let expiry_str   = encode_date(item.expiry_date);
    let added_str    = encode_date(item.added_on);
    let lot_id       = item.lot_id.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let existing: Option<String> = tx
          .query_row(
            "SELECT item_id FROM showcase_items
              WHERE product = ?1 AND production_date = ?2 AND removed_on IS NULL",
            rusqlite::params![product, produced_str],
            |r| r.get(0),
          )
          .optional()?;
        if let Some(existing) = existing {
          return Ok(Guarded::Blocked(existing));
        }

        tx.execute(
          "INSERT INTO showcase_items (
             item_id, product, production_date, expiry_date, added_on, lot_id
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, product, produced_str, expiry_str, added_str, lot_id],
        )?;
        tx.commit()?;
        Ok(Guarded::Done(()))
      })
      .await?;

    match outcome {
      Guarded::Done(()) => Ok(item),
      Guarded::Blocked(_) | Guarded::NotFound => {
        Err(corner_core::Error::DuplicateShowcaseItem {
          product:         item.product,
          production_date: item.production_date,
        }
        .into())
      }
    }
  }

  async fn get_showcase_item(&self, id: Uuid) -> Result<Option<ShowcaseItem>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawShowcaseItem> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {SHOWCASE_COLUMNS} FROM showcase_items WHERE item_id = ?1"),
            rusqlite::params![id_str],
            RawShowcaseItem::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawShowcaseItem::into_item).transpose()
  }

  async fn list_showcase(&self, active_only: bool) -> Result<Vec<ShowcaseItem>> {
    let raws: Vec<RawShowcaseItem> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SHOWCASE_COLUMNS} FROM showcase_items
           WHERE NOT ?1 OR removed_on IS NULL
           ORDER BY expiry_date, product"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![active_only], RawShowcaseItem::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawShowcaseItem::into_item).collect()
  }

  async fn remove_showcase_item(
    &self,
    id:         Uuid,
    removed_on: NaiveDate,
  ) -> Result<ShowcaseItem> {
    let id_str      = encode_uuid(id);
    let removed_str = encode_date(removed_on);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let removed: Option<Option<String>> = tx
          .query_row(
            "SELECT removed_on FROM showcase_items WHERE item_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;

        match removed {
          None => return Ok(Guarded::NotFound),
          Some(Some(on)) => return Ok(Guarded::Blocked(on)),
          Some(None) => {}
        }

        tx.execute(
          "UPDATE showcase_items SET removed_on = ?2
            WHERE item_id = ?1 AND removed_on IS NULL",
          rusqlite::params![id_str, removed_str],
        )?;
        let raw = tx.query_row(
          &format!("SELECT {SHOWCASE_COLUMNS} FROM showcase_items WHERE item_id = ?1"),
          rusqlite::params![id_str],
          RawShowcaseItem::from_row,
        )?;
        tx.commit()?;
        Ok(Guarded::Done(raw))
      })
      .await?;

    match outcome {
      Guarded::Done(raw) => raw.into_item(),
      Guarded::NotFound => Err(corner_core::Error::ShowcaseItemNotFound(id).into()),
      Guarded::Blocked(_) => Err(corner_core::Error::AlreadyRemoved(id).into()),
    }
  }

  // ── Supply requests ───────────────────────────────────────────────────────

  async fn submit_request(&self, input: NewSupplyRequest) -> Result<SupplyRequest> {
    let input = input.validate()?;
    let request = SupplyRequest {
      request_id:   Uuid::new_v4(),
      submitted_at: now(),
      wanted_on:    input.wanted_on,
      product:      input.product,
      quantity:     input.quantity,
      comment:      input.comment,
      kind:         input.kind,
      status:       RequestStatus::Pending,
      lot_id:       None,
    };
    self.insert_request(&request).await?;
    Ok(request)
  }

  async fn add_ready_item(&self, input: NewReadyItem) -> Result<SupplyRequest> {
    let request = input.into_request(Uuid::new_v4(), now())?;
    self.insert_request(&request).await?;
    Ok(request)
  }

  async fn get_request(&self, id: Uuid) -> Result<Option<SupplyRequest>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawRequest> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {REQUEST_COLUMNS} FROM supply_requests WHERE request_id = ?1"),
            rusqlite::params![id_str],
            RawRequest::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawRequest::into_request).transpose()
  }

  async fn list_requests(&self, filter: RequestFilter) -> Result<Vec<SupplyRequest>> {
    let wanted_str = filter.wanted_on.map(encode_date);
    let status_str = filter.status.map(RequestStatus::as_str);

    let raws: Vec<RawRequest> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REQUEST_COLUMNS} FROM supply_requests
           WHERE (?1 IS NULL OR wanted_on = ?1)
             AND (?2 IS NULL OR status = ?2)
           ORDER BY wanted_on DESC, submitted_at, product"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![wanted_str, status_str], RawRequest::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRequest::into_request).collect()
  }

  async fn update_request_status(
    &self,
    id:     Uuid,
    change: StatusChange,
  ) -> Result<SupplyRequest> {
    let id_str     = encode_uuid(id);
    let next       = change.status;
    let status_str = next.as_str();
    let lot_id     = change.lot_id;

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let current: Option<String> = tx
          .query_row(
            "SELECT status FROM supply_requests WHERE request_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;

        let Some(current) = current else {
          return Ok(Guarded::NotFound);
        };
        // Unknown stored values are reported by the decoder below.
        if RequestStatus::from_stored(&current).is_some_and(|c| next < c) {
          return Ok(Guarded::Blocked(current));
        }

        tx.execute(
          "UPDATE supply_requests
              SET status = ?2, lot_id = COALESCE(?3, lot_id)
            WHERE request_id = ?1",
          rusqlite::params![id_str, status_str, lot_id],
        )?;
        let raw = tx.query_row(
          &format!("SELECT {REQUEST_COLUMNS} FROM supply_requests WHERE request_id = ?1"),
          rusqlite::params![id_str],
          RawRequest::from_row,
        )?;
        tx.commit()?;
        Ok(Guarded::Done(raw))
      })
      .await?;

    match outcome {
      Guarded::Done(raw) => raw.into_request(),
      Guarded::NotFound => Err(corner_core::Error::RequestNotFound(id).into()),
      Guarded::Blocked(current) => Err(
        corner_core::Error::InvalidTransition {
          from: decode_request_status(&current)?,
          to:   next,
        }
        .into(),
      ),
    }
  }

  async fn edit_request(&self, id: Uuid, edit: RequestEdit) -> Result<SupplyRequest> {
    let edit   = edit.validate()?;
    let id_str = encode_uuid(id);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let current: Option<String> = tx
          .query_row(
            "SELECT status FROM supply_requests WHERE request_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;

        match current {
          None => return Ok(Guarded::NotFound),
          Some(status) if status != RequestStatus::Pending.as_str() => {
            return Ok(Guarded::Blocked(status));
          }
          Some(_) => {}
        }

        // A blank comment clears it; an absent one leaves it.
        tx.execute(
          "UPDATE supply_requests
              SET quantity = COALESCE(?2, quantity),
                  comment  = CASE WHEN ?3 IS NULL THEN comment ELSE NULLIF(?3, '') END
            WHERE request_id = ?1",
          rusqlite::params![id_str, edit.quantity, edit.comment],
        )?;
        let raw = tx.query_row(
          &format!("SELECT {REQUEST_COLUMNS} FROM supply_requests WHERE request_id = ?1"),
          rusqlite::params![id_str],
          RawRequest::from_row,
        )?;
        tx.commit()?;
        Ok(Guarded::Done(raw))
      })
      .await?;

    match outcome {
      Guarded::Done(raw) => raw.into_request(),
      Guarded::NotFound => Err(corner_core::Error::RequestNotFound(id).into()),
      Guarded::Blocked(status) => Err(
        corner_core::Error::RequestLocked { id, status: decode_request_status(&status)? }
          .into(),
      ),
    }
  }

  async fn withdraw_request(&self, id: Uuid) -> Result<SupplyRequest> {
    let id_str = encode_uuid(id);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let raw: Option<RawRequest> = tx
          .query_row(
            &format!("SELECT {REQUEST_COLUMNS} FROM supply_requests WHERE request_id = ?1"),
            rusqlite::params![id_str],
            RawRequest::from_row,
          )
          .optional()?;

        let Some(raw) = raw else {
          return Ok(Guarded::NotFound);
        };
        if raw.status != RequestStatus::Pending.as_str() {
          return Ok(Guarded::Blocked(raw.status));
        }

        tx.execute(
          "DELETE FROM supply_requests WHERE request_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(Guarded::Done(raw))
      })
      .await?;

    match outcome {
      Guarded::Done(raw) => raw.into_request(),
      Guarded::NotFound => Err(corner_core::Error::RequestNotFound(id).into()),
      Guarded::Blocked(status) => Err(
        corner_core::Error::RequestLocked { id, status: decode_request_status(&status)? }
          .into(),
      ),
    }
  }

  async fn ship_ready_requests(
    &self,
    date:      NaiveDate,
    selection: Option<Vec<Uuid>>,
  ) -> Result<Vec<SupplyRequest>> {
    let date_str = encode_date(date);
    let shipped_str = RequestStatus::OutForDelivery.as_str();

    let shipped = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let candidates = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {REQUEST_COLUMNS} FROM supply_requests
              WHERE wanted_on = ?1 AND status = ?2
              ORDER BY submitted_at, product"
          ))?;
          stmt
            .query_map(
              rusqlite::params![date_str, RequestStatus::Ready.as_str()],
              RawRequest::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        let mut shipped = Vec::new();
        {
          let mut update = tx.prepare(
            "UPDATE supply_requests SET status = ?2, lot_id = ?3
              WHERE request_id = ?1 AND status = ?4",
          )?;
          for raw in candidates {
            let mut request = raw.into_request().map_err(in_call)?;
            if !request.is_shippable_on(date)
              || selection.as_ref().is_some_and(|ids| !ids.contains(&request.request_id))
            {
              continue;
            }
            let lot_id = request
              .lot_id
              .take()
              .unwrap_or_else(|| generate_lot_id(request.wanted_on, &request.product));
            let moved = update.execute(rusqlite::params![
              encode_uuid(request.request_id),
              shipped_str,
              lot_id,
              RequestStatus::Ready.as_str(),
            ])?;
            if moved == 1 {
              request.status = RequestStatus::OutForDelivery;
              request.lot_id = Some(lot_id);
              shipped.push(request);
            }
          }
        }
        tx.commit()?;
        Ok(shipped)
      })
      .await?;

    Ok(shipped)
  }
}
