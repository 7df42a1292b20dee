//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with fixed microsecond
//! precision, so lexical order matches chronological order. Calendar dates
//! are stored as `YYYY-MM-DD`. UUIDs are stored as hyphenated lowercase
//! strings.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use corner_core::{
  catalog::CatalogEntry,
  delivery::{DeliveryRecord, Reception},
  reception::Verdict,
  request::{RequestKind, RequestStatus, SupplyRequest},
  showcase::ShowcaseItem,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Enums ────────────────────────────────────────────────────────────────────

pub fn decode_verdict(s: &str) -> Result<Verdict> {
  Verdict::from_stored(s).ok_or_else(|| Error::UnknownValue {
    column: "reception_verdict",
    value:  s.to_owned(),
  })
}

pub fn decode_request_kind(s: &str) -> Result<RequestKind> {
  match s {
    "food" => Ok(RequestKind::Food),
    "supplies" => Ok(RequestKind::Supplies),
    other => Err(Error::UnknownValue { column: "kind", value: other.to_owned() }),
  }
}

pub fn decode_request_status(s: &str) -> Result<RequestStatus> {
  RequestStatus::from_stored(s).ok_or_else(|| Error::UnknownValue {
    column: "status",
    value:  s.to_owned(),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const CATALOG_COLUMNS: &str = "product, category";

pub struct RawCatalogEntry {
  pub product:  String,
  pub category: String,
}

impl RawCatalogEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { product: row.get(0)?, category: row.get(1)? })
  }

  pub fn into_entry(self) -> CatalogEntry {
    CatalogEntry { product: self.product, category: self.category }
  }
}

pub const DELIVERY_COLUMNS: &str = "delivery_id, product, departure_temperature, \
   departure_at, category, reception_temperature, reception_verdict, \
   photo_ref, received_at";

/// Raw strings read directly from a `deliveries` row.
pub struct RawDelivery {
  pub delivery_id:           String,
  pub product:               String,
  pub departure_temperature: String,
  pub departure_at:          String,
  pub category:              Option<String>,
  pub reception_temperature: Option<String>,
  pub reception_verdict:     Option<String>,
  pub photo_ref:             Option<String>,
  pub received_at:           Option<String>,
}

impl RawDelivery {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      delivery_id:           row.get(0)?,
      product:               row.get(1)?,
      departure_temperature: row.get(2)?,
      departure_at:          row.get(3)?,
      category:              row.get(4)?,
      reception_temperature: row.get(5)?,
      reception_verdict:     row.get(6)?,
      photo_ref:             row.get(7)?,
      received_at:           row.get(8)?,
    })
  }

  pub fn into_record(self) -> Result<DeliveryRecord> {
    // `received_at` is the marker; the other reception columns are written
    // in the same UPDATE.
    let reception = match self.received_at {
      Some(at) => Some(Reception {
        temperature: self.reception_temperature.unwrap_or_default(),
        verdict:     decode_verdict(
          self.reception_verdict.as_deref().unwrap_or_default(),
        )?,
        photo_ref:   self.photo_ref,
        received_at: decode_dt(&at)?,
      }),
      None => None,
    };

    Ok(DeliveryRecord {
      delivery_id: decode_uuid(&self.delivery_id)?,
      product: self.product,
      departure_temperature: self.departure_temperature,
      departure_at: decode_dt(&self.departure_at)?,
      category: self.category,
      reception,
    })
  }
}

pub const SHOWCASE_COLUMNS: &str =
  "item_id, product, production_date, expiry_date, added_on, lot_id, removed_on";

/// Raw strings read directly from a `showcase_items` row.
pub struct RawShowcaseItem {
  pub item_id:         String,
  pub product:         String,
  pub production_date: String,
  pub expiry_date:     String,
  pub added_on:        String,
  pub lot_id:          String,
  pub removed_on:      Option<String>,
}

impl RawShowcaseItem {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      item_id:         row.get(0)?,
      product:         row.get(1)?,
      production_date: row.get(2)?,
      expiry_date:     row.get(3)?,
      added_on:        row.get(4)?,
      lot_id:          row.get(5)?,
      removed_on:      row.get(6)?,
    })
  }

  pub fn into_item(self) -> Result<ShowcaseItem> {
    Ok(ShowcaseItem {
      item_id:         decode_uuid(&self.item_id)?,
      product:         self.product,
      production_date: decode_date(&self.production_date)?,
      expiry_date:     decode_date(&self.expiry_date)?,
      added_on:        decode_date(&self.added_on)?,
      lot_id:          self.lot_id,
      removed_on:      self.removed_on.as_deref().map(decode_date).transpose()?,
    })
  }
}

pub const REQUEST_COLUMNS: &str = "request_id, submitted_at, wanted_on, product, \
   quantity, comment, kind, status, lot_id";

/// Raw values read directly from a `supply_requests` row.
pub struct RawRequest {
  pub request_id:   String,
  pub submitted_at: String,
  pub wanted_on:    String,
  pub product:      String,
  pub quantity:     u32,
  pub comment:      Option<String>,
  pub kind:         String,
  pub status:       String,
  pub lot_id:       Option<String>,
}

impl RawRequest {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      request_id:   row.get(0)?,
      submitted_at: row.get(1)?,
      wanted_on:    row.get(2)?,
      product:      row.get(3)?,
      quantity:     row.get(4)?,
      comment:      row.get(5)?,
      kind:         row.get(6)?,
      status:       row.get(7)?,
      lot_id:       row.get(8)?,
    })
  }

  pub fn into_request(self) -> Result<SupplyRequest> {
    Ok(SupplyRequest {
      request_id:   decode_uuid(&self.request_id)?,
      submitted_at: decode_dt(&self.submitted_at)?,
      wanted_on:    decode_date(&self.wanted_on)?,
      product:      self.product,
      quantity:     self.quantity,
      comment:      self.comment,
      kind:         decode_request_kind(&self.kind)?,
      status:       decode_request_status(&self.status)?,
      lot_id:       self.lot_id,
    })
  }
}
