//! Error type for `corner-store-sqlite`.

use corner_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] corner_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored enum column holds a value this build does not know.
  #[error("unknown {column} value: {value:?}")]
  UnknownValue {
    column: &'static str,
    value:  String,
  },
}

impl StoreError for Error {
  fn as_core(&self) -> Option<&corner_core::Error> {
    match self {
      Error::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
