//! Error type for `custman-store-sqlite`.

use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown phone kind: {0:?}")]
  PhoneKind(String),

  /// Attempted to delete a customer row that is not there.
  #[error("customer not found: {0}")]
  CustomerNotFound(uuid::Uuid),
}

impl Error {
  fn constraint_code(&self) -> Option<i32> {
    match self {
      Self::Database(tokio_rusqlite::Error::Rusqlite(
        rusqlite::Error::SqliteFailure(e, _),
      )) => Some(e.extended_code),
      _ => None,
    }
  }

  /// Whether SQLite rejected the write because of a `UNIQUE` index.
  pub fn is_unique_violation(&self) -> bool {
    self.constraint_code() == Some(ffi::SQLITE_CONSTRAINT_UNIQUE)
  }

  /// Whether the write reused a row id that is already taken.
  pub fn is_primary_key_violation(&self) -> bool {
    self.constraint_code() == Some(ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
  }
}

impl From<Error> for custman_core::Error {
  fn from(e: Error) -> Self {
    if e.is_unique_violation() {
      return Self::Conflict("email already registered".into());
    }
    if e.is_primary_key_violation() {
      return Self::Conflict("record id already in use".into());
    }
    match e {
      Error::CustomerNotFound(id) => {
        Self::InvalidOperation(format!("customer {id} does not exist"))
      }
      other => Self::Store(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
