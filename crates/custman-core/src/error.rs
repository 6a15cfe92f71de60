//! Error types for `custman-core`.
//!
//! Every failure raised below the HTTP surface is one of these variants. Each
//! variant belongs to exactly one [`ErrorKind`], which is the only thing the
//! HTTP surface needs to pick a status code.

use serde::Serialize;
use strum::{AsRefStr, Display};
use thiserror::Error;

/// The shared error taxonomy. The variant name is what clients see as
/// `exceptionType`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, Serialize,
)]
pub enum ErrorKind {
  /// The caller supplied a null/empty required value.
  InvalidArgument,
  /// Malformed business state, e.g. an empty identifier on update.
  GenericApplicationError,
  NotFound,
  /// Duplicate or uniqueness violation.
  Conflict,
  Unauthorized,
  Forbidden,
  PreconditionFailed,
  UnprocessableEntity,
  UnsupportedMediaType,
  Timeout,
  NotImplemented,
  /// Anything else.
  Unclassified,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  #[error("{0}")]
  Application(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  #[error("unauthorized")]
  Unauthorized,

  #[error("forbidden")]
  Forbidden,

  #[error("precondition failed")]
  PreconditionFailed,

  #[error("{0}")]
  UnprocessableEntity(String),

  #[error("unsupported media type: {0}")]
  UnsupportedMediaType(String),

  #[error("timeout")]
  Timeout,

  #[error("not implemented: {0}")]
  NotImplemented(String),

  /// The gateway was asked to do something impossible, e.g. delete a row
  /// that is not there.
  #[error("invalid operation: {0}")]
  InvalidOperation(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Shorthand for a [`Error::NotFound`] with the default message.
  pub fn not_found() -> Self { Self::NotFound("resource not found".into()) }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
      Self::Application(_) => ErrorKind::GenericApplicationError,
      Self::NotFound(_) => ErrorKind::NotFound,
      Self::Conflict(_) => ErrorKind::Conflict,
      Self::Unauthorized => ErrorKind::Unauthorized,
      Self::Forbidden => ErrorKind::Forbidden,
      Self::PreconditionFailed => ErrorKind::PreconditionFailed,
      Self::UnprocessableEntity(_) => ErrorKind::UnprocessableEntity,
      Self::UnsupportedMediaType(_) => ErrorKind::UnsupportedMediaType,
      Self::Timeout => ErrorKind::Timeout,
      Self::NotImplemented(_) => ErrorKind::NotImplemented,
      Self::InvalidOperation(_) | Self::Store(_) => ErrorKind::Unclassified,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
