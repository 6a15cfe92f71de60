//! Record metadata shared by every stored entity and transfer model.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Bookkeeping columns carried by every entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMeta {
  /// `Uuid::nil()` until the store assigns one.
  pub id:         Uuid,
  pub active:     bool,
  /// Soft-delete marker. Deleted rows stay in the table but drop out of
  /// every default read path.
  pub is_deleted: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: Option<DateTime<Utc>>,
}

impl RecordMeta {
  /// Metadata for a record that has not been persisted yet.
  pub fn new(id: Uuid) -> Self {
    Self {
      id,
      active: true,
      is_deleted: false,
      created_at: Utc::now(),
      updated_at: None,
    }
  }
}

impl Default for RecordMeta {
  fn default() -> Self { Self::new(Uuid::nil()) }
}

/// An entity the persistence gateway can store.
pub trait Record {
  fn meta(&self) -> &RecordMeta;
  fn meta_mut(&mut self) -> &mut RecordMeta;

  fn id(&self) -> Uuid { self.meta().id }
}

/// The transport-facing shape of a [`Record`].
pub trait Model {
  fn id(&self) -> Uuid;
  fn set_id(&mut self, id: Uuid);
  fn created_at(&self) -> Option<DateTime<Utc>>;
  fn set_created_at(&mut self, at: Option<DateTime<Utc>>);
}

/// How a read is going to be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
  /// A read-only copy; nothing will be written back.
  #[default]
  Snapshot,
  /// The result is about to be mutated and written back.
  ///
  /// Stores may serialize the read itself against concurrent writers, but
  /// no lock is held between the read and the later write.
  Tracked,
}
