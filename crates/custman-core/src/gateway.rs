//! The `Gateway` trait: generic data access over one aggregate table.
//!
//! The trait is implemented by storage backends (e.g.
//! `custman-store-sqlite`). The services in this crate depend on this
//! abstraction, never on a concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::record::{ReadMode, Record};

/// Page size meaning "no limit".
pub const UNBOUNDED: u64 = u64::MAX;

/// Abstraction over persistence for one entity type.
///
/// Every mutating method is its own unit of work: either everything it writes
/// (including owned child rows) is committed, or nothing is.
///
/// Default read paths (`get`, `get_page`, `find`, `count`, `exists`) skip
/// soft-deleted rows unless the query says otherwise.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait Gateway: Send + Sync {
  type Entity: Record + Send + Sync + 'static;
  /// Filter predicate over [`Self::Entity`].
  type Query: Send + Sync + 'static;
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert one entity. The store assigns the id (when nil) and timestamps.
  fn add(
    &self,
    entity: Self::Entity,
  ) -> impl Future<Output = Result<Self::Entity, Self::Error>> + Send;

  /// Insert several entities in one transaction.
  fn add_many(
    &self,
    entities: Vec<Self::Entity>,
  ) -> impl Future<Output = Result<Vec<Self::Entity>, Self::Error>> + Send;

  /// Physically remove the row with `id`.
  ///
  /// Fails with an invalid-operation error when no such row exists.
  fn delete(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send;

  /// Physically remove `entity`'s row.
  fn delete_entity(
    &self,
    entity: Self::Entity,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send {
    self.delete(entity.id())
  }

  /// Update the row with the entity's id if there is one, insert otherwise.
  fn save_or_update(
    &self,
    entity: Self::Entity,
  ) -> impl Future<Output = Result<Self::Entity, Self::Error>> + Send;

  fn update(
    &self,
    entity: Self::Entity,
  ) -> impl Future<Output = Result<Self::Entity, Self::Error>> + Send {
    self.save_or_update(entity)
  }

  /// Upsert under `key`, regardless of the id the payload carries.
  fn update_with_key(
    &self,
    mut entity: Self::Entity,
    key: Uuid,
  ) -> impl Future<Output = Result<Self::Entity, Self::Error>> + Send {
    entity.meta_mut().id = key;
    self.save_or_update(entity)
  }

  /// Number of rows changed since the previous call.
  fn save(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send;

  // ── Reads ─────────────────────────────────────────────────────────────

  fn count(
    &self,
    query: Option<Self::Query>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send;

  fn get(
    &self,
    id: Uuid,
    mode: ReadMode,
  ) -> impl Future<Output = Result<Option<Self::Entity>, Self::Error>> + Send;

  /// One page of entities ordered by creation time, oldest first.
  /// `page` is zero-based.
  fn get_page(
    &self,
    page: u64,
    page_size: u64,
    mode: ReadMode,
  ) -> impl Future<Output = Result<Vec<Self::Entity>, Self::Error>> + Send;

  /// Like [`Gateway::get_page`], restricted to entities matching `query`.
  fn find(
    &self,
    query: Self::Query,
    page: u64,
    page_size: u64,
    mode: ReadMode,
  ) -> impl Future<Output = Result<Vec<Self::Entity>, Self::Error>> + Send;

  fn exists(
    &self,
    query: Self::Query,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}
