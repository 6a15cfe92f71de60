//! Generic create/read/update/delete lifecycle over a [`Gateway`].
//!
//! A [`DomainService`] is assembled from three parts: the gateway that talks
//! to storage, a [`Rules`] value that knows how to validate one model type,
//! and a [`Mapper`] that converts between entities and models. Concrete
//! services (see [`crate::customer_service`]) wrap a `DomainService` and add
//! their own operations.
//!
//! Deletes are soft: the row is flagged `is_deleted` and kept.

use std::future::Future;

use uuid::Uuid;

use crate::{
  Error, Result,
  gateway::{Gateway, UNBOUNDED},
  mapper::Mapper,
  record::{Model, ReadMode, Record},
};

fn lift<E: Into<Error>>(e: E) -> Error { e.into() }

// ─── Validation strategy ─────────────────────────────────────────────────────

/// Validation hooks run before every write.
///
/// Only [`Rules::validate_insert`] is required. The update and delete hooks
/// default to identity/existence checks and can be overridden.
pub trait Rules<G, M>: Send + Sync
where
  G: Gateway,
  M: Model + Send + Sync,
{
  /// Field-level and business-invariant checks for a model about to be
  /// stored.
  fn validate_insert(
    &self,
    gateway: &G,
    model: &M,
  ) -> impl Future<Output = Result<()>> + Send;

  /// Fails when the id is nil or the record does not exist, then defers to
  /// [`Rules::validate_insert`].
  fn validate_update(
    &self,
    gateway: &G,
    model: &M,
  ) -> impl Future<Output = Result<()>> + Send {
    async move {
      require_existing(gateway, model.id()).await?;
      self.validate_insert(gateway, model).await
    }
  }

  /// Fails when the id is nil or the record does not exist.
  fn validate_delete(
    &self,
    gateway: &G,
    model: &M,
  ) -> impl Future<Output = Result<()>> + Send {
    async move { require_existing(gateway, model.id()).await }
  }
}

async fn require_existing<G: Gateway>(gateway: &G, id: Uuid) -> Result<()> {
  if id.is_nil() {
    return Err(Error::Application("record identifier is required".into()));
  }
  match gateway.get(id, ReadMode::Snapshot).await.map_err(lift)? {
    Some(_) => Ok(()),
    None => Err(Error::not_found()),
  }
}

// ─── Service ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DomainService<G, R, C> {
  gateway: G,
  rules:   R,
  mapper:  C,
}

impl<G, R, C> DomainService<G, R, C>
where
  G: Gateway,
  C: Mapper<G::Entity>,
  C::Model: Model + Send + Sync + 'static,
  R: Rules<G, C::Model>,
{
  pub fn new(gateway: G, rules: R, mapper: C) -> Self {
    Self { gateway, rules, mapper }
  }

  pub fn gateway(&self) -> &G { &self.gateway }

  pub fn mapper(&self) -> &C { &self.mapper }

  // ── Add ───────────────────────────────────────────────────────────────────

  /// Insert `model` under a freshly generated id; any id it carries is
  /// discarded.
  pub async fn add(&self, mut model: C::Model) -> Result<C::Model> {
    model.set_id(Uuid::nil());
    self.rules.validate_insert(&self.gateway, &model).await?;

    let mut entity = self.mapper.to_entity(model);
    entity.meta_mut().active = true;

    let stored = self.gateway.add(entity).await.map_err(lift)?;
    Ok(self.mapper.to_model(stored))
  }

  /// Validate every model, then insert them all in one unit of work.
  pub async fn add_many(&self, mut models: Vec<C::Model>) -> Result<Vec<C::Model>> {
    for model in &mut models {
      model.set_id(Uuid::nil());
      self.rules.validate_insert(&self.gateway, model).await?;
    }

    let mut entities = self.mapper.to_entities(models);
    for entity in &mut entities {
      entity.meta_mut().active = true;
    }

    let stored = self.gateway.add_many(entities).await.map_err(lift)?;
    Ok(self.mapper.to_models(stored))
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub async fn count(&self) -> Result<u64> {
    self.gateway.count(None).await.map_err(lift)
  }

  pub async fn get(&self, id: Uuid, mode: ReadMode) -> Result<Option<C::Model>> {
    let entity = self.gateway.get(id, mode).await.map_err(lift)?;
    Ok(entity.map(|e| self.mapper.to_model(e)))
  }

  /// One page of models, oldest first.
  ///
  /// `page` is 1-based here; anything below 1 means the first page.
  /// `qty = None` means no limit.
  pub async fn get_page(
    &self,
    page: i64,
    qty: Option<u64>,
  ) -> Result<Vec<C::Model>> {
    let page = u64::try_from(page.saturating_sub(1)).unwrap_or(0);
    let qty = qty.unwrap_or(UNBOUNDED);

    let entities = self
      .gateway
      .get_page(page, qty, ReadMode::Snapshot)
      .await
      .map_err(lift)?;
    Ok(self.mapper.to_models(entities))
  }

  // ── Save / update ─────────────────────────────────────────────────────────

  /// Insert when the model has no id yet, update otherwise.
  pub async fn save_or_update(&self, model: C::Model) -> Result<C::Model> {
    if model.id().is_nil() {
      self.add(model).await
    } else {
      self.update(model).await
    }
  }

  pub async fn update(&self, mut model: C::Model) -> Result<C::Model> {
    self.rules.validate_update(&self.gateway, &model).await?;

    let record = self
      .gateway
      .get(model.id(), ReadMode::Snapshot)
      .await
      .map_err(lift)?
      .ok_or_else(Error::not_found)?;
    model.set_created_at(Some(record.meta().created_at));

    let entity = self.mapper.to_entity(model);
    let stored = self.gateway.update(entity).await.map_err(lift)?;
    Ok(self.mapper.to_model(stored))
  }

  /// Update the record stored under `key`, whatever id `model` carries.
  pub async fn update_with_key(
    &self,
    mut model: C::Model,
    key: Uuid,
  ) -> Result<C::Model> {
    model.set_id(key);
    self.rules.validate_update(&self.gateway, &model).await?;

    let record = self
      .gateway
      .get(key, ReadMode::Tracked)
      .await
      .map_err(lift)?
      .ok_or_else(Error::not_found)?;
    model.set_created_at(Some(record.meta().created_at));

    let entity = self.mapper.to_entity(model);
    let stored = self
      .gateway
      .update_with_key(entity, key)
      .await
      .map_err(lift)?;
    Ok(self.mapper.to_model(stored))
  }

  // ── Delete ────────────────────────────────────────────────────────────────

  pub async fn delete(&self, id: Uuid) -> Result<()> {
    let model = self
      .get(id, ReadMode::Snapshot)
      .await?
      .ok_or_else(Error::not_found)?;
    self.delete_model(model).await
  }

  /// Soft-delete the record behind `model`.
  pub async fn delete_model(&self, model: C::Model) -> Result<()> {
    self.rules.validate_delete(&self.gateway, &model).await?;

    let mut entity = self
      .gateway
      .get(model.id(), ReadMode::Tracked)
      .await
      .map_err(lift)?
      .ok_or_else(Error::not_found)?;

    let meta = entity.meta_mut();
    meta.is_deleted = true;
    meta.active = false;

    self.gateway.update(entity).await.map_err(lift)?;
    Ok(())
  }
}
