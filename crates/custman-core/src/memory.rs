//! An in-memory [`Gateway`] for exercising the services without a database.

use std::sync::{
  Arc, Mutex,
  atomic::{AtomicU64, Ordering},
};

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Error, Result,
  customer::{Customer, CustomerQuery},
  gateway::Gateway,
  record::ReadMode,
};

#[derive(Clone, Default)]
pub struct MemoryGateway {
  rows:    Arc<Mutex<Vec<Customer>>>,
  changes: Arc<AtomicU64>,
}

impl MemoryGateway {
  /// Every stored row, deleted or not.
  pub fn rows(&self) -> Vec<Customer> { self.rows.lock().unwrap().clone() }

  fn stamp_new(customer: &mut Customer) {
    let now = Utc::now();
    if customer.meta.id.is_nil() {
      customer.meta.id = Uuid::new_v4();
    }
    customer.meta.created_at = now;
    customer.meta.updated_at = Some(now);
    customer.meta.is_deleted = false;
    customer.meta.active = true;
    Self::stamp_phones(customer);
  }

  fn stamp_phones(customer: &mut Customer) {
    let now = Utc::now();
    for p in &mut customer.phones {
      if p.meta.id.is_nil() {
        p.meta.id = Uuid::new_v4();
        p.meta.created_at = now;
      }
      p.meta.updated_at = Some(now);
      p.customer_id = customer.meta.id;
    }
  }

  fn matches(c: &Customer, q: &CustomerQuery) -> bool {
    (q.include_deleted || !c.meta.is_deleted)
      && q.email.as_ref().is_none_or(|e| &c.email == e)
      && q.exclude_id.is_none_or(|id| c.meta.id != id)
      && q.phone.as_ref().is_none_or(|(ddd, number)| {
        c.phones.iter().any(|p| &p.ddd == ddd && &p.number == number)
      })
  }

  fn page(rows: Vec<Customer>, page: u64, size: u64) -> Vec<Customer> {
    let mut rows = rows;
    rows.sort_by_key(|c| c.meta.created_at);
    let skip = usize::try_from(page.saturating_mul(size)).unwrap_or(usize::MAX);
    let take = usize::try_from(size).unwrap_or(usize::MAX);
    rows.into_iter().skip(skip).take(take).collect()
  }
}

impl Gateway for MemoryGateway {
  type Entity = Customer;
  type Error = Error;
  type Query = CustomerQuery;

  async fn add(&self, mut entity: Customer) -> Result<Customer> {
    Self::stamp_new(&mut entity);
    let mut rows = self.rows.lock().unwrap();
    if rows.iter().any(|c| c.meta.id == entity.meta.id) {
      return Err(Error::Conflict("record id already in use".into()));
    }
    rows.push(entity.clone());
    self.changes.fetch_add(1, Ordering::SeqCst);
    Ok(entity)
  }

  async fn add_many(&self, entities: Vec<Customer>) -> Result<Vec<Customer>> {
    let mut out = Vec::with_capacity(entities.len());
    for mut entity in entities {
      Self::stamp_new(&mut entity);
      out.push(entity);
    }
    let mut rows = self.rows.lock().unwrap();
    if out.iter().any(|e| rows.iter().any(|c| c.meta.id == e.meta.id)) {
      return Err(Error::Conflict("record id already in use".into()));
    }
    rows.extend(out.iter().cloned());
    self.changes.fetch_add(out.len() as u64, Ordering::SeqCst);
    Ok(out)
  }

  async fn delete(&self, id: Uuid) -> Result<()> {
    let mut rows = self.rows.lock().unwrap();
    let before = rows.len();
    rows.retain(|c| c.meta.id != id);
    if rows.len() == before {
      return Err(Error::InvalidOperation("entity does not exist".into()));
    }
    self.changes.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }

  async fn save_or_update(&self, mut entity: Customer) -> Result<Customer> {
    let mut rows = self.rows.lock().unwrap();
    match rows.iter_mut().find(|c| c.meta.id == entity.meta.id) {
      Some(row) => {
        entity.meta.created_at = row.meta.created_at;
        entity.meta.updated_at = Some(Utc::now());
        Self::stamp_phones(&mut entity);
        *row = entity.clone();
      }
      None => {
        Self::stamp_new(&mut entity);
        rows.push(entity.clone());
      }
    }
    self.changes.fetch_add(1, Ordering::SeqCst);
    Ok(entity)
  }

  async fn save(&self) -> Result<u64> { Ok(self.changes.swap(0, Ordering::SeqCst)) }

  async fn count(&self, query: Option<CustomerQuery>) -> Result<u64> {
    let q = query.unwrap_or_default();
    let rows = self.rows.lock().unwrap();
    Ok(rows.iter().filter(|c| Self::matches(c, &q)).count() as u64)
  }

  async fn get(&self, id: Uuid, _mode: ReadMode) -> Result<Option<Customer>> {
    let rows = self.rows.lock().unwrap();
    Ok(
      rows
        .iter()
        .find(|c| c.meta.id == id && !c.meta.is_deleted)
        .cloned(),
    )
  }

  async fn get_page(
    &self,
    page: u64,
    page_size: u64,
    mode: ReadMode,
  ) -> Result<Vec<Customer>> {
    self.find(CustomerQuery::default(), page, page_size, mode).await
  }

  async fn find(
    &self,
    query: CustomerQuery,
    page: u64,
    page_size: u64,
    _mode: ReadMode,
  ) -> Result<Vec<Customer>> {
    let matching: Vec<Customer> = {
      let rows = self.rows.lock().unwrap();
      rows.iter().filter(|c| Self::matches(c, &query)).cloned().collect()
    };
    Ok(Self::page(matching, page, page_size))
  }

  async fn exists(&self, query: CustomerQuery) -> Result<bool> {
    let rows = self.rows.lock().unwrap();
    Ok(rows.iter().any(|c| Self::matches(c, &query)))
  }
}
