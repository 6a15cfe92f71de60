//! [`SqliteStore`]: the SQLite implementation of [`Gateway`].

use std::{
  path::Path,
  sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
  },
};

use chrono::{DateTime, Utc};
use rusqlite::{
  Connection, OptionalExtension as _, Row, Transaction, TransactionBehavior,
  types::Value,
};
use uuid::Uuid;

use custman_core::{
  customer::{Customer, CustomerQuery},
  gateway::Gateway,
  record::ReadMode,
};

use crate::{
  Error, Result,
  encode::{RawAggregate, RawCustomer, RawPhone, encode_dt, encode_uuid},
  schema::SCHEMA,
};

const CUSTOMER_COLUMNS: &str = "c.customer_id, c.name, c.email, c.active, \
                                c.is_deleted, c.created_at, c.updated_at";

const PHONE_COLUMNS: &str = "phone_id, customer_id, ddd, number, kind, \
                             active, is_deleted, created_at, updated_at";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A customer gateway backed by a single SQLite file.
///
/// Cloning is cheap; clones share the connection and the change counter.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  changes: Arc<AtomicU64>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn, changes: Arc::new(AtomicU64::new(0)) })
  }

  fn record_changes(&self, n: u64) { self.changes.fetch_add(n, Ordering::Relaxed); }

  /// Run `filter` on the connection thread and decode the matching customers.
  async fn select(
    &self,
    filter: Filter,
    page: u64,
    page_size: u64,
    mode: ReadMode,
  ) -> Result<Vec<Customer>> {
    let (limit, offset) = limit_offset(page, page_size);

    let raws: Vec<RawAggregate> = self
      .conn
      .call(move |conn| {
        let tx = begin_read(conn, mode)?;
        let raws = select_aggregates(&tx, &filter, limit, offset)?;
        tx.commit()?;
        Ok(raws)
      })
      .await?;

    raws.into_iter().map(RawAggregate::into_customer).collect()
  }
}

/// Assign ids and timestamps the caller left blank.
fn stamp(customer: &mut Customer, now: DateTime<Utc>) {
  if customer.meta.id.is_nil() {
    customer.meta.id = Uuid::new_v4();
  }
  customer.meta.updated_at = Some(now);

  for p in &mut customer.phones {
    if p.meta.id.is_nil() {
      p.meta.id = Uuid::new_v4();
      p.meta.created_at = now;
    }
    p.meta.updated_at = Some(now);
    p.customer_id = customer.meta.id;
  }
}

// ─── SQL helpers (connection thread) ─────────────────────────────────────────

/// A `WHERE` clause over `customers c` and its positional parameters.
struct Filter {
  clause: String,
  params: Vec<Value>,
}

impl Filter {
  fn new(query: &CustomerQuery) -> Self {
    let mut conds: Vec<&'static str> = vec![];
    let mut params = vec![];

    if !query.include_deleted {
      conds.push("c.is_deleted = 0");
    }
    if let Some(email) = &query.email {
      conds.push("c.email = ?");
      params.push(Value::Text(email.clone()));
    }
    if let Some(id) = query.exclude_id {
      conds.push("c.customer_id <> ?");
      params.push(Value::Text(encode_uuid(id)));
    }
    if let Some((ddd, number)) = &query.phone {
      conds.push(
        "EXISTS (SELECT 1 FROM phones p
                 WHERE p.customer_id = c.customer_id
                   AND p.ddd = ? AND p.number = ?)",
      );
      params.push(Value::Text(ddd.clone()));
      params.push(Value::Text(number.clone()));
    }

    let clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };
    Self { clause, params }
  }

  fn by_id(id: &str, include_deleted: bool) -> Self {
    let clause = if include_deleted {
      "WHERE c.customer_id = ?"
    } else {
      "WHERE c.customer_id = ? AND c.is_deleted = 0"
    };
    Self { clause: clause.to_owned(), params: vec![Value::Text(id.to_owned())] }
  }
}

/// SQLite reads a negative `LIMIT` as "no limit".
fn limit_offset(page: u64, page_size: u64) -> (i64, i64) {
  let limit = i64::try_from(page_size).unwrap_or(-1);
  let offset = i64::try_from(page.saturating_mul(page_size)).unwrap_or(i64::MAX);
  (limit, offset)
}

/// `Tracked` reads take the write lock for the duration of the read only; it
/// is released at commit, before the caller writes anything back.
fn begin_read(conn: &mut Connection, mode: ReadMode) -> rusqlite::Result<Transaction<'_>> {
  let behavior = match mode {
    ReadMode::Snapshot => TransactionBehavior::Deferred,
    ReadMode::Tracked => TransactionBehavior::Immediate,
  };
  conn.transaction_with_behavior(behavior)
}

fn raw_customer(row: &Row<'_>) -> rusqlite::Result<RawCustomer> {
  Ok(RawCustomer {
    customer_id: row.get(0)?,
    name:        row.get(1)?,
    email:       row.get(2)?,
    active:      row.get(3)?,
    is_deleted:  row.get(4)?,
    created_at:  row.get(5)?,
    updated_at:  row.get(6)?,
  })
}

fn raw_phone(row: &Row<'_>) -> rusqlite::Result<RawPhone> {
  Ok(RawPhone {
    phone_id:    row.get(0)?,
    customer_id: row.get(1)?,
    ddd:         row.get(2)?,
    number:      row.get(3)?,
    kind:        row.get(4)?,
    active:      row.get(5)?,
    is_deleted:  row.get(6)?,
    created_at:  row.get(7)?,
    updated_at:  row.get(8)?,
  })
}

fn select_phones(conn: &Connection, customer_id: &str) -> rusqlite::Result<Vec<RawPhone>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {PHONE_COLUMNS} FROM phones
     WHERE customer_id = ?1
     ORDER BY created_at, rowid"
  ))?;
  let phones = stmt
    .query_map([customer_id], raw_phone)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(phones)
}

fn select_aggregates(
  conn: &Connection,
  filter: &Filter,
  limit: i64,
  offset: i64,
) -> rusqlite::Result<Vec<RawAggregate>> {
  let sql = format!(
    "SELECT {CUSTOMER_COLUMNS} FROM customers c
     {}
     ORDER BY c.created_at, c.rowid
     LIMIT ? OFFSET ?",
    filter.clause
  );

  let mut params = filter.params.clone();
  params.push(Value::Integer(limit));
  params.push(Value::Integer(offset));

  let mut stmt = conn.prepare(&sql)?;
  let customers = stmt
    .query_map(rusqlite::params_from_iter(params), raw_customer)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut aggregates = Vec::with_capacity(customers.len());
  for customer in customers {
    let phones = select_phones(conn, &customer.customer_id)?;
    aggregates.push(RawAggregate { customer, phones });
  }
  Ok(aggregates)
}

fn select_one(
  conn: &Connection,
  id: &str,
  include_deleted: bool,
) -> rusqlite::Result<Option<RawAggregate>> {
  let filter = Filter::by_id(id, include_deleted);
  Ok(select_aggregates(conn, &filter, 1, 0)?.into_iter().next())
}

fn customer_exists(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM customers WHERE customer_id = ?1",
        [id],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

fn insert_customer(conn: &Connection, c: &RawCustomer) -> rusqlite::Result<usize> {
  conn.execute(
    "INSERT INTO customers (
       customer_id, name, email, active, is_deleted, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    rusqlite::params![
      c.customer_id,
      c.name,
      c.email,
      c.active,
      c.is_deleted,
      c.created_at,
      c.updated_at,
    ],
  )
}

/// Overwrite the mutable columns; `created_at` is never rewritten.
fn update_customer(conn: &Connection, c: &RawCustomer) -> rusqlite::Result<usize> {
  conn.execute(
    "UPDATE customers
     SET name = ?2, email = ?3, active = ?4, is_deleted = ?5, updated_at = ?6
     WHERE customer_id = ?1",
    rusqlite::params![
      c.customer_id,
      c.name,
      c.email,
      c.active,
      c.is_deleted,
      c.updated_at,
    ],
  )
}

/// Insert the phone, or update it when the id already belongs to this
/// customer. Returns 0 when the id belongs to someone else.
fn upsert_phone(conn: &Connection, p: &RawPhone) -> rusqlite::Result<usize> {
  conn.execute(
    "INSERT INTO phones (
       phone_id, customer_id, ddd, number, kind,
       active, is_deleted, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
     ON CONFLICT(phone_id) DO UPDATE SET
       ddd        = excluded.ddd,
       number     = excluded.number,
       kind       = excluded.kind,
       active     = excluded.active,
       is_deleted = excluded.is_deleted,
       updated_at = excluded.updated_at
     WHERE phones.customer_id = excluded.customer_id",
    rusqlite::params![
      p.phone_id,
      p.customer_id,
      p.ddd,
      p.number,
      p.kind,
      p.active,
      p.is_deleted,
      p.created_at,
      p.updated_at,
    ],
  )
}

/// Make the customer's phone rows exactly `phones`: upsert each one and
/// delete the rows that are no longer listed. Returns the rows changed.
fn replace_phones(
  conn: &Connection,
  customer_id: &str,
  phones: Vec<RawPhone>,
) -> rusqlite::Result<u64> {
  let mut changed = 0;
  let mut kept = Vec::with_capacity(phones.len());

  for mut p in phones {
    p.customer_id = customer_id.to_owned();
    let mut n = upsert_phone(conn, &p)?;
    if n == 0 {
      p.phone_id = encode_uuid(Uuid::new_v4());
      n = upsert_phone(conn, &p)?;
    }
    changed += n as u64;
    kept.push(p.phone_id);
  }

  let mut stmt = conn.prepare("SELECT phone_id FROM phones WHERE customer_id = ?1")?;
  let existing = stmt
    .query_map([customer_id], |r| r.get::<_, String>(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  drop(stmt);

  for id in existing.iter().filter(|id| !kept.contains(id)) {
    changed += conn.execute("DELETE FROM phones WHERE phone_id = ?1", [id])? as u64;
  }

  Ok(changed)
}

fn insert_aggregate(conn: &Connection, raw: RawAggregate) -> rusqlite::Result<u64> {
  let inserted = insert_customer(conn, &raw.customer)? as u64;
  Ok(inserted + replace_phones(conn, &raw.customer.customer_id, raw.phones)?)
}

// ─── Gateway impl ────────────────────────────────────────────────────────────

impl Gateway for SqliteStore {
  type Entity = Customer;
  type Error = Error;
  type Query = CustomerQuery;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn add(&self, mut entity: Customer) -> Result<Customer> {
    let now = Utc::now();
    entity.meta.created_at = now;
    stamp(&mut entity, now);

    let id = entity.meta.id;
    let id_str = encode_uuid(id);
    let raw = RawAggregate::from_customer(&entity);

    let (stored, changed): (Option<RawAggregate>, u64) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = insert_aggregate(&tx, raw)?;
        let stored = select_one(&tx, &id_str, true)?;
        tx.commit()?;
        Ok((stored, changed))
      })
      .await?;

    self.record_changes(changed);
    stored.ok_or(Error::CustomerNotFound(id))?.into_customer()
  }

  async fn add_many(&self, entities: Vec<Customer>) -> Result<Vec<Customer>> {
    let now = Utc::now();
    let raws: Vec<RawAggregate> = entities
      .into_iter()
      .map(|mut entity| {
        entity.meta.created_at = now;
        stamp(&mut entity, now);
        RawAggregate::from_customer(&entity)
      })
      .collect();

    let (stored, changed): (Vec<RawAggregate>, u64) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut changed = 0;
        let mut stored = Vec::with_capacity(raws.len());
        for raw in raws {
          let id = raw.customer.customer_id.clone();
          changed += insert_aggregate(&tx, raw)?;
          stored.extend(select_one(&tx, &id, true)?);
        }
        tx.commit()?;
        Ok((stored, changed))
      })
      .await?;

    self.record_changes(changed);
    stored.into_iter().map(RawAggregate::into_customer).collect()
  }

  async fn delete(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let deleted: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM customers WHERE customer_id = ?1", [id_str])?)
      })
      .await?;

    if deleted == 0 {
      return Err(Error::CustomerNotFound(id));
    }
    self.record_changes(deleted as u64);
    Ok(())
  }

  async fn save_or_update(&self, mut entity: Customer) -> Result<Customer> {
    let now = Utc::now();
    stamp(&mut entity, now);

    let id = entity.meta.id;
    let id_str = encode_uuid(id);
    let now_str = encode_dt(now);
    let mut raw = RawAggregate::from_customer(&entity);

    let (stored, changed): (Option<RawAggregate>, u64) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = if customer_exists(&tx, &id_str)? {
          let updated = update_customer(&tx, &raw.customer)? as u64;
          updated + replace_phones(&tx, &id_str, raw.phones)?
        } else {
          raw.customer.created_at = now_str;
          insert_aggregate(&tx, raw)?
        };
        let stored = select_one(&tx, &id_str, true)?;
        tx.commit()?;
        Ok((stored, changed))
      })
      .await?;

    self.record_changes(changed);
    stored.ok_or(Error::CustomerNotFound(id))?.into_customer()
  }

  async fn save(&self) -> Result<u64> { Ok(self.changes.swap(0, Ordering::Relaxed)) }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn count(&self, query: Option<CustomerQuery>) -> Result<u64> {
    let filter = Filter::new(&query.unwrap_or_default());

    let n: i64 = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT COUNT(*) FROM customers c {}", filter.clause);
        Ok(conn.query_row(&sql, rusqlite::params_from_iter(filter.params), |r| {
          r.get(0)
        })?)
      })
      .await?;

    Ok(u64::try_from(n).unwrap_or(0))
  }

  async fn get(&self, id: Uuid, mode: ReadMode) -> Result<Option<Customer>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAggregate> = self
      .conn
      .call(move |conn| {
        let tx = begin_read(conn, mode)?;
        let raw = select_one(&tx, &id_str, false)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawAggregate::into_customer).transpose()
  }

  async fn get_page(
    &self,
    page: u64,
    page_size: u64,
    mode: ReadMode,
  ) -> Result<Vec<Customer>> {
    let filter = Filter::new(&CustomerQuery::default());
    self.select(filter, page, page_size, mode).await
  }

  async fn find(
    &self,
    query: CustomerQuery,
    page: u64,
    page_size: u64,
    mode: ReadMode,
  ) -> Result<Vec<Customer>> {
    self.select(Filter::new(&query), page, page_size, mode).await
  }

  async fn exists(&self, query: CustomerQuery) -> Result<bool> {
    let filter = Filter::new(&query);

    let found: bool = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT EXISTS (SELECT 1 FROM customers c {})", filter.clause);
        Ok(conn.query_row(&sql, rusqlite::params_from_iter(filter.params), |r| {
          r.get(0)
        })?)
      })
      .await?;

    Ok(found)
  }
}
