//! Encoding and decoding helpers between the domain entities and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings with
//! microsecond precision, so lexical order is chronological order. UUIDs are
//! stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use custman_core::{
  customer::{Customer, Phone, PhoneKind},
  record::RecordMeta,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── PhoneKind ───────────────────────────────────────────────────────────────

pub fn encode_phone_kind(k: PhoneKind) -> String { k.as_ref().to_owned() }

pub fn decode_phone_kind(s: &str) -> Result<PhoneKind> {
  s.parse().map_err(|_| Error::PhoneKind(s.to_owned()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw column values of a `customers` row.
#[derive(Debug, Clone)]
pub struct RawCustomer {
  pub customer_id: String,
  pub name:        String,
  pub email:       String,
  pub active:      bool,
  pub is_deleted:  bool,
  pub created_at:  String,
  pub updated_at:  Option<String>,
}

/// Raw column values of a `phones` row.
#[derive(Debug, Clone)]
pub struct RawPhone {
  pub phone_id:    String,
  pub customer_id: String,
  pub ddd:         String,
  pub number:      String,
  pub kind:        String,
  pub active:      bool,
  pub is_deleted:  bool,
  pub created_at:  String,
  pub updated_at:  Option<String>,
}

/// A customer row together with its phone rows, in storage order.
#[derive(Debug, Clone)]
pub struct RawAggregate {
  pub customer: RawCustomer,
  pub phones:   Vec<RawPhone>,
}

fn decode_meta(
  id: &str,
  active: bool,
  is_deleted: bool,
  created_at: &str,
  updated_at: Option<&str>,
) -> Result<RecordMeta> {
  Ok(RecordMeta {
    id: decode_uuid(id)?,
    active,
    is_deleted,
    created_at: decode_dt(created_at)?,
    updated_at: updated_at.map(decode_dt).transpose()?,
  })
}

impl RawCustomer {
  pub fn from_customer(c: &Customer) -> Self {
    Self {
      customer_id: encode_uuid(c.meta.id),
      name:        c.name.clone(),
      email:       c.email.clone(),
      active:      c.meta.active,
      is_deleted:  c.meta.is_deleted,
      created_at:  encode_dt(c.meta.created_at),
      updated_at:  c.meta.updated_at.map(encode_dt),
    }
  }
}

impl RawPhone {
  pub fn from_phone(p: &Phone) -> Self {
    Self {
      phone_id:    encode_uuid(p.meta.id),
      customer_id: encode_uuid(p.customer_id),
      ddd:         p.ddd.clone(),
      number:      p.number.clone(),
      kind:        encode_phone_kind(p.kind),
      active:      p.meta.active,
      is_deleted:  p.meta.is_deleted,
      created_at:  encode_dt(p.meta.created_at),
      updated_at:  p.meta.updated_at.map(encode_dt),
    }
  }

  pub fn into_phone(self) -> Result<Phone> {
    Ok(Phone {
      meta:        decode_meta(
        &self.phone_id,
        self.active,
        self.is_deleted,
        &self.created_at,
        self.updated_at.as_deref(),
      )?,
      ddd:         self.ddd,
      number:      self.number,
      kind:        decode_phone_kind(&self.kind)?,
      customer_id: decode_uuid(&self.customer_id)?,
    })
  }
}

impl RawAggregate {
  pub fn from_customer(c: &Customer) -> Self {
    Self {
      customer: RawCustomer::from_customer(c),
      phones:   c.phones.iter().map(RawPhone::from_phone).collect(),
    }
  }

  pub fn into_customer(self) -> Result<Customer> {
    let c = self.customer;
    Ok(Customer {
      meta:   decode_meta(
        &c.customer_id,
        c.active,
        c.is_deleted,
        &c.created_at,
        c.updated_at.as_deref(),
      )?,
      name:   c.name,
      email:  c.email,
      phones: self
        .phones
        .into_iter()
        .map(RawPhone::into_phone)
        .collect::<Result<_>>()?,
    })
  }
}
