//! Customer and phone entities, their transfer models, and the query type
//! used to filter customers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::record::{Model, Record, RecordMeta};

/// Longest name or email a customer may carry.
pub const MAX_TEXT_LEN: usize = 255;
/// Longest area code, in digits.
pub const MAX_DDD_LEN: usize = 3;
/// Longest subscriber number, in digits.
pub const MAX_NUMBER_LEN: usize = 9;

// ─── Entities ────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PhoneKind {
  #[default]
  #[serde(alias = "fixo")]
  Landline,
  #[serde(alias = "movel")]
  Mobile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Phone {
  pub meta:        RecordMeta,
  /// Area code, digits only.
  pub ddd:         String,
  /// Subscriber number, digits only.
  pub number:      String,
  pub kind:        PhoneKind,
  /// Owning customer. Nil until the customer is persisted.
  pub customer_id: Uuid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
  pub meta:   RecordMeta,
  pub name:   String,
  pub email:  String,
  pub phones: Vec<Phone>,
}

impl Record for Customer {
  fn meta(&self) -> &RecordMeta { &self.meta }

  fn meta_mut(&mut self) -> &mut RecordMeta { &mut self.meta }
}

impl Record for Phone {
  fn meta(&self) -> &RecordMeta { &self.meta }

  fn meta_mut(&mut self) -> &mut RecordMeta { &mut self.meta }
}

// ─── Transfer models ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneView {
  #[serde(default)]
  pub id:         Uuid,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub updated_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub ddd:        String,
  #[serde(default, alias = "phoneNumber")]
  pub number:     String,
  #[serde(default, alias = "phoneType")]
  pub kind:       PhoneKind,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerView {
  #[serde(default)]
  pub id:         Uuid,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub updated_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub name:       String,
  #[serde(default)]
  pub email:      String,
  #[serde(default, alias = "phoneNumbers")]
  pub phones:     Vec<PhoneView>,
}

/// Body of a partial customer update: a new email (ignored when empty) and
/// phones to add or overwrite.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdateView {
  #[serde(default)]
  pub email:  String,
  #[serde(default, alias = "phoneNumbers")]
  pub phones: Vec<PhoneView>,
}

impl Model for CustomerView {
  fn id(&self) -> Uuid { self.id }

  fn set_id(&mut self, id: Uuid) { self.id = id; }

  fn created_at(&self) -> Option<DateTime<Utc>> { self.created_at }

  fn set_created_at(&mut self, at: Option<DateTime<Utc>>) {
    self.created_at = at;
  }
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// Filter over customers. Every set field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerQuery {
  /// Exact email match.
  pub email:           Option<String>,
  /// Exclude the customer with this id.
  pub exclude_id:      Option<Uuid>,
  /// The customer owns a phone with this `(ddd, number)` pair.
  pub phone:           Option<(String, String)>,
  /// Also match soft-deleted customers.
  pub include_deleted: bool,
}

impl CustomerQuery {
  pub fn by_email(email: impl Into<String>) -> Self {
    Self { email: Some(email.into()), ..Self::default() }
  }

  pub fn by_phone(ddd: impl Into<String>, number: impl Into<String>) -> Self {
    Self { phone: Some((ddd.into(), number.into())), ..Self::default() }
  }

  /// Narrow the query to customers other than `id`.
  pub fn excluding(mut self, id: Uuid) -> Self {
    self.exclude_id = Some(id);
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn view_accepts_legacy_field_names() {
    let json = serde_json::json!({
      "name": "John",
      "email": "john@test.com",
      "phoneNumbers": [
        { "ddd": "(41)", "phoneNumber": "3456-7890", "phoneType": "movel" }
      ]
    });
    let view: CustomerView = serde_json::from_value(json).unwrap();
    assert!(view.id.is_nil());
    assert_eq!(view.phones.len(), 1);
    assert_eq!(view.phones[0].number, "3456-7890");
    assert_eq!(view.phones[0].kind, PhoneKind::Mobile);
  }

  #[test]
  fn view_serializes_camel_case() {
    let view = CustomerView {
      name: "Ana".into(),
      email: "ana@test.com".into(),
      phones: vec![PhoneView {
        ddd: "41".into(),
        number: "34567890".into(),
        ..PhoneView::default()
      }],
      ..CustomerView::default()
    };
    let json = serde_json::to_value(&view).unwrap();
    assert!(json.get("createdAt").is_some());
    assert_eq!(json["phones"][0]["kind"], "landline");
  }

  #[test]
  fn phone_kind_round_trips_through_strum() {
    assert_eq!(PhoneKind::Mobile.as_ref(), "mobile");
    assert_eq!("landline".parse::<PhoneKind>().unwrap(), PhoneKind::Landline);
    assert!("satellite".parse::<PhoneKind>().is_err());
  }

  #[test]
  fn excluding_keeps_other_filters() {
    let id = Uuid::new_v4();
    let q = CustomerQuery::by_email("a@b.c").excluding(id);
    assert_eq!(q.email.as_deref(), Some("a@b.c"));
    assert_eq!(q.exclude_id, Some(id));
    assert!(!q.include_deleted);
  }
}
