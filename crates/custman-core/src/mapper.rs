//! Conversion between stored entities and transfer models.
//!
//! The services never touch field mappings themselves; they hand values to a
//! [`Mapper`] and get the other shape back.

use uuid::Uuid;

use crate::{
  customer::{Customer, CustomerView, Phone, PhoneView},
  record::RecordMeta,
};

/// Bidirectional converter between an entity `E` and its transfer model.
pub trait Mapper<E>: Send + Sync {
  type Model;

  fn to_model(&self, entity: E) -> Self::Model;
  fn to_entity(&self, model: Self::Model) -> E;

  fn to_models(&self, entities: Vec<E>) -> Vec<Self::Model> {
    entities.into_iter().map(|e| self.to_model(e)).collect()
  }

  fn to_entities(&self, models: Vec<Self::Model>) -> Vec<E> {
    models.into_iter().map(|m| self.to_entity(m)).collect()
  }
}

/// Field mapping for [`Customer`] ⇄ [`CustomerView`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerMapper;

impl CustomerMapper {
  fn phone_to_view(phone: Phone) -> PhoneView {
    PhoneView {
      id:         phone.meta.id,
      created_at: Some(phone.meta.created_at),
      updated_at: phone.meta.updated_at,
      ddd:        phone.ddd,
      number:     phone.number,
      kind:       phone.kind,
    }
  }

  fn phone_from_view(view: PhoneView, customer_id: Uuid) -> Phone {
    let mut meta = RecordMeta::new(view.id);
    if let Some(at) = view.created_at {
      meta.created_at = at;
    }
    meta.updated_at = view.updated_at;
    Phone {
      meta,
      ddd: view.ddd,
      number: view.number,
      kind: view.kind,
      customer_id,
    }
  }
}

impl Mapper<Customer> for CustomerMapper {
  type Model = CustomerView;

  fn to_model(&self, entity: Customer) -> CustomerView {
    CustomerView {
      id:         entity.meta.id,
      created_at: Some(entity.meta.created_at),
      updated_at: entity.meta.updated_at,
      name:       entity.name,
      email:      entity.email,
      phones:     entity.phones.into_iter().map(Self::phone_to_view).collect(),
    }
  }

  fn to_entity(&self, model: CustomerView) -> Customer {
    let mut meta = RecordMeta::new(model.id);
    if let Some(at) = model.created_at {
      meta.created_at = at;
    }
    meta.updated_at = model.updated_at;
    let customer_id = model.id;
    Customer {
      meta,
      name: model.name,
      email: model.email,
      phones: model
        .phones
        .into_iter()
        .map(|p| Self::phone_from_view(p, customer_id))
        .collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;
  use crate::customer::PhoneKind;

  #[test]
  fn entity_round_trip_keeps_business_fields() {
    let id = Uuid::new_v4();
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let view = CustomerView {
      id,
      created_at: Some(at),
      updated_at: None,
      name: "John".into(),
      email: "john@test.com".into(),
      phones: vec![PhoneView {
        ddd: "41".into(),
        number: "34567890".into(),
        kind: PhoneKind::Mobile,
        ..PhoneView::default()
      }],
    };

    let entity = CustomerMapper.to_entity(view.clone());
    assert_eq!(entity.meta.id, id);
    assert_eq!(entity.meta.created_at, at);
    assert!(entity.meta.active);
    assert_eq!(entity.phones[0].customer_id, id);

    let back = CustomerMapper.to_model(entity);
    assert_eq!(back.name, view.name);
    assert_eq!(back.phones[0].ddd, "41");
    assert_eq!(back.phones[0].kind, PhoneKind::Mobile);
  }
}
