//! Customer-specific rules and operations on top of [`DomainService`].

use std::collections::HashSet;

use uuid::Uuid;

use crate::{
  Error, Result,
  customer::{
    Customer, CustomerQuery, CustomerUpdateView, CustomerView, MAX_DDD_LEN,
    MAX_NUMBER_LEN, MAX_TEXT_LEN, PhoneView,
  },
  gateway::{Gateway, UNBOUNDED},
  mapper::{CustomerMapper, Mapper as _},
  phone,
  record::ReadMode,
  service::{DomainService, Rules},
};

// ─── Rules ───────────────────────────────────────────────────────────────────

/// Validation for [`CustomerView`]: required name, well-formed email that no
/// other customer uses, and phone fields within column limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerRules;

impl<G> Rules<G, CustomerView> for CustomerRules
where
  G: Gateway<Entity = Customer, Query = CustomerQuery>,
{
  async fn validate_insert(&self, gateway: &G, model: &CustomerView) -> Result<()> {
    if model.name.trim().is_empty() {
      return Err(Error::Application("name required".into()));
    }
    if !is_plausible_email(&model.email) {
      return Err(Error::Application("invalid email".into()));
    }
    if model.name.chars().count() > MAX_TEXT_LEN {
      return Err(Error::UnprocessableEntity(format!(
        "name is longer than {MAX_TEXT_LEN} characters"
      )));
    }
    if model.email.chars().count() > MAX_TEXT_LEN {
      return Err(Error::UnprocessableEntity(format!(
        "email is longer than {MAX_TEXT_LEN} characters"
      )));
    }
    for p in &model.phones {
      if p.ddd.len() > MAX_DDD_LEN || p.number.len() > MAX_NUMBER_LEN {
        return Err(Error::UnprocessableEntity(format!(
          "phone ({}) {} exceeds {MAX_DDD_LEN}/{MAX_NUMBER_LEN} digits",
          p.ddd, p.number
        )));
      }
    }

    let taken = gateway
      .exists(CustomerQuery::by_email(&model.email).excluding(model.id))
      .await
      .map_err(Into::<Error>::into)?;
    if taken {
      return Err(Error::Conflict("email already registered".into()));
    }
    Ok(())
  }
}

/// `local@domain` with no whitespace and exactly one `@`.
fn is_plausible_email(email: &str) -> bool {
  match email.split_once('@') {
    Some((local, domain)) => {
      !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
    }
    None => false,
  }
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub type CustomerDomain<G> = DomainService<G, CustomerRules, CustomerMapper>;

/// Customer operations. Phones are normalized before every write.
#[derive(Debug, Clone)]
pub struct CustomerService<G> {
  inner: CustomerDomain<G>,
}

impl<G> CustomerService<G>
where
  G: Gateway<Entity = Customer, Query = CustomerQuery>,
{
  pub fn new(gateway: G) -> Self {
    Self { inner: DomainService::new(gateway, CustomerRules, CustomerMapper) }
  }

  /// The generic service this one wraps.
  pub fn domain(&self) -> &CustomerDomain<G> { &self.inner }

  /// Strip formatting from every phone on `model`.
  ///
  /// Area codes also lose their leading zeros. A phone whose area code or
  /// number ends up empty is rejected.
  pub fn clear_phone_numbers(mut model: CustomerView) -> Result<CustomerView> {
    for p in &mut model.phones {
      let ddd = phone::digits_only(&p.ddd);
      let ddd = ddd.trim_start_matches('0');
      let number = phone::digits_only(&p.number);

      if ddd.is_empty() {
        return Err(Error::InvalidArgument(format!(
          "phone area code {:?} has no digits",
          p.ddd
        )));
      }
      if number.is_empty() {
        return Err(Error::InvalidArgument(format!(
          "phone number {:?} has no digits",
          p.number
        )));
      }

      p.ddd = ddd.to_owned();
      p.number = number;
    }
    Ok(model)
  }

  /// New customers get new phones; ids from the payload are not reused.
  fn without_phone_ids(mut model: CustomerView) -> CustomerView {
    for p in &mut model.phones {
      p.id = Uuid::nil();
    }
    model
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  pub async fn add(&self, model: CustomerView) -> Result<CustomerView> {
    let model = Self::clear_phone_numbers(Self::without_phone_ids(model))?;
    self.inner.add(model).await
  }

  pub async fn add_many(
    &self,
    models: Vec<CustomerView>,
  ) -> Result<Vec<CustomerView>> {
    let models = models
      .into_iter()
      .map(|m| Self::clear_phone_numbers(Self::without_phone_ids(m)))
      .collect::<Result<Vec<_>>>()?;
    self.inner.add_many(models).await
  }

  pub async fn update(&self, model: CustomerView) -> Result<CustomerView> {
    let model = Self::clear_phone_numbers(model)?;
    self.inner.update(model).await
  }

  pub async fn update_with_key(
    &self,
    model: CustomerView,
    key: Uuid,
  ) -> Result<CustomerView> {
    let model = Self::clear_phone_numbers(model)?;
    self.inner.update_with_key(model, key).await
  }

  pub async fn save_or_update(&self, model: CustomerView) -> Result<CustomerView> {
    if model.id.is_nil() {
      self.add(model).await
    } else {
      self.update(model).await
    }
  }

  /// Overwrite the email (when one is given) and merge `update.phones` into
  /// the customer's phones.
  ///
  /// Phones without an id are added. Phones whose id matches one of the
  /// customer's phones overwrite it. Any other id is dropped and the phone is
  /// added as new.
  pub async fn update_phone_and_email(
    &self,
    id: Uuid,
    update: CustomerUpdateView,
  ) -> Result<CustomerView> {
    let mut customer = self
      .inner
      .get(id, ReadMode::Tracked)
      .await?
      .ok_or_else(Error::not_found)?;

    if !update.email.is_empty() {
      customer.email = update.email;
    }

    for incoming in update.phones {
      if incoming.id.is_nil() {
        customer.phones.push(incoming);
        continue;
      }
      match customer.phones.iter_mut().find(|p| p.id == incoming.id) {
        Some(existing) => {
          existing.ddd = incoming.ddd;
          existing.number = incoming.number;
          existing.kind = incoming.kind;
        }
        None => customer.phones.push(PhoneView { id: Uuid::nil(), ..incoming }),
      }
    }

    self.update(customer).await
  }

  /// Remove one phone from a customer.
  pub async fn delete_phone(&self, customer_id: Uuid, phone_id: Uuid) -> Result<()> {
    if customer_id.is_nil() || phone_id.is_nil() {
      return Err(Error::InvalidArgument(
        "customer id and phone id are required".into(),
      ));
    }

    let mut customer = self
      .inner
      .get(customer_id, ReadMode::Tracked)
      .await?
      .ok_or_else(Error::not_found)?;

    let before = customer.phones.len();
    customer.phones.retain(|p| p.id != phone_id);
    if customer.phones.len() == before {
      return Err(Error::NotFound(format!(
        "phone {phone_id} not found on customer {customer_id}"
      )));
    }

    self.update(customer).await?;
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub async fn count(&self) -> Result<u64> { self.inner.count().await }

  pub async fn get(&self, id: Uuid, mode: ReadMode) -> Result<Option<CustomerView>> {
    self.inner.get(id, mode).await
  }

  pub async fn get_page(&self, page: i64, qty: Option<u64>) -> Result<Vec<CustomerView>> {
    self.inner.get_page(page, qty).await
  }

  pub async fn get_by_email(&self, email: &str) -> Result<Option<CustomerView>> {
    if email.trim().is_empty() {
      return Err(Error::InvalidArgument("email is required".into()));
    }

    let found = self
      .inner
      .gateway()
      .find(CustomerQuery::by_email(email), 0, 1, ReadMode::Snapshot)
      .await
      .map_err(Into::<Error>::into)?;
    Ok(found.into_iter().next().map(|c| self.to_view(c)))
  }

  /// Every customer owning the phone `raw` normalizes to.
  pub async fn get_by_phone(&self, raw: &str) -> Result<Vec<CustomerView>> {
    let (ddd, number) = phone::parse(raw.trim())?;

    let found = self
      .inner
      .gateway()
      .find(CustomerQuery::by_phone(ddd, number), 0, UNBOUNDED, ReadMode::Snapshot)
      .await
      .map_err(Into::<Error>::into)?;

    let mut seen = HashSet::new();
    Ok(
      found
        .into_iter()
        .filter(|c| seen.insert(c.meta.id))
        .map(|c| self.to_view(c))
        .collect(),
    )
  }

  // ── Deletes ───────────────────────────────────────────────────────────────

  pub async fn delete(&self, id: Uuid) -> Result<()> { self.inner.delete(id).await }

  pub async fn delete_model(&self, model: CustomerView) -> Result<()> {
    self.inner.delete_model(model).await
  }

  pub async fn delete_by_email(&self, email: &str) -> Result<()> {
    let customer = self.get_by_email(email).await?.ok_or_else(Error::not_found)?;
    self.inner.delete(customer.id).await
  }

  fn to_view(&self, customer: Customer) -> CustomerView {
    self.inner.mapper().to_model(customer)
  }
}
