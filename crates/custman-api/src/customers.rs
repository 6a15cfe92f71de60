//! Handlers for `/customers` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/customers` | `?page=<n>&qty=<n>`, 1-based, oldest first |
//! | `GET`    | `/customers/page/{page}/items/{qty}` | Same, in the path |
//! | `GET`    | `/customers/{id}` | 404 if not found |
//! | `GET`    | `/customers/phone/{phone}` | Every owner of the phone |
//! | `GET`    | `/customers/email/{email}` | 404 if not found |
//! | `POST`   | `/customers` | 201 with `Location` |
//! | `PUT`    | `/customers/{id}` | Body: `{"email":..,"phones":[..]}` |
//! | `DELETE` | `/customers/{id}` | 204 |
//! | `DELETE` | `/customers/email/{email}` | 204 |
//! | `DELETE` | `/customers/{id}/phone/{phone_id}` | 204 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    OriginalUri, Path, Query, State,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::{HeaderMap, StatusCode, header},
  response::IntoResponse,
};
use custman_core::{
  Error,
  customer::{Customer, CustomerQuery, CustomerUpdateView, CustomerView},
  customer_service::CustomerService,
  gateway::Gateway,
  record::ReadMode,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

type Service<G> = State<Arc<CustomerService<G>>>;

/// Unwrap a JSON body that may be `null`.
fn required<T>(body: Result<Json<Option<T>>, JsonRejection>) -> Result<T, ApiError> {
  let Json(value) = body?;
  value.ok_or_else(|| Error::InvalidArgument("request body is required".into()).into())
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PageParams {
  pub page: Option<i64>,
  pub qty:  Option<u64>,
}

/// `GET /customers[?page=<n>&qty=<n>]`
pub async fn list<G>(
  State(svc): Service<G>,
  params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<Vec<CustomerView>>, ApiError>
where
  G: Gateway<Entity = Customer, Query = CustomerQuery>,
{
  let Query(params) = params?;
  let customers = svc.get_page(params.page.unwrap_or(1), params.qty).await?;
  Ok(Json(customers))
}

/// `GET /customers/page/{page}/items/{qty}`
pub async fn list_page<G>(
  State(svc): Service<G>,
  path: Result<Path<(i64, u64)>, PathRejection>,
) -> Result<Json<Vec<CustomerView>>, ApiError>
where
  G: Gateway<Entity = Customer, Query = CustomerQuery>,
{
  let Path((page, qty)) = path?;
  Ok(Json(svc.get_page(page, Some(qty)).await?))
}

// ─── Lookups ─────────────────────────────────────────────────────────────────

/// `GET /customers/{id}`
pub async fn get_one<G>(
  State(svc): Service<G>,
  path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<CustomerView>, ApiError>
where
  G: Gateway<Entity = Customer, Query = CustomerQuery>,
{
  let Path(id) = path?;
  let customer = svc
    .get(id, ReadMode::Snapshot)
    .await?
    .ok_or_else(|| Error::NotFound(format!("customer {id} not found")))?;
  Ok(Json(customer))
}

/// `GET /customers/phone/{phone}`
pub async fn get_by_phone<G>(
  State(svc): Service<G>,
  path: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<CustomerView>>, ApiError>
where
  G: Gateway<Entity = Customer, Query = CustomerQuery>,
{
  let Path(phone) = path?;
  Ok(Json(svc.get_by_phone(&phone).await?))
}

/// `GET /customers/email/{email}`
pub async fn get_by_email<G>(
  State(svc): Service<G>,
  path: Result<Path<String>, PathRejection>,
) -> Result<Json<CustomerView>, ApiError>
where
  G: Gateway<Entity = Customer, Query = CustomerQuery>,
{
  let Path(email) = path?;
  let customer = svc
    .get_by_email(&email)
    .await?
    .ok_or_else(|| Error::NotFound(format!("no customer with email {email}")))?;
  Ok(Json(customer))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /customers`
///
/// The `Location` header is built from `X-Forwarded-Proto` (default `http`),
/// the `Host` header and the path the request arrived on.
pub async fn create<G>(
  State(svc): Service<G>,
  OriginalUri(uri): OriginalUri,
  headers: HeaderMap,
  body: Result<Json<Option<CustomerView>>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  G: Gateway<Entity = Customer, Query = CustomerQuery>,
{
  let model = required(body)?;
  let created = svc.add(model).await?;

  let scheme = headers
    .get("x-forwarded-proto")
    .and_then(|v| v.to_str().ok())
    .unwrap_or("http");
  let host = headers
    .get(header::HOST)
    .and_then(|v| v.to_str().ok())
    .unwrap_or("localhost");
  let location = format!(
    "{scheme}://{host}{}/{}",
    uri.path().trim_end_matches('/'),
    created.id
  );

  Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(created)))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PUT /customers/{id}`: replace the email and merge phones.
pub async fn update<G>(
  State(svc): Service<G>,
  path: Result<Path<Uuid>, PathRejection>,
  body: Result<Json<Option<CustomerUpdateView>>, JsonRejection>,
) -> Result<Json<CustomerView>, ApiError>
where
  G: Gateway<Entity = Customer, Query = CustomerQuery>,
{
  let Path(id) = path?;
  let update = required(body)?;
  Ok(Json(svc.update_phone_and_email(id, update).await?))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /customers/{id}`
pub async fn delete_one<G>(
  State(svc): Service<G>,
  path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError>
where
  G: Gateway<Entity = Customer, Query = CustomerQuery>,
{
  let Path(id) = path?;
  svc.delete(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /customers/email/{email}`
pub async fn delete_by_email<G>(
  State(svc): Service<G>,
  path: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ApiError>
where
  G: Gateway<Entity = Customer, Query = CustomerQuery>,
{
  let Path(email) = path?;
  svc.delete_by_email(&email).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /customers/{id}/phone/{phone_id}`
pub async fn delete_phone<G>(
  State(svc): Service<G>,
  path: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> Result<StatusCode, ApiError>
where
  G: Gateway<Entity = Customer, Query = CustomerQuery>,
{
  let Path((id, phone_id)) = path?;
  svc.delete_phone(id, phone_id).await?;
  Ok(StatusCode::NO_CONTENT)
}
