//! JSON REST API for customer management.
//!
//! Exposes an axum [`Router`] backed by a [`CustomerService`] over any
//! [`Gateway`]. Transport concerns (binding, tracing layers) are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", custman_api::api_router(service.clone()))
//! ```

pub mod customers;
pub mod error;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get},
};
use custman_core::{
  customer::{Customer, CustomerQuery},
  customer_service::CustomerService,
  gateway::Gateway,
};

pub use error::ApiError;

/// Build the customer API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<G>(service: Arc<CustomerService<G>>) -> Router<()>
where
  G: Gateway<Entity = Customer, Query = CustomerQuery> + 'static,
{
  Router::new()
    .route(
      "/customers",
      get(customers::list::<G>).post(customers::create::<G>),
    )
    .route(
      "/customers/page/{page}/items/{qty}",
      get(customers::list_page::<G>),
    )
    .route(
      "/customers/{id}",
      get(customers::get_one::<G>)
        .put(customers::update::<G>)
        .delete(customers::delete_one::<G>),
    )
    .route("/customers/phone/{phone}", get(customers::get_by_phone::<G>))
    .route(
      "/customers/email/{email}",
      get(customers::get_by_email::<G>).delete(customers::delete_by_email::<G>),
    )
    .route(
      "/customers/{id}/phone/{phone_id}",
      delete(customers::delete_phone::<G>),
    )
    .with_state(service)
}
