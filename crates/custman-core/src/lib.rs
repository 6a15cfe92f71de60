//! Core types, the persistence seam, and the business layer for the customer
//! management service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`gateway::Gateway`]; the HTTP surface calls
//! [`customer_service::CustomerService`].

pub mod customer;
pub mod customer_service;
pub mod error;
pub mod gateway;
pub mod mapper;
pub mod phone;
pub mod record;
pub mod service;

pub use error::{Error, ErrorKind, Result};

#[cfg(test)]
mod memory;
