//! Server assembly for the customer management service: configuration and
//! the top-level router.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use custman_core::{
  customer::{Customer, CustomerQuery},
  customer_service::CustomerService,
  gateway::Gateway,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Prefix for environment overrides, e.g. `CUSTMAN_PORT=9000`.
pub const ENV_PREFIX: &str = "CUSTMAN";

/// Runtime server configuration, deserialised from `config.toml` and the
/// environment.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("customers.db") }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       default_host(),
      port:       default_port(),
      store_path: default_store_path(),
    }
  }
}

impl ServerConfig {
  /// Read `file` (optional) and overlay `CUSTMAN_*` environment variables.
  pub fn load(file: &Path) -> Result<Self, config::ConfigError> {
    Self::from_sources(file, None)
  }

  fn from_sources(
    file: &Path,
    env: Option<config::Map<String, String>>,
  ) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(
        config::Environment::with_prefix(ENV_PREFIX)
          .try_parsing(true)
          .source(env),
      )
      .build()?
      .try_deserialize()
  }

  /// `host:port`, ready for binding.
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The whole HTTP application: the customer API under `/api`, with request
/// tracing.
pub fn app<G>(gateway: G) -> Router
where
  G: Gateway<Entity = Customer, Query = CustomerQuery> + 'static,
{
  let service = Arc::new(CustomerService::new(gateway));
  Router::new()
    .nest("/api", custman_api::api_router(service))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use custman_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  fn env(pairs: &[(&str, &str)]) -> config::Map<String, String> {
    pairs
      .iter()
      .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
      .collect()
  }

  #[test]
  fn missing_file_yields_defaults() {
    let cfg = ServerConfig::from_sources(
      Path::new("/nonexistent/custman.toml"),
      Some(env(&[])),
    )
    .unwrap();
    assert_eq!(cfg, ServerConfig::default());
    assert_eq!(cfg.address(), "127.0.0.1:8080");
  }

  #[test]
  fn environment_overrides_defaults() {
    let cfg = ServerConfig::from_sources(
      Path::new("/nonexistent/custman.toml"),
      Some(env(&[("CUSTMAN_PORT", "9090"), ("CUSTMAN_HOST", "0.0.0.0")])),
    )
    .unwrap();
    assert_eq!(cfg.port, 9090);
    assert_eq!(cfg.host, "0.0.0.0");
    assert_eq!(cfg.store_path, PathBuf::from("customers.db"));
  }

  #[test]
  fn tilde_expands_to_home() {
    let plain = Path::new("/var/lib/customers.db");
    assert_eq!(expand_tilde(plain), plain);

    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(
        expand_tilde(Path::new("~/customers.db")),
        PathBuf::from(home).join("customers.db")
      );
    }
  }

  #[tokio::test]
  async fn api_is_mounted_under_api() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let app = app(store);

    let req = Request::builder()
      .method("POST")
      .uri("/api/customers")
      .header(header::CONTENT_TYPE, "application/json")
      .header(header::HOST, "localhost:8080")
      .body(Body::from(r#"{"name":"John","email":"john@test.com"}"#))
      .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let location = resp
      .headers()
      .get(header::LOCATION)
      .unwrap()
      .to_str()
      .unwrap()
      .to_owned();
    assert!(
      location.starts_with("http://localhost:8080/api/customers/"),
      "{location}"
    );

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let created: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(location.ends_with(created["id"].as_str().unwrap()));

    let req = Request::builder()
      .uri("/customers")
      .body(Body::empty())
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
