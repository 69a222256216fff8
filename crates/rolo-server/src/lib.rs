//! HTTP server assembly for rolo.
//!
//! Wraps the [`rolo_api`] router with request logging, metrics, panic
//! recovery, and the operational endpoints (`/liveness`, `/readiness`,
//! `/metrics`).

pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod probes;

use std::{
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use axum::{
  Router,
  error_handling::HandleErrorLayer,
  middleware::from_fn_with_state,
  routing::get,
};
use chrono::NaiveDate;
use rolo_api::IdMode;
use rolo_core::{contact::NewContact, store::ContactStore};
use serde::Deserialize;
use tower::{ServiceBuilder, timeout::TimeoutLayer};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use logging::LogConfig;
use metrics::{BuildInfo, Metrics};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Which in-memory backend to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
  /// Ordered, single `RwLock` (`rolo_store_mem::IndexedStore`).
  #[default]
  Indexed,
  /// Unordered, sharded map (`rolo_store_mem::ConcurrentStore`).
  Concurrent,
}

/// Runtime server configuration, deserialised from `rolo.toml` and `ROLO_*`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:    String,
  #[serde(default = "default_port")]
  pub port:    u16,
  /// Where the API routes are mounted. Empty or `/` mounts at the root.
  #[serde(default = "default_prefix")]
  pub prefix:  String,
  #[serde(default)]
  pub id_mode: IdMode,
  #[serde(default)]
  pub store:   StoreKind,
  /// Reported in `build_info`.
  #[serde(default = "default_title")]
  pub title:   String,
  /// Start with one sample contact.
  #[serde(default = "default_seed")]
  pub seed:    bool,
  /// Upper bound on handling one API request, body read included.
  #[serde(default = "default_request_timeout_ms")]
  pub request_timeout_ms: u64,
  #[serde(default)]
  pub log:     LogConfig,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8888 }
fn default_prefix() -> String { "/api".to_string() }
fn default_title() -> String { "rolo".to_string() }
fn default_seed() -> bool { true }
fn default_request_timeout_ms() -> u64 { 15_000 }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:    default_host(),
      port:    default_port(),
      prefix:  default_prefix(),
      id_mode: IdMode::default(),
      store:   StoreKind::default(),
      title:   default_title(),
      seed:    default_seed(),
      request_timeout_ms: default_request_timeout_ms(),
      log:     LogConfig::default(),
    }
  }
}

impl ServerConfig {
  /// The contacts a fresh store starts with.
  pub fn seed_contacts(&self) -> Vec<NewContact> {
    if !self.seed {
      return Vec::new();
    }
    NaiveDate::from_ymd_opt(1999, 12, 31)
      .map(|birthday| NewContact::new("john", "smith", birthday))
      .into_iter()
      .collect()
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the operational handlers.
pub struct AppState<S> {
  pub store:   Arc<S>,
  pub config:  Arc<ServerConfig>,
  pub metrics: Arc<Metrics>,
  ready:       Arc<AtomicBool>,
}

// Manual impl: `S` itself need not be `Clone`.
impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      config:  Arc::clone(&self.config),
      metrics: Arc::clone(&self.metrics),
      ready:   Arc::clone(&self.ready),
    }
  }
}

impl<S: ContactStore> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Self {
    let metrics = Metrics::new(BuildInfo::from_env(config.title.clone()));
    Self {
      store:   Arc::new(store),
      config:  Arc::new(config),
      metrics: Arc::new(metrics),
      ready:   Arc::new(AtomicBool::new(true)),
    }
  }

  pub fn is_ready(&self) -> bool { self.ready.load(Ordering::Relaxed) }

  /// Flip `/readiness` to 503 so load balancers stop routing here.
  pub fn begin_shutdown(&self) { self.ready.store(false, Ordering::Relaxed); }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ContactStore + 'static,
{
  let timeout = Duration::from_millis(state.config.request_timeout_ms);
  let api = rolo_api::api_router(Arc::clone(&state.store), state.config.id_mode)
    .layer(CatchPanicLayer::custom(middleware::recover))
    .layer(
      ServiceBuilder::new()
        .layer(HandleErrorLayer::new(middleware::timed_out))
        .layer(TimeoutLayer::new(timeout)),
    )
    .layer(from_fn_with_state(Arc::clone(&state.metrics), middleware::observe))
    .layer(TraceLayer::new_for_http().make_span_with(middleware::request_span));

  let prefix = match state.config.prefix.trim_matches('/') {
    "" => String::new(),
    p => format!("/{p}"),
  };

  let ops = Router::new()
    .route("/liveness", get(probes::liveness))
    .route("/readiness", get(probes::readiness::<S>))
    .route("/metrics", get(probes::metrics::<S>))
    .with_state(state);

  if prefix.is_empty() {
    ops.merge(api)
  } else {
    ops.nest(&prefix, api)
  }
}

// ─── Integration tests ────────────────────────────────────────────────────────
