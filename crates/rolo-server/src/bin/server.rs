//! rolo server binary.
//!
//! Reads `rolo.toml` (or the path given with `--config`), overlays `ROLO_*`
//! environment variables and command-line flags, builds the configured
//! in-memory store, and serves the contacts API over HTTP.
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `ROLO_LOG__FORMAT=json`.

use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context as _;
use clap::Parser;
use rolo_api::IdMode;
use rolo_core::{
  key::{RandomToken, Sequential},
  store::ContactStore,
};
use rolo_server::{AppState, ServerConfig, StoreKind, logging};
use rolo_store_mem::{ConcurrentStore, IndexedStore};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(author, version, about = "rolo contacts server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "rolo.toml")]
  config: PathBuf,

  /// Host to listen on.
  #[arg(short = 'H', long)]
  host: Option<String>,

  /// Port to listen on.
  #[arg(short, long, env = "SERVICE_PORT")]
  port: Option<u16>,

  /// Minimum log level: debug, info, warn or error.
  #[arg(long)]
  log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("ROLO")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // CLI flags override config file and environment.
  if let Some(host) = cli.host {
    server_cfg.host = host;
  }
  if let Some(port) = cli.port {
    server_cfg.port = port;
  }
  if let Some(level) = cli.log_level {
    server_cfg.log.level = level;
  }

  logging::init(&server_cfg.log).context("failed to initialise logging")?;

  let seed = server_cfg.seed_contacts();
  match (server_cfg.id_mode, server_cfg.store) {
    (IdMode::Assigned, StoreKind::Indexed) => {
      let store = IndexedStore::with_contacts(Sequential::default(), seed);
      serve(store, server_cfg).await
    }
    (IdMode::Assigned, StoreKind::Concurrent) => {
      let store = ConcurrentStore::with_contacts(Sequential::default(), seed);
      serve(store, server_cfg).await
    }
    (IdMode::Generated, StoreKind::Indexed) => {
      let store = IndexedStore::with_contacts(RandomToken, seed);
      serve(store, server_cfg).await
    }
    (IdMode::Generated, StoreKind::Concurrent) => {
      let store = ConcurrentStore::with_contacts(RandomToken, seed);
      serve(store, server_cfg).await
    }
  }
}

async fn serve<S>(store: S, server_cfg: ServerConfig) -> anyhow::Result<()>
where
  S: ContactStore + 'static,
{
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  tracing::info!(
    id_mode = ?server_cfg.id_mode,
    store = ?server_cfg.store,
    prefix = %server_cfg.prefix,
    "starting"
  );

  let state = AppState::new(store, server_cfg);
  let app = rolo_server::router(state.clone());

  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!("Listening on http://{address}");

  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .with_graceful_shutdown(shutdown_signal(state))
    .await
    .context("server error")?;

  tracing::info!("server closed");
  Ok(())
}

/// Resolve on SIGINT or SIGTERM, marking the server not-ready first.
async fn shutdown_signal<S: ContactStore>(state: AppState<S>) {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      tracing::error!(err = %e, "failed to install Ctrl+C handler");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(e) => {
        tracing::error!(err = %e, "failed to install SIGTERM handler");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
  state.begin_shutdown();
  tracing::info!("signal received, starting graceful shutdown");
}
