//! spl-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `SPL_*`
//! environment overrides, opens the SQLite store, starts the supervised
//! poll scheduler and delivery worker, and serves the subscription API until
//! Ctrl-C.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use spl_api::{AppState, AuthConfig, ServerConfig};
use spl_client::{UpstreamClient, WebhookDispatcher};
use spl_store_sqlite::SqliteStore;
use spl_sync::{Reconciler, Scheduler, delivery, supervisor::spawn_supervised};
use tokio::{net::TcpListener, sync::watch};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Access notification server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, env = "SPL_CONFIG", default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  let store_path = expand_tilde(&cfg.store.path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  let timeout = cfg.schedule.request_timeout();
  let upstream = UpstreamClient::new(cfg.access.clone(), cfg.identity.clone(), timeout)
    .context("failed to build upstream client")?;
  let upstream = Arc::new(upstream);
  let webhook = WebhookDispatcher::new(cfg.notification.clone(), timeout)
    .context("failed to build notification client")?;

  let (queued, worker) = delivery::queue(Arc::new(webhook), cfg.schedule.queue_capacity);
  let dispatcher = Arc::new(queued);

  // Background tasks. The scheduler is stopped before the worker so that
  // the last cycle's notifications are still drained.
  let (stop_scheduler, scheduler_rx) = watch::channel(false);
  let (stop_worker, worker_rx) = watch::channel(false);

  let scheduler = Arc::new(Scheduler::new(
    upstream.clone(),
    Reconciler::new(store.clone(), dispatcher.clone()),
    cfg.schedule.poll_interval(),
  ));
  let scheduler_task = spawn_supervised("scheduler", move || {
    scheduler.clone().run(scheduler_rx.clone())
  });
  let worker_task = spawn_supervised("delivery", move || {
    worker.clone().run(worker_rx.clone())
  });

  let state = AppState {
    store,
    upstream,
    dispatcher,
    auth: Arc::new(AuthConfig { token: cfg.server.auth_token.clone() }),
  };

  let app = spl_api::router(state);
  let address = format!("{}:{}", cfg.server.host, cfg.server.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  stop_scheduler.send_replace(true);
  if let Err(e) = scheduler_task.await {
    tracing::warn!(error = %e, "scheduler task ended abnormally");
  }
  stop_worker.send_replace(true);
  if let Err(e) = worker_task.await {
    tracing::warn!(error = %e, "delivery task ended abnormally");
  }

  tracing::info!("shutdown complete");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutdown requested");
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
