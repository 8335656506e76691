//! nanoworks API server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens an
//! in-process SQLite store, and serves the marketplace REST API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::http::{HeaderValue, Method, header};
use clap::Parser;
use nanoworks_api::{
  AppState, ServerConfig,
  auth::TokenKeys,
  gateway::{GatewayConfig, HttpGateway},
};
use nanoworks_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::{
  cors::{AllowHeaders, AllowMethods, CorsLayer},
  trace::TraceLayer,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "nanoworks marketplace API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
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

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("NANOWORKS"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Outbound payment-provider client.
  let payments = HttpGateway::new(GatewayConfig {
    card_api_base:        server_cfg.card_api_base.clone(),
    card_secret_key:      server_cfg.card_secret_key.clone(),
    paypal_api_base:      server_cfg.paypal_api_base.clone(),
    paypal_client_id:     server_cfg.paypal_client_id.clone(),
    paypal_client_secret: server_cfg.paypal_client_secret.clone(),
    paypal_return_base:   server_cfg.paypal_return_base.clone(),
    paypal_brand_name:    server_cfg.paypal_brand_name.clone(),
  })
  .context("failed to build payment gateway client")?;

  let cors = cors_layer(&server_cfg.allowed_origins)?;

  // Build application state.
  let state = AppState {
    store:    Arc::new(store),
    config:   Arc::new(server_cfg.clone()),
    keys:     Arc::new(TokenKeys::new(&server_cfg.token_secret)),
    payments: Arc::new(payments),
  };

  let app = nanoworks_api::router(state)
    .layer(TraceLayer::new_for_http())
    .layer(cors);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Build the browser CORS layer from the configured origin list.
fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
  let origins = origins
    .iter()
    .map(|origin| {
      origin
        .parse::<HeaderValue>()
        .with_context(|| format!("invalid allowed origin {origin:?}"))
    })
    .collect::<anyhow::Result<Vec<_>>>()?;

  Ok(
    CorsLayer::new()
      .allow_origin(origins)
      .allow_methods(AllowMethods::list([
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
      ]))
      .allow_headers(AllowHeaders::list([
        header::CONTENT_TYPE,
        header::AUTHORIZATION,
        header::ACCEPT,
      ])),
  )
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
