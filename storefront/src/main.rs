// storefront/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use storefront::config::{AppConfig, LogFormat};
use storefront::state::AppState;
use storefront::{store, web};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Text => builder.init(),
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  // LOG_FORMAT is read before the rest of the config so that config
  // errors are already logged in the chosen format.
  dotenvy::dotenv().ok();
  let log_format = std::env::var("LOG_FORMAT")
    .ok()
    .and_then(|raw| raw.parse::<LogFormat>().ok())
    .unwrap_or(LogFormat::Text);
  init_tracing(log_format);

  tracing::info!("Starting storefront order service...");
  run().await.map_err(|e| {
    tracing::error!(error = format!("{:#}", e), "Storefront order service stopped.");
    e
  })
}

async fn run() -> anyhow::Result<()> {
  let app_config = AppConfig::from_env().context("failed to load application configuration")?;

  let order_store = store::connect(&app_config.database)
    .await
    .context("failed to connect to the database")?;
  tracing::info!(backend = order_store.backend(), "Connected to the order store.");

  if app_config.init_schema {
    order_store
      .ensure_schema()
      .await
      .context("failed to create the order schema")?;
  }

  let server_address = app_config.server_address();
  let app_state = AppState::new(app_config, order_store).context("failed to build application state")?;

  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("failed to bind {}", server_address))?
  .run()
  .await
  .context("HTTP server failed")
}
