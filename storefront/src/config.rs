// storefront/src/config.rs

use crate::errors::{AppError, Result};
use crate::orders::manager::{DEFAULT_COMMIT_TIMEOUT, DEFAULT_TX_TIMEOUT};
use crate::orders::CheckoutPolicy;
use crate::services::pricing::DEFAULT_TAX_RATE_BPS;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Text,
  Json,
}

impl FromStr for LogFormat {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "text" | "pretty" => Ok(LogFormat::Text),
      "json" => Ok(LogFormat::Json),
      other => Err(format!("unknown log format '{}'", other)),
    }
  }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
  pub url: String,
  pub max_connections: u32,
  pub acquire_timeout: Duration,
}

impl DatabaseConfig {
  pub fn new(url: impl Into<String>) -> Self {
    Self {
      url: url.into(),
      max_connections: 10,
      acquire_timeout: Duration::from_secs(5),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database: DatabaseConfig,
  pub order_tx_timeout: Duration,
  /// How long a commit may stay unconfirmed before the request gives up.
  pub order_commit_timeout: Duration,
  pub checkout: CheckoutPolicy,
  pub tax_rate_bps: u32,
  pub site_discount_percent: u8,
  /// Create the order tables on startup.
  pub init_schema: bool,
  pub log_format: LogFormat,
}

impl AppConfig {
  /// Defaults for everything except the database location.
  pub fn with_database_url(url: impl Into<String>) -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 5000,
      database: DatabaseConfig::new(url),
      order_tx_timeout: DEFAULT_TX_TIMEOUT,
      order_commit_timeout: DEFAULT_COMMIT_TIMEOUT,
      checkout: CheckoutPolicy::default(),
      tax_rate_bps: DEFAULT_TAX_RATE_BPS,
      site_discount_percent: 0,
      init_schema: false,
      log_format: LogFormat::Text,
    }
  }

  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let database_url = env::var("DATABASE_URL")
      .map_err(|e| AppError::Config(format!("Missing environment variable 'DATABASE_URL': {}", e)))?;
    let defaults = Self::with_database_url(database_url);

    let config = Self {
      server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
      server_port: parse_var("SERVER_PORT", defaults.server_port)?,
      database: DatabaseConfig {
        max_connections: parse_var("DB_MAX_CONNECTIONS", defaults.database.max_connections)?,
        acquire_timeout: Duration::from_secs(parse_var(
          "DB_ACQUIRE_TIMEOUT_SECS",
          defaults.database.acquire_timeout.as_secs(),
        )?),
        url: defaults.database.url,
      },
      order_tx_timeout: Duration::from_secs(parse_var("ORDER_TX_TIMEOUT_SECS", defaults.order_tx_timeout.as_secs())?),
      order_commit_timeout: Duration::from_secs(parse_var(
        "ORDER_COMMIT_TIMEOUT_SECS",
        defaults.order_commit_timeout.as_secs(),
      )?),
      checkout: CheckoutPolicy {
        allow_guest_checkout: parse_var("ALLOW_GUEST_CHECKOUT", defaults.checkout.allow_guest_checkout)?,
        enforce_total_consistency: parse_var("ENFORCE_ORDER_TOTALS", defaults.checkout.enforce_total_consistency)?,
      },
      tax_rate_bps: parse_var("TAX_RATE_BPS", defaults.tax_rate_bps)?,
      site_discount_percent: parse_var("SITE_DISCOUNT_PERCENT", defaults.site_discount_percent)?,
      init_schema: parse_var("INIT_SCHEMA", defaults.init_schema)?,
      log_format: parse_var("LOG_FORMAT", defaults.log_format)?,
    };

    if config.database.max_connections == 0 {
      return Err(AppError::Config("DB_MAX_CONNECTIONS must be at least 1".to_string()));
    }
    if config.order_tx_timeout.is_zero() {
      return Err(AppError::Config("ORDER_TX_TIMEOUT_SECS must be at least 1".to_string()));
    }
    if config.order_commit_timeout.is_zero() {
      return Err(AppError::Config("ORDER_COMMIT_TIMEOUT_SECS must be at least 1".to_string()));
    }

    tracing::info!("Application configuration loaded successfully.");
    Ok(config)
  }

  pub fn server_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

/// Reads `var_name`, falling back to `default` when it is unset.
fn parse_var<T>(var_name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match env::var(var_name) {
    Ok(raw) => raw
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", var_name, raw, e))),
    Err(env::VarError::NotPresent) => Ok(default),
    Err(e) => Err(AppError::Config(format!("Invalid {} value: {}", var_name, e))),
  }
}
