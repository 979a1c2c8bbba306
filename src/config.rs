use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;
use tracing::info;
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 15;
const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 2;
const DEFAULT_GEOCODING_BASE_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_GEOCODING_COUNTRY: &str = "Brazil";
const DEFAULT_GEOCODING_USER_AGENT: &str = "booking-engine";

/// Remote tabular store connection settings (PostgREST-style endpoint).
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Base URL of the store, e.g. `https://project.example.co`
    #[validate(length(min = 1))]
    pub base_url: String,

    /// API key, sent as both `apikey` and bearer token
    #[validate(length(min = 1))]
    pub api_key: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_store_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl StoreConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Postal-code geocoding lookup settings.
///
/// The lookup timeout is deliberately short: the legacy flow runs this
/// call while the user waits on the booking form.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct GeocodingConfig {
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,

    /// Country constraint passed to the lookup provider
    #[serde(default = "default_geocoding_country")]
    pub country: String,

    /// User-Agent header (Nominatim rejects anonymous clients)
    #[serde(default = "default_geocoding_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_lookup_timeout_secs")]
    pub lookup_timeout_secs: u64,
}

impl GeocodingConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            country: default_geocoding_country(),
            user_agent: default_geocoding_user_agent(),
            lookup_timeout_secs: default_lookup_timeout_secs(),
        }
    }
}

/// Freight pricing policy.
///
/// The per-km rates are business configuration, not engine invariants;
/// the defaults are the rates the business currently charges.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct FreightConfig {
    /// Postal code freight is measured from (the warehouse)
    #[validate(length(min = 1))]
    pub origin_postal_code: String,

    /// Rate applied when every selected item is in the traditional tier
    #[serde(default = "default_base_rate_per_km")]
    pub base_rate_per_km: Decimal,

    /// Rate applied when any selected item is in the specialized tier
    #[serde(default = "default_specialized_rate_per_km")]
    pub specialized_rate_per_km: Decimal,
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[validate]
    pub store: StoreConfig,

    #[serde(default)]
    #[validate]
    pub geocoding: GeocodingConfig,

    #[validate]
    pub freight: FreightConfig,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,
}

fn default_store_timeout_secs() -> u64 {
    DEFAULT_STORE_TIMEOUT_SECS
}
fn default_lookup_timeout_secs() -> u64 {
    DEFAULT_LOOKUP_TIMEOUT_SECS
}
fn default_geocoding_base_url() -> String {
    DEFAULT_GEOCODING_BASE_URL.to_string()
}
fn default_geocoding_country() -> String {
    DEFAULT_GEOCODING_COUNTRY.to_string()
}
fn default_geocoding_user_agent() -> String {
    DEFAULT_GEOCODING_USER_AGENT.to_string()
}
fn default_base_rate_per_km() -> Decimal {
    dec!(3)
}
fn default_specialized_rate_per_km() -> Decimal {
    dec!(5)
}
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("booking_engine={}", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Default config (config/default.toml)
/// 2. Environment-specific config (config/{env}.toml)
/// 3. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let mut builder = Config::builder();
    if Path::new(CONFIG_DIR).exists() {
        builder = builder
            .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
            .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false));
    }
    let settings = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;
    app_config
        .validate()
        .map_err(|e| ConfigError::Message(e.to_string()))?;

    info!(
        environment = %app_config.environment,
        store_url = %app_config.store.base_url,
        "Configuration loaded"
    );
    Ok(app_config)
}
