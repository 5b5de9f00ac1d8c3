use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub settlement: SettlementSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Serve from the in-memory repository instead of Postgres
    #[serde(default)]
    pub in_memory: bool,
}

fn default_max_connections() -> u32 { 5 }

/// Defaults for deal terms a tour stop leaves blank
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SettlementSettings {
    #[serde(default = "default_fee_percent")]
    pub default_ticket_fee_percent: Decimal,
    #[serde(default = "default_currency")]
    pub default_currency: String,
}

fn default_fee_percent() -> Decimal { Decimal::from(5) }

fn default_currency() -> String { "EUR".to_string() }

impl Default for SettlementSettings {
    fn default() -> Self {
        Self {
            default_ticket_fee_percent: default_fee_percent(),
            default_currency: default_currency(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Developer overrides, never checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `GIGROUTE__SERVER__PORT=8080` sets `server.port`
            .add_source(config::Environment::with_prefix("GIGROUTE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
