use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use crate::app_config::SettlementSettings;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        info!("Connected to Postgres");
        Ok(Self { pool })
    }

    /// Apply global overrides stored in `system_settings` on top of `defaults`.
    ///
    /// Only rows without an organization are read. Values that do not parse
    /// are logged and ignored.
    pub async fn fetch_settlement_defaults(
        &self,
        defaults: SettlementSettings,
    ) -> Result<SettlementSettings, sqlx::Error> {
        #[derive(sqlx::FromRow)]
        struct SettingRow {
            key: String,
            value: Option<String>,
        }

        let rows: Vec<SettingRow> = sqlx::query_as(
            "SELECT key, value FROM system_settings WHERE org_id IS NULL AND key IN ('default_ticket_fee_percent', 'default_currency')",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(apply_settings(defaults, rows.into_iter().map(|r| (r.key, r.value))))
    }
}

fn apply_settings(
    mut settings: SettlementSettings,
    rows: impl IntoIterator<Item = (String, Option<String>)>,
) -> SettlementSettings {
    for (key, value) in rows {
        let Some(value) = value else { continue };
        let value = value.trim();

        match key.as_str() {
            "default_ticket_fee_percent" => match Decimal::from_str(value) {
                Ok(percent) => settings.default_ticket_fee_percent = percent,
                Err(e) => warn!(%key, %value, error = %e, "Ignoring unparseable setting"),
            },
            "default_currency" => {
                if !value.is_empty() {
                    settings.default_currency = value.to_ascii_uppercase();
                }
            }
            _ => {}
        }
    }
    settings
}
