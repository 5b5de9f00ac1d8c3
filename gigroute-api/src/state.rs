use std::sync::Arc;
use gigroute_settlement::{SettlementConfig, SettlementService};
use gigroute_store::app_config::SettlementSettings;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub settlements: Arc<SettlementService>,
    pub auth: AuthConfig,
}

/// Calculator defaults from the `settlement` config section
pub fn settlement_config(settings: &SettlementSettings) -> SettlementConfig {
    SettlementConfig {
        default_ticket_fee_percent: settings.default_ticket_fee_percent,
        default_currency: settings.default_currency.clone(),
    }
}
