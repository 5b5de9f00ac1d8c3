use std::sync::Arc;
use std::net::SocketAddr;
use anyhow::Context;
use gigroute_api::{app, state::{settlement_config, AppState, AuthConfig}};
use gigroute_core::TourStopRepository;
use gigroute_settlement::{SettlementCalculator, SettlementService};
use gigroute_store::{Config, DbClient, MemoryTourStopRepository, PgTourStopRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gigroute_api=debug,gigroute_settlement=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting GigRoute API on port {}", config.server.port);

    let (repo, settings) = if config.database.in_memory {
        tracing::warn!("Using in-memory tour stop repository; data is lost on restart");
        let repo: Arc<dyn TourStopRepository> = Arc::new(MemoryTourStopRepository::new());
        (repo, config.settlement.clone())
    } else {
        let db = DbClient::new(&config.database.url, config.database.max_connections)
            .await
            .context("Failed to connect to Postgres")?;

        // Stored overrides are optional; fall back to file/env config
        let settings = match db.fetch_settlement_defaults(config.settlement.clone()).await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read system_settings, using configured defaults");
                config.settlement.clone()
            }
        };
        let repo: Arc<dyn TourStopRepository> = Arc::new(PgTourStopRepository::new(db.pool.clone()));
        (repo, settings)
    };

    tracing::info!(
        default_currency = %settings.default_currency,
        default_ticket_fee_percent = %settings.default_ticket_fee_percent,
        "Settlement defaults loaded"
    );

    let calculator = SettlementCalculator::new(settlement_config(&settings));

    let app_state = AppState {
        settlements: Arc::new(SettlementService::new(repo, calculator)),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
