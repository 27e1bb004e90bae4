//! Procura Server: application entry point.

mod config;

use clap::Parser;
use procura_core::models::tender::ServiceTypeFilter;
use procura_core::repository::Pagination;
use procura_db::DbManager;
use procura_db::repository::{
    SurrealBidRepository, SurrealDecisionRepository, SurrealFeedbackRepository,
    SurrealMembershipRepository, SurrealTenderRepository,
};
use procura_market::Marketplace;
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, LogFormat};

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("procura=info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    tracing::info!("Starting Procura server...");

    let market = cli.market_config();
    tracing::info!(
        default_page_limit = market.default_page_limit,
        max_page_limit = market.max_page_limit,
        max_quorum = market.max_quorum,
        "Marketplace configuration loaded"
    );

    let db = DbManager::connect(&cli.db_config()).await?;
    procura_db::run_migrations(db.client()).await?;
    db.ping().await?;
    tracing::info!("Store is reachable");

    let client = db.client();
    let market = Marketplace::new(
        SurrealMembershipRepository::new(client.clone()),
        SurrealTenderRepository::new(client.clone()),
        SurrealBidRepository::new(client.clone()),
        SurrealDecisionRepository::new(client.clone()),
        SurrealFeedbackRepository::new(client.clone()),
        market,
    );
    let open = market
        .tenders
        .list_published(&ServiceTypeFilter::default(), Pagination::default())
        .await?;
    tracing::info!(published_tenders = open.total, "Marketplace ready");

    let mut health = tokio::time::interval(cli.health_interval());
    health.tick().await;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
            _ = health.tick() => {
                if let Err(e) = db.ping().await {
                    tracing::warn!(error = %e, "Store health check failed");
                }
            }
        }
    }

    drop(market);
    db.close().await?;
    tracing::info!("Procura server stopped.");
    Ok(())
}
