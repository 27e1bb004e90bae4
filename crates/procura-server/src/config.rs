//! Command-line and environment configuration.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use procura_db::DbConfig;
use procura_market::MarketConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "procura-server", version, about = "Procura tender marketplace server")]
pub struct Cli {
    /// SurrealDB WebSocket address.
    #[arg(long, env = "PROCURA_DB_URL", default_value = "127.0.0.1:8000")]
    pub db_url: String,

    /// SurrealDB namespace.
    #[arg(long, env = "PROCURA_DB_NS", default_value = "procura")]
    pub db_namespace: String,

    /// SurrealDB database.
    #[arg(long, env = "PROCURA_DB_NAME", default_value = "main")]
    pub db_name: String,

    #[arg(long, env = "PROCURA_DB_USER", default_value = "root")]
    pub db_user: String,

    #[arg(long, env = "PROCURA_DB_PASS", default_value = "root", hide_env_values = true)]
    pub db_pass: String,

    #[arg(long, env = "PROCURA_LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    /// Page size when a listing omits `limit`.
    #[arg(long, env = "PROCURA_PAGE_LIMIT", default_value_t = 5)]
    pub page_limit: u64,

    /// Largest accepted `limit`.
    #[arg(long, env = "PROCURA_MAX_PAGE_LIMIT", default_value_t = 100)]
    pub max_page_limit: u64,

    /// Cap on approve votes needed to accept a bid.
    #[arg(long, env = "PROCURA_MAX_QUORUM", default_value_t = 3)]
    pub max_quorum: u64,

    /// Seconds between store health checks.
    #[arg(long, env = "PROCURA_HEALTH_INTERVAL", default_value_t = 30)]
    pub health_interval_secs: u64,
}

impl Cli {
    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.db_url.clone(),
            namespace: self.db_namespace.clone(),
            database: self.db_name.clone(),
            username: self.db_user.clone(),
            password: self.db_pass.clone(),
        }
    }

    pub fn market_config(&self) -> MarketConfig {
        MarketConfig {
            default_page_limit: self.page_limit,
            max_page_limit: self.max_page_limit.max(1),
            max_quorum: self.max_quorum.max(1),
        }
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_library_defaults() {
        let cli = Cli::parse_from(["procura-server"]);
        let market = cli.market_config();
        let defaults = MarketConfig::default();
        assert_eq!(market.default_page_limit, defaults.default_page_limit);
        assert_eq!(market.max_page_limit, defaults.max_page_limit);
        assert_eq!(market.max_quorum, defaults.max_quorum);
        assert_eq!(cli.db_config().namespace, DbConfig::default().namespace);
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "procura-server",
            "--db-url",
            "db:8000",
            "--max-quorum",
            "0",
            "--log-format",
            "text",
        ]);
        assert_eq!(cli.db_config().url, "db:8000");
        assert_eq!(cli.market_config().max_quorum, 1);
        assert_eq!(cli.log_format, LogFormat::Text);
    }
}
