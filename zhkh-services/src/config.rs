/// Configuration management for the back-office services
///
/// All six services share one configuration shape. Defaults depend on the
/// service kind (port, database file); everything can be overridden from the
/// environment.
///
/// # Environment Variables
///
/// - `SERVICE_HOST`: Host to bind to (default: 0.0.0.0)
/// - `SERVICE_PORT`: Port to bind to (default: per service, 5001..5006)
/// - `DATABASE_URL`: SQLite URL (default: `sqlite://data/<service>.db`)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 5)
/// - `BILLING_SERVICE_URL`: Used by the payment service (default: http://127.0.0.1:5002)
/// - `SETTLEMENT_DELAY_MS`: Delay before a payment is settled (default: 2000)
/// - `DECLINED_CARD_NUMBER`: Test card that always fails settlement
/// - `RECEIPTS_DIR`: Where PDF receipts are written (default: receipts)
/// - `QRCODES_DIR`: Where receipt QR images are written (default: qrcodes)
/// - `SEED_DEMO_DATA`: Seed the report service demo account (default: true)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: *)
/// - `UPSTREAM_TIMEOUT_SECS`: Timeout for service-to-service calls (default: 10)
///
/// # Example
///
/// ```no_run
/// use zhkh_services::{app::ServiceKind, config::Config};
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env(ServiceKind::Billing)?;
/// println!("Billing listens on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use crate::app::ServiceKind;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Card number the settlement job always declines
pub const DEFAULT_DECLINED_CARD: &str = "4111111111111112";

/// Complete service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Listener configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseSettings,

    /// Base URL of the billing service
    pub billing_service_url: String,

    /// Payment settlement configuration
    pub settlement: SettlementConfig,

    /// Directory for generated PDF receipts
    pub receipts_dir: PathBuf,

    /// Directory for receipt QR code PNGs
    pub qrcodes_dir: PathBuf,

    /// Whether the report service seeds its demo account on startup
    pub seed_demo_data: bool,

    /// Allowed CORS origins (`*` allows any)
    pub cors_origins: Vec<String>,

    /// Timeout for service-to-service HTTP calls (seconds)
    pub upstream_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    /// SQLite connection URL
    pub url: String,

    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct SettlementConfig {
    /// Delay before the payment status is finalised (milliseconds)
    pub delay_ms: u64,

    /// Card number whose payments end in `error`
    pub declined_card_number: String,
}

impl Config {
    /// Built-in defaults for a service kind
    pub fn defaults(kind: ServiceKind) -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: kind.default_port(),
            },
            database: DatabaseSettings {
                url: format!("sqlite://data/{}.db", kind.name()),
                max_connections: 5,
            },
            billing_service_url: "http://127.0.0.1:5002".to_string(),
            settlement: SettlementConfig {
                delay_ms: 2000,
                declined_card_number: DEFAULT_DECLINED_CARD.to_string(),
            },
            receipts_dir: PathBuf::from("receipts"),
            qrcodes_dir: PathBuf::from("qrcodes"),
            seed_demo_data: true,
            cors_origins: vec!["*".to_string()],
            upstream_timeout_secs: 10,
        }
    }

    /// Loads configuration from environment variables on top of the defaults
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed
    pub fn from_env(kind: ServiceKind) -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let mut config = Self::defaults(kind);

        if let Ok(host) = env::var("SERVICE_HOST") {
            config.server.host = host;
        }
        config.server.port = parse_var("SERVICE_PORT", config.server.port)?;

        if let Ok(url) = env::var("DATABASE_URL") {
            config.database.url = url;
        }
        config.database.max_connections =
            parse_var("DATABASE_MAX_CONNECTIONS", config.database.max_connections)?;

        if let Ok(url) = env::var("BILLING_SERVICE_URL") {
            config.billing_service_url = url.trim_end_matches('/').to_string();
        }

        config.settlement.delay_ms = parse_var("SETTLEMENT_DELAY_MS", config.settlement.delay_ms)?;
        if let Ok(card) = env::var("DECLINED_CARD_NUMBER") {
            config.settlement.declined_card_number = card;
        }

        if let Ok(dir) = env::var("RECEIPTS_DIR") {
            config.receipts_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = env::var("QRCODES_DIR") {
            config.qrcodes_dir = PathBuf::from(dir);
        }
        config.seed_demo_data = parse_var("SEED_DEMO_DATA", config.seed_demo_data)?;

        if let Ok(origins) = env::var("CORS_ORIGINS") {
            config.cors_origins = split_list(&origins);
        }
        config.upstream_timeout_secs =
            parse_var("UPSTREAM_TIMEOUT_SECS", config.upstream_timeout_secs)?;

        Ok(config)
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}

/// Splits a comma-separated list, dropping blanks
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
