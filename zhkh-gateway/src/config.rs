/// Configuration management for the API gateway
///
/// Loaded from environment variables (and a `.env` file when present) on top
/// of built-in defaults.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 5000)
/// - `ACCOUNT_SERVICE_URL`, `BILLING_SERVICE_URL`, `PAYMENT_SERVICE_URL`,
///   `REPORT_SERVICE_URL`, `USERS_SERVICE_URL`, `TASKS_SERVICE_URL`:
///   base URLs of the back-office services
/// - `SESSION_BACKEND`: `memory` (default) or `redis`
/// - `REDIS_URL`: Redis connection URL for the `redis` backend
/// - `SESSION_TTL_SECS`: Session lifetime (default: 86400)
/// - `COOKIE_SECURE`: Add `Secure` to the session cookie (default: false)
/// - `CORS_ORIGINS`: Comma-separated origins, `*` for any (default: *)
/// - `UPSTREAM_TIMEOUT_SECS`: Timeout of proxied requests (default: 10)
///
/// # Example
///
/// ```no_run
/// use zhkh_gateway::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Gateway will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::fmt;
use std::str::FromStr;

/// Complete gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,

    /// Base URLs of the back-office services
    pub services: ServiceUrls,

    pub session: SessionConfig,

    pub cors_origins: Vec<String>,

    pub upstream_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct ServiceUrls {
    pub accounts: String,
    pub billing: String,
    pub payments: String,
    pub reports: String,
    pub users: String,
    pub tasks: String,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub backend: SessionBackend,

    /// Used only by the Redis backend
    pub redis_url: String,

    pub ttl_secs: u64,

    pub cookie_secure: bool,
}

/// Where sessions are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    /// In-process map, lost on restart
    Memory,

    Redis,
}

impl FromStr for SessionBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(SessionBackend::Memory),
            "redis" => Ok(SessionBackend::Redis),
            other => Err(format!("unknown session backend '{}'", other)),
        }
    }
}

impl fmt::Display for SessionBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionBackend::Memory => f.write_str("memory"),
            SessionBackend::Redis => f.write_str("redis"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            services: ServiceUrls {
                accounts: "http://127.0.0.1:5001".to_string(),
                billing: "http://127.0.0.1:5002".to_string(),
                payments: "http://127.0.0.1:5003".to_string(),
                reports: "http://127.0.0.1:5004".to_string(),
                users: "http://127.0.0.1:5005".to_string(),
                tasks: "http://127.0.0.1:5006".to_string(),
            },
            session: SessionConfig {
                backend: SessionBackend::Memory,
                redis_url: "redis://127.0.0.1:6379".to_string(),
                ttl_secs: 86_400,
                cookie_secure: false,
            },
            cors_origins: vec!["*".to_string()],
            upstream_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(host) = env::var("API_HOST") {
            config.api.host = host;
        }
        config.api.port = parse_var("API_PORT", config.api.port)?;

        let services = &mut config.services;
        for (name, slot) in [
            ("ACCOUNT_SERVICE_URL", &mut services.accounts),
            ("BILLING_SERVICE_URL", &mut services.billing),
            ("PAYMENT_SERVICE_URL", &mut services.payments),
            ("REPORT_SERVICE_URL", &mut services.reports),
            ("USERS_SERVICE_URL", &mut services.users),
            ("TASKS_SERVICE_URL", &mut services.tasks),
        ] {
            if let Ok(url) = env::var(name) {
                *slot = url.trim().trim_end_matches('/').to_string();
            }
        }

        config.session.backend = parse_var("SESSION_BACKEND", config.session.backend)?;
        if let Ok(url) = env::var("REDIS_URL") {
            config.session.redis_url = url;
        }
        config.session.ttl_secs = parse_var("SESSION_TTL_SECS", config.session.ttl_secs)?;
        if config.session.ttl_secs == 0 {
            anyhow::bail!("SESSION_TTL_SECS must be positive");
        }
        config.session.cookie_secure = parse_var("COOKIE_SECURE", config.session.cookie_secure)?;

        if let Ok(origins) = env::var("CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        config.upstream_timeout_secs =
            parse_var("UPSTREAM_TIMEOUT_SECS", config.upstream_timeout_secs)?;

        Ok(config)
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}
