/// Tracing subscriber setup
///
/// Every binary calls [`init_tracing`] once at startup. The filter comes from
/// `RUST_LOG` when set, otherwise from the directive passed by the caller.
/// Setting `LOG_FORMAT=json` switches the formatter to newline-delimited JSON.

use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, one line per event
    Pretty,

    /// Newline-delimited JSON
    Json,
}

impl LogFormat {
    /// Reads `LOG_FORMAT` (`json` or anything else)
    pub fn from_env() -> Self {
        Self::parse(&env::var("LOG_FORMAT").unwrap_or_default())
    }

    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Installs the global tracing subscriber
///
/// # Arguments
///
/// * `default_directive` - Filter used when `RUST_LOG` is unset,
///   e.g. `"zhkh_gateway=debug,tower_http=debug"`
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let registry = tracing_subscriber::registry().with(filter);

    match LogFormat::from_env() {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
