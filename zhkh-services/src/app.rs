/// Service kinds, shared state and router builder
///
/// All back-office services are built from this crate. A [`ServiceKind`]
/// selects the routes, the migration set and the defaults; the rest of the
/// plumbing (tracing, CORS, health check, pool) is identical.
///
/// # Example
///
/// ```no_run
/// use zhkh_services::app::{build_router, ServiceKind, ServiceState};
/// use zhkh_services::config::Config;
/// use zhkh_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env(ServiceKind::Accounts)?;
/// let pool = create_pool(DatabaseConfig::for_file("data/accounts.db")).await?;
/// let state = ServiceState::new(ServiceKind::Accounts, pool, config)?;
///
/// let app = build_router(state);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:5001").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{billing_client::BillingClient, config::Config, routes};
use axum::{
    routing::{get, post, put},
    Router,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};
use zhkh_shared::api::cors::cors_layer;
use zhkh_shared::db::{
    migrations::{run_migrations, Schema},
    pool::{close_pool, create_pool, DatabaseConfig},
};
use zhkh_shared::models::report::seed_demo_data;

/// One of the back-office services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Accounts,
    Billing,
    Payments,
    Reports,
    Users,
    Tasks,
}

impl ServiceKind {
    /// Short name used in logs, health output and database file names
    pub fn name(&self) -> &'static str {
        match self {
            ServiceKind::Accounts => "accounts",
            ServiceKind::Billing => "billing",
            ServiceKind::Payments => "payments",
            ServiceKind::Reports => "reports",
            ServiceKind::Users => "users",
            ServiceKind::Tasks => "tasks",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            ServiceKind::Accounts => 5001,
            ServiceKind::Billing => 5002,
            ServiceKind::Payments => 5003,
            ServiceKind::Reports => 5004,
            ServiceKind::Users => 5005,
            ServiceKind::Tasks => 5006,
        }
    }

    /// Migration set owned by the service
    pub fn schema(&self) -> Schema {
        match self {
            ServiceKind::Accounts => Schema::Accounts,
            ServiceKind::Billing => Schema::Billing,
            ServiceKind::Payments => Schema::Payments,
            ServiceKind::Reports => Schema::Reports,
            ServiceKind::Users => Schema::Users,
            ServiceKind::Tasks => Schema::Tasks,
        }
    }
}

/// Shared service state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct ServiceState {
    pub kind: ServiceKind,

    /// Database connection pool
    pub db: SqlitePool,

    /// Service configuration
    pub config: Arc<Config>,

    /// HTTP client for calls to other services
    pub http: reqwest::Client,
}

impl ServiceState {
    /// Creates new service state
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(kind: ServiceKind, db: SqlitePool, config: Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()?;

        Ok(Self {
            kind,
            db,
            config: Arc::new(config),
            http,
        })
    }

    /// Client for the billing service
    pub fn billing(&self) -> BillingClient {
        BillingClient::new(self.http.clone(), &self.config.billing_service_url)
    }
}

/// Builds the router of one service
///
/// # Architecture
///
/// ```text
/// /health                              every service
/// /api/accounts[/:id]                  accounts
/// /api/billings, /api/billings/paid    billing
/// /api/payments/:account_id[/summary]  payments
/// /api/users, /login, /:id             users
/// /api/tasks/..., /api/executors       tasks
/// /api/reports[/:id[/receipt]]         reports
/// ```
pub fn build_router(state: ServiceState) -> Router {
    let api = match state.kind {
        ServiceKind::Accounts => Router::new()
            .route(
                "/api/accounts",
                get(routes::accounts::list_accounts).post(routes::accounts::create_account),
            )
            .route(
                "/api/accounts/:id",
                get(routes::accounts::get_account)
                    .put(routes::accounts::update_account)
                    .delete(routes::accounts::delete_account),
            ),
        ServiceKind::Billing => Router::new()
            .route(
                "/api/billings",
                get(routes::billing::get_billing).post(routes::billing::create_bill),
            )
            .route("/api/billings/paid", put(routes::billing::mark_paid)),
        ServiceKind::Payments => Router::new()
            .route("/api/payments", post(routes::payments::create_payment))
            .route("/api/payments/:account_id", get(routes::payments::list_payments))
            .route(
                "/api/payments/:account_id/summary",
                get(routes::payments::payment_summary),
            ),
        ServiceKind::Users => Router::new()
            .route("/api/users", post(routes::users::create_user))
            .route("/api/users/login", post(routes::users::login))
            .route("/api/users/:id", get(routes::users::get_user)),
        ServiceKind::Tasks => Router::new()
            .route(
                "/api/tasks",
                get(routes::tasks::list_tasks).post(routes::tasks::create_task),
            )
            .route("/api/tasks/:id", get(routes::tasks::get_task))
            .route("/api/tasks/:id/status", put(routes::tasks::update_status))
            .route("/api/tasks/:id/assign", put(routes::tasks::assign_task))
            .route("/api/tasks/:id/comments", post(routes::tasks::add_comment))
            .route("/api/tasks/:id/attachments", post(routes::tasks::add_attachment))
            .route("/api/tasks/:id/rate", post(routes::tasks::rate_task))
            .route(
                "/api/executors",
                get(routes::tasks::list_executors).post(routes::tasks::create_executor),
            ),
        ServiceKind::Reports => Router::new()
            .route(
                "/api/reports",
                get(routes::reports::list_reports).post(routes::reports::generate_report),
            )
            .route("/api/reports/:id", get(routes::reports::get_report))
            .route("/api/reports/:id/receipt", get(routes::reports::download_receipt)),
    };

    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .merge(api)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Runs one service until Ctrl-C
///
/// Loads the configuration, opens and migrates the database, seeds demo data
/// for the report service and serves the router.
pub async fn run(kind: ServiceKind) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    zhkh_shared::telemetry::init_tracing("zhkh_services=debug,zhkh_shared=info,tower_http=debug");

    let config = Config::from_env(kind)?;

    info!(
        service = kind.name(),
        "ZHKH {} service v{} starting...",
        kind.name(),
        env!("CARGO_PKG_VERSION")
    );

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    run_migrations(&pool, kind.schema()).await?;

    if kind == ServiceKind::Reports {
        tokio::fs::create_dir_all(&config.receipts_dir).await?;
        tokio::fs::create_dir_all(&config.qrcodes_dir).await?;
        if config.seed_demo_data {
            seed_demo_data(&pool).await?;
        }
    }

    let address = config.bind_address();
    let state = ServiceState::new(kind, pool.clone(), config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(service = kind.name(), "Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    info!(service = kind.name(), "Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_defaults() {
        assert_eq!(ServiceKind::Accounts.default_port(), 5001);
        assert_eq!(ServiceKind::Reports.default_port(), 5004);
        assert_eq!(ServiceKind::Users.schema(), Schema::Users);
        assert_eq!(ServiceKind::Billing.name(), "billing");
    }
}
