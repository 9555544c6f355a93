/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use zhkh_gateway::app::{build_router, connect_store, AppState};
/// use zhkh_gateway::config::Config;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let store = connect_store(&config).await?;
/// let state = AppState::new(config, store)?;
///
/// let app = build_router(state);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::config::{Config, SessionBackend};
use crate::middleware::session::require_session;
use crate::proxy::{self, Upstream};
use crate::routes;
use crate::session::{
    memory::MemorySessionStore, redis::RedisSessionStore, Session, SessionError, SessionManager,
    SessionStore,
};
use axum::{
    extract::{Request, State},
    routing::{get, on, post, MethodFilter, MethodRouter},
    Extension, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};
use zhkh_shared::api::cors::cors_layer;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    pub sessions: SessionManager,

    /// Client for all calls to the services
    pub http: reqwest::Client,
}

impl AppState {
    /// Creates new application state
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: Config, store: Arc<dyn SessionStore>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()?;
        let sessions = SessionManager::new(store, Duration::from_secs(config.session.ttl_secs));

        Ok(Self {
            config: Arc::new(config),
            sessions,
            http,
        })
    }
}

/// Opens the configured session store
pub async fn connect_store(config: &Config) -> Result<Arc<dyn SessionStore>, SessionError> {
    match config.session.backend {
        SessionBackend::Memory => Ok(Arc::new(MemorySessionStore::new())),
        SessionBackend::Redis => {
            Ok(Arc::new(RedisSessionStore::connect(&config.session.redis_url).await?))
        }
    }
}

/// Method router that forwards to one service
fn proxied(upstream: Upstream, methods: MethodFilter) -> MethodRouter<AppState> {
    on(
        methods,
        move |State(state): State<AppState>, Extension(session): Extension<Session>, req: Request| async move {
            proxy::forward(&state, upstream, &session, req).await
        },
    )
}

/// Builds the gateway router
///
/// # Architecture
///
/// ```text
/// /                      index (public)
/// /favicon.ico           204 (public)
/// /health                health check (public)
/// /api/register          public
/// /api/login             public
/// /api/logout            public
/// /api/me                session
/// /api/accounts[/*]      session, GET POST PUT DELETE  -> accounts
/// /api/billings[/*]      session, GET POST             -> billing
/// /api/payments[/*]      session, GET POST             -> payments
/// /api/tasks[/*]         session, GET POST PUT         -> tasks
/// /api/executors         session, GET POST PUT         -> tasks
/// /api/reports[/*]       session, GET POST             -> reports
/// ```
pub fn build_router(state: AppState) -> Router {
    let read_write = MethodFilter::GET.or(MethodFilter::POST);
    let read_write_update = read_write.or(MethodFilter::PUT);
    let crud = read_write_update.or(MethodFilter::DELETE);

    let public_routes = Router::new()
        .route("/", get(routes::root::index))
        .route("/favicon.ico", get(routes::root::favicon))
        .route("/health", get(routes::health::health_check))
        .route("/api/register", post(routes::auth::register))
        .route("/api/login", post(routes::auth::login))
        .route("/api/logout", post(routes::auth::logout));

    let session_routes = Router::new()
        .route("/api/me", get(routes::auth::me))
        .route("/api/accounts", proxied(Upstream::Accounts, crud))
        .route("/api/accounts/*rest", proxied(Upstream::Accounts, crud))
        .route("/api/billings", proxied(Upstream::Billing, read_write))
        .route("/api/billings/*rest", proxied(Upstream::Billing, read_write))
        .route("/api/payments", proxied(Upstream::Payments, read_write))
        .route("/api/payments/*rest", proxied(Upstream::Payments, read_write))
        .route("/api/tasks", proxied(Upstream::Tasks, read_write_update))
        .route("/api/tasks/*rest", proxied(Upstream::Tasks, read_write_update))
        .route("/api/executors", proxied(Upstream::Tasks, read_write_update))
        .route("/api/reports", proxied(Upstream::Reports, read_write))
        .route("/api/reports/*rest", proxied(Upstream::Reports, read_write))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Runs the gateway until Ctrl-C
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    zhkh_shared::telemetry::init_tracing("zhkh_gateway=debug,zhkh_shared=info,tower_http=debug");

    let config = Config::from_env()?;

    info!(
        "ZHKH API gateway v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let store = connect_store(&config).await?;
    info!(backend = store.name(), "Session store ready");

    let address = config.bind_address();
    let state = AppState::new(config, store)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
