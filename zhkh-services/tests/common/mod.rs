//! Common test utilities for service integration tests
//!
//! - Fresh in-memory database per context, migrated for the service kind
//! - Receipts written to a temporary directory
//! - Settlement without delay
//! - Request helpers that return status and parsed JSON
//! - Serving a router on an ephemeral port for service-to-service tests

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::SqlitePool;
use std::net::SocketAddr;
use tempfile::TempDir;
use tower::ServiceExt;
use zhkh_services::app::{build_router, ServiceKind, ServiceState};
use zhkh_services::config::Config;
use zhkh_shared::db::migrations::run_migrations;
use zhkh_shared::db::pool::{create_pool, DatabaseConfig};

/// Test context for one service
pub struct TestContext {
    pub db: SqlitePool,
    pub app: Router,
    pub config: Config,

    /// Keeps the receipts directory alive for the duration of the test
    pub receipts: TempDir,
}

impl TestContext {
    pub async fn new(kind: ServiceKind) -> anyhow::Result<Self> {
        Self::with_config(kind, |_| {}).await
    }

    /// Creates a context after letting the caller adjust the configuration
    pub async fn with_config<F>(kind: ServiceKind, adjust: F) -> anyhow::Result<Self>
    where
        F: FnOnce(&mut Config),
    {
        let receipts = tempfile::tempdir()?;

        let mut config = Config::defaults(kind);
        config.receipts_dir = receipts.path().to_path_buf();
        config.qrcodes_dir = receipts.path().join("qrcodes");
        config.settlement.delay_ms = 0;
        config.upstream_timeout_secs = 5;
        adjust(&mut config);

        let db = create_pool(DatabaseConfig::in_memory()).await?;
        run_migrations(&db, kind.schema()).await?;

        let state = ServiceState::new(kind, db.clone(), config.clone())?;
        let app = build_router(state);

        Ok(Self {
            db,
            app,
            config,
            receipts,
        })
    }

    /// Sends a request and returns the status and the JSON body
    ///
    /// A body that is not JSON is returned as `Value::Null`.
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send_with_headers(method, uri, body, &[]).await
    }

    pub async fn send_with_headers(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let (status, _, bytes) = self.send_raw(method, uri, body, headers).await;
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    /// Sends a request and returns status, content type and raw body
    pub async fn send_raw(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Option<String>, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, content_type, bytes.to_vec())
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("PUT", uri, Some(body)).await
    }
}

/// Serves a router on `127.0.0.1:<ephemeral>` and returns its base URL
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    format!("http://{}", addr)
}

/// Base URL of a port nothing listens on
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Polls `condition` every 20ms until it holds or `timeout_ms` passes
pub async fn wait_for<F, Fut>(condition: F, timeout_ms: u64) -> anyhow::Result<()>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);

    loop {
        if condition().await {
            return Ok(());
        }

        if start.elapsed() > timeout {
            anyhow::bail!("Condition not met within {} ms", timeout_ms);
        }

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
}
