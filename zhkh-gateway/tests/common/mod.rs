//! Common test utilities for gateway integration tests
//!
//! - Real back-office services on ephemeral ports (in-memory databases)
//! - An echo upstream that reflects what the gateway forwarded
//! - A gateway router driven in-process with `oneshot`
//! - Cookie handling for the session flow

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode, Uri};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower::ServiceExt;
use zhkh_gateway::app::{build_router, AppState};
use zhkh_gateway::config::Config;
use zhkh_gateway::session::memory::MemorySessionStore;
use zhkh_services::app::{build_router as build_service, ServiceKind, ServiceState};
use zhkh_services::config::Config as ServiceConfig;
use zhkh_shared::db::migrations::run_migrations;
use zhkh_shared::db::pool::{create_pool, DatabaseConfig};

pub const PASSWORD: &str = "correct horse";

/// Response of a gateway call
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap_or(Value::Null)
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// `name=value` part of the session `Set-Cookie`, usable as a `Cookie` header
    pub fn session_cookie(&self) -> Option<String> {
        self.header("set-cookie")
            .and_then(|c| c.split(';').next().map(str::to_string))
    }
}

/// Gateway under test
pub struct TestGateway {
    pub app: Router,
    pub state: AppState,
}

impl TestGateway {
    /// Builds a gateway whose services all point at closed ports until the
    /// caller adjusts them
    pub async fn new<F>(adjust: F) -> Self
    where
        F: FnOnce(&mut Config),
    {
        let closed = closed_port_url().await;

        let mut config = Config::default();
        for url in [
            &mut config.services.accounts,
            &mut config.services.billing,
            &mut config.services.payments,
            &mut config.services.reports,
            &mut config.services.users,
            &mut config.services.tasks,
        ] {
            *url = closed.clone();
        }
        config.upstream_timeout_secs = 5;
        adjust(&mut config);

        let state = AppState::new(config, std::sync::Arc::new(MemorySessionStore::new())).unwrap();
        let app = build_router(state.clone());

        Self { app, state }
    }

    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();

        Reply {
            status,
            headers,
            bytes,
        }
    }

    /// Registers `email` through the gateway and logs in; returns the cookie
    pub async fn login_as(&self, email: &str) -> String {
        let reply = self
            .call("POST", "/api/register", Some(registration(email)), None)
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.json());

        let reply = self
            .call(
                "POST",
                "/api/login",
                Some(json!({"email": email, "password": PASSWORD})),
                None,
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.json());

        reply.session_cookie().unwrap()
    }
}

pub fn registration(email: &str) -> Value {
    json!({
        "email": email,
        "name": "Оператор",
        "sex": 1,
        "password": PASSWORD
    })
}

/// Starts one back-office service with an in-memory database
pub async fn spawn_service(kind: ServiceKind) -> String {
    let mut config = ServiceConfig::defaults(kind);
    config.upstream_timeout_secs = 5;

    let db = create_pool(DatabaseConfig::in_memory()).await.unwrap();
    run_migrations(&db, kind.schema()).await.unwrap();

    let state = ServiceState::new(kind, db, config).unwrap();
    serve(build_service(state)).await
}

/// Upstream that answers every request with what it received
///
/// `GET /api/billings/teapot` answers 418 with a plain-text body instead.
pub async fn spawn_echo() -> String {
    async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> (StatusCode, Json<Value>) {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);

        (
            StatusCode::ACCEPTED,
            Json(json!({
                "method": method.as_str(),
                "uri": uri.to_string(),
                "user": header("x-forwarded-user"),
                "content_type": header("content-type"),
                "body": body,
            })),
        )
    }

    async fn teapot() -> (StatusCode, [(header::HeaderName, &'static str); 1], &'static str) {
        (
            StatusCode::IM_A_TEAPOT,
            [(header::CONTENT_TYPE, "text/plain")],
            "short and stout",
        )
    }

    let app = Router::new()
        .route("/api/billings/teapot", get(teapot))
        .fallback(echo);
    serve(app).await
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
