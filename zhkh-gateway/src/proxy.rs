/// Forwarding requests to the back-office services
///
/// The gateway passes method, path, query, body and content type through
/// unchanged and adds `X-Forwarded-User` with the session email. The
/// downstream status, content type and body come back as they are. A service
/// that cannot be reached turns into a 503 envelope:
///
/// ```json
/// { "success": false, "error": "service_unavailable", "message": "Billing service unavailable" }
/// ```

use crate::app::AppState;
use crate::session::Session;
use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{header, StatusCode},
    response::Response,
};
use bytes::Bytes;
use serde_json::Value;
use zhkh_shared::api::{ApiError, ApiResult};

/// Header carrying the email of the logged-in user to the services
pub const FORWARDED_USER_HEADER: &str = "x-forwarded-user";

/// Largest request body the gateway buffers
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// A back-office service behind the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Accounts,
    Billing,
    Payments,
    Reports,
    Users,
    Tasks,
}

impl Upstream {
    /// Name used in "... service unavailable"
    pub fn display_name(&self) -> &'static str {
        match self {
            Upstream::Accounts => "Account",
            Upstream::Billing => "Billing",
            Upstream::Payments => "Payment",
            Upstream::Reports => "Report",
            Upstream::Users => "User",
            Upstream::Tasks => "Task",
        }
    }

    fn base_url<'a>(&self, state: &'a AppState) -> &'a str {
        let services = &state.config.services;
        match self {
            Upstream::Accounts => &services.accounts,
            Upstream::Billing => &services.billing,
            Upstream::Payments => &services.payments,
            Upstream::Reports => &services.reports,
            Upstream::Users => &services.users,
            Upstream::Tasks => &services.tasks,
        }
    }
}

/// Request sent to a service
#[derive(Debug, Clone)]
pub struct Outbound {
    pub method: reqwest::Method,

    /// Path and query, starting with `/`
    pub path: String,

    pub content_type: Option<String>,

    /// Value of `X-Forwarded-User`
    pub user: Option<String>,

    pub body: Bytes,
}

impl Outbound {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: reqwest::Method::GET,
            path: path.into(),
            content_type: None,
            user: None,
            body: Bytes::new(),
        }
    }

    pub fn post_json(path: impl Into<String>, body: &Value) -> Self {
        Self {
            method: reqwest::Method::POST,
            path: path.into(),
            content_type: Some("application/json".to_string()),
            user: None,
            body: Bytes::from(body.to_string()),
        }
    }

    pub fn as_user(mut self, email: &str) -> Self {
        self.user = Some(email.to_string());
        self
    }
}

/// Sends a request to a service
///
/// # Errors
///
/// `ServiceUnavailable` when the service cannot be reached or times out
pub async fn send(
    state: &AppState,
    upstream: Upstream,
    outbound: Outbound,
) -> ApiResult<reqwest::Response> {
    let url = format!("{}{}", upstream.base_url(state), outbound.path);

    let mut request = state.http.request(outbound.method.clone(), &url);
    if let Some(content_type) = &outbound.content_type {
        request = request.header(reqwest::header::CONTENT_TYPE, content_type);
    }
    if let Some(user) = &outbound.user {
        request = request.header(FORWARDED_USER_HEADER, user);
    }
    if !outbound.body.is_empty() {
        request = request.body(outbound.body);
    }

    request.send().await.map_err(|e| {
        tracing::warn!(
            upstream = upstream.display_name(),
            method = %outbound.method,
            url = %url,
            "Upstream request failed: {}",
            e
        );
        ApiError::ServiceUnavailable(format!("{} service unavailable", upstream.display_name()))
    })
}

/// Turns a service response into a gateway response
pub async fn relay(upstream: Upstream, response: reqwest::Response) -> ApiResult<Response> {
    let status =
        StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = header_string(&response, reqwest::header::CONTENT_TYPE);
    let disposition = header_string(&response, reqwest::header::CONTENT_DISPOSITION);

    let body = response.bytes().await.map_err(|e| {
        tracing::warn!(upstream = upstream.display_name(), "Upstream body read failed: {}", e);
        ApiError::ServiceUnavailable(format!("{} service unavailable", upstream.display_name()))
    })?;

    let mut builder = Response::builder().status(status);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    if let Some(disposition) = disposition {
        builder = builder.header(header::CONTENT_DISPOSITION, disposition);
    }

    builder
        .body(Body::from(body))
        .map_err(|e| ApiError::InternalError(format!("Failed to build relayed response: {}", e)))
}

fn header_string(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Forwards an incoming request on behalf of a logged-in user
pub async fn forward(
    state: &AppState,
    upstream: Upstream,
    session: &Session,
    req: Request,
) -> ApiResult<Response> {
    let (parts, body) = req.into_parts();

    let method = reqwest::Method::from_bytes(parts.method.as_str().as_bytes())
        .map_err(|_| ApiError::BadRequest("Unsupported method".to_string()))?;
    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());
    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let body = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| ApiError::BadRequest("Request body too large".to_string()))?;

    tracing::debug!(upstream = upstream.display_name(), %method, path = %path, "Proxying request");

    let outbound = Outbound {
        method,
        path,
        content_type,
        user: Some(session.email.clone()),
        body,
    };

    let response = send(state, upstream, outbound).await?;
    relay(upstream, response).await
}
