/// Index and favicon
///
/// ```text
/// GET /             endpoint listing
/// GET /favicon.ico  204, keeps browser noise out of the logs
/// ```

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub success: bool,
    pub message: String,
    pub endpoints: Vec<&'static str>,
}

const ENDPOINTS: &[&str] = &[
    "GET /health",
    "POST /api/register",
    "POST /api/login",
    "POST /api/logout",
    "GET /api/me",
    "/api/accounts",
    "/api/billings",
    "/api/payments",
    "/api/reports",
    "/api/tasks",
    "/api/executors",
];

pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        success: true,
        message: "ZHKH API gateway".to_string(),
        endpoints: ENDPOINTS.to_vec(),
    })
}

pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}
