/// Authentication endpoints
///
/// Credentials are checked by the users service; the gateway only owns the
/// session.
///
/// ```text
/// POST /api/register   forwarded to users POST /api/users
/// POST /api/login      users POST /api/users/login, then session + cookie
/// POST /api/logout     drops the session and clears the cookie
/// GET  /api/me         users GET /api/users/:id (session required)
/// ```

use crate::app::AppState;
use crate::proxy::{relay, send, Outbound, Upstream};
use crate::session::{
    cookie::{clear_cookie, read_token, session_cookie},
    Session,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::Value;
use zhkh_shared::api::{ApiError, ApiResult, Envelope, JsonBody};

/// Returns the email of a body that carries both email and password
fn credentials(body: &Value) -> ApiResult<String> {
    let field = |name: &str| {
        body.get(name)
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
    };

    match (field("email"), field("password")) {
        (Some(email), Some(_)) => Ok(email.trim().to_string()),
        _ => Err(ApiError::BadRequest("Email or password missing".to_string())),
    }
}

/// Register a user
///
/// The users service validates the rest of the body; its answer is relayed.
pub async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> ApiResult<Response> {
    credentials(&body)?;

    let response = send(&state, Upstream::Users, Outbound::post_json("/api/users", &body)).await?;
    relay(Upstream::Users, response).await
}

/// Log in and start a session
///
/// # Response
///
/// 200 with the user and `Set-Cookie: zhkh_session=...`; failures from the
/// users service (401, 400) are relayed unchanged.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> ApiResult<Response> {
    let email = credentials(&body)?;

    let response = send(
        &state,
        Upstream::Users,
        Outbound::post_json("/api/users/login", &body),
    )
    .await?;

    if response.status() != reqwest::StatusCode::OK {
        tracing::info!(email = %email, status = response.status().as_u16(), "Login rejected");
        return relay(Upstream::Users, response).await;
    }

    let payload: Value = response.json().await.map_err(|e| {
        ApiError::UpstreamFailure(format!("Invalid response from user service: {}", e))
    })?;
    let user = payload.get("data").cloned().unwrap_or(Value::Null);

    let (user_id, user_email) = match (
        user.get("id").and_then(Value::as_i64),
        user.get("email").and_then(Value::as_str),
    ) {
        (Some(id), Some(email)) => (id, email.to_string()),
        _ => {
            return Err(ApiError::UpstreamFailure(
                "Invalid response from user service".to_string(),
            ))
        }
    };

    let token = state.sessions.start(user_id, &user_email).await?;
    let cookie = session_cookie(
        &token,
        state.sessions.ttl(),
        state.config.session.cookie_secure,
    );

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(Envelope::data(user).with_message("Login successful")),
    )
        .into_response())
}

/// Log out
///
/// Always succeeds; a missing or stale cookie is not an error.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    if let Some(token) = read_token(&headers) {
        state.sessions.end(&token).await?;
    }

    Ok((
        StatusCode::OK,
        [(
            header::SET_COOKIE,
            clear_cookie(state.config.session.cookie_secure),
        )],
        Json(Envelope::message("Logged out")),
    )
        .into_response())
}

/// Current user
pub async fn me(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Response> {
    let outbound =
        Outbound::get(format!("/api/users/{}", session.user_id)).as_user(&session.email);

    let response = send(&state, Upstream::Users, outbound).await?;
    relay(Upstream::Users, response).await
}
