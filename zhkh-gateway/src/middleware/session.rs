/// Session authentication middleware
///
/// Reads the `zhkh_session` cookie, resolves it against the session store and
/// injects the [`Session`] into request extensions. Requests without a live
/// session get a 401 envelope.
///
/// # Example
///
/// ```no_run
/// use axum::{routing::get, Extension, Router};
/// use zhkh_gateway::app::AppState;
/// use zhkh_gateway::middleware::session::require_session;
/// use zhkh_gateway::session::Session;
///
/// # fn example(state: AppState) -> Router {
/// Router::new()
///     .route("/api/whoami", get(|Extension(session): Extension<Session>| async move {
///         session.email
///     }))
///     .layer(axum::middleware::from_fn_with_state(state.clone(), require_session))
///     .with_state(state)
/// # }
/// ```

use crate::app::AppState;
use crate::session::{cookie::read_token, Session};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use zhkh_shared::api::ApiError;

pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = read_token(req.headers()).ok_or_else(unauthorized)?;

    let session: Session = state
        .sessions
        .resolve(&token)
        .await?
        .ok_or_else(unauthorized)?;

    tracing::debug!(user_id = session.user_id, "Session resolved");
    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}

fn unauthorized() -> ApiError {
    ApiError::Unauthorized("Unauthorized".to_string())
}
