/// User endpoints
///
/// # Endpoints
///
/// ```text
/// POST /api/users         register
/// POST /api/users/login   verify credentials
/// GET  /api/users/:id     fetch
/// ```

use crate::app::ServiceState;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;
use zhkh_shared::api::{
    envelope::{created, ok},
    ApiError, ApiResult, Envelope, JsonBody, PathParam,
};
use zhkh_shared::auth::password::{hash_password, validate_password_length, verify_password};
use zhkh_shared::models::user::{CreateUser, User};

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    #[validate(range(min = 0, max = 1, message = "Sex must be 0 or 1"))]
    pub sex: i64,

    pub password: String,

    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedUser {
    pub id: i64,
}

/// Registers a user
///
/// # Errors
///
/// - `400 Bad Request`: invalid field or short password
/// - `409 Conflict`: email already registered
pub async fn create_user(
    State(state): State<ServiceState>,
    JsonBody(req): JsonBody<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<CreatedUser>>)> {
    req.validate()?;
    if req.name.trim().is_empty() {
        return Err(ApiError::invalid_field("name", "Name is required"));
    }
    validate_password_length(&req.password)
        .map_err(|msg| ApiError::invalid_field("password", msg))?;

    let password_hash = hash_password(&req.password)?;

    let id = User::create(
        &state.db,
        CreateUser {
            email: req.email.trim().to_string(),
            name: req.name.trim().to_string(),
            sex: req.sex,
            description: req.description,
            password_hash,
        },
    )
    .await?;
    info!(user_id = id, "User registered");

    Ok(created(CreatedUser { id }))
}

/// Verifies credentials and returns the user
///
/// Unknown email and wrong password produce the same 401.
pub async fn login(
    State(state): State<ServiceState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<Json<Envelope<User>>> {
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let Some(user) = User::find_by_email(&state.db, req.email.trim()).await? else {
        warn!("Login attempt for unknown email");
        return Err(invalid());
    };

    if !verify_password(&req.password, &user.password)? {
        warn!(user_id = user.id, "Login attempt with wrong password");
        return Err(invalid());
    }

    info!(user_id = user.id, "User logged in");
    Ok(ok(user))
}

/// Fetches one user
pub async fn get_user(
    State(state): State<ServiceState>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<Envelope<User>>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(ok(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> CreateUserRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_registration_validation() {
        let valid = request(json!({
            "email": "user@example.com",
            "name": "Ivan",
            "sex": 1,
            "password": "password123"
        }));
        assert!(valid.validate().is_ok());

        let bad_email = request(json!({
            "email": "nope",
            "name": "Ivan",
            "sex": 1,
            "password": "password123"
        }));
        assert!(bad_email.validate().is_err());

        let bad_sex = request(json!({
            "email": "user@example.com",
            "name": "Ivan",
            "sex": 2,
            "password": "password123"
        }));
        assert!(bad_sex.validate().is_err());
    }
}
