/// Account endpoints
///
/// # Endpoints
///
/// ```text
/// POST   /api/accounts          create
/// GET    /api/accounts          list (?active=true|false)
/// GET    /api/accounts/:id      fetch
/// PUT    /api/accounts/:id      partial update
/// DELETE /api/accounts/:id      soft delete (is_active = false)
/// ```

use crate::app::ServiceState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use tracing::info;
use validator::Validate;
use zhkh_shared::api::{
    envelope::{created, ok},
    ApiError, ApiResult, Envelope, JsonBody, PathParam, QueryParams,
};
use zhkh_shared::models::account::{Account, CreateAccount, UpdateAccount};

/// List filter
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub active: Option<bool>,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Account not found".to_string())
}

fn ensure_positive_square(value: f64) -> ApiResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ApiError::invalid_field(
            "propertySquare",
            "Property square must be a positive number",
        ))
    }
}

/// Creates an account
///
/// # Errors
///
/// - `400 Bad Request`: missing or invalid field
/// - `409 Conflict`: account number already exists
pub async fn create_account(
    State(state): State<ServiceState>,
    JsonBody(req): JsonBody<CreateAccount>,
) -> ApiResult<(StatusCode, Json<Envelope<Account>>)> {
    req.validate()?;
    ensure_positive_square(req.property_square)?;

    let account = Account::create(&state.db, req).await?;
    info!(account_id = account.id, number = %account.number, "Account created");

    Ok(created(account))
}

/// Lists accounts
pub async fn list_accounts(
    State(state): State<ServiceState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<Json<Envelope<Vec<Account>>>> {
    let accounts = Account::list(&state.db, query.active).await?;
    Ok(ok(accounts))
}

/// Fetches one account
pub async fn get_account(
    State(state): State<ServiceState>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<Envelope<Account>>> {
    let account = Account::find_by_id(&state.db, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(ok(account))
}

/// Updates the given fields of an account
///
/// # Errors
///
/// - `400 Bad Request`: empty body or invalid field
/// - `404 Not Found`: unknown account
pub async fn update_account(
    State(state): State<ServiceState>,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<UpdateAccount>,
) -> ApiResult<Json<Envelope<Account>>> {
    if req.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }
    req.validate()?;
    if let Some(square) = req.property_square {
        ensure_positive_square(square)?;
    }

    let account = Account::update(&state.db, id, req)
        .await?
        .ok_or_else(not_found)?;
    info!(account_id = id, "Account updated");

    Ok(ok(account))
}

/// Soft-deletes an account
pub async fn delete_account(
    State(state): State<ServiceState>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<Envelope<()>>> {
    if !Account::deactivate(&state.db, id).await? {
        return Err(not_found());
    }
    info!(account_id = id, "Account deactivated");

    Ok(Json(Envelope::message("Account deleted successfully")))
}
