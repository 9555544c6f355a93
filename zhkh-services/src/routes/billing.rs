/// Billing endpoints
///
/// # Endpoints
///
/// ```text
/// GET /api/billings?account=<id>&period=<months>   bills with totals
/// POST /api/billings                               create a bill
/// PUT  /api/billings/paid                          mark bills paid
/// ```
///
/// # Response (GET)
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "services": [{"id": 1, "accountId": 7, "createdAt": "...", "status": "pending", "type": "water", "amount": 120.0}],
///     "total": {"services": [{"type": "water", "amount": 120.0}], "amount": 120.0}
///   }
/// }
/// ```

use crate::{
    app::ServiceState,
    summary::{summarize_bills, BillingSummary},
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use zhkh_shared::api::{
    envelope::{created, ok},
    ApiError, ApiResult, Envelope, JsonBody, QueryParams,
};
use zhkh_shared::models::bill::{Bill, BillStatus, CreateBill};

/// Default look-back window in months
pub const DEFAULT_PERIOD_MONTHS: u32 = 6;

#[derive(Debug, Deserialize)]
pub struct BillingQuery {
    pub account: Option<String>,
    pub period: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBillRequest {
    pub account_id: i64,
    pub amount: f64,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub status: Option<BillStatus>,
}

#[derive(Debug, Serialize)]
pub struct CreatedBill {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct MarkPaidRequest {
    #[serde(default)]
    pub billing_ids: Vec<i64>,
}

/// Parses the `period` query value (months, positive)
pub fn parse_period(raw: Option<&str>) -> ApiResult<u32> {
    match raw.map(str::trim) {
        None | Some("") => Ok(DEFAULT_PERIOD_MONTHS),
        Some(value) => value
            .parse::<u32>()
            .ok()
            .filter(|months| *months > 0)
            .ok_or_else(|| ApiError::BadRequest("Period must be a positive number".to_string())),
    }
}

fn parse_account(raw: Option<&str>) -> ApiResult<i64> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Account ID is required".to_string()))?;

    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::BadRequest("Account ID must be a positive number".to_string()))
}

/// Bills of an account for the last `period` months, oldest first
pub async fn get_billing(
    State(state): State<ServiceState>,
    QueryParams(query): QueryParams<BillingQuery>,
) -> ApiResult<Json<Envelope<BillingSummary>>> {
    let account_id = parse_account(query.account.as_deref())?;
    let months = parse_period(query.period.as_deref())?;

    let bills = Bill::list_for_account(&state.db, account_id, months).await?;
    Ok(ok(summarize_bills(bills)))
}

/// Creates a bill, `pending` unless told otherwise
pub async fn create_bill(
    State(state): State<ServiceState>,
    JsonBody(req): JsonBody<CreateBillRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<CreatedBill>>)> {
    if req.account_id <= 0 {
        return Err(ApiError::invalid_field(
            "account_id",
            "Account ID must be a positive number",
        ));
    }
    if !(req.amount.is_finite() && req.amount > 0.0) {
        return Err(ApiError::invalid_field("amount", "Amount must be positive"));
    }
    let kind = req.kind.trim();
    if kind.is_empty() {
        return Err(ApiError::invalid_field("type", "Bill type is required"));
    }

    let id = Bill::create(
        &state.db,
        CreateBill {
            account_id: req.account_id,
            amount: req.amount,
            kind: kind.to_string(),
            status: req.status.unwrap_or_default(),
        },
    )
    .await?;
    info!(bill_id = id, account_id = req.account_id, "Bill created");

    Ok(created(CreatedBill { id }))
}

/// Marks bills paid in one transaction
pub async fn mark_paid(
    State(state): State<ServiceState>,
    JsonBody(req): JsonBody<MarkPaidRequest>,
) -> ApiResult<Json<Envelope<Value>>> {
    if req.billing_ids.is_empty() {
        return Err(ApiError::invalid_field(
            "billing_ids",
            "Billing IDs are required",
        ));
    }
    if req.billing_ids.iter().any(|id| *id <= 0) {
        return Err(ApiError::invalid_field(
            "billing_ids",
            "Billing ID must be a positive number",
        ));
    }

    let updated = Bill::mark_paid(&state.db, &req.billing_ids).await?;
    info!(requested = req.billing_ids.len(), updated, "Bills marked paid");

    Ok(Json(
        Envelope::data(json!({ "updated": updated }))
            .with_message("Billing data updated successfully"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_period() {
        assert_eq!(parse_period(None).unwrap(), DEFAULT_PERIOD_MONTHS);
        assert_eq!(parse_period(Some("")).unwrap(), DEFAULT_PERIOD_MONTHS);
        assert_eq!(parse_period(Some("12")).unwrap(), 12);
        assert!(parse_period(Some("0")).is_err());
        assert!(parse_period(Some("-3")).is_err());
        assert!(parse_period(Some("abc")).is_err());
    }

    #[test]
    fn test_parse_account() {
        assert_eq!(parse_account(Some("15")).unwrap(), 15);
        assert!(parse_account(None).is_err());
        assert!(parse_account(Some(" ")).is_err());
        assert!(parse_account(Some("x")).is_err());
    }
}
