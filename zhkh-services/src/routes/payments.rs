/// Payment endpoints
///
/// # Endpoints
///
/// ```text
/// POST /api/payments                       create and start settlement
/// GET  /api/payments/:account_id           payments of an account, newest first
/// GET  /api/payments/:account_id/summary   payments with totals per status
/// ```
///
/// # Payment flow
///
/// ```text
/// insert (processing) → billing PUT /api/billings/paid
///                          ├── unreachable → error, 503
///                          ├── non-2xx     → error, 500
///                          └── ok          → spawn settlement, 201
/// ```

use crate::{
    app::ServiceState,
    billing_client::UpstreamError,
    settlement::SettlementJob,
    summary::{summarize_payments, PaymentSummary},
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use zhkh_shared::api::{
    envelope::{created, ok},
    ApiError, ApiResult, Envelope, JsonBody, PathParam,
};
use zhkh_shared::models::payment::{CreatePayment, Payment, PaymentStatus};

/// Payment request
///
/// Accepts both snake_case and the camelCase names sent by the frontend.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    #[serde(alias = "account", alias = "accountId")]
    pub account_id: Option<i64>,

    #[serde(alias = "billingIds")]
    pub billing_ids: Option<Vec<i64>>,

    pub amount: Option<f64>,

    #[serde(alias = "creditCard")]
    pub credit_card: Option<CreditCard>,
}

#[derive(Debug, Deserialize)]
pub struct CreditCard {
    pub number: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentCreated {
    pub id: i64,
    pub status: PaymentStatus,
}

/// Validated payment request
#[derive(Debug)]
struct ValidPayment {
    account_id: i64,
    billing_ids: Vec<i64>,
    amount: f64,
    card_number: Option<String>,
}

fn validate(req: CreatePaymentRequest) -> ApiResult<ValidPayment> {
    let account_id = req
        .account_id
        .ok_or_else(|| ApiError::invalid_field("account_id", "Account ID is required"))?;
    if account_id <= 0 {
        return Err(ApiError::invalid_field(
            "account_id",
            "Account ID must be a positive number",
        ));
    }

    let billing_ids = req.billing_ids.unwrap_or_default();
    if billing_ids.is_empty() {
        return Err(ApiError::invalid_field("billing_ids", "Billing IDs are required"));
    }
    if billing_ids.iter().any(|id| *id <= 0) {
        return Err(ApiError::invalid_field(
            "billing_ids",
            "Billing ID must be a positive number",
        ));
    }

    let amount = req
        .amount
        .ok_or_else(|| ApiError::invalid_field("amount", "Amount is required"))?;
    if !(amount.is_finite() && amount > 0.0) {
        return Err(ApiError::invalid_field("amount", "Amount must be positive"));
    }

    Ok(ValidPayment {
        account_id,
        billing_ids,
        amount,
        card_number: req.credit_card.map(|card| card.number),
    })
}

/// Records a payment, marks its bills paid and schedules settlement
///
/// # Errors
///
/// - `400 Bad Request`: invalid request
/// - `500 Internal Server Error`: billing refused the update
/// - `503 Service Unavailable`: billing unreachable
pub async fn create_payment(
    State(state): State<ServiceState>,
    JsonBody(req): JsonBody<CreatePaymentRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<PaymentCreated>>)> {
    let req = validate(req)?;

    let payment = Payment::create(
        &state.db,
        CreatePayment {
            account_id: req.account_id,
            billing_ids: req.billing_ids.clone(),
            amount: req.amount,
        },
    )
    .await?;

    info!(
        payment_id = payment.id,
        account_id = req.account_id,
        amount = req.amount,
        billing_ids = ?req.billing_ids,
        "Payment created"
    );

    if let Err(e) = state.billing().mark_paid(&req.billing_ids).await {
        warn!(payment_id = payment.id, error = %e, "Billing update failed");
        Payment::set_status(&state.db, payment.id, PaymentStatus::Error).await?;

        return Err(match e {
            UpstreamError::Unavailable(_) => {
                ApiError::ServiceUnavailable("Billing service unavailable".to_string())
            }
            UpstreamError::Rejected { .. } => {
                ApiError::UpstreamFailure("Failed to update billing status".to_string())
            }
        });
    }

    SettlementJob::from_config(state.db.clone(), &state.config.settlement)
        .spawn(payment.id, req.card_number);

    Ok(created(PaymentCreated {
        id: payment.id,
        status: PaymentStatus::Processing,
    }))
}

/// Payments of an account, newest first
pub async fn list_payments(
    State(state): State<ServiceState>,
    PathParam(account_id): PathParam<i64>,
) -> ApiResult<Json<Envelope<Vec<Payment>>>> {
    let payments = Payment::list_for_account(&state.db, account_id).await?;
    Ok(ok(payments))
}

/// Payments of an account with totals per status
pub async fn payment_summary(
    State(state): State<ServiceState>,
    PathParam(account_id): PathParam<i64>,
) -> ApiResult<Json<Envelope<PaymentSummary>>> {
    let payments = Payment::list_for_account(&state.db, account_id).await?;
    Ok(ok(summarize_payments(payments)))
}
