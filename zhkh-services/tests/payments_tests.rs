/// Integration tests for the payments service
///
/// Payments talk to a real billing router served on an ephemeral port, or to
/// a stub that refuses every update, or to a closed port.

mod common;

use axum::{http::StatusCode, routing::put, Router};
use common::{closed_port_url, serve, wait_for, TestContext};
use serde_json::{json, Value};
use zhkh_services::app::ServiceKind;
use zhkh_services::config::DEFAULT_DECLINED_CARD;
use zhkh_shared::models::payment::{Payment, PaymentStatus};

/// Billing service with two pending bills for account 1
async fn billing_with_bills() -> (TestContext, String, Vec<i64>) {
    let billing = TestContext::new(ServiceKind::Billing).await.unwrap();

    let mut ids = Vec::new();
    for (kind, amount) in [("water", 300.0), ("heating", 1200.0)] {
        let (status, body) = billing
            .post(
                "/api/billings",
                json!({"account_id": 1, "type": kind, "amount": amount}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(body["data"]["id"].as_i64().unwrap());
    }

    let url = serve(billing.app.clone()).await;
    (billing, url, ids)
}

async fn payments_for(billing_url: String) -> TestContext {
    TestContext::with_config(ServiceKind::Payments, move |config| {
        config.billing_service_url = billing_url;
    })
    .await
    .unwrap()
}

async fn wait_for_status(ctx: &TestContext, id: i64) -> PaymentStatus {
    let db = ctx.db.clone();
    wait_for(
        || {
            let db = db.clone();
            async move {
                matches!(
                    Payment::find_by_id(&db, id).await,
                    Ok(Some(p)) if p.status.is_terminal()
                )
            }
        },
        2000,
    )
    .await
    .unwrap();

    Payment::find_by_id(&ctx.db, id).await.unwrap().unwrap().status
}

#[tokio::test]
async fn test_payment_marks_bills_paid_and_settles() {
    let (billing, billing_url, bill_ids) = billing_with_bills().await;
    let ctx = payments_for(billing_url).await;

    let (status, body) = ctx
        .post(
            "/api/payments",
            json!({
                "account": 1,
                "billingIds": bill_ids,
                "amount": 1500.0,
                "creditCard": {"number": "4111 1111 1111 1111"}
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["status"], "processing");
    let id = body["data"]["id"].as_i64().unwrap();

    let (_, bills) = billing.get("/api/billings?account=1").await;
    assert!(bills["data"]["services"]
        .as_array()
        .unwrap()
        .iter()
        .all(|b| b["status"] == "paid"));

    assert_eq!(wait_for_status(&ctx, id).await, PaymentStatus::Completed);
}

#[tokio::test]
async fn test_declined_card_settles_as_error() {
    let (_billing, billing_url, bill_ids) = billing_with_bills().await;
    let ctx = payments_for(billing_url).await;

    let (status, body) = ctx
        .post(
            "/api/payments",
            json!({
                "account_id": 1,
                "billing_ids": [bill_ids[0]],
                "amount": 300.0,
                "credit_card": {"number": DEFAULT_DECLINED_CARD}
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let id = body["data"]["id"].as_i64().unwrap();

    assert_eq!(wait_for_status(&ctx, id).await, PaymentStatus::Error);
}

#[tokio::test]
async fn test_billing_unavailable() {
    let ctx = payments_for(closed_port_url().await).await;

    let (status, body) = ctx
        .post(
            "/api/payments",
            json!({"account_id": 3, "billing_ids": [1], "amount": 10.0}),
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], "Billing service unavailable");

    let payments = Payment::list_for_account(&ctx.db, 3).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, PaymentStatus::Error);
}

#[tokio::test]
async fn test_billing_rejects_update() {
    let stub = Router::new().route(
        "/api/billings/paid",
        put(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let ctx = payments_for(serve(stub).await).await;

    let (status, body) = ctx
        .post(
            "/api/payments",
            json!({"account_id": 4, "billing_ids": [1, 2], "amount": 10.0}),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Failed to update billing status");

    let payments = Payment::list_for_account(&ctx.db, 4).await.unwrap();
    assert_eq!(payments[0].status, PaymentStatus::Error);
}

#[tokio::test]
async fn test_payment_validation() {
    let ctx = payments_for(closed_port_url().await).await;

    for body in [
        json!({"billing_ids": [1], "amount": 10.0}),
        json!({"account_id": 1, "amount": 10.0}),
        json!({"account_id": 1, "billing_ids": [1], "amount": -5}),
    ] {
        let (status, response) = ctx.post("/api/payments", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", response);
    }

    assert!(Payment::list_for_account(&ctx.db, 1).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_and_summary() {
    let ctx = payments_for(closed_port_url().await).await;

    // every attempt fails against the closed port and is stored as error
    for amount in [100.0, 50.0] {
        ctx.post(
            "/api/payments",
            json!({"account_id": 9, "billing_ids": [1], "amount": amount}),
        )
        .await;
    }

    let (status, body) = ctx.get("/api/payments/9").await;
    assert_eq!(status, StatusCode::OK);
    let amounts: Vec<f64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["amount"].as_f64().unwrap())
        .collect();
    assert_eq!(amounts, vec![50.0, 100.0]);

    let (status, body) = ctx.get("/api/payments/9/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"]["amount"], 150.0);
    assert_eq!(
        body["data"]["total"]["by_status"],
        json!([{"status": "error", "amount": 150.0}])
    );

    let (_, empty): (_, Value) = ctx.get("/api/payments/10").await;
    assert!(empty["data"].as_array().unwrap().is_empty());
}
