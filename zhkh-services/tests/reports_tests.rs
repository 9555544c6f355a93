/// Integration tests for the reports service

mod common;

use axum::http::StatusCode;
use chrono::{Datelike, NaiveDate, Utc};
use common::TestContext;
use serde_json::json;
use zhkh_services::app::ServiceKind;
use zhkh_shared::models::report::{
    month_bounds, seed_demo_data, Charge, ReportAccount, ReportPayment, DEMO_ACCOUNT_NUMBER,
};

async fn march_account(ctx: &TestContext) -> i64 {
    let account = ReportAccount::create(
        &ctx.db,
        "ACC-77",
        "ул. Мира, д. 3",
        61.2,
        4,
        "УК Север",
    )
    .await
    .unwrap();

    let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
    for (service, amount) in [("Отопление", 1000.0), ("Вода", 250.5), ("Отопление", 500.0)] {
        Charge::create(&ctx.db, account.id, service, amount, start, end)
            .await
            .unwrap();
    }

    // another month, must not be counted
    let april = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
    let may = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
    Charge::create(&ctx.db, account.id, "Вода", 999.0, april, may)
        .await
        .unwrap();

    ReportPayment::create(
        &ctx.db,
        account.id,
        NaiveDate::from_ymd_opt(2025, 2, 10).unwrap(),
        800.0,
        "Карта",
    )
    .await
    .unwrap();
    ReportPayment::create(
        &ctx.db,
        account.id,
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        900.0,
        "Наличные",
    )
    .await
    .unwrap();

    account.id
}

#[tokio::test]
async fn test_generate_report() {
    let ctx = TestContext::new(ServiceKind::Reports).await.unwrap();
    let account_id = march_account(&ctx).await;

    let (status, body) = ctx
        .post(
            "/api/reports",
            json!({"account_id": account_id, "period": "202503"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let report = &body["data"];
    assert_eq!(report["account_id"], account_id);
    assert_eq!(report["period"], "202503");
    assert_eq!(report["account_number"], "ACC-77");
    assert_eq!(report["total_amount"], 1750.5);
    assert_eq!(
        report["services"],
        json!([
            {"type": "Отопление", "amount": 1500.0},
            {"type": "Вода", "amount": 250.5}
        ])
    );
    assert_eq!(report["qr_data"], format!("{}:1750.50", account_id));

    let payments = report["payments"].as_array().unwrap();
    assert_eq!(payments.len(), 2);
    assert_eq!(payments[0]["date"], "2025-03-10");

    let receipt_path = report["receipt_path"].as_str().unwrap();
    assert!(receipt_path.ends_with(&format!("ACC{:03}_202503.pdf", account_id)));
    let bytes = std::fs::read(receipt_path).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    assert!(String::from_utf8_lossy(&bytes).trim_end().ends_with("%%EOF"));

    let qr_path = report["qr_path"].as_str().unwrap();
    assert!(qr_path.ends_with(&format!("ACC{:03}_202503_qr.png", account_id)));
    let qr = image::open(qr_path).unwrap().to_luma8();
    assert_eq!(qr.width(), qr.height());
    assert_eq!(qr.get_pixel(0, 0).0, [255]);
}

#[tokio::test]
async fn test_period_as_number() {
    let ctx = TestContext::new(ServiceKind::Reports).await.unwrap();
    let account_id = march_account(&ctx).await;

    let (status, body) = ctx
        .post("/api/reports", json!({"account_id": account_id, "period": 202503}))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["period"], "202503");
}

#[tokio::test]
async fn test_generate_errors() {
    let ctx = TestContext::new(ServiceKind::Reports).await.unwrap();
    let account_id = march_account(&ctx).await;

    let (status, _) = ctx
        .post("/api/reports", json!({"account_id": account_id, "period": "2025-03"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .post("/api/reports", json!({"account_id": account_id, "period": "202513"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx.post("/api/reports", json!({"period": "202503"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = ctx
        .post("/api/reports", json!({"account_id": 999, "period": "202503"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Account not found");

    let (status, _) = ctx
        .post("/api/reports", json!({"account_id": account_id, "period": "202401"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_get_and_download() {
    let ctx = TestContext::new(ServiceKind::Reports).await.unwrap();
    let account_id = march_account(&ctx).await;

    let (_, first) = ctx
        .post("/api/reports", json!({"account_id": account_id, "period": "202503"}))
        .await;
    let (_, second) = ctx
        .post("/api/reports", json!({"account_id": account_id, "period": "202504"}))
        .await;
    let first_id = first["data"]["report_id"].as_i64().unwrap();
    let second_id = second["data"]["report_id"].as_i64().unwrap();

    let (status, body) = ctx
        .get(&format!("/api/reports?account={}", account_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![second_id, first_id]);

    let (status, body) = ctx.get(&format!("/api/reports/{}", first_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "generated");
    assert_eq!(body["data"]["period_start"], "2025-03-01");
    assert_eq!(body["data"]["total_amount"], 1750.5);

    let (status, content_type, bytes) = ctx
        .send_raw("GET", &format!("/api/reports/{}/receipt", first_id), None, &[])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/pdf"));
    assert!(bytes.starts_with(b"%PDF-"));

    // the file disappears from disk
    let path = first["data"]["receipt_path"].as_str().unwrap();
    std::fs::remove_file(path).unwrap();
    let (status, _) = ctx
        .get(&format!("/api/reports/{}/receipt", first_id))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.get("/api/reports/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = ctx.get("/api/reports/999/receipt").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_demo_account_report() {
    let ctx = TestContext::new(ServiceKind::Reports).await.unwrap();
    assert!(seed_demo_data(&ctx.db).await.unwrap());

    let account = ReportAccount::find_by_number(&ctx.db, DEMO_ACCOUNT_NUMBER)
        .await
        .unwrap()
        .unwrap();

    let today = Utc::now().date_naive();
    let (start, _) = month_bounds(today).unwrap();
    let period = format!("{:04}{:02}", start.year(), start.month());

    let (status, body) = ctx
        .post("/api/reports", json!({"account_id": account.id, "period": period}))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["total_amount"], 4000.0);
    assert_eq!(body["data"]["services"].as_array().unwrap().len(), 5);
}
