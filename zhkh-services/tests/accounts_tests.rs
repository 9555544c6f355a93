/// Integration tests for the accounts service

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::{json, Value};
use zhkh_services::app::ServiceKind;

fn account_body(number: &str) -> Value {
    json!({
        "number": number,
        "address": "ул. Ленина, д. 5, кв. 12",
        "ownerFullName": "Иванов Иван Иванович",
        "propertySquare": 54.3,
        "residentsCount": 3,
        "companyName": "УК Восток"
    })
}

#[tokio::test]
async fn test_create_then_fetch_account() {
    let ctx = TestContext::new(ServiceKind::Accounts).await.unwrap();

    let (status, body) = ctx.post("/api/accounts", account_body("1001")).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["success"], true);

    let id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["isActive"], true);

    let (status, fetched) = ctx.get(&format!("/api/accounts/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"]["number"], "1001");
    assert_eq!(fetched["data"]["ownerFullName"], "Иванов Иван Иванович");
    assert_eq!(fetched["data"]["propertySquare"], 54.3);
    assert_eq!(fetched["data"]["residentsCount"], 3);
}

#[tokio::test]
async fn test_create_account_validation() {
    let ctx = TestContext::new(ServiceKind::Accounts).await.unwrap();

    let mut missing_address = account_body("1002");
    missing_address["address"] = json!("");
    let (status, body) = ctx.post("/api/accounts", missing_address).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    for square in [json!(0), json!(-1.0)] {
        let mut bad_square = account_body("1003");
        bad_square["propertySquare"] = square;
        let (status, body) = ctx.post("/api/accounts", bad_square).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["details"][0]["field"], "property_square");
        assert_eq!(body["details"][0]["message"], "Property square must be positive");
    }

    let (status, _) = ctx.post("/api/accounts", json!({"number": "1004"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_number_conflicts() {
    let ctx = TestContext::new(ServiceKind::Accounts).await.unwrap();

    let (status, _) = ctx.post("/api/accounts", account_body("2001")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = ctx.post("/api/accounts", account_body("2001")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_partial_update() {
    let ctx = TestContext::new(ServiceKind::Accounts).await.unwrap();

    let (_, body) = ctx.post("/api/accounts", account_body("3001")).await;
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, updated) = ctx
        .put(
            &format!("/api/accounts/{}", id),
            json!({"residentsCount": 4, "isActive": 0}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["data"]["residentsCount"], 4);
    assert_eq!(updated["data"]["isActive"], false);
    assert_eq!(updated["data"]["address"], "ул. Ленина, д. 5, кв. 12");

    let (status, body) = ctx.put(&format!("/api/accounts/{}", id), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No fields to update");

    let (status, body) = ctx
        .put(&format!("/api/accounts/{}", id), json!({"propertySquare": 0}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "property_square");

    let (status, _) = ctx.put("/api/accounts/9999", json!({"residentsCount": 1})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_is_soft() {
    let ctx = TestContext::new(ServiceKind::Accounts).await.unwrap();

    let (_, body) = ctx.post("/api/accounts", account_body("4001")).await;
    let id = body["data"]["id"].as_i64().unwrap();
    ctx.post("/api/accounts", account_body("4002")).await;

    let (status, body) = ctx.send("DELETE", &format!("/api/accounts/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Account deleted successfully");

    // still readable, just inactive
    let (status, fetched) = ctx.get(&format!("/api/accounts/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"]["isActive"], false);

    let (_, active) = ctx.get("/api/accounts?active=true").await;
    let numbers: Vec<&str> = active["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["number"].as_str().unwrap())
        .collect();
    assert_eq!(numbers, vec!["4002"]);

    let (_, all) = ctx.get("/api/accounts").await;
    assert_eq!(all["data"].as_array().unwrap().len(), 2);

    let (status, _) = ctx.send("DELETE", "/api/accounts/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_account_and_bad_id() {
    let ctx = TestContext::new(ServiceKind::Accounts).await.unwrap();

    let (status, body) = ctx.get("/api/accounts/77").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Account not found");

    let (status, body) = ctx.get("/api/accounts/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new(ServiceKind::Accounts).await.unwrap();

    let (status, body) = ctx.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "accounts");
    assert_eq!(body["database"], "connected");
}
