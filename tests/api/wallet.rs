use crate::helpers::{body_json, spawn_app};
use uuid::Uuid;

#[actix_web::test]
async fn new_user_has_an_empty_wallet() {
    let app = spawn_app().await;

    let response = app.get("/wallet", Uuid::new_v4()).await;

    assert_eq!(response.status().as_u16(), 200);
    let body = body_json(response).await;
    assert_eq!(body["data"]["balance"], "0.00");
    assert_eq!(body["data"]["currency"], "ZAR");
}

#[actix_web::test]
async fn withdrawal_is_recorded_in_the_ledger() {
    let app = spawn_app().await;
    let user = Uuid::new_v4();
    app.fund_wallet(user, "80.00").await;

    let response = app
        .post_json(
            "/wallet/withdraw",
            user,
            &serde_json::json!({"amount": "30.00"}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let transactions = body_json(app.get("/wallet/transactions", user).await).await;
    let entries = transactions["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["direction"], "DEBIT");
    assert_eq!(entries[0]["amount"], "30.00");

    let wallet = body_json(app.get("/wallet", user).await).await;
    assert_eq!(wallet["data"]["balance"], "50.00");
}

#[actix_web::test]
async fn overdraft_withdrawal_is_refused() {
    let app = spawn_app().await;
    let user = Uuid::new_v4();
    app.fund_wallet(user, "10.00").await;

    let response = app
        .post_json(
            "/wallet/withdraw",
            user,
            &serde_json::json!({"amount": "10.01"}),
        )
        .await;

    assert_eq!(response.status().as_u16(), 402);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INSUFFICIENT_BALANCE");
}
