use crate::helpers::{body_json, spawn_app};
use uuid::Uuid;

#[actix_web::test]
async fn wallet_payment_confirms_the_appointment() {
    let app = spawn_app().await;
    let requester = Uuid::new_v4();
    let provider = Uuid::new_v4();
    app.fund_wallet(requester, "200.00").await;
    let created = body_json(app.book(requester, provider, "14:00").await).await;
    let appointment_id = created["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .post_json(
            "/payment/initiate",
            requester,
            &serde_json::json!({
                "provider": "WALLET",
                "amount": "150.00",
                "appointmentId": appointment_id,
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], "COMPLETED");

    let appointment = body_json(
        app.get(&format!("/appointment/{}", appointment_id), requester)
            .await,
    )
    .await;
    assert_eq!(appointment["data"]["status"], "CONFIRMED");
    assert_eq!(appointment["data"]["isPaid"], true);

    let wallet = body_json(app.get("/wallet", requester).await).await;
    assert_eq!(wallet["data"]["balance"], "50.00");
}

#[actix_web::test]
async fn insufficient_wallet_balance_leaves_appointment_pending() {
    let app = spawn_app().await;
    let requester = Uuid::new_v4();
    app.fund_wallet(requester, "100.00").await;
    let created = body_json(app.book(requester, Uuid::new_v4(), "15:00").await).await;
    let appointment_id = created["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .post_json(
            "/payment/initiate",
            requester,
            &serde_json::json!({
                "provider": "WALLET",
                "amount": "150.00",
                "appointmentId": appointment_id,
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 402);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INSUFFICIENT_BALANCE");

    let appointment = body_json(
        app.get(&format!("/appointment/{}", appointment_id), requester)
            .await,
    )
    .await;
    assert_eq!(appointment["data"]["status"], "PENDING");
    let wallet = body_json(app.get("/wallet", requester).await).await;
    assert_eq!(wallet["data"]["balance"], "100.00");
}

#[actix_web::test]
async fn unconfigured_gateway_is_unavailable() {
    let app = spawn_app().await;

    let response = app
        .post_json(
            "/payment/initiate",
            Uuid::new_v4(),
            &serde_json::json!({"provider": "GATEWAY_A", "amount": "10.00"}),
        )
        .await;

    assert_eq!(response.status().as_u16(), 503);
    let body = body_json(response).await;
    assert_eq!(body["code"], "PROVIDER_UNAVAILABLE");
}

#[actix_web::test]
async fn webhook_for_unknown_provider_is_not_found() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .post(format!("{}/payment/webhook/wallet", &app.address))
        .body("{}")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 404);
}

#[actix_web::test]
async fn another_users_payment_is_forbidden() {
    let app = spawn_app().await;
    let payer = Uuid::new_v4();
    app.fund_wallet(payer, "20.00").await;
    let initiated = body_json(
        app.post_json(
            "/payment/initiate",
            payer,
            &serde_json::json!({"provider": "WALLET", "amount": "5.00"}),
        )
        .await,
    )
    .await;
    let payment_id = initiated["data"]["paymentId"].as_str().unwrap().to_string();

    let own = app.get(&format!("/payment/{}", payment_id), payer).await;
    assert_eq!(own.status().as_u16(), 200);

    let foreign = app
        .get(&format!("/payment/{}", payment_id), Uuid::new_v4())
        .await;
    assert_eq!(foreign.status().as_u16(), 403);
}
