use crate::helpers::{body_json, spawn_app};

#[actix_web::test]
async fn health_check_works() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .get(format!("{}/util/health_check", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    let body = body_json(response).await;
    assert_eq!(body["status"], true);
}

#[actix_web::test]
async fn openapi_document_lists_payment_routes() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .get(format!("{}/api-docs/openapi.json", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    let body = body_json(response).await;
    assert!(body["paths"]["/payment/initiate"].is_object());
    assert!(body["paths"]["/appointment/create"].is_object());
}
