use crate::helpers::{body_json, spawn_app};
use fake::faker::address::en::StreetName;
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use uuid::Uuid;

#[actix_web::test]
async fn create_appointment_returns_pending_booking() {
    let app = spawn_app().await;
    let requester = Uuid::new_v4();
    let provider = Uuid::new_v4();

    let response = app.book(requester, provider, "14:00").await;

    assert_eq!(response.status().as_u16(), 200);
    let body = body_json(response).await;
    assert_eq!(body["status"], true);
    assert_eq!(body["data"]["status"], "PENDING");
    assert_eq!(body["data"]["time"], "14:00");
    assert_eq!(body["data"]["isPaid"], false);
}

#[actix_web::test]
async fn booking_details_are_kept() {
    let app = spawn_app().await;
    let address: String = StreetName().fake();
    let notes: String = Sentence(3..8).fake();

    let response = app
        .post_json(
            "/appointment/create",
            Uuid::new_v4(),
            &serde_json::json!({
                "providerId": Uuid::new_v4(),
                "date": "2024-06-02",
                "time": "08:15",
                "address": address,
                "notes": notes,
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body = body_json(response).await;
    assert_eq!(body["data"]["address"], address.as_str());
    assert_eq!(body["data"]["note"], notes.as_str());
}

#[actix_web::test]
async fn second_booking_of_a_slot_is_a_conflict() {
    let app = spawn_app().await;
    let provider = Uuid::new_v4();

    let first = app.book(Uuid::new_v4(), provider, "09:30").await;
    assert_eq!(first.status().as_u16(), 200);

    let second = app.book(Uuid::new_v4(), provider, "09:30").await;
    assert_eq!(second.status().as_u16(), 409);
    let body = body_json(second).await;
    assert_eq!(body["status"], false);
    assert_eq!(body["code"], "SLOT_CONFLICT");
}

#[actix_web::test]
async fn missing_identity_headers_are_rejected() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .post(format!("{}/appointment/create", &app.address))
        .json(&serde_json::json!({
            "providerId": Uuid::new_v4(),
            "date": "2024-06-01",
            "time": "10:00",
        }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 400);
    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[actix_web::test]
async fn malformed_time_slot_is_rejected() {
    let app = spawn_app().await;

    let response = app.book(Uuid::new_v4(), Uuid::new_v4(), "2pm").await;

    assert_eq!(response.status().as_u16(), 400);
    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[actix_web::test]
async fn requester_cannot_confirm_their_own_booking() {
    let app = spawn_app().await;
    let requester = Uuid::new_v4();
    let provider = Uuid::new_v4();
    let created = body_json(app.book(requester, provider, "11:00").await).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .post_json(
            &format!("/appointment/{}/status", id),
            requester,
            &serde_json::json!({"status": "CONFIRMED", "actorRole": "REQUESTER"}),
        )
        .await;

    assert_eq!(response.status().as_u16(), 409);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_TRANSITION");
    assert_eq!(
        body["customerMessage"],
        "Cannot move appointment from PENDING to CONFIRMED"
    );
}

#[actix_web::test]
async fn provider_confirmation_is_visible_to_requester() {
    let app = spawn_app().await;
    let requester = Uuid::new_v4();
    let provider = Uuid::new_v4();
    let created = body_json(app.book(requester, provider, "12:00").await).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .post_json(
            &format!("/appointment/{}/status", id),
            provider,
            &serde_json::json!({"status": "CONFIRMED", "actorRole": "PROVIDER"}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let fetched = body_json(app.get(&format!("/appointment/{}", id), requester).await).await;
    assert_eq!(fetched["data"]["status"], "CONFIRMED");
}

#[actix_web::test]
async fn unknown_appointment_is_not_found() {
    let app = spawn_app().await;

    let response = app
        .get(&format!("/appointment/{}", Uuid::new_v4()), Uuid::new_v4())
        .await;

    assert_eq!(response.status().as_u16(), 404);
    let body = body_json(response).await;
    assert_eq!(body["code"], "NOT_FOUND");
}
