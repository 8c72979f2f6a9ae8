//! End-to-end tests for event registration and cancellation

mod common;

use chrono::{Duration, Utc};
use common::*;
use community_sync_server::notifications::{
    EVENT_REMINDER_WORKFLOW, REGISTRATION_CONFIRMATION_WORKFLOW,
};
use community_sync_server::relational_store::{RegistrationStatus, RelationalStore};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_register_confirms_and_schedules_reminders() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let event_id = event_in_days(&server.store, 7, Some(10));

    let response = client.register(&event_id, "Ada Lovelace", "Ada@Example.com").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    let registration_id = body["registrationId"].as_str().unwrap();

    let registration = server
        .store
        .get_registration(registration_id)
        .unwrap()
        .unwrap();
    assert_eq!(registration.email, "ada@example.com");
    assert_eq!(registration.status, RegistrationStatus::Confirmed);
    assert_eq!(
        server.store.get_event(&event_id).unwrap().unwrap().registration_count,
        1
    );

    let immediate = server.notifier.immediate();
    assert_eq!(immediate.len(), 1);
    assert_eq!(immediate[0].workflow, REGISTRATION_CONFIRMATION_WORKFLOW);
    assert_eq!(immediate[0].recipient.email, "ada@example.com");

    let scheduled = server.notifier.scheduled();
    assert_eq!(scheduled.len(), 2);
    assert!(scheduled
        .iter()
        .all(|(notification, _)| notification.workflow == EVENT_REMINDER_WORKFLOW));
}

#[tokio::test]
async fn test_reminders_in_the_past_are_not_scheduled() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    // Starts in twelve hours: the 24h reminder would already be due
    let event_id = insert_event(&server.store, Utc::now() + Duration::hours(12), None)
        .expect("Failed to insert test event");

    let response = client.register(&event_id, "Grace", "grace@example.com").await;
    assert_eq!(response.status(), StatusCode::OK);

    let scheduled = server.notifier.scheduled();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].0.payload["hoursBefore"], 1);
    assert_eq!(server.notifier.immediate().len(), 1);
}

#[tokio::test]
async fn test_duplicate_registration_returns_existing_id() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let event_id = event_in_days(&server.store, 3, None);

    let first: Value = client
        .register(&event_id, "Ada", "ada@example.com")
        .await
        .json()
        .await
        .unwrap();

    let response = client.register(&event_id, "Ada", " ADA@example.com ").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Already registered for this event");
    assert_eq!(body["registrationId"], first["registrationId"]);
}

#[tokio::test]
async fn test_full_event_rejects_registration() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let event_id = event_in_days(&server.store, 3, Some(1));

    let response = client.register(&event_id, "Ada", "ada@example.com").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = client.register(&event_id, "Grace", "grace@example.com").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Event is full");
    assert_eq!(
        server.store.get_event(&event_id).unwrap().unwrap().registration_count,
        1
    );
}

#[tokio::test]
async fn test_duplicate_on_full_event_returns_existing_id() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let event_id = event_in_days(&server.store, 3, Some(1));

    let first: Value = client
        .register(&event_id, "Ada", "ada@example.com")
        .await
        .json()
        .await
        .unwrap();

    let response = client.register(&event_id, "Ada", "ada@example.com").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Already registered for this event");
    assert_eq!(body["registrationId"], first["registrationId"]);
}

#[tokio::test]
async fn test_registration_validation() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let event_id = event_in_days(&server.store, 3, None);

    let response = client
        .register_with(json!({ "eventId": event_id, "name": "Ada" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Missing required fields");

    let response = client.register(&event_id, "Ada", "not-an-email").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid email address");

    let response = client.register("no-such-event", "Ada", "ada@example.com").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .client
        .post(format!("{}/api/events/register", server.base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(server.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_cancelled_event_rejects_registration() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let event_id = event_in_days(&server.store, 3, None);
    server.store.set_event_status(&event_id, "cancelled").unwrap();

    let response = client.register(&event_id, "Ada", "ada@example.com").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Event is not accepting registrations");
}

#[tokio::test]
async fn test_cancel_registration_frees_a_seat() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let event_id = event_in_days(&server.store, 3, Some(1));

    let body: Value = client
        .register(&event_id, "Ada", "ada@example.com")
        .await
        .json()
        .await
        .unwrap();
    let registration_id = body["registrationId"].as_str().unwrap().to_string();

    // Wrong email does not reveal the registration
    let response = client
        .cancel_registration(&registration_id, "someone@example.com")
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .cancel_registration(&registration_id, "ada@example.com")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Registration cancelled");

    let registration = server
        .store
        .get_registration(&registration_id)
        .unwrap()
        .unwrap();
    assert_eq!(registration.status, RegistrationStatus::Cancelled);
    assert_eq!(
        server.store.get_event(&event_id).unwrap().unwrap().registration_count,
        0
    );

    // The freed seat can be taken
    let response = client.register(&event_id, "Grace", "grace@example.com").await;
    assert_eq!(response.status(), StatusCode::OK);

    // Cancelling twice is rejected
    let response = client
        .cancel_registration(&registration_id, "ada@example.com")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
