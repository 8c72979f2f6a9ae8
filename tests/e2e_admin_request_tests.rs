//! End-to-end tests for role requests and their review by admins

mod common;

use common::*;
use community_sync_server::relational_store::{ProfileRole, RelationalStore, RoleRequestStatus};
use reqwest::StatusCode;
use serde_json::Value;

async fn submit(client: &TestClient, user_id: &str, role: &str) -> String {
    let response = client.submit_role_request(user_id, role).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    body["requestId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_approving_a_request_grants_the_role() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let request_id = submit(&client, &server.user_id, "moderator").await;

    let response = client
        .review_role_request(&request_id, &server.admin_id, "approved")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Request approved");

    let profile = server.store.get_profile(&server.user_id).unwrap().unwrap();
    assert_eq!(profile.role, ProfileRole::Moderator);

    let request = server.store.get_role_request(&request_id).unwrap().unwrap();
    assert_eq!(request.status, RoleRequestStatus::Approved);
    assert_eq!(request.reviewed_by.as_deref(), Some(server.admin_id.as_str()));
}

#[tokio::test]
async fn test_rejecting_a_request_keeps_the_role() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let request_id = submit(&client, &server.user_id, "admin").await;

    let response = client
        .review_role_request(&request_id, &server.admin_id, "rejected")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Request rejected");

    let profile = server.store.get_profile(&server.user_id).unwrap().unwrap();
    assert_eq!(profile.role, ProfileRole::User);
}

#[tokio::test]
async fn test_request_can_only_be_reviewed_once() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let request_id = submit(&client, &server.user_id, "moderator").await;

    client
        .review_role_request(&request_id, &server.admin_id, "rejected")
        .await;
    let response = client
        .review_role_request(&request_id, &server.admin_id, "approved")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Request has already been processed");

    let profile = server.store.get_profile(&server.user_id).unwrap().unwrap();
    assert_eq!(profile.role, ProfileRole::User);
}

#[tokio::test]
async fn test_non_admin_cannot_review() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let request_id = submit(&client, &server.user_id, "moderator").await;

    let response = client
        .review_role_request(&request_id, &server.user_id, "approved")
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .review_role_request(&request_id, "no-such-profile", "approved")
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let request = server.store.get_role_request(&request_id).unwrap().unwrap();
    assert_eq!(request.status, RoleRequestStatus::Pending);
}

#[tokio::test]
async fn test_review_validation() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let request_id = submit(&client, &server.user_id, "moderator").await;

    let response = client
        .review_role_request(&request_id, &server.admin_id, "pending")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .review_role_request("no-such-request", &server.admin_id, "approved")
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_only_one_pending_request_per_user() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let request_id = submit(&client, &server.user_id, "moderator").await;

    let response = client.submit_role_request(&server.user_id, "admin").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["requestId"], request_id.as_str());

    let response = client.submit_role_request(&server.user_id, "superuser").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client.submit_role_request("no-such-user", "moderator").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
