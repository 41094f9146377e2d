pub mod utils;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};
use utils::{create_test_app, create_test_config, credential_json, device_json, session_cookie};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::OrphanDevicePolicy;
use crate::db::{Store, errors::DbError};

const PASSWORD: &str = "correct horse battery";

async fn mount_provider_success(server: &MockServer, device_id: &str, psk: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/projects/frogs/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_json(device_id)))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/v1/projects/frogs/devices/{device_id}/credentials")))
        .respond_with(ResponseTemplate::new(200).set_body_json(credential_json(psk, "2024-03-01T10:00:00Z")))
        .mount(server)
        .await;
}

async fn signup(server: &TestServer, email: &str, password: &str) -> axum_test::TestResponse {
    server.post("/signup").json(&json!({ "email": email, "password": password })).await
}

async fn login(server: &TestServer, email: &str, password: &str) -> axum_test::TestResponse {
    server.post("/login").json(&json!({ "email": email, "password": password })).await
}

/// Sign up and log in, returning the session cookie.
async fn signed_in(server: &TestServer, email: &str) -> String {
    signup(server, email, PASSWORD).await.assert_status_ok();
    let response = login(server, email, PASSWORD).await;
    response.assert_status_ok();
    session_cookie(&response)
}

/// End-to-end: signup, login, wrong login, add a device, list users, delete the user, and the
/// user is gone afterwards.
#[test_log::test(tokio::test)]
async fn test_e2e_signup_login_device_and_admin_flow() {
    let provider = MockServer::start().await;
    mount_provider_success(&provider, "dev-42", "issued-psk").await;
    let (server, store) = create_test_app(&provider, create_test_config());

    // Signup returns the user, without the hash
    let response = signup(&server, "alice@example.com", PASSWORD).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert!(body["user"].get("password_hash").is_none());

    let stored = store.get_user_by_email("alice@example.com").await.unwrap();
    assert_ne!(stored.password_hash, PASSWORD);

    // Wrong password and unknown email are indistinguishable
    let wrong = login(&server, "alice@example.com", "not the password").await;
    wrong.assert_status(StatusCode::UNAUTHORIZED);
    let unknown = login(&server, "nobody@example.com", PASSWORD).await;
    unknown.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.json::<Value>(), unknown.json::<Value>());
    assert_eq!(wrong.json::<Value>()["message"], "Invalid email or password");

    // Login sets an HTTP-only session cookie
    let response = login(&server, "alice@example.com", PASSWORD).await;
    response.assert_status_ok();
    let set_cookie = response.header("set-cookie");
    let set_cookie = set_cookie.to_str().unwrap();
    assert!(set_cookie.starts_with("ribbit_session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Max-Age=86400"));
    let alice = session_cookie(&response);

    // Register a device
    let response = server.post("/addDevice").add_header("cookie", alice.clone()).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["deviceID"], "dev-42");
    assert_eq!(body["psk"], "issued-psk");

    // Listing shows the device but never the key
    let response = server.get("/devices").add_header("cookie", alice.clone()).await;
    response.assert_status_ok();
    let devices: Vec<Value> = response.json();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0]["deviceID"], "dev-42");
    assert!(devices[0].get("psk").is_none());
    assert!(devices[0].get("preshared_key").is_none());

    // Admin lists users
    let admin = signed_in(&server, "admin@example.com").await;
    let response = server.get("/users").add_header("cookie", admin.clone()).await;
    response.assert_status_ok();
    let users: Vec<Value> = response.json();
    assert_eq!(users.len(), 2);
    assert_eq!(users.iter().filter(|u| u["email"] == "alice@example.com").count(), 1);
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));

    // Admin deletes alice
    let response = server.delete("/users/alice@example.com").add_header("cookie", admin.clone()).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["devices_removed"], 0);

    assert!(matches!(store.get_user_by_email("alice@example.com").await, Err(DbError::NotFound)));
    server
        .delete("/users/alice@example.com")
        .add_header("cookie", admin)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // Devices are retained by default, but the deleted user's session is dead
    assert_eq!(store.device_count(), 1);
    server
        .get("/devices")
        .add_header("cookie", alice)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[test_log::test(tokio::test)]
async fn test_duplicate_signup_conflicts_and_keeps_first_password() {
    let provider = MockServer::start().await;
    let (server, _store) = create_test_app(&provider, create_test_config());

    signup(&server, "bob@example.com", PASSWORD).await.assert_status_ok();
    let response = signup(&server, "bob@example.com", "a different password").await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(
        response.json::<Value>()["message"],
        "An account with this email address already exists"
    );

    login(&server, "bob@example.com", PASSWORD).await.assert_status_ok();
    login(&server, "bob@example.com", "a different password")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[test_log::test(tokio::test)]
async fn test_signup_validation() {
    let provider = MockServer::start().await;
    let (server, store) = create_test_app(&provider, create_test_config());

    signup(&server, "not-an-email", PASSWORD).await.assert_status(StatusCode::BAD_REQUEST);
    signup(&server, "carol@example.com", "short").await.assert_status(StatusCode::BAD_REQUEST);
    signup(&server, "carol@example.com", &"x".repeat(65))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    assert!(store.list_users().await.unwrap().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_device_routes_require_session() {
    let provider = MockServer::start().await;
    Mock::given(path_regex(".*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&provider)
        .await;
    let (server, _store) = create_test_app(&provider, create_test_config());

    server.post("/addDevice").await.assert_status(StatusCode::UNAUTHORIZED);
    server
        .post("/addDevice")
        .add_header("cookie", "ribbit_session=not.a.token")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server.get("/devices").await.assert_status(StatusCode::UNAUTHORIZED);
    server.post("/provider/verify").await.assert_status(StatusCode::UNAUTHORIZED);
    server.get("/users").await.assert_status(StatusCode::UNAUTHORIZED);

    // Signed in is not enough to provision throwaway devices
    let ivan = signed_in(&server, "ivan@example.com").await;
    server
        .post("/provider/verify")
        .add_header("cookie", ivan)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[test_log::test(tokio::test)]
async fn test_session_signed_with_another_key_is_rejected() {
    let provider = MockServer::start().await;
    let (server, _store) = create_test_app(&provider, create_test_config());
    let cookie = signed_in(&server, "dave@example.com").await;

    let mut other_config = create_test_config();
    other_config.secret_key = Some("some-other-secret".to_string());
    let (other_server, other_store) = create_test_app(&provider, other_config);
    other_store
        .create_user(&crate::db::models::users::UserCreateDBRequest {
            email: "dave@example.com".to_string(),
            password_hash: "unused".to_string(),
        })
        .await
        .unwrap();

    other_server
        .get("/devices")
        .add_header("cookie", cookie)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[test_log::test(tokio::test)]
async fn test_non_admin_cannot_manage_users() {
    let provider = MockServer::start().await;
    let (server, store) = create_test_app(&provider, create_test_config());
    let erin = signed_in(&server, "erin@example.com").await;

    server
        .get("/users")
        .add_header("cookie", erin.clone())
        .await
        .assert_status(StatusCode::FORBIDDEN);
    server
        .delete("/users/erin@example.com")
        .add_header("cookie", erin)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    assert!(store.get_user_by_email("erin@example.com").await.is_ok());
}

#[test_log::test(tokio::test)]
async fn test_case_variant_of_admin_email_is_not_admin() {
    let provider = MockServer::start().await;
    let (server, store) = create_test_app(&provider, create_test_config());
    signup(&server, "victim@example.com", PASSWORD).await.assert_status_ok();
    let impostor = signed_in(&server, "ADMIN@example.com").await;

    server
        .get("/users")
        .add_header("cookie", impostor.clone())
        .await
        .assert_status(StatusCode::FORBIDDEN);
    server
        .delete("/users/victim@example.com")
        .add_header("cookie", impostor)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    assert!(store.get_user_by_email("victim@example.com").await.is_ok());
}

#[test_log::test(tokio::test)]
async fn test_logout_expires_cookie() {
    let provider = MockServer::start().await;
    let (server, _store) = create_test_app(&provider, create_test_config());

    for response in [server.get("/logout").await, server.post("/logout").await] {
        response.assert_status_ok();
        let set_cookie = response.header("set-cookie");
        let set_cookie = set_cookie.to_str().unwrap();
        assert!(set_cookie.starts_with("ribbit_session=;"));
        assert!(set_cookie.contains("Max-Age=0"));
    }
}

#[test_log::test(tokio::test)]
async fn test_provider_failure_is_bad_gateway_and_stores_nothing() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/frogs/devices"))
        .respond_with(ResponseTemplate::new(500).set_body_string("provider exploded"))
        .expect(1)
        .mount(&provider)
        .await;
    let (server, store) = create_test_app(&provider, create_test_config());
    let frank = signed_in(&server, "frank@example.com").await;

    let response = server.post("/addDevice").add_header("cookie", frank).await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["provider_status"], 500);
    assert_eq!(body["provider_body"], "provider exploded");
    assert_eq!(body["phase"], "requested");

    assert_eq!(store.device_count(), 0);
}

#[test_log::test(tokio::test)]
async fn test_delete_orphan_policy_removes_devices() {
    let provider = MockServer::start().await;
    mount_provider_success(&provider, "dev-7", "psk-7").await;
    let mut config = create_test_config();
    config.devices.orphan_policy = OrphanDevicePolicy::Delete;
    let (server, store) = create_test_app(&provider, config);

    let grace = signed_in(&server, "grace@example.com").await;
    server.post("/addDevice").add_header("cookie", grace).await.assert_status_ok();
    assert_eq!(store.device_count(), 1);

    let admin = signed_in(&server, "admin@example.com").await;
    let response = server.delete("/users/grace@example.com").add_header("cookie", admin).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["devices_removed"], 1);
    assert_eq!(store.device_count(), 0);
}

#[test_log::test(tokio::test)]
async fn test_provider_verify_stores_nothing() {
    let provider = MockServer::start().await;
    mount_provider_success(&provider, "probe-1", "probe-psk").await;
    let (server, store) = create_test_app(&provider, create_test_config());
    let heidi = signed_in(&server, "heidi@example.com").await;
    server
        .post("/provider/verify")
        .add_header("cookie", heidi)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let admin = signed_in(&server, "admin@example.com").await;
    let response = server.post("/provider/verify").add_header("cookie", admin).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["deviceID"], "probe-1");
    assert_eq!(store.device_count(), 0);
}

#[test_log::test(tokio::test)]
async fn test_healthz() {
    let provider = MockServer::start().await;
    let (server, _store) = create_test_app(&provider, create_test_config());

    let response = server.get("/healthz").await;
    response.assert_status_ok();
    response.assert_text("OK");
}
