//! Test utilities for integration testing
use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use serde_json::json;
use url::Url;
use wiremock::MockServer;

use crate::{
    AppState, Application,
    config::{Config, ProviderConfig},
    db::InMemoryStore,
    provider::GoliothClient,
};

pub fn create_test_config() -> Config {
    let mut config = Config {
        secret_key: Some("test-secret-key-for-jwt".to_string()),
        ..Default::default()
    };
    config.auth.session.cookie_secure = false;
    config.auth.admin_emails = vec!["admin@example.com".to_string()];
    config.provider = ProviderConfig {
        base_url: Url::parse("http://127.0.0.1:9").unwrap(),
        api_key: Some("test-key".to_string()),
        project_id: Some("frogs".to_string()),
        request_timeout: Duration::from_secs(5),
        max_retries: 1,
        retry_base_delay: Duration::from_millis(1),
        compensate_on_failure: false,
    };
    config
}

/// Provider client for project `frogs` talking to `server`.
pub fn provider_for(server: &MockServer) -> GoliothClient {
    let mut config = create_test_config().provider;
    config.base_url = Url::parse(&server.uri()).unwrap();
    GoliothClient::new(&config).unwrap()
}

/// State over an empty in-memory store. The provider points at a closed port, so only use it
/// where no provider call is expected.
pub fn create_test_state() -> AppState {
    let config = create_test_config();
    let provider = GoliothClient::new(&config.provider).unwrap();
    AppState::builder()
        .store(Arc::new(InMemoryStore::new()))
        .provider(Arc::new(provider))
        .config(config)
        .build()
}

/// Full router over an in-memory store, with the provider pointed at `server`.
pub fn create_test_app(server: &MockServer, config: Config) -> (TestServer, Arc<InMemoryStore>) {
    let mut config = config;
    config.provider.base_url = Url::parse(&server.uri()).unwrap();

    let store = Arc::new(InMemoryStore::new());
    let provider = GoliothClient::new(&config.provider).unwrap();
    let state = AppState::builder()
        .store(store.clone())
        .provider(Arc::new(provider))
        .config(config)
        .build();

    let server = Application::from_state(state).unwrap().into_test_server();
    (server, store)
}

pub fn device_json(device_id: &str) -> serde_json::Value {
    json!({
        "data": {
            "id": device_id,
            "hardwareIds": [format!("hw-{device_id}")],
            "name": "brave-frog-0042",
            "createdAt": "2024-03-01T10:00:00Z",
            "updatedAt": "2024-03-01T10:00:00Z",
            "tagIds": [],
            "status": "-",
            "enabled": true
        }
    })
}

pub fn credential_json(psk: &str, created_at: &str) -> serde_json::Value {
    json!({
        "data": {
            "id": "cred-1",
            "type": "PRE_SHARED_KEY",
            "identity": "device@frogs",
            "createdAt": created_at,
            "preSharedKey": psk
        }
    })
}

/// `name=value` of the first `Set-Cookie` header, ready to send back as a `Cookie` header.
pub fn session_cookie(response: &axum_test::TestResponse) -> String {
    let set_cookie = response.header("set-cookie");
    let set_cookie = set_cookie.to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}
