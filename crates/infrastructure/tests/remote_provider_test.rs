//! Remote identity provider against a mocked backend.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quoteconnect_application::ports::{IdentityProvider, KeyValueStore, SessionChange};
use quoteconnect_application::{AuthController, SessionStore};
use quoteconnect_domain::{AuthError, Credentials, Role, SignupRequest};
use quoteconnect_infrastructure::{
    InMemoryKeyValueStore, RemoteIdentityProvider, SystemClock, TOKEN_KEY, TracingNotifier,
};

const ANON_KEY: &str = "anon-key";

fn session_body(access: &str, refresh: &str, id: &str, email: &str) -> serde_json::Value {
    json!({
        "access_token": access,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": refresh,
        "user": { "id": id, "email": email }
    })
}

fn vendor_profile() -> serde_json::Value {
    json!([{
        "id": "u-1",
        "role": "vendor",
        "first_name": "Vera",
        "last_name": "Vendor",
        "phone": null,
        "company": "Acme"
    }])
}

async fn provider(server: &MockServer) -> (RemoteIdentityProvider, Arc<InMemoryKeyValueStore>) {
    let storage = Arc::new(InMemoryKeyValueStore::new());
    let provider = RemoteIdentityProvider::new(&server.uri(), ANON_KEY, storage.clone()).unwrap();
    (provider, storage)
}

async fn mount_password_grant(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", ANON_KEY))
        .and(body_json(json!({"email": "vendor@example.com", "password": "password"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body(
            "access-1",
            "refresh-1",
            "u-1",
            "vendor@example.com",
        )))
        .mount(server)
        .await;
}

async fn mount_profile(server: &MockServer, bearer: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", "eq.u-1"))
        .and(query_param("select", "*"))
        .and(header("authorization", format!("Bearer {bearer}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(vendor_profile()))
        .mount(server)
        .await;
}

fn signup_request() -> SignupRequest {
    SignupRequest {
        email: "new@acme.test".to_string(),
        password: "secret1".to_string(),
        first_name: "Nia".to_string(),
        last_name: "New".to_string(),
        role: Some(Role::Customer),
        phone: Some("555-0101".to_string()),
        company: None,
    }
}

#[tokio::test]
async fn test_login_stores_tokens_and_defers_profile() {
    let server = MockServer::start().await;
    mount_password_grant(&server).await;
    let (provider, storage) = provider(&server).await;

    let session = provider
        .login(&Credentials::new("vendor@example.com", "password"))
        .await
        .unwrap();

    assert_eq!(session.account.id, "u-1");
    assert!(session.profile.is_none());
    let stored = storage.get(TOKEN_KEY).await.unwrap().expect("tokens stored");
    assert!(stored.contains("access-1"));
}

#[tokio::test]
async fn test_login_rejected_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;
    let (provider, storage) = provider(&server).await;

    let err = provider
        .login(&Credentials::new("vendor@example.com", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(err, AuthError::InvalidCredentials);
    assert!(storage.is_empty().await);
}

#[tokio::test]
async fn test_login_server_error_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;
    let (provider, _) = provider(&server).await;

    let err = provider
        .login(&Credentials::new("vendor@example.com", "password"))
        .await
        .unwrap_err();

    match err {
        AuthError::Provider(cause) => assert!(cause.contains("503"), "{cause}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_backend_hits_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(session_body("access-1", "refresh-1", "u-1", "vendor@example.com"))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;
    let (provider, storage) = provider(&server).await;
    let provider = provider
        .with_request_timeout(Duration::from_millis(50))
        .unwrap();

    let err = provider
        .login(&Credentials::new("vendor@example.com", "password"))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Provider(_)), "{err:?}");
    assert!(storage.is_empty().await);
}

#[tokio::test]
async fn test_missing_profile_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    let (provider, _) = provider(&server).await;

    let err = provider.fetch_profile("u-404").await.unwrap_err();

    assert_eq!(err, AuthError::NotFound("u-404".to_string()));
}

#[tokio::test]
async fn test_signup_writes_profile() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body(
            "access-new",
            "refresh-new",
            "u-9",
            "new@acme.test",
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/profiles"))
        .and(header("authorization", "Bearer access-new"))
        .and(body_json(json!({
            "id": "u-9",
            "role": "customer",
            "first_name": "Nia",
            "last_name": "New",
            "phone": "555-0101",
            "company": null
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    let (provider, _) = provider(&server).await;

    let identity = provider.signup(&signup_request()).await.unwrap();

    assert_eq!(identity.id, "u-9");
    assert_eq!(identity.role, Some(Role::Customer));
}

#[tokio::test]
async fn test_signup_existing_email() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "code": 422,
            "error_code": "user_already_exists",
            "msg": "User already registered"
        })))
        .mount(&server)
        .await;
    let (provider, _) = provider(&server).await;

    let err = provider.signup(&signup_request()).await.unwrap_err();

    assert_eq!(err, AuthError::EmailInUse);
}

#[tokio::test]
async fn test_signup_profile_failure_is_partial() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body(
            "access-new",
            "refresh-new",
            "u-9",
            "new@acme.test",
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "db down"})))
        .mount(&server)
        .await;
    let (provider, _) = provider(&server).await;

    let err = provider.signup(&signup_request()).await.unwrap_err();

    let AuthError::PartialSignupFailure { identity, cause } = err else {
        panic!("expected a partial signup, got {err:?}");
    };
    assert_eq!(identity.id, "u-9");
    assert_eq!(identity.role, None);
    assert!(cause.contains("db down"), "{cause}");
}

#[tokio::test]
async fn test_restore_refreshes_expired_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"msg": "JWT expired"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_json(json!({"refresh_token": "refresh-0"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body(
            "access-2",
            "refresh-2",
            "u-1",
            "vendor@example.com",
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer access-2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "u-1", "email": "vendor@example.com"})),
        )
        .mount(&server)
        .await;
    mount_profile(&server, "access-2").await;

    let (provider, storage) = provider(&server).await;
    storage
        .set(
            TOKEN_KEY,
            r#"{"access_token":"stale","refresh_token":"refresh-0"}"#,
        )
        .await
        .unwrap();

    let identity = provider.restore_session().await.unwrap().expect("restored");

    assert_eq!(identity.email, "vendor@example.com");
    assert_eq!(identity.role, Some(Role::Vendor));
    assert!(storage.get(TOKEN_KEY).await.unwrap().unwrap().contains("access-2"));
}

#[tokio::test]
async fn test_restore_without_tokens_skips_backend() {
    let server = MockServer::start().await;
    let (provider, _) = provider(&server).await;

    assert_eq!(provider.restore_session().await.unwrap(), None);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_refresh_signs_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Refresh Token Not Found"
        })))
        .mount(&server)
        .await;
    let (provider, storage) = provider(&server).await;
    storage
        .set(TOKEN_KEY, r#"{"access_token":"a","refresh_token":"gone"}"#)
        .await
        .unwrap();

    let changes = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&changes);
    let _subscription = provider.subscribe(Arc::new(move |change: &SessionChange| {
        log.lock().unwrap().push(change.clone());
    }));

    assert!(!provider.refresh_session().await.unwrap());
    assert_eq!(*changes.lock().unwrap(), vec![SessionChange::SignedOut]);
    assert!(storage.is_empty().await);
}

#[tokio::test]
async fn test_logout_clears_tokens_even_on_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer a"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    let (provider, storage) = provider(&server).await;
    storage
        .set(TOKEN_KEY, r#"{"access_token":"a","refresh_token":"r"}"#)
        .await
        .unwrap();

    let err = provider.logout().await.unwrap_err();

    assert!(matches!(err, AuthError::Provider(_)));
    assert!(storage.is_empty().await);
    provider.logout().await.unwrap();
}

#[tokio::test]
async fn test_controller_login_resolves_profile() {
    let server = MockServer::start().await;
    mount_password_grant(&server).await;
    mount_profile(&server, "access-1").await;
    let (provider, _) = provider(&server).await;

    let controller = AuthController::new(
        Arc::new(provider),
        SessionStore::new(Arc::new(SystemClock::new())),
        Arc::new(TracingNotifier),
    );
    controller.restore().await;

    let identity = controller
        .login("vendor@example.com", "password")
        .await
        .unwrap();

    assert_eq!(identity.role, Some(Role::Vendor));
    assert_eq!(identity.company.as_deref(), Some("Acme"));
    assert!(controller.session().is_authenticated());
}
