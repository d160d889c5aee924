//! Login, registration, logout and password-reset flows against a mock API

use clinic_core::Role;
use clinic_frontend_common::auth::TokenStore;
use clinic_frontend_common::validation::{Field, LoginForm, RegisterForm};
use clinic_frontend_common::{
    AuthApiService, AuthFlows, FlowError, NotificationLevel, SessionStore,
};
use clinic_http::PublicClinicClient;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    server: MockServer,
    tokens: Arc<TokenStore>,
    session: SessionStore,
    flows: AuthFlows,
}

async fn harness() -> Harness {
    let server = MockServer::start().await;
    let api = AuthApiService::new(PublicClinicClient::new(server.uri()).unwrap());
    let tokens = Arc::new(TokenStore::in_memory());
    let session = SessionStore::new();
    let flows = AuthFlows::new(api, tokens.clone(), session.clone());
    Harness {
        server,
        tokens,
        session,
        flows,
    }
}

fn login_form(remember_me: bool) -> LoginForm {
    LoginForm {
        email: "dr.lee@clinic.test".into(),
        password: "correct-horse".into(),
        remember_me,
    }
}

fn grant_body(role: &str) -> serde_json::Value {
    json!({
        "user": {"id": 11, "email": "dr.lee@clinic.test", "role": role, "name": "Dr Lee"},
        "tokens": {"accessToken": "acc", "refreshToken": "ref", "expiresIn": 3600}
    })
}

#[tokio::test]
async fn test_login_normalizes_role_and_authenticates() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({
            "email": "dr.lee@clinic.test",
            "password": "correct-horse"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant_body("Admin")))
        .expect(1)
        .mount(&h.server)
        .await;

    let user = h.flows.login(&login_form(false)).await.unwrap();

    assert_eq!(user.role, Role::Admin);
    assert_eq!(user.display_name, "Dr Lee");
    let state = h.session.snapshot();
    assert!(state.is_authenticated);
    assert!(state.error.is_none());
    assert_eq!(state.tokens.map(|pair| pair.access_token).as_deref(), Some("acc"));
    assert!(h.tokens.has_valid_auth());
    assert!(!h.tokens.is_persistent());
}

#[tokio::test]
async fn test_remember_me_persists_tokens() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant_body("user")))
        .expect(1)
        .mount(&h.server)
        .await;

    h.flows.login(&login_form(true)).await.unwrap();

    assert!(h.tokens.is_persistent());
    assert_eq!(h.tokens.refresh_token().as_deref(), Some("ref"));
}

#[tokio::test]
async fn test_invalid_form_makes_no_request() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant_body("user")))
        .expect(0)
        .mount(&h.server)
        .await;

    let err = h
        .flows
        .login(&LoginForm {
            email: "nope".into(),
            password: String::new(),
            remember_me: false,
        })
        .await
        .unwrap_err();

    let fields = err.field_errors().expect("validation error");
    assert!(fields.get(Field::Email).is_some());
    assert!(fields.get(Field::Password).is_some());
    assert!(!h.session.is_authenticated());
}

#[tokio::test]
async fn test_bad_credentials_set_friendly_error() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("no such user"))
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h.flows.login(&login_form(false)).await.unwrap_err();

    assert_eq!(err, FlowError::Rejected("Invalid email or password.".into()));
    assert_eq!(
        h.session.snapshot().error.as_deref(),
        Some("Invalid email or password.")
    );
    assert!(h.tokens.access_token().is_none());
}

#[tokio::test]
async fn test_server_failure_is_generic() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h.flows.login(&login_form(false)).await.unwrap_err();

    assert_eq!(err, FlowError::Unavailable);
    assert_eq!(err.notification().level, NotificationLevel::Error);
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key"))
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h.flows.register(&pat_form()).await.unwrap_err();

    assert_eq!(
        err,
        FlowError::Rejected("An account with this email already exists.".into())
    );
}

fn pat_form() -> RegisterForm {
    RegisterForm {
        name: "Pat Doe".into(),
        email: "pat@clinic.test".into(),
        password: "long-enough".into(),
        confirm_password: "long-enough".into(),
        remember_me: false,
    }
}

#[tokio::test]
async fn test_json_rejection_shows_server_message() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": "Password too weak"})),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h.flows.register(&pat_form()).await.unwrap_err();

    assert_eq!(err, FlowError::Rejected("Password too weak".into()));
    assert_eq!(
        h.session.snapshot().error.as_deref(),
        Some("Password too weak")
    );
}

#[tokio::test]
async fn test_unrecognized_json_rejection_is_generic() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"errors": [{"field": "password"}]})),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h.flows.register(&pat_form()).await.unwrap_err();

    assert_eq!(
        err,
        FlowError::Rejected("Something went wrong. Please try again later.".into())
    );
}

#[tokio::test]
async fn test_register_signs_in_with_flat_tokens() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .and(body_json(json!({
            "name": "Pat Doe",
            "email": "pat@clinic.test",
            "password": "long-enough"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "user": {"id": "p-1", "email": "pat@clinic.test"},
            "accessToken": "acc-flat",
            "refreshToken": "ref-flat"
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let user = h
        .flows
        .register(&RegisterForm {
            name: " Pat Doe ".into(),
            email: "pat@clinic.test".into(),
            password: "long-enough".into(),
            confirm_password: "long-enough".into(),
            remember_me: true,
        })
        .await
        .unwrap();

    assert_eq!(user.role, Role::User);
    assert!(h.session.is_authenticated());
    assert_eq!(h.tokens.access_token().as_deref(), Some("acc-flat"));
    // No lifetime in the grant: treated as expired on the next restore.
    assert!(h.tokens.expires_at().is_none());
}

#[tokio::test]
async fn test_logout_clears_even_when_server_fails() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant_body("user")))
        .mount(&h.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header("authorization", "Bearer acc"))
        .and(body_json(json!({"refreshToken": "ref"})))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&h.server)
        .await;

    h.flows.login(&login_form(true)).await.unwrap();
    let notice = h.flows.logout().await;

    assert_eq!(notice.level, NotificationLevel::Info);
    assert!(!h.session.is_authenticated());
    assert!(h.session.snapshot().tokens.is_none());
    assert!(h.tokens.access_token().is_none());
    assert!(h.tokens.refresh_token().is_none());
}

#[tokio::test]
async fn test_logout_without_session_skips_server() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&h.server)
        .await;

    h.flows.logout().await;
    assert!(!h.session.is_loading());
}

#[tokio::test]
async fn test_forgot_password_uses_server_message() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/auth/forgot-password"))
        .and(body_json(json!({"email": "pat@clinic.test"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "Check your inbox"})),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let notice = h.flows.forgot_password("pat@clinic.test").await.unwrap();
    assert_eq!(notice.level, NotificationLevel::Success);
    assert_eq!(notice.message, "Check your inbox");
}

#[tokio::test]
async fn test_forgot_password_unknown_email() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/auth/forgot-password"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h
        .flows
        .forgot_password("ghost@clinic.test")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        FlowError::Rejected("No account is registered with this email.".into())
    );
}
