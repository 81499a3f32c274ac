//! Router-level smoke tests over the in-memory gateway.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use membership_service::config::{
    DatabaseConfig, Environment, MailConfig, MembershipConfig, SecurityConfig, TwoFactorConfig,
};
use membership_service::gateway::MemoryGateway;
use membership_service::services::{ApprovalService, LoginService, MockEmailService};
use membership_service::{build_router, AppState};
use tower::ServiceExt;

const ADMIN_KEY: &str = "test-admin-key";

fn test_config() -> MembershipConfig {
    MembershipConfig {
        common: service_core::config::Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
        },
        environment: Environment::Dev,
        service_name: "membership-service".to_string(),
        service_version: "0.0.0-test".to_string(),
        log_level: "info".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        mail: MailConfig {
            user: "noreply@example.com".to_string(),
            app_password: "unused".to_string(),
            smtp_relay: "smtp.example.com".to_string(),
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            admin_api_key: ADMIN_KEY.to_string(),
        },
        two_factor: TwoFactorConfig {
            code_ttl_minutes: 10,
            resend_cooldown_seconds: 60,
        },
    }
}

fn test_app() -> axum::Router {
    let gateway = Arc::new(MemoryGateway::new());
    let email = Arc::new(MockEmailService::new());
    let approval = ApprovalService::new(gateway.clone());
    let login = LoginService::new(gateway.clone(), email.clone(), 10, 60);

    let state = AppState {
        config: test_config(),
        gateway,
        email,
        approval,
        login,
    };

    build_router(state).expect("router builds")
}

#[tokio::test]
async fn health_reports_healthy() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn admin_routes_require_the_key() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/admin/access-requests")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/admin/access-requests")
                .header("x-admin-api-key", ADMIN_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn submit_then_review_over_http() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/access-requests")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "name": "Ana",
                        "phone": "+5511999990000",
                        "email": "ana@example.com",
                        "sector": "TI",
                        "password": "s3nha-forte"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status_code"], "pending");
    assert!(json.get("password").is_none());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/admin/access-requests")
                .header("x-admin-api-key", ADMIN_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn login_failure_is_unauthorized() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "phone": "+5511999990000",
                        "password": "whatever"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_body_is_unprocessable() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/access-requests")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "name": "Ana",
                        "phone": "+5511999990000",
                        "email": "not-an-email",
                        "sector": "TI",
                        "password": "s3nha-forte"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
