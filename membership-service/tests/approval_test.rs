//! Approval workflow tests: provisioning, compensation, decision guards.

mod common;

use common::TestApp;
use membership_service::gateway::{Gateway, GatewayError};
use membership_service::models::{AccessRequest, RequestStatus};
use membership_service::services::{LoginOutcome, ServiceError};
use membership_service::utils::Password;

async fn submit(app: &TestApp, name: &str, phone: &str, email: &str, sector: &str) -> AccessRequest {
    app.approval
        .submit_request(
            name.to_string(),
            phone.to_string(),
            email.to_string(),
            sector.to_string(),
            "s3nha-forte".to_string(),
        )
        .await
        .expect("submit should succeed")
}

#[tokio::test]
async fn approve_provisions_user_and_membership() {
    let app = TestApp::new();
    let group = app.approval.create_group("TI".to_string()).await.unwrap();

    let request = submit(&app, "Ana", "+5511999990000", "ana@example.com", "TI").await;
    let outcome = app.approval.approve(&request).await.unwrap();

    assert_eq!(outcome.group_id, group.group_id);
    assert_eq!(app.gateway.user_count(), 1);
    assert_eq!(app.gateway.membership_count(), 1);

    let stored = app
        .approval
        .find_request(request.request_id)
        .await
        .unwrap();
    assert_eq!(stored.status_code, RequestStatus::Approved.as_str());
    assert!(stored.approved_utc.is_some());

    // The new user can start a login; the second factor is still required.
    let outcome = app
        .login
        .login(
            "+5511999990000",
            &Password::new("s3nha-forte".to_string()),
            false,
        )
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        LoginOutcome::TwoFactorRequired { email } if email == "ana@example.com"
    ));
}

#[tokio::test]
async fn approve_fails_when_group_is_missing() {
    let app = TestApp::new();
    let request = submit(&app, "Ana", "+5511999990000", "ana@example.com", "RH").await;

    let err = app.approval.approve(&request).await.unwrap_err();
    assert!(matches!(err, ServiceError::GroupNotFound(sector) if sector == "RH"));
    assert_eq!(app.gateway.user_count(), 0);

    let stored = app
        .approval
        .find_request(request.request_id)
        .await
        .unwrap();
    assert!(stored.is_pending());
}

#[tokio::test]
async fn membership_failure_rolls_back_the_user() {
    let app = TestApp::new();
    app.approval.create_group("TI".to_string()).await.unwrap();
    let request = submit(&app, "Ana", "+5511999990000", "ana@example.com", "TI").await;

    app.gateway.fail_next_membership_insert();
    let err = app.approval.approve(&request).await.unwrap_err();
    assert!(matches!(err, ServiceError::MembershipCreationFailed(_)));

    // Compensation removed the half-provisioned user.
    assert_eq!(app.gateway.user_count(), 0);
    assert_eq!(app.gateway.membership_count(), 0);

    let stored = app
        .approval
        .find_request(request.request_id)
        .await
        .unwrap();
    assert!(stored.is_pending());

    // A retry after the transient failure succeeds.
    app.approval.approve(&request).await.unwrap();
    assert_eq!(app.gateway.user_count(), 1);
    assert_eq!(app.gateway.membership_count(), 1);
}

#[tokio::test]
async fn approving_twice_is_rejected() {
    let app = TestApp::new();
    app.approval.create_group("TI".to_string()).await.unwrap();
    let request = submit(&app, "Ana", "+5511999990000", "ana@example.com", "TI").await;

    app.approval.approve(&request).await.unwrap();
    let err = app.approval.approve(&request).await.unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyProcessed(status) if status == "approved"));
    assert_eq!(app.gateway.user_count(), 1);
}

#[tokio::test]
async fn reject_only_touches_the_request() {
    let app = TestApp::new();
    let request = submit(&app, "Ana", "+5511999990000", "ana@example.com", "TI").await;

    app.approval.reject(request.request_id).await.unwrap();

    let stored = app
        .approval
        .find_request(request.request_id)
        .await
        .unwrap();
    assert_eq!(stored.status_code, RequestStatus::Rejected.as_str());
    assert!(stored.rejected_utc.is_some());
    assert_eq!(app.gateway.user_count(), 0);
    assert_eq!(app.gateway.membership_count(), 0);

    // A rejected request cannot be approved afterwards.
    let err = app.approval.approve(&request).await.unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyProcessed(status) if status == "rejected"));
}

#[tokio::test]
async fn approve_requires_a_password() {
    let app = TestApp::new();
    app.approval.create_group("TI".to_string()).await.unwrap();

    let request = AccessRequest::new(
        "Ana".to_string(),
        "+5511999990000".to_string(),
        "ana@example.com".to_string(),
        "TI".to_string(),
        String::new(),
    );
    app.gateway.insert_access_request(&request).await.unwrap();

    let err = app.approval.approve(&request).await.unwrap_err();
    assert!(matches!(err, ServiceError::MissingCredential));
    assert_eq!(app.gateway.user_count(), 0);
}

#[tokio::test]
async fn duplicate_active_phone_is_a_conflict() {
    let app = TestApp::new();
    app.approval.create_group("TI".to_string()).await.unwrap();

    let first = submit(&app, "Ana", "+5511999990000", "ana@example.com", "TI").await;
    let second = submit(&app, "Bia", "+5511999990000", "bia@example.com", "TI").await;

    app.approval.approve(&first).await.unwrap();
    let err = app.approval.approve(&second).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::UserCreationFailed(GatewayError::Conflict(_))
    ));
    assert_eq!(app.gateway.user_count(), 1);
}

#[tokio::test]
async fn pending_list_excludes_decided_requests() {
    let app = TestApp::new();
    app.approval.create_group("TI".to_string()).await.unwrap();

    let first = submit(&app, "Ana", "+5511999990000", "ana@example.com", "TI").await;
    let second = submit(&app, "Bia", "+5511999990001", "bia@example.com", "TI").await;
    app.approval.approve(&first).await.unwrap();

    let pending = app.approval.pending_requests().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].request_id, second.request_id);
}

#[tokio::test]
async fn submit_validates_input() {
    let app = TestApp::new();

    let err = app
        .approval
        .submit_request(
            "Ana".to_string(),
            "11999990000".to_string(),
            "ana@example.com".to_string(),
            "TI".to_string(),
            "s3nha-forte".to_string(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let err = app
        .approval
        .submit_request(
            "Ana".to_string(),
            "+5511999990000".to_string(),
            "ana@example.com".to_string(),
            "TI".to_string(),
            "curta".to_string(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}
