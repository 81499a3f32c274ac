//! Login flow tests: credential checking, session establishment, password
//! rotation.

mod common;

use common::TestApp;
use membership_service::gateway::Gateway;
use membership_service::models::AccessRequest;
use membership_service::services::{LoginOutcome, ServiceError};
use membership_service::utils::Password;

const PHONE: &str = "+5511999990000";
const EMAIL: &str = "ana@example.com";
const PASSWORD: &str = "s3nha-forte";

/// Provision a user through the approval workflow.
async fn provision_user(app: &TestApp) {
    app.approval.create_group("TI".to_string()).await.unwrap();
    let request = app
        .approval
        .submit_request(
            "Ana".to_string(),
            PHONE.to_string(),
            EMAIL.to_string(),
            "TI".to_string(),
            PASSWORD.to_string(),
        )
        .await
        .unwrap();
    app.approval.approve(&request).await.unwrap();
}

#[tokio::test]
async fn gated_login_does_not_establish_a_session() {
    let app = TestApp::new();
    provision_user(&app).await;

    let outcome = app
        .login
        .login(PHONE, &Password::new(PASSWORD.to_string()), false)
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        LoginOutcome::TwoFactorRequired { email } if email == EMAIL
    ));

    // The login is not finished, so the login time stays unset.
    let user = app.gateway.find_active_user_by_phone(PHONE).await.unwrap().unwrap();
    assert!(user.last_login_utc.is_none());
}

#[tokio::test]
async fn wrong_password_and_unknown_phone_look_alike() {
    let app = TestApp::new();
    provision_user(&app).await;

    let wrong_password = app
        .login
        .login(PHONE, &Password::new("errada123".to_string()), false)
        .await
        .unwrap_err();
    let unknown_phone = app
        .login
        .login(
            "+5511888880000",
            &Password::new(PASSWORD.to_string()),
            false,
        )
        .await
        .unwrap_err();

    assert!(matches!(wrong_password, ServiceError::InvalidCredentials));
    assert!(matches!(unknown_phone, ServiceError::InvalidCredentials));
    assert_eq!(wrong_password.to_string(), unknown_phone.to_string());
}

#[tokio::test]
async fn skip_path_establishes_a_session_and_stamps_login_time() {
    let app = TestApp::new();
    provision_user(&app).await;

    let outcome = app
        .login
        .login(PHONE, &Password::new(PASSWORD.to_string()), true)
        .await
        .unwrap();

    match outcome {
        LoginOutcome::Authenticated {
            session,
            require_password_change,
        } => {
            assert!(session.is_active());
            assert_eq!(session.user.phone, PHONE);
            // Approval provisions users with a forced first rotation.
            assert!(require_password_change);
        }
        other => panic!("expected Authenticated, got {:?}", other),
    }

    let user = app.gateway.find_active_user_by_phone(PHONE).await.unwrap().unwrap();
    assert!(user.last_login_utc.is_some());
}

#[tokio::test]
async fn change_password_clears_the_rotation_flag() {
    let app = TestApp::new();
    provision_user(&app).await;

    let user = app.gateway.find_active_user_by_phone(PHONE).await.unwrap().unwrap();
    app.login
        .change_password(user.user_id, &Password::new("nova-s3nha".to_string()))
        .await
        .unwrap();

    // Old password no longer works, new one does, and the flag is gone.
    let err = app
        .login
        .login(PHONE, &Password::new(PASSWORD.to_string()), true)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidCredentials));

    let outcome = app
        .login
        .login(PHONE, &Password::new("nova-s3nha".to_string()), true)
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        LoginOutcome::Authenticated {
            require_password_change: false,
            ..
        }
    ));
}

#[tokio::test]
async fn change_password_enforces_minimum_length() {
    let app = TestApp::new();
    provision_user(&app).await;

    let user = app.gateway.find_active_user_by_phone(PHONE).await.unwrap().unwrap();
    let err = app
        .login
        .change_password(user.user_id, &Password::new("curta".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn inactive_users_cannot_log_in() {
    let app = TestApp::new();
    app.approval.create_group("TI".to_string()).await.unwrap();

    // Insert a deactivated user directly; the lookup only sees active ones.
    let digest = membership_service::utils::hash_password(&Password::new(PASSWORD.to_string()));
    let mut user = membership_service::models::User::new(
        "Ana".to_string(),
        PHONE.to_string(),
        EMAIL.to_string(),
        "TI".to_string(),
        digest.into_string(),
    );
    user.is_active = false;
    app.gateway.insert_user(&user).await.unwrap();

    let err = app
        .login
        .login(PHONE, &Password::new(PASSWORD.to_string()), false)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidCredentials));
}

#[tokio::test]
async fn rejected_requests_never_produce_credentials() {
    let app = TestApp::new();
    app.approval.create_group("TI".to_string()).await.unwrap();

    let request = AccessRequest::new(
        "Ana".to_string(),
        PHONE.to_string(),
        EMAIL.to_string(),
        "TI".to_string(),
        PASSWORD.to_string(),
    );
    app.gateway.insert_access_request(&request).await.unwrap();
    app.approval.reject(request.request_id).await.unwrap();

    let err = app
        .login
        .login(PHONE, &Password::new(PASSWORD.to_string()), false)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidCredentials));
}
