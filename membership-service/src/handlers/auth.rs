//! Login and two-factor code endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::ErrorResponse;
use crate::models::Session;
use crate::services::LoginOutcome;
use crate::utils::validation::ValidatedJson;
use crate::utils::Password;
use crate::AppState;
use service_core::error::AppError;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 10, max = 20))]
    pub phone: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
    /// When true the emailed code step is skipped. Used to finalize a login
    /// after a code was verified, or by trusted clients.
    #[serde(default)]
    pub skip_two_factor: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub require_two_factor: bool,
    /// Where the verification code was addressed, present when a second
    /// factor is required.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_password_change: Option<bool>,
}

/// First login step: check phone and password.
///
/// POST /auth/login
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = LoginResponse),
        (status = 401, description = "Invalid phone or password", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let outcome = state
        .login
        .login(&body.phone, &Password::new(body.password), body.skip_two_factor)
        .await?;

    let response = match outcome {
        LoginOutcome::TwoFactorRequired { email } => LoginResponse {
            require_two_factor: true,
            email: Some(email),
            session: None,
            require_password_change: None,
        },
        LoginOutcome::Authenticated {
            session,
            require_password_change,
        } => LoginResponse {
            require_two_factor: false,
            email: None,
            session: Some(session),
            require_password_change: Some(require_password_change),
        },
    };

    Ok(Json(response))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SendCodeRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SendCodeResponse {
    pub expires_in_minutes: i64,
}

/// Email a fresh verification code.
///
/// POST /auth/otp/send
#[utoipa::path(
    post,
    path = "/auth/otp/send",
    request_body = SendCodeRequest,
    responses(
        (status = 200, description = "Code sent", body = SendCodeResponse),
        (status = 429, description = "A code was sent too recently", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn send_code(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<SendCodeRequest>,
) -> Result<Json<SendCodeResponse>, AppError> {
    let issued = state.login.issue_code(&body.email).await?;
    Ok(Json(SendCodeResponse {
        expires_in_minutes: issued.expires_in_minutes,
    }))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyCodeRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(equal = 6))]
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyCodeResponse {
    pub verified: bool,
}

/// Check and consume a verification code. On success the client finalizes
/// the login by calling /auth/login with skip_two_factor set.
///
/// POST /auth/otp/verify
#[utoipa::path(
    post,
    path = "/auth/otp/verify",
    request_body = VerifyCodeRequest,
    responses(
        (status = 200, description = "Code accepted", body = VerifyCodeResponse),
        (status = 401, description = "Invalid or expired code", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn verify_code(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<VerifyCodeRequest>,
) -> Result<Json<VerifyCodeResponse>, AppError> {
    state.login.verify_code(&body.email, &body.code).await?;
    Ok(Json(VerifyCodeResponse { verified: true }))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    pub user_id: Uuid,
    #[validate(length(min = 6, max = 128))]
    pub new_password: String,
}

/// Replace a user's password and clear the forced-rotation flag.
///
/// POST /auth/password/change
#[utoipa::path(
    post,
    path = "/auth/password/change",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn change_password(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    state
        .login
        .change_password(body.user_id, &Password::new(body.new_password))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
