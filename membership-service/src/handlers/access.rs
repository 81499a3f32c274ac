//! Public access request submission.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::ErrorResponse;
use crate::models::AccessRequestResponse;
use crate::utils::validation::ValidatedJson;
use crate::AppState;
use service_core::error::AppError;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitAccessRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 10, max = 20))]
    pub phone: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 120))]
    pub sector: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

/// Submit a request to join a group.
///
/// POST /auth/access-requests
#[utoipa::path(
    post,
    path = "/auth/access-requests",
    request_body = SubmitAccessRequest,
    responses(
        (status = 201, description = "Access request recorded", body = AccessRequestResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "access"
)]
pub async fn submit_access_request(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<SubmitAccessRequest>,
) -> Result<(StatusCode, Json<AccessRequestResponse>), AppError> {
    let request = state
        .approval
        .submit_request(body.name, body.phone, body.email, body.sector, body.password)
        .await?;

    Ok((StatusCode::CREATED, Json(AccessRequestResponse::from(request))))
}
