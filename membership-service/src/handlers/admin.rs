//! Admin endpoints: reviewing access requests and managing groups.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::ErrorResponse;
use crate::models::{AccessRequestResponse, GroupResponse};
use crate::services::ApprovalOutcome;
use crate::utils::validation::ValidatedJson;
use crate::AppState;
use service_core::error::AppError;

/// List access requests still awaiting a decision, newest first.
///
/// GET /admin/access-requests
#[utoipa::path(
    get,
    path = "/admin/access-requests",
    responses(
        (status = 200, description = "Pending access requests", body = [AccessRequestResponse]),
        (status = 401, description = "Missing or invalid admin key", body = ErrorResponse)
    ),
    security(("admin_api_key" = [])),
    tag = "admin"
)]
pub async fn list_pending_requests(
    State(state): State<AppState>,
) -> Result<Json<Vec<AccessRequestResponse>>, AppError> {
    let pending = state.approval.pending_requests().await?;
    Ok(Json(
        pending.into_iter().map(AccessRequestResponse::from).collect(),
    ))
}

/// Approve a pending access request, creating the user and membership.
///
/// POST /admin/access-requests/:id/approve
#[utoipa::path(
    post,
    path = "/admin/access-requests/{request_id}/approve",
    params(("request_id" = Uuid, Path, description = "Access request id")),
    responses(
        (status = 200, description = "User provisioned", body = ApprovalOutcome),
        (status = 404, description = "Request or group not found", body = ErrorResponse),
        (status = 409, description = "Request already decided", body = ErrorResponse)
    ),
    security(("admin_api_key" = [])),
    tag = "admin"
)]
pub async fn approve_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<ApprovalOutcome>, AppError> {
    let request = state.approval.find_request(request_id).await?;
    let outcome = state.approval.approve(&request).await?;
    Ok(Json(outcome))
}

/// Reject a pending access request.
///
/// POST /admin/access-requests/:id/reject
#[utoipa::path(
    post,
    path = "/admin/access-requests/{request_id}/reject",
    params(("request_id" = Uuid, Path, description = "Access request id")),
    responses(
        (status = 204, description = "Request rejected"),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 409, description = "Request already decided", body = ErrorResponse)
    ),
    security(("admin_api_key" = [])),
    tag = "admin"
)]
pub async fn reject_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.approval.reject(request_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
}

/// Create a group that access requests can target.
///
/// POST /admin/groups
#[utoipa::path(
    post,
    path = "/admin/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = GroupResponse),
        (status = 409, description = "Group name already taken", body = ErrorResponse)
    ),
    security(("admin_api_key" = [])),
    tag = "admin"
)]
pub async fn create_group(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), AppError> {
    let group = state.approval.create_group(body.name).await?;
    Ok((StatusCode::CREATED, Json(GroupResponse::from(group))))
}
