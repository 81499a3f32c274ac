pub mod access;
pub mod admin;
pub mod auth;

use serde::Serialize;
use utoipa::ToSchema;

/// Error body shape shared by every endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
