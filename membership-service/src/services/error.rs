use service_core::error::AppError;
use thiserror::Error;

use crate::gateway::GatewayError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Access request has no password")]
    MissingCredential,

    #[error("Group \"{0}\" not found. Create the group first.")]
    GroupNotFound(String),

    #[error("Access request not found")]
    RequestNotFound,

    #[error("Access request already {0}")]
    AlreadyProcessed(String),

    #[error("Could not create user: {0}")]
    UserCreationFailed(#[source] GatewayError),

    #[error("Could not add user to group: {0}")]
    MembershipCreationFailed(#[source] GatewayError),

    #[error("Could not update access request: {0}")]
    RequestUpdateFailed(#[source] GatewayError),

    #[error("Invalid phone or password")]
    InvalidCredentials,

    #[error("Invalid or expired code")]
    InvalidOrExpiredCode,

    #[error("A code was sent recently; wait before requesting another")]
    CodeResendThrottled { retry_after_seconds: u64 },

    #[error("User not found")]
    UserNotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] GatewayError),

    #[error("Email error: {0}")]
    Email(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::MissingCredential | ServiceError::Validation(_) => {
                AppError::BadRequest(anyhow::anyhow!(message))
            }
            ServiceError::GroupNotFound(_)
            | ServiceError::RequestNotFound
            | ServiceError::UserNotFound => AppError::NotFound(anyhow::anyhow!(message)),
            ServiceError::AlreadyProcessed(_) => AppError::Conflict(anyhow::anyhow!(message)),
            ServiceError::InvalidCredentials | ServiceError::InvalidOrExpiredCode => {
                AppError::AuthError(anyhow::anyhow!(message))
            }
            ServiceError::CodeResendThrottled {
                retry_after_seconds,
            } => AppError::TooManyRequests(message, Some(retry_after_seconds)),
            ServiceError::UserCreationFailed(GatewayError::Conflict(_))
            | ServiceError::Persistence(GatewayError::Conflict(_)) => {
                AppError::Conflict(anyhow::anyhow!(message))
            }
            ServiceError::UserCreationFailed(e)
            | ServiceError::MembershipCreationFailed(e)
            | ServiceError::RequestUpdateFailed(e)
            | ServiceError::Persistence(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ServiceError::Email(e) => AppError::EmailError(e),
        }
    }
}
