use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::ServiceError;
use crate::gateway::Gateway;
use crate::models::{AccessRequest, Group, GroupMembership, User};
use crate::utils::validation::{is_valid_email, is_valid_phone};
use crate::utils::{hash_password, Password};

const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Serialize, ToSchema)]
pub struct ApprovalOutcome {
    pub user_id: Uuid,
    pub group_id: Uuid,
}

/// Turns a pending access request into an active user with a group
/// membership. The steps run as a saga: if the membership insert fails the
/// freshly created user is deleted so no orphaned account can log in.
#[derive(Clone)]
pub struct ApprovalService {
    gateway: Arc<dyn Gateway>,
}

impl ApprovalService {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    pub async fn submit_request(
        &self,
        name: String,
        phone: String,
        email: String,
        sector: String,
        password: String,
    ) -> Result<AccessRequest, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::Validation("name must not be empty".into()));
        }
        if !is_valid_phone(&phone) {
            return Err(ServiceError::Validation(
                "phone must be in +<country><number> form".into(),
            ));
        }
        if !is_valid_email(&email) {
            return Err(ServiceError::Validation("email is not valid".into()));
        }
        if sector.trim().is_empty() {
            return Err(ServiceError::Validation("sector must not be empty".into()));
        }
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(ServiceError::Validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let request = AccessRequest::new(name, phone, email, sector, password);
        self.gateway.insert_access_request(&request).await?;

        tracing::info!(request_id = %request.request_id, "access request submitted");
        Ok(request)
    }

    pub async fn pending_requests(&self) -> Result<Vec<AccessRequest>, ServiceError> {
        Ok(self.gateway.list_pending_requests().await?)
    }

    pub async fn find_request(&self, request_id: Uuid) -> Result<AccessRequest, ServiceError> {
        self.gateway
            .find_access_request(request_id)
            .await?
            .ok_or(ServiceError::RequestNotFound)
    }

    #[tracing::instrument(skip(self, request), fields(request_id = %request.request_id, sector = %request.sector))]
    pub async fn approve(&self, request: &AccessRequest) -> Result<ApprovalOutcome, ServiceError> {
        if request.password.is_empty() {
            return Err(ServiceError::MissingCredential);
        }

        let group = self
            .gateway
            .find_group_by_name(&request.sector)
            .await?
            .ok_or_else(|| ServiceError::GroupNotFound(request.sector.clone()))?;

        let digest = hash_password(&Password::new(request.password.clone()));
        let user = User::new(
            request.name.clone(),
            request.phone.clone(),
            request.email.clone(),
            request.sector.clone(),
            digest.into_string(),
        );

        // Re-read right before the first write so a concurrent approval of
        // the same request cannot create a second user.
        let current = self
            .gateway
            .find_access_request(request.request_id)
            .await?
            .ok_or(ServiceError::RequestNotFound)?;
        if !current.is_pending() {
            return Err(ServiceError::AlreadyProcessed(current.status_code));
        }

        self.gateway
            .insert_user(&user)
            .await
            .map_err(ServiceError::UserCreationFailed)?;

        let membership = GroupMembership::new(group.group_id, user.user_id);
        if let Err(err) = self.gateway.insert_membership(&membership).await {
            // Compensate: remove the user so the approval leaves no
            // half-provisioned account behind.
            if let Err(delete_err) = self.gateway.delete_user(user.user_id).await {
                tracing::warn!(
                    user_id = %user.user_id,
                    error = %delete_err,
                    "compensating user delete failed after membership error"
                );
            }
            return Err(ServiceError::MembershipCreationFailed(err));
        }

        // The approval stamp is best effort. The user and membership exist,
        // so a failure here only leaves the request looking pending.
        if let Err(err) = self
            .gateway
            .mark_request_approved(request.request_id, Utc::now())
            .await
        {
            tracing::warn!(
                request_id = %request.request_id,
                error = %err,
                "could not mark access request approved"
            );
        }

        tracing::info!(user_id = %user.user_id, group_id = %group.group_id, "access request approved");
        Ok(ApprovalOutcome {
            user_id: user.user_id,
            group_id: group.group_id,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn reject(&self, request_id: Uuid) -> Result<(), ServiceError> {
        let current = self
            .gateway
            .find_access_request(request_id)
            .await?
            .ok_or(ServiceError::RequestNotFound)?;
        if !current.is_pending() {
            return Err(ServiceError::AlreadyProcessed(current.status_code));
        }

        self.gateway
            .mark_request_rejected(request_id, Utc::now())
            .await
            .map_err(ServiceError::RequestUpdateFailed)?;

        tracing::info!(%request_id, "access request rejected");
        Ok(())
    }

    pub async fn create_group(&self, name: String) -> Result<Group, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::Validation(
                "group name must not be empty".into(),
            ));
        }
        let group = Group::new(name);
        self.gateway.insert_group(&group).await?;
        tracing::info!(group_id = %group.group_id, name = %group.name, "group created");
        Ok(group)
    }
}
