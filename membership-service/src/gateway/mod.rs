//! Persistence gateway.
//!
//! The backing store is an external collaborator: it gives per-statement
//! atomicity but no multi-statement transactions, so multi-step workflows
//! compensate explicitly instead of relying on rollback. Engines depend on
//! the `Gateway` trait object; `PostgresGateway` is the production
//! implementation and `MemoryGateway` backs the tests.

mod memory;
mod postgres;

pub use memory::MemoryGateway;
pub use postgres::PostgresGateway;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AccessRequest, Group, GroupMembership, User, VerificationCode};

#[derive(Debug, Error)]
pub enum GatewayError {
    /// A uniqueness constraint rejected the write (duplicate active phone,
    /// duplicate membership, duplicate group name).
    #[error("conflict on {0}")]
    Conflict(String),

    /// The targeted record does not exist.
    #[error("record not found")]
    NotFound,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[async_trait]
pub trait Gateway: Send + Sync {
    async fn health_check(&self) -> Result<(), GatewayError>;

    // Access requests
    async fn insert_access_request(&self, request: &AccessRequest) -> Result<(), GatewayError>;
    async fn find_access_request(
        &self,
        request_id: Uuid,
    ) -> Result<Option<AccessRequest>, GatewayError>;
    async fn list_pending_requests(&self) -> Result<Vec<AccessRequest>, GatewayError>;
    async fn mark_request_approved(
        &self,
        request_id: Uuid,
        approved_utc: DateTime<Utc>,
    ) -> Result<(), GatewayError>;
    async fn mark_request_rejected(
        &self,
        request_id: Uuid,
        rejected_utc: DateTime<Utc>,
    ) -> Result<(), GatewayError>;

    // Groups
    async fn find_group_by_name(&self, name: &str) -> Result<Option<Group>, GatewayError>;
    async fn insert_group(&self, group: &Group) -> Result<(), GatewayError>;

    // Users
    async fn insert_user(&self, user: &User) -> Result<(), GatewayError>;
    async fn delete_user(&self, user_id: Uuid) -> Result<(), GatewayError>;
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, GatewayError>;
    async fn find_active_user_by_phone(&self, phone: &str) -> Result<Option<User>, GatewayError>;
    async fn update_last_login(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), GatewayError>;
    /// Set a new password digest and clear the must-change-password flag.
    async fn update_password(&self, user_id: Uuid, digest: &str) -> Result<(), GatewayError>;

    // Memberships
    async fn insert_membership(&self, membership: &GroupMembership) -> Result<(), GatewayError>;

    // Verification codes
    async fn insert_verification_code(&self, code: &VerificationCode) -> Result<(), GatewayError>;
    /// Most recently created unused, unexpired code matching email and value.
    async fn find_valid_code(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationCode>, GatewayError>;
    async fn mark_code_used(&self, code_id: Uuid) -> Result<(), GatewayError>;
    /// Number of codes created for this email at or after `since`.
    async fn count_codes_since(
        &self,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, GatewayError>;
}
