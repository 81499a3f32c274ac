//! User model - members provisioned through the approval workflow.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// User entity. Created exclusively by the approval workflow; never
/// self-registered directly.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub name: String,
    /// Login identifier; unique among active users.
    pub phone: String,
    pub email: String,
    pub sector: String,
    pub password_digest: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub must_change_password: bool,
    pub last_login_utc: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
}

impl User {
    /// Create a new active user with the approval-time defaults: not an
    /// admin, forced password rotation on first login.
    pub fn new(
        name: String,
        phone: String,
        email: String,
        sector: String,
        password_digest: String,
    ) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            name,
            phone,
            email,
            sector,
            password_digest,
            is_admin: false,
            is_active: true,
            must_change_password: true,
            last_login_utc: None,
            created_utc: Utc::now(),
        }
    }

    /// Convert to sanitized response (no credential material).
    pub fn sanitized(&self) -> UserResponse {
        UserResponse::from(self.clone())
    }
}

/// User response for API (without the password digest).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub sector: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub must_change_password: bool,
    pub last_login_utc: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            user_id: u.user_id,
            name: u.name,
            phone: u.phone,
            email: u.email,
            sector: u.sector,
            is_admin: u.is_admin,
            is_active: u.is_active,
            must_change_password: u.must_change_password,
            last_login_utc: u.last_login_utc,
            created_utc: u.created_utc,
        }
    }
}
