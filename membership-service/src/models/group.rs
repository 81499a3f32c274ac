//! Group and membership models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Membership role codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Member,
    Admin,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Member => "member",
            MemberRole::Admin => "admin",
        }
    }
}

/// Group entity. Reference data: the approval workflow looks groups up by
/// name but never creates them implicitly.
#[derive(Debug, Clone, FromRow)]
pub struct Group {
    pub group_id: Uuid,
    pub name: String,
    pub created_utc: DateTime<Utc>,
}

impl Group {
    pub fn new(name: String) -> Self {
        Self {
            group_id: Uuid::new_v4(),
            name,
            created_utc: Utc::now(),
        }
    }
}

/// Group membership entity. At most one row per (group, user) pair.
#[derive(Debug, Clone, FromRow)]
pub struct GroupMembership {
    pub membership_id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub role_code: String,
    pub joined_utc: DateTime<Utc>,
}

impl GroupMembership {
    /// Create a plain-member membership, as the approval workflow does.
    pub fn new(group_id: Uuid, user_id: Uuid) -> Self {
        Self {
            membership_id: Uuid::new_v4(),
            group_id,
            user_id,
            role_code: MemberRole::Member.as_str().to_string(),
            joined_utc: Utc::now(),
        }
    }
}

/// Group response for API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GroupResponse {
    pub group_id: Uuid,
    pub name: String,
    pub created_utc: DateTime<Utc>,
}

impl From<Group> for GroupResponse {
    fn from(g: Group) -> Self {
        Self {
            group_id: g.group_id,
            name: g.name,
            created_utc: g.created_utc,
        }
    }
}
