//! Access request model - prospective member registrations awaiting decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Request status codes. Transitions are one-way: pending -> approved or
/// pending -> rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

/// Access request entity. Rows are never deleted; they are the audit trail
/// of every registration decision.
#[derive(Debug, Clone, FromRow)]
pub struct AccessRequest {
    pub request_id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
    /// Target group name; must resolve to an existing group at approval time.
    pub sector: String,
    /// Plaintext until approval hashes it into the user record.
    pub password: String,
    pub status_code: String,
    pub approved_utc: Option<DateTime<Utc>>,
    pub rejected_utc: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
}

impl AccessRequest {
    /// Create a new pending access request.
    pub fn new(name: String, phone: String, email: String, sector: String, password: String) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            name,
            phone,
            email,
            sector,
            password,
            status_code: RequestStatus::Pending.as_str().to_string(),
            approved_utc: None,
            rejected_utc: None,
            created_utc: Utc::now(),
        }
    }

    /// Check whether the request is still awaiting a decision.
    pub fn is_pending(&self) -> bool {
        self.status_code == RequestStatus::Pending.as_str()
    }
}

/// Access request response for API (without the submitted password).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccessRequestResponse {
    pub request_id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub sector: String,
    pub status_code: String,
    pub created_utc: DateTime<Utc>,
}

impl From<AccessRequest> for AccessRequestResponse {
    fn from(r: AccessRequest) -> Self {
        Self {
            request_id: r.request_id,
            name: r.name,
            phone: r.phone,
            email: r.email,
            sector: r.sector,
            status_code: r.status_code,
            created_utc: r.created_utc,
        }
    }
}
