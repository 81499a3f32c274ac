//! Authenticated session object.
//!
//! The session is an explicit value handed to the caller after a completed
//! two-factor login, not ambient global state. Lifecycle: established ->
//! terminated.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{User, UserResponse};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Session {
    pub user: UserResponse,
    pub established_utc: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminated_utc: Option<DateTime<Utc>>,
}

impl Session {
    /// Establish a session for an authenticated user.
    pub fn establish(user: &User) -> Self {
        Self {
            user: user.sanitized(),
            established_utc: Utc::now(),
            terminated_utc: None,
        }
    }

    /// Check whether the session is still live.
    pub fn is_active(&self) -> bool {
        self.terminated_utc.is_none()
    }

    /// Terminate the session. Idempotent: the first termination time wins.
    pub fn terminate(&mut self) {
        if self.terminated_utc.is_none() {
            self.terminated_utc = Some(Utc::now());
        }
    }
}
