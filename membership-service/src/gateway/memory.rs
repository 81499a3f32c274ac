//! In-memory gateway for tests.
//!
//! Mirrors the constraints the real schema enforces (active-phone uniqueness,
//! one membership per group/user pair, unique group names) and offers a
//! fault-injection switch so compensation paths can be exercised.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Gateway, GatewayError};
use crate::models::{AccessRequest, Group, GroupMembership, RequestStatus, User, VerificationCode};

#[derive(Default)]
struct Store {
    requests: Vec<AccessRequest>,
    groups: Vec<Group>,
    users: Vec<User>,
    memberships: Vec<GroupMembership>,
    codes: Vec<VerificationCode>,
}

#[derive(Default)]
pub struct MemoryGateway {
    store: Mutex<Store>,
    fail_next_membership_insert: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next membership insert fail with a backend error.
    pub fn fail_next_membership_insert(&self) {
        self.fail_next_membership_insert
            .store(true, Ordering::SeqCst);
    }

    pub fn user_count(&self) -> usize {
        self.store.lock().map(|s| s.users.len()).unwrap_or(0)
    }

    pub fn membership_count(&self) -> usize {
        self.store.lock().map(|s| s.memberships.len()).unwrap_or(0)
    }

    pub fn code_count(&self) -> usize {
        self.store.lock().map(|s| s.codes.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Store>, GatewayError> {
        self.store
            .lock()
            .map_err(|e| GatewayError::Backend(anyhow::anyhow!("store mutex poisoned: {}", e)))
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn health_check(&self) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn insert_access_request(&self, request: &AccessRequest) -> Result<(), GatewayError> {
        self.lock()?.requests.push(request.clone());
        Ok(())
    }

    async fn find_access_request(
        &self,
        request_id: Uuid,
    ) -> Result<Option<AccessRequest>, GatewayError> {
        let store = self.lock()?;
        Ok(store
            .requests
            .iter()
            .find(|r| r.request_id == request_id)
            .cloned())
    }

    async fn list_pending_requests(&self) -> Result<Vec<AccessRequest>, GatewayError> {
        let store = self.lock()?;
        let mut pending: Vec<AccessRequest> = store
            .requests
            .iter()
            .filter(|r| r.is_pending())
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.created_utc.cmp(&a.created_utc));
        Ok(pending)
    }

    async fn mark_request_approved(
        &self,
        request_id: Uuid,
        approved_utc: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let mut store = self.lock()?;
        let request = store
            .requests
            .iter_mut()
            .find(|r| r.request_id == request_id)
            .ok_or(GatewayError::NotFound)?;
        request.status_code = RequestStatus::Approved.as_str().to_string();
        request.approved_utc = Some(approved_utc);
        Ok(())
    }

    async fn mark_request_rejected(
        &self,
        request_id: Uuid,
        rejected_utc: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let mut store = self.lock()?;
        let request = store
            .requests
            .iter_mut()
            .find(|r| r.request_id == request_id)
            .ok_or(GatewayError::NotFound)?;
        request.status_code = RequestStatus::Rejected.as_str().to_string();
        request.rejected_utc = Some(rejected_utc);
        Ok(())
    }

    async fn find_group_by_name(&self, name: &str) -> Result<Option<Group>, GatewayError> {
        let store = self.lock()?;
        Ok(store.groups.iter().find(|g| g.name == name).cloned())
    }

    async fn insert_group(&self, group: &Group) -> Result<(), GatewayError> {
        let mut store = self.lock()?;
        if store.groups.iter().any(|g| g.name == group.name) {
            return Err(GatewayError::Conflict("groups_name_key".to_string()));
        }
        store.groups.push(group.clone());
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> Result<(), GatewayError> {
        let mut store = self.lock()?;
        if user.is_active
            && store
                .users
                .iter()
                .any(|u| u.is_active && u.phone == user.phone)
        {
            return Err(GatewayError::Conflict("users_phone_active_uq".to_string()));
        }
        store.users.push(user.clone());
        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), GatewayError> {
        let mut store = self.lock()?;
        let before = store.users.len();
        store.users.retain(|u| u.user_id != user_id);
        if store.users.len() == before {
            return Err(GatewayError::NotFound);
        }
        store.memberships.retain(|m| m.user_id != user_id);
        Ok(())
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, GatewayError> {
        let store = self.lock()?;
        Ok(store.users.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn find_active_user_by_phone(&self, phone: &str) -> Result<Option<User>, GatewayError> {
        let store = self.lock()?;
        Ok(store
            .users
            .iter()
            .find(|u| u.is_active && u.phone == phone)
            .cloned())
    }

    async fn update_last_login(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let mut store = self.lock()?;
        let user = store
            .users
            .iter_mut()
            .find(|u| u.user_id == user_id)
            .ok_or(GatewayError::NotFound)?;
        user.last_login_utc = Some(at);
        Ok(())
    }

    async fn update_password(&self, user_id: Uuid, digest: &str) -> Result<(), GatewayError> {
        let mut store = self.lock()?;
        let user = store
            .users
            .iter_mut()
            .find(|u| u.user_id == user_id)
            .ok_or(GatewayError::NotFound)?;
        user.password_digest = digest.to_string();
        user.must_change_password = false;
        Ok(())
    }

    async fn insert_membership(&self, membership: &GroupMembership) -> Result<(), GatewayError> {
        if self.fail_next_membership_insert.swap(false, Ordering::SeqCst) {
            return Err(GatewayError::Backend(anyhow::anyhow!(
                "injected membership insert failure"
            )));
        }
        let mut store = self.lock()?;
        if store
            .memberships
            .iter()
            .any(|m| m.group_id == membership.group_id && m.user_id == membership.user_id)
        {
            return Err(GatewayError::Conflict(
                "group_members_group_id_user_id_key".to_string(),
            ));
        }
        store.memberships.push(membership.clone());
        Ok(())
    }

    async fn insert_verification_code(&self, code: &VerificationCode) -> Result<(), GatewayError> {
        self.lock()?.codes.push(code.clone());
        Ok(())
    }

    async fn find_valid_code(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationCode>, GatewayError> {
        let store = self.lock()?;
        Ok(store
            .codes
            .iter()
            .filter(|c| c.email == email && c.code == code && !c.used && c.expires_utc > now)
            .max_by_key(|c| c.created_utc)
            .cloned())
    }

    async fn mark_code_used(&self, code_id: Uuid) -> Result<(), GatewayError> {
        let mut store = self.lock()?;
        let code = store
            .codes
            .iter_mut()
            .find(|c| c.code_id == code_id)
            .ok_or(GatewayError::NotFound)?;
        code.used = true;
        Ok(())
    }

    async fn count_codes_since(
        &self,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, GatewayError> {
        let store = self.lock()?;
        Ok(store
            .codes
            .iter()
            .filter(|c| c.email == email && c.created_utc >= since)
            .count() as i64)
    }
}
