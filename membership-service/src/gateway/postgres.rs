//! PostgreSQL gateway implementation.
//!
//! Uses runtime-bound sqlx queries over the connection pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use uuid::Uuid;

use super::{Gateway, GatewayError};
use crate::models::{AccessRequest, Group, GroupMembership, RequestStatus, User, VerificationCode};

/// PostgreSQL-backed gateway.
#[derive(Clone)]
pub struct PostgresGateway {
    pool: PgPool,
}

impl PostgresGateway {
    /// Create a new gateway from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_sqlx(e: sqlx::Error) -> GatewayError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            GatewayError::Conflict(db.constraint().unwrap_or("unique constraint").to_string())
        }
        sqlx::Error::RowNotFound => GatewayError::NotFound,
        other => GatewayError::Backend(anyhow::Error::new(other)),
    }
}

#[async_trait]
impl Gateway for PostgresGateway {
    async fn health_check(&self) -> Result<(), GatewayError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn insert_access_request(&self, request: &AccessRequest) -> Result<(), GatewayError> {
        sqlx::query(
            r#"
            INSERT INTO access_requests
                (request_id, name, phone, email, sector, password, status_code,
                 approved_utc, rejected_utc, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(request.request_id)
        .bind(&request.name)
        .bind(&request.phone)
        .bind(&request.email)
        .bind(&request.sector)
        .bind(&request.password)
        .bind(&request.status_code)
        .bind(request.approved_utc)
        .bind(request.rejected_utc)
        .bind(request.created_utc)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn find_access_request(
        &self,
        request_id: Uuid,
    ) -> Result<Option<AccessRequest>, GatewayError> {
        sqlx::query_as::<_, AccessRequest>("SELECT * FROM access_requests WHERE request_id = $1")
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn list_pending_requests(&self) -> Result<Vec<AccessRequest>, GatewayError> {
        sqlx::query_as::<_, AccessRequest>(
            "SELECT * FROM access_requests WHERE status_code = $1 ORDER BY created_utc DESC",
        )
        .bind(RequestStatus::Pending.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn mark_request_approved(
        &self,
        request_id: Uuid,
        approved_utc: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let result = sqlx::query(
            "UPDATE access_requests SET status_code = $1, approved_utc = $2 WHERE request_id = $3",
        )
        .bind(RequestStatus::Approved.as_str())
        .bind(approved_utc)
        .bind(request_id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound);
        }
        Ok(())
    }

    async fn mark_request_rejected(
        &self,
        request_id: Uuid,
        rejected_utc: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let result = sqlx::query(
            "UPDATE access_requests SET status_code = $1, rejected_utc = $2 WHERE request_id = $3",
        )
        .bind(RequestStatus::Rejected.as_str())
        .bind(rejected_utc)
        .bind(request_id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound);
        }
        Ok(())
    }

    async fn find_group_by_name(&self, name: &str) -> Result<Option<Group>, GatewayError> {
        sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn insert_group(&self, group: &Group) -> Result<(), GatewayError> {
        sqlx::query("INSERT INTO groups (group_id, name, created_utc) VALUES ($1, $2, $3)")
            .bind(group.group_id)
            .bind(&group.name)
            .bind(group.created_utc)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> Result<(), GatewayError> {
        sqlx::query(
            r#"
            INSERT INTO users
                (user_id, name, phone, email, sector, password_digest, is_admin,
                 is_active, must_change_password, last_login_utc, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user.user_id)
        .bind(&user.name)
        .bind(&user.phone)
        .bind(&user.email)
        .bind(&user.sector)
        .bind(&user.password_digest)
        .bind(user.is_admin)
        .bind(user.is_active)
        .bind(user.must_change_password)
        .bind(user.last_login_utc)
        .bind(user.created_utc)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), GatewayError> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound);
        }
        Ok(())
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, GatewayError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn find_active_user_by_phone(&self, phone: &str) -> Result<Option<User>, GatewayError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE phone = $1 AND is_active")
            .bind(phone)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn update_last_login(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let result = sqlx::query("UPDATE users SET last_login_utc = $1 WHERE user_id = $2")
            .bind(at)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound);
        }
        Ok(())
    }

    async fn update_password(&self, user_id: Uuid, digest: &str) -> Result<(), GatewayError> {
        let result = sqlx::query(
            "UPDATE users SET password_digest = $1, must_change_password = FALSE WHERE user_id = $2",
        )
        .bind(digest)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound);
        }
        Ok(())
    }

    async fn insert_membership(&self, membership: &GroupMembership) -> Result<(), GatewayError> {
        sqlx::query(
            r#"
            INSERT INTO group_members (membership_id, group_id, user_id, role_code, joined_utc)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(membership.membership_id)
        .bind(membership.group_id)
        .bind(membership.user_id)
        .bind(&membership.role_code)
        .bind(membership.joined_utc)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn insert_verification_code(&self, code: &VerificationCode) -> Result<(), GatewayError> {
        sqlx::query(
            r#"
            INSERT INTO verification_codes (code_id, email, code, expires_utc, used, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(code.code_id)
        .bind(&code.email)
        .bind(&code.code)
        .bind(code.expires_utc)
        .bind(code.used)
        .bind(code.created_utc)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn find_valid_code(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationCode>, GatewayError> {
        sqlx::query_as::<_, VerificationCode>(
            r#"
            SELECT * FROM verification_codes
            WHERE email = $1 AND code = $2 AND used = FALSE AND expires_utc > $3
            ORDER BY created_utc DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(code)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn mark_code_used(&self, code_id: Uuid) -> Result<(), GatewayError> {
        let result = sqlx::query("UPDATE verification_codes SET used = TRUE WHERE code_id = $1")
            .bind(code_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound);
        }
        Ok(())
    }

    async fn count_codes_since(
        &self,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, GatewayError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM verification_codes WHERE email = $1 AND created_utc >= $2",
        )
        .bind(email)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(count)
    }
}
