//! Verification code model - time-boxed one-time login codes.

use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// One-time verification code entity. Rows are never deleted; expiry is
/// enforced at query time and consumption flips `used` exactly once.
#[derive(Debug, Clone, FromRow)]
pub struct VerificationCode {
    pub code_id: Uuid,
    pub email: String,
    /// Six ASCII digits. String-typed: leading zeros are significant.
    pub code: String,
    pub expires_utc: DateTime<Utc>,
    pub used: bool,
    pub created_utc: DateTime<Utc>,
}

impl VerificationCode {
    /// Create a new unused code expiring `ttl_minutes` from now.
    pub fn new(email: String, code: String, ttl_minutes: i64) -> Self {
        let now = Utc::now();
        Self {
            code_id: Uuid::new_v4(),
            email,
            code,
            expires_utc: now + Duration::minutes(ttl_minutes),
            used: false,
            created_utc: now,
        }
    }

    /// Check if the code is still consumable (not used and not expired).
    pub fn is_valid(&self) -> bool {
        !self.used && self.expires_utc > Utc::now()
    }

    /// Check if the code has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_utc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_code_is_valid() {
        let code = VerificationCode::new("ana@example.com".to_string(), "042137".to_string(), 10);
        assert!(code.is_valid());
        assert!(!code.is_expired());
    }

    #[test]
    fn used_code_is_invalid() {
        let mut code =
            VerificationCode::new("ana@example.com".to_string(), "042137".to_string(), 10);
        code.used = true;
        assert!(!code.is_valid());
    }

    #[test]
    fn expired_code_is_invalid() {
        let mut code =
            VerificationCode::new("ana@example.com".to_string(), "042137".to_string(), 10);
        code.expires_utc = Utc::now() - Duration::minutes(1);
        assert!(!code.is_valid());
        assert!(code.is_expired());
    }

    #[test]
    fn leading_zeros_survive() {
        let code = VerificationCode::new("ana@example.com".to_string(), "001234".to_string(), 10);
        assert_eq!(code.code, "001234");
    }
}
