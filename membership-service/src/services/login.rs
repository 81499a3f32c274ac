use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;
use uuid::Uuid;

use super::email::EmailProvider;
use super::error::ServiceError;
use crate::gateway::Gateway;
use crate::models::{Session, VerificationCode};
use crate::utils::validation::is_valid_email;
use crate::utils::{hash_password, verify_password, Password};

const CODE_LENGTH: usize = 6;
const MIN_PASSWORD_LENGTH: usize = 6;

/// What the first login step produced.
#[derive(Debug)]
pub enum LoginOutcome {
    /// Credentials were correct; a code must be verified before a session
    /// is established.
    TwoFactorRequired { email: String },
    /// Credentials were correct and the second factor was skipped.
    Authenticated {
        session: Session,
        require_password_change: bool,
    },
}

#[derive(Debug)]
pub struct CodeIssued {
    pub expires_in_minutes: i64,
}

/// Phone-and-password login with an emailed one-time code as the second
/// factor.
#[derive(Clone)]
pub struct LoginService {
    gateway: Arc<dyn Gateway>,
    email: Arc<dyn EmailProvider>,
    code_ttl_minutes: i64,
    resend_cooldown_seconds: u64,
}

impl LoginService {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        email: Arc<dyn EmailProvider>,
        code_ttl_minutes: i64,
        resend_cooldown_seconds: u64,
    ) -> Self {
        Self {
            gateway,
            email,
            code_ttl_minutes,
            resend_cooldown_seconds,
        }
    }

    /// Check phone and password. Unknown phones and wrong passwords both
    /// come back as InvalidCredentials so callers cannot probe which phones
    /// exist.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(
        &self,
        phone: &str,
        password: &Password,
        skip_two_factor: bool,
    ) -> Result<LoginOutcome, ServiceError> {
        let user = self
            .gateway
            .find_active_user_by_phone(phone)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        let digest = crate::utils::PasswordDigest::new(user.password_digest.clone());
        verify_password(password, &digest).map_err(|_| ServiceError::InvalidCredentials)?;

        if !skip_two_factor {
            tracing::info!(user_id = %user.user_id, "credentials accepted, second factor required");
            return Ok(LoginOutcome::TwoFactorRequired {
                email: user.email.clone(),
            });
        }

        // Stamping the login time must not block the login itself.
        if let Err(err) = self.gateway.update_last_login(user.user_id, Utc::now()).await {
            tracing::warn!(user_id = %user.user_id, error = %err, "could not update last login");
        }

        let require_password_change = user.must_change_password;
        let session = Session::establish(&user);
        tracing::info!(user_id = %user.user_id, "session established");
        Ok(LoginOutcome::Authenticated {
            session,
            require_password_change,
        })
    }

    /// Generate and email a fresh code. Issuing a new code does not touch
    /// codes issued earlier; they stay valid until they expire or are used.
    #[tracing::instrument(skip(self))]
    pub async fn issue_code(&self, email: &str) -> Result<CodeIssued, ServiceError> {
        if !is_valid_email(email) {
            return Err(ServiceError::Validation("email is not valid".into()));
        }

        let cooldown_start = Utc::now() - Duration::seconds(self.resend_cooldown_seconds as i64);
        let recent = self.gateway.count_codes_since(email, cooldown_start).await?;
        if recent > 0 {
            return Err(ServiceError::CodeResendThrottled {
                retry_after_seconds: self.resend_cooldown_seconds,
            });
        }

        let code = generate_code(CODE_LENGTH);
        let record = VerificationCode::new(email.to_string(), code.clone(), self.code_ttl_minutes);
        self.gateway.insert_verification_code(&record).await?;

        self.email
            .send_verification_code(email, &code, self.code_ttl_minutes)
            .await
            .map_err(|e| ServiceError::Email(e.to_string()))?;

        tracing::info!("verification code issued");
        Ok(CodeIssued {
            expires_in_minutes: self.code_ttl_minutes,
        })
    }

    /// Check a submitted code and consume it. Each code can be used once;
    /// when several codes are outstanding the most recent match wins.
    #[tracing::instrument(skip(self, code))]
    pub async fn verify_code(&self, email: &str, code: &str) -> Result<(), ServiceError> {
        let matched = self
            .gateway
            .find_valid_code(email, code, Utc::now())
            .await?
            .ok_or(ServiceError::InvalidOrExpiredCode)?;

        self.gateway.mark_code_used(matched.code_id).await?;
        tracing::info!("verification code accepted");
        Ok(())
    }

    #[tracing::instrument(skip(self, new_password))]
    pub async fn change_password(
        &self,
        user_id: Uuid,
        new_password: &Password,
    ) -> Result<(), ServiceError> {
        if new_password.as_str().len() < MIN_PASSWORD_LENGTH {
            return Err(ServiceError::Validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        self.gateway
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let digest = hash_password(new_password);
        self.gateway.update_password(user_id, digest.as_str()).await?;
        tracing::info!(%user_id, "password changed");
        Ok(())
    }
}

fn generate_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10)))
        .collect()
}
