use async_trait::async_trait;
use lettre::message::{header, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use service_core::error::AppError;

use crate::config::MailConfig;

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send_verification_code(
        &self,
        to_email: &str,
        code: &str,
        ttl_minutes: i64,
    ) -> Result<(), AppError>;
}

pub struct SmtpEmailService {
    mailer: SmtpTransport,
    from_address: String,
}

impl SmtpEmailService {
    pub fn new(config: &MailConfig) -> Result<Self, AppError> {
        let credentials =
            Credentials::new(config.user.clone(), config.app_password.clone());

        let mailer = SmtpTransport::relay(&config.smtp_relay)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("SMTP relay setup failed: {}", e)))?
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.user.clone(),
        })
    }

    fn build_message(
        &self,
        to_email: &str,
        code: &str,
        ttl_minutes: i64,
    ) -> Result<Message, AppError> {
        let text_body = format!(
            "Your verification code is: {}\n\nThis code expires in {} minutes.\n\nIf you did not request this code, you can ignore this message.",
            code, ttl_minutes
        );
        let html_body = format!(
            r#"<html>
<body style="font-family: sans-serif;">
  <h2>Verification code</h2>
  <p>Use this code to finish signing in:</p>
  <p style="font-size: 28px; font-weight: bold; letter-spacing: 4px; background: #f0f0f0; padding: 12px 24px; display: inline-block;">{}</p>
  <p>This code expires in {} minutes.</p>
  <p style="color: #888;">If you did not request this code, you can ignore this message.</p>
</body>
</html>"#,
            code, ttl_minutes
        );

        Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|e| AppError::EmailError(format!("Invalid from address: {}", e)))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| AppError::EmailError(format!("Invalid to address: {}", e)))?)
            .subject("Your verification code")
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )
            .map_err(|e| AppError::EmailError(format!("Failed to build email: {}", e)))
    }
}

#[async_trait]
impl EmailProvider for SmtpEmailService {
    #[tracing::instrument(skip(self, code), fields(to = %to_email))]
    async fn send_verification_code(
        &self,
        to_email: &str,
        code: &str,
        ttl_minutes: i64,
    ) -> Result<(), AppError> {
        let message = self.build_message(to_email, code, ttl_minutes)?;
        let mailer = self.mailer.clone();

        // SmtpTransport::send is blocking.
        tokio::task::spawn_blocking(move || mailer.send(&message))
            .await
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("email task panicked: {}", e)))?
            .map_err(|e| AppError::EmailError(format!("Failed to send email: {}", e)))?;

        tracing::info!("verification code email sent");
        Ok(())
    }
}

/// Records outgoing mail instead of sending it.
#[derive(Default)]
pub struct MockEmailService {
    sent: std::sync::Mutex<Vec<(String, String)>>,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// The most recent code sent to the given address, if any.
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .ok()?
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl EmailProvider for MockEmailService {
    async fn send_verification_code(
        &self,
        to_email: &str,
        code: &str,
        _ttl_minutes: i64,
    ) -> Result<(), AppError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((to_email.to_string(), code.to_string()));
        }
        Ok(())
    }
}
