use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::utils::error::{AppError, Result};

/// Outbound mail capability. Transport mechanics stay behind this seam.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// SMTP transport over lettre's async client.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| AppError::Mail(format!("SMTP relay setup failed: {}", e)))?
            .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: format!("{} <{}>", config.from_name, config.from_address),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let message = Message::builder()
            .from(self
                .from
                .parse()
                .map_err(|e| AppError::Mail(format!("invalid from address: {}", e)))?)
            .to(to
                .parse()
                .map_err(|e| AppError::Mail(format!("invalid recipient '{}': {}", to, e)))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::Mail(format!("failed to build message: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Mail(format!("send to {} failed: {}", to, e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: Some("sender@example.com".to_string()),
            password: Some("app-password".to_string()),
            from_address: "sender@example.com".to_string(),
            from_name: "Price Sentry".to_string(),
        }
    }

    #[test]
    fn test_mailer_creation() {
        assert!(SmtpMailer::new(&test_config()).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_rejected() {
        let mailer = SmtpMailer::new(&test_config()).unwrap();
        let result = mailer.send("not an address", "subject", "body").await;
        assert!(matches!(result, Err(AppError::Mail(_))));
    }
}
