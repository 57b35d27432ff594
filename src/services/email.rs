//! Email service for password reset messages

use std::{str::FromStr, sync::Arc};

use lettre::{
    message::{header::ContentType, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
};

/// Something able to deliver a built message
#[cfg_attr(test, mockall::automock)]
pub trait MailTransport: Send + Sync {
    fn send(&self, message: Message) -> AppResult<()>;
}

/// SMTP delivery configured from [`EmailConfig`]
pub struct SmtpMailer {
    transport: SmtpTransport,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> AppResult<Self> {
        let builder = if config.smtp_use_tls {
            SmtpTransport::starttls_relay(&config.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&config.smtp_host)
        }
        .port(config.smtp_port);

        let builder = match (&config.smtp_username, &config.smtp_password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        Ok(Self {
            transport: builder.build(),
        })
    }
}

impl MailTransport for SmtpMailer {
    fn send(&self, message: Message) -> AppResult<()> {
        self.transport
            .send(&message)
            .map_err(|e| AppError::Mail(format!("Failed to send email: {}", e)))?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
    transport: Arc<dyn MailTransport>,
}

impl EmailService {
    pub fn new(config: EmailConfig, transport: Arc<dyn MailTransport>) -> Self {
        Self { config, transport }
    }

    /// Send the password reset link
    pub async fn send_password_reset(&self, to: &str, username: &str, link: &str) -> AppResult<()> {
        let subject = "Password reset on Book Swap";
        self.send_email(to, subject, &password_reset_body(username, link))
            .await
    }

    /// Generic email sending function
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let from_name = self.config.smtp_from_name.as_deref().unwrap_or("Book Swap");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Validation(format!("Invalid to address: {}", e)))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(format!(
                                r#"<html><body><pre>{}</pre></body></html>"#,
                                body.replace('\n', "<br>")
                            )),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        // SMTP delivery blocks
        let transport = Arc::clone(&self.transport);
        tokio::task::spawn_blocking(move || transport.send(email))
            .await
            .map_err(|e| AppError::Internal(format!("Mail task failed: {}", e)))?
    }
}

pub fn password_reset_body(username: &str, link: &str) -> String {
    format!(
        r#"
You're receiving this email because you requested a password reset for your user account at Book Swap.

Please go to the following page and choose a new password:

{link}

Your username, in case you've forgotten: {username}

If you didn't request a password reset, you can ignore this email.
"#,
        link = link,
        username = username
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(transport: MockMailTransport) -> EmailService {
        EmailService::new(EmailConfig::default(), Arc::new(transport))
    }

    #[test]
    fn test_body_contains_link_and_username() {
        let body = password_reset_body("reader", "http://localhost/reset?token=abc");
        assert!(body.contains("http://localhost/reset?token=abc"));
        assert!(body.contains("Your username, in case you've forgotten: reader"));
    }

    #[tokio::test]
    async fn test_reset_mail_is_addressed_to_user() {
        let mut transport = MockMailTransport::new();
        transport
            .expect_send()
            .withf(|message: &Message| {
                let to = message.envelope().to();
                to.len() == 1 && to[0].to_string() == "reader@example.com"
            })
            .times(1)
            .returning(|_| Ok(()));

        service(transport)
            .send_password_reset("reader@example.com", "reader", "http://localhost/reset")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let mut transport = MockMailTransport::new();
        transport
            .expect_send()
            .returning(|_| Err(AppError::Mail("relay refused".to_string())));

        let result = service(transport)
            .send_password_reset("reader@example.com", "reader", "http://localhost/reset")
            .await;
        assert!(matches!(result, Err(AppError::Mail(_))));
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_rejected_before_sending() {
        let mut transport = MockMailTransport::new();
        transport.expect_send().times(0);

        let result = service(transport)
            .send_password_reset("not an address", "reader", "http://localhost/reset")
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
