//! SMTP delivery through lettre.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Attachment, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::time::Duration;
use tracing::info;

use crate::config::SmtpConfig;
use crate::services::delivery::{DeliveryError, Mailer, OutgoingEmail};

#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// Builds a STARTTLS transport. No connection is made until the first send.
    ///
    /// # Errors
    ///
    /// Returns error if the relay host cannot be used for TLS.
    pub fn new(config: &SmtpConfig, from_address: &str) -> Result<Self, DeliveryError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| DeliveryError::Transport(e.to_string()))?
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_seconds)));

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from_address: from_address.to_string(),
        })
    }

    fn build_message(&self, email: OutgoingEmail) -> Result<Message, DeliveryError> {
        let from = self
            .from_address
            .parse()
            .map_err(|_| DeliveryError::InvalidAddress(self.from_address.clone()))?;
        let to = email
            .to
            .parse()
            .map_err(|_| DeliveryError::InvalidAddress(email.to.clone()))?;

        let mut body = MultiPart::mixed().multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(email.text_body),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(email.html_body),
                ),
        );

        for attachment in email.attachments {
            let content_type = ContentType::parse(&attachment.content_type)
                .map_err(|e| DeliveryError::MessageBuild(e.to_string()))?;
            body = body.singlepart(
                Attachment::new(attachment.file_name).body(attachment.bytes, content_type),
            );
        }

        Message::builder()
            .from(from)
            .to(to)
            .subject(email.subject)
            .multipart(body)
            .map_err(|e| DeliveryError::MessageBuild(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), DeliveryError> {
        let to = email.to.clone();
        let message = self.build_message(email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        info!(to = %to, "Email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::delivery::EmailAttachment;

    fn mailer() -> SmtpMailer {
        SmtpMailer::new(&SmtpConfig::default(), "billing@marketbook.test").unwrap()
    }

    fn email(to: &str) -> OutgoingEmail {
        OutgoingEmail {
            to: to.to_string(),
            subject: "Invoice for Chair".to_string(),
            html_body: "<p>Hi</p>".to_string(),
            text_body: "Hi".to_string(),
            attachments: vec![EmailAttachment {
                file_name: "invoice-1.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                bytes: b"%PDF-1.4".to_vec(),
            }],
        }
    }

    #[tokio::test]
    async fn test_builds_message_with_attachment() {
        let message = mailer().build_message(email("c@x.com")).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Subject: Invoice for Chair"));
        assert!(raw.contains("filename=\"invoice-1.pdf\""));
        assert!(raw.contains("application/pdf"));
    }

    #[tokio::test]
    async fn test_rejects_bad_recipient() {
        let err = mailer().build_message(email("not an address")).unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidAddress(_)));
    }
}
