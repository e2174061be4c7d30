//! Outbound email with attachments.

use html_escape::encode_text;
use thiserror::Error;

use crate::db::{Item, User};
use crate::services::invoice::PDF_MEDIA_TYPE;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build message: {0}")]
    MessageBuild(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
    pub attachments: Vec<EmailAttachment>,
}

/// Sends a fully built message. No retries.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), DeliveryError>;
}

/// Message carrying the invoice PDF for `item` to its customer.
#[must_use]
pub fn invoice_email(
    item: &Item,
    owner: &User,
    recipient: &str,
    currency_symbol: &str,
    file_name: &str,
    pdf: Vec<u8>,
) -> OutgoingEmail {
    let greeting = item.customer_name.as_deref().unwrap_or("Customer");
    let address = item.customer_address.as_deref().unwrap_or("N/A");
    let amount = item.amount.display_with(currency_symbol);

    let html_body = format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
         <h2 style=\"color: #1f6feb;\">Invoice from {owner}</h2>\
         <p>Dear {greeting},</p>\
         <p>Please find attached your invoice for <strong>{title}</strong>.</p>\
         <table style=\"border-collapse: collapse; margin: 16px 0;\">\
         <tr><td style=\"padding: 4px 12px 4px 0;\"><strong>Item:</strong></td><td>{title}</td></tr>\
         <tr><td style=\"padding: 4px 12px 4px 0;\"><strong>Amount:</strong></td><td>{amount}</td></tr>\
         <tr><td style=\"padding: 4px 12px 4px 0;\"><strong>Status:</strong></td><td>{status}</td></tr>\
         <tr><td style=\"padding: 4px 12px 4px 0;\"><strong>Address:</strong></td><td>{address}</td></tr>\
         </table>\
         <p>Thank you for your business!</p>\
         <p>Best regards,<br>{owner}</p></div>",
        owner = encode_text(&owner.name),
        greeting = encode_text(greeting),
        title = encode_text(&item.title),
        amount = encode_text(&amount),
        status = item.status.label(),
        address = encode_text(address),
    );

    let text_body = html2text::from_read(html_body.as_bytes(), 80)
        .unwrap_or_else(|_| format!("Invoice for {}: {amount}", item.title));

    OutgoingEmail {
        to: recipient.to_string(),
        subject: format!("Invoice for {}", item.title),
        html_body,
        text_body,
        attachments: vec![EmailAttachment {
            file_name: file_name.to_string(),
            content_type: PDF_MEDIA_TYPE.to_string(),
            bytes: pdf,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BillingAddress, ItemId, ItemStatus, Money, UserId};

    fn owner() -> User {
        User {
            id: UserId::new(1),
            name: "Ada Stores".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            avatar: None,
            billing_address: BillingAddress::default(),
            is_admin_registered: false,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn item(address: Option<&str>) -> Item {
        Item {
            id: ItemId::new(9),
            user_id: UserId::new(1),
            title: "Desk & Chair".to_string(),
            description: None,
            amount: Money::from_minor_units(123_450),
            status: ItemStatus::Paid,
            image: None,
            customer_email: Some("c@x.com".to_string()),
            customer_name: Some("Jane".to_string()),
            customer_address: address.map(str::to_string),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_invoice_email_contents() {
        let email = invoice_email(
            &item(Some("5 Broad St")),
            &owner(),
            "c@x.com",
            "₦",
            "invoice-9.pdf",
            b"%PDF".to_vec(),
        );

        assert_eq!(email.to, "c@x.com");
        assert_eq!(email.subject, "Invoice for Desk & Chair");
        assert!(email.html_body.contains("Desk &amp; Chair"));
        assert!(email.html_body.contains("₦1,234.50"));
        assert!(email.html_body.contains("<td>Paid</td>"));
        assert!(email.html_body.contains("5 Broad St"));
        assert!(email.html_body.contains("Dear Jane"));
        assert!(email.text_body.contains("Desk & Chair"));
        assert_eq!(email.attachments.len(), 1);
        assert_eq!(email.attachments[0].file_name, "invoice-9.pdf");
        assert_eq!(email.attachments[0].content_type, "application/pdf");
    }

    #[test]
    fn test_missing_address_shows_placeholder() {
        let email = invoice_email(&item(None), &owner(), "c@x.com", "₦", "f.pdf", vec![1]);
        assert!(email.html_body.contains("<td>N/A</td>"));
    }
}
