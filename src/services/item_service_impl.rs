//! `SeaORM` implementation of the `ItemService` trait.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::db::{Item, ItemFields, ItemPatch, Store, User};
use crate::domain::{AuditAction, ItemId, Money, MoneyError, RequestContext, UserId};
use crate::services::clock::Clock;
use crate::services::delivery::{Mailer, invoice_email};
use crate::services::invoice::{
    InvoiceDocument, InvoiceRenderer, InvoiceSettings, PDF_MEDIA_TYPE, RenderError, pdf_data_uri,
};
use crate::services::item_service::{
    DeleteOrigin, EmailReceipt, InvoicePayload, ItemError, ItemInput, ItemService, ItemView,
};
use crate::services::provenance::{ProvenanceEvent, ProvenanceLog};
use crate::services::validation::{is_valid_email, non_blank, normalize_email};

pub struct SeaOrmItemService {
    store: Store,
    provenance: ProvenanceLog,
    renderer: Arc<dyn InvoiceRenderer>,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    settings: InvoiceSettings,
}

impl SeaOrmItemService {
    #[must_use]
    pub fn new(
        store: Store,
        renderer: Arc<dyn InvoiceRenderer>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        settings: InvoiceSettings,
    ) -> Self {
        Self {
            provenance: ProvenanceLog::new(store.clone()),
            store,
            renderer,
            mailer,
            clock,
            settings,
        }
    }

    async fn owner(&self, user_id: UserId) -> Result<User, ItemError> {
        self.store
            .user_repo()
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| ItemError::Internal(format!("Owner {user_id} no longer exists")))
    }

    /// The caller's item joined with the caller's profile.
    async fn load(&self, ctx: &RequestContext, id: ItemId) -> Result<(Item, User), ItemError> {
        let item = self
            .store
            .item_repo()
            .get_for_user(id, ctx.user_id)
            .await?
            .ok_or(ItemError::NotFound)?;
        let owner = self.owner(ctx.user_id).await?;
        Ok((item, owner))
    }

    async fn render(&self, document: &InvoiceDocument) -> Result<Vec<u8>, ItemError> {
        let backend = self.renderer.name();
        let start = Instant::now();

        let result = match self.renderer.render(document).await {
            Ok(pdf) if pdf.is_empty() => Err(RenderError::EmptyOutput),
            other => other,
        };

        match result {
            Ok(pdf) => {
                metrics::histogram!("invoice_render_duration_seconds", "backend" => backend)
                    .record(start.elapsed().as_secs_f64());
                Ok(pdf)
            }
            Err(e) => {
                metrics::counter!("invoice_render_failures_total", "backend" => backend)
                    .increment(1);
                warn!(
                    backend,
                    invoice = %document.invoice_number,
                    error = %e,
                    "Invoice rendering failed"
                );
                Err(e.into())
            }
        }
    }
}

fn required_title(title: Option<String>) -> Result<String, ItemError> {
    non_blank(title).ok_or_else(|| ItemError::Validation("Title is required".to_string()))
}

fn required_amount(amount: Option<Decimal>) -> Result<Money, ItemError> {
    let amount =
        amount.ok_or_else(|| ItemError::Validation("Amount is required".to_string()))?;

    Money::try_from_decimal(amount).map_err(|e| match e {
        MoneyError::Negative => ItemError::Validation("Amount must be non-negative".to_string()),
        MoneyError::Overflow => ItemError::Validation("Amount is too large".to_string()),
    })
}

fn customer_email(email: Option<String>) -> Result<Option<String>, ItemError> {
    match non_blank(email) {
        None => Ok(None),
        Some(email) => {
            let email = normalize_email(&email);
            if is_valid_email(&email) {
                Ok(Some(email))
            } else {
                Err(ItemError::Validation(
                    "Customer email is not a valid email address".to_string(),
                ))
            }
        }
    }
}

/// `None` keeps the stored value; a blank string clears it.
fn replacement(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| non_blank(Some(v)))
}

#[async_trait]
impl ItemService for SeaOrmItemService {
    async fn list(&self, ctx: &RequestContext) -> Result<Vec<ItemView>, ItemError> {
        let owner = self.owner(ctx.user_id).await?;
        let items = self.store.item_repo().list_for_user(ctx.user_id).await?;

        Ok(items
            .into_iter()
            .map(|item| ItemView::new(item, &owner))
            .collect())
    }

    async fn get(&self, ctx: &RequestContext, id: ItemId) -> Result<ItemView, ItemError> {
        let (item, owner) = self.load(ctx, id).await?;
        Ok(ItemView::new(item, &owner))
    }

    #[instrument(skip(self, ctx, input), fields(user_id = %ctx.user_id))]
    async fn create(&self, ctx: &RequestContext, input: ItemInput) -> Result<ItemView, ItemError> {
        let fields = ItemFields {
            title: required_title(input.title)?,
            amount: required_amount(input.amount)?,
            description: non_blank(input.description),
            status: input.status.unwrap_or_default(),
            image: non_blank(input.image),
            customer_email: customer_email(input.customer_email)?,
            customer_name: non_blank(input.customer_name),
            customer_address: non_blank(input.customer_address),
        };

        let owner = self.owner(ctx.user_id).await?;
        let item = self.store.item_repo().insert(ctx.user_id, fields).await?;

        info!(item_id = %item.id, "Item created");

        self.provenance
            .record(
                ctx.user_id,
                &ctx.client,
                ProvenanceEvent::new(
                    AuditAction::ItemCreated,
                    format!("Created item: {}", item.title),
                )
                .message(format!("Item \"{}\" created successfully", item.title))
                .item(item.id),
            )
            .await;

        Ok(ItemView::new(item, &owner))
    }

    #[instrument(skip(self, ctx, input), fields(user_id = %ctx.user_id, item_id = %id))]
    async fn update(
        &self,
        ctx: &RequestContext,
        id: ItemId,
        input: ItemInput,
    ) -> Result<ItemView, ItemError> {
        let (current, owner) = self.load(ctx, id).await?;

        let customer_email = match input.customer_email {
            Some(email) => Some(customer_email(Some(email))?),
            None => None,
        };

        let patch = ItemPatch {
            title: required_title(input.title)?,
            amount: required_amount(input.amount)?,
            status: input.status,
            description: replacement(input.description),
            image: replacement(input.image),
            customer_email,
            customer_name: replacement(input.customer_name),
            customer_address: replacement(input.customer_address),
        };

        let item = self
            .store
            .item_repo()
            .update_for_user(current, patch)
            .await?
            .ok_or(ItemError::NotFound)?;

        info!("Item updated");

        self.provenance
            .record(
                ctx.user_id,
                &ctx.client,
                ProvenanceEvent::new(
                    AuditAction::ItemUpdated,
                    format!("Updated item: {}", item.title),
                )
                .message(format!("Item \"{}\" updated successfully", item.title))
                .item(item.id),
            )
            .await;

        Ok(ItemView::new(item, &owner))
    }

    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id, item_id = %id))]
    async fn delete(
        &self,
        ctx: &RequestContext,
        id: ItemId,
        origin: DeleteOrigin,
    ) -> Result<(), ItemError> {
        let repo = self.store.item_repo();

        let item = repo
            .get_for_user(id, ctx.user_id)
            .await?
            .ok_or(ItemError::NotFound)?;

        if !repo.delete_for_user(id, ctx.user_id).await? {
            return Err(ItemError::NotFound);
        }

        info!(?origin, "Item deleted");

        let customer = item.customer_name.as_deref().unwrap_or("N/A");
        let (action, message) = match origin {
            DeleteOrigin::Owner => (
                AuditAction::ItemDeleted,
                format!("Item \"{}\" was deleted", item.title),
            ),
            DeleteOrigin::Admin => (
                AuditAction::AdminItemDeleted,
                format!("Item \"{}\" was deleted by admin", item.title),
            ),
        };

        self.provenance
            .record(
                ctx.user_id,
                &ctx.client,
                ProvenanceEvent::new(
                    action,
                    format!("Deleted item: {} (customer: {customer})", item.title),
                )
                .message(message)
                .item(item.id),
            )
            .await;

        Ok(())
    }

    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id, item_id = %id))]
    async fn generate_invoice(
        &self,
        ctx: &RequestContext,
        id: ItemId,
    ) -> Result<InvoicePayload, ItemError> {
        let (item, owner) = self.load(ctx, id).await?;

        let document = InvoiceDocument::build(&item, &owner, &self.settings, self.clock.now());
        let pdf = self.render(&document).await?;

        metrics::counter!("invoices_generated_total").increment(1);
        info!(invoice = %document.invoice_number, bytes = pdf.len(), "Invoice generated");

        self.provenance
            .record(
                ctx.user_id,
                &ctx.client,
                ProvenanceEvent::new(
                    AuditAction::InvoiceGenerated,
                    format!("Generated invoice for: {}", item.title),
                )
                .message(format!("Invoice generated for \"{}\"", item.title))
                .item(item.id),
            )
            .await;

        Ok(InvoicePayload {
            invoice_number: document.invoice_number,
            file_name: document.file_name,
            media_type: PDF_MEDIA_TYPE.to_string(),
            pdf: pdf_data_uri(&pdf),
        })
    }

    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id, item_id = %id))]
    async fn send_invoice_email(
        &self,
        ctx: &RequestContext,
        id: ItemId,
    ) -> Result<EmailReceipt, ItemError> {
        let (item, owner) = self.load(ctx, id).await?;

        let Some(recipient) = item.customer_email.clone() else {
            return Err(ItemError::Validation(
                "Customer email is required to send an invoice".to_string(),
            ));
        };

        let document = InvoiceDocument::build(&item, &owner, &self.settings, self.clock.now());
        let pdf = self.render(&document).await?;

        let email = invoice_email(
            &item,
            &owner,
            &recipient,
            &self.settings.currency_symbol,
            &document.file_name,
            pdf,
        );
        let subject = email.subject.clone();

        if let Err(e) = self.mailer.send(email).await {
            metrics::counter!("invoice_delivery_failures_total").increment(1);
            warn!(error = %e, "Invoice email delivery failed");
            return Err(e.into());
        }

        metrics::counter!("invoice_emails_sent_total").increment(1);
        info!(to = %recipient, "Invoice email sent");

        self.provenance
            .record(
                ctx.user_id,
                &ctx.client,
                ProvenanceEvent::new(
                    AuditAction::EmailSent,
                    format!("Sent invoice email to: {recipient}"),
                )
                .message(format!("Invoice for \"{}\" sent to {recipient}", item.title))
                .item(item.id),
            )
            .await;

        Ok(EmailReceipt {
            sent_to: recipient,
            subject,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_required_amount() {
        assert!(matches!(required_amount(None), Err(ItemError::Validation(_))));
        assert!(matches!(
            required_amount(Some(Decimal::from_str("-1").unwrap())),
            Err(ItemError::Validation(_))
        ));
        assert_eq!(
            required_amount(Some(Decimal::from_str("99.99").unwrap())).unwrap(),
            Money::from_minor_units(9_999)
        );
        assert_eq!(
            required_amount(Some(Decimal::ZERO)).unwrap(),
            Money::ZERO
        );
    }

    #[test]
    fn test_required_title() {
        assert!(required_title(Some("   ".into())).is_err());
        assert!(required_title(None).is_err());
        assert_eq!(required_title(Some(" Chair ".into())).unwrap(), "Chair");
    }

    #[test]
    fn test_customer_email_normalized() {
        assert_eq!(
            customer_email(Some(" C@X.com ".into())).unwrap().as_deref(),
            Some("c@x.com")
        );
        assert_eq!(customer_email(Some(String::new())).unwrap(), None);
        assert!(customer_email(Some("nope".into())).is_err());
    }

    #[test]
    fn test_replacement_semantics() {
        assert_eq!(replacement(None), None);
        assert_eq!(replacement(Some(" ".into())), Some(None));
        assert_eq!(replacement(Some("x".into())), Some(Some("x".to_string())));
    }
}
