//! Domain service for invoiceable items.
//!
//! Every operation is scoped to the calling user. A foreign item is
//! indistinguishable from a missing one.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{Item, User};
use crate::domain::{BillingAddress, ItemId, ItemStatus, Money, RequestContext, UserId};
use crate::services::delivery::DeliveryError;
use crate::services::invoice::RenderError;

#[derive(Debug, Error)]
pub enum ItemError {
    #[error("Item not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Failed to generate invoice: {0}")]
    Render(#[from] RenderError),

    #[error("Failed to send email: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for ItemError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Fields accepted on create and update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub status: Option<ItemStatus>,
    pub image: Option<String>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub customer_address: Option<String>,
}

/// Who initiated a delete. Admin deletes are flagged in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOrigin {
    Owner,
    Admin,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub billing_address: BillingAddress,
}

impl From<&User> for OwnerSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            billing_address: user.billing_address.clone(),
        }
    }
}

/// An item joined with its owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    pub id: ItemId,
    pub user: OwnerSummary,
    pub title: String,
    pub description: Option<String>,
    pub amount: Money,
    pub status: ItemStatus,
    pub image: Option<String>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub customer_address: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ItemView {
    #[must_use]
    pub fn new(item: Item, owner: &User) -> Self {
        Self {
            id: item.id,
            user: OwnerSummary::from(owner),
            title: item.title,
            description: item.description,
            amount: item.amount,
            status: item.status,
            image: item.image,
            customer_email: item.customer_email,
            customer_name: item.customer_name,
            customer_address: item.customer_address,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

/// Rendered invoice returned inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePayload {
    pub invoice_number: String,
    pub file_name: String,
    pub media_type: String,
    /// `data:application/pdf;base64,...`
    pub pdf: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailReceipt {
    pub sent_to: String,
    pub subject: String,
}

/// The invoice pipeline: validate, persist, render, deliver, record.
#[async_trait::async_trait]
pub trait ItemService: Send + Sync {
    /// Caller's items, newest first.
    async fn list(&self, ctx: &RequestContext) -> Result<Vec<ItemView>, ItemError>;

    async fn get(&self, ctx: &RequestContext, id: ItemId) -> Result<ItemView, ItemError>;

    /// # Errors
    ///
    /// Returns [`ItemError::Validation`] if the title is blank or the amount
    /// is missing or negative.
    async fn create(&self, ctx: &RequestContext, input: ItemInput) -> Result<ItemView, ItemError>;

    /// Replaces the mutable fields. Optional fields omitted from `input` keep
    /// their stored value.
    async fn update(
        &self,
        ctx: &RequestContext,
        id: ItemId,
        input: ItemInput,
    ) -> Result<ItemView, ItemError>;

    async fn delete(
        &self,
        ctx: &RequestContext,
        id: ItemId,
        origin: DeleteOrigin,
    ) -> Result<(), ItemError>;

    /// # Errors
    ///
    /// Returns [`ItemError::Render`] if the backend fails. Nothing is recorded.
    async fn generate_invoice(
        &self,
        ctx: &RequestContext,
        id: ItemId,
    ) -> Result<InvoicePayload, ItemError>;

    /// # Errors
    ///
    /// Returns [`ItemError::Validation`] without rendering when the item has no
    /// customer email, and [`ItemError::Delivery`] if sending fails.
    async fn send_invoice_email(
        &self,
        ctx: &RequestContext,
        id: ItemId,
    ) -> Result<EmailReceipt, ItemError>;
}
