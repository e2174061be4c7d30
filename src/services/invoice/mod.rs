//! Invoice documents and the capability that turns them into PDFs.
//!
//! The document is a pure function of the item, its owner and the generation
//! instant. Backends only see the finished document, so the pipeline never
//! branches on which one is deployed.

mod document;
mod template;

pub use document::{BillTo, InvoiceDocument, InvoiceSettings, Issuer, LineItem, format_date};
pub use template::render_html;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Renderer timed out after {0}s")]
    Timeout(u64),

    #[error("Renderer request failed: {0}")]
    Request(String),

    #[error("Renderer returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Renderer process failed: {0}")]
    Process(String),

    #[error("Renderer produced an empty document")]
    EmptyOutput,
}

/// Converts a finished invoice into PDF bytes.
#[async_trait::async_trait]
pub trait InvoiceRenderer: Send + Sync {
    /// Short backend name for logs and metrics.
    fn name(&self) -> &'static str;

    async fn render(&self, document: &InvoiceDocument) -> Result<Vec<u8>, RenderError>;
}

/// `data:application/pdf;base64,...` for inline delivery to the browser.
#[must_use]
pub fn pdf_data_uri(pdf: &[u8]) -> String {
    format!("data:{PDF_MEDIA_TYPE};base64,{}", STANDARD.encode(pdf))
}
