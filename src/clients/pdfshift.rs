//! Hosted HTML to PDF conversion via `PDFShift`.

use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::config::InvoiceConfig;
use crate::services::invoice::{InvoiceDocument, InvoiceRenderer, RenderError, render_html};

#[derive(Serialize)]
struct ConvertRequest<'a> {
    source: &'a str,
}

pub struct PdfShiftRenderer {
    client: Client,
    url: String,
    api_key: String,
    timeout_secs: u64,
}

impl PdfShiftRenderer {
    #[must_use]
    pub fn with_shared_client(client: Client, config: &InvoiceConfig) -> Self {
        Self {
            client,
            url: config.pdfshift_url.clone(),
            api_key: config.pdfshift_api_key.clone(),
            timeout_secs: config.render_timeout_seconds,
        }
    }
}

#[async_trait::async_trait]
impl InvoiceRenderer for PdfShiftRenderer {
    fn name(&self) -> &'static str {
        "pdfshift"
    }

    async fn render(&self, document: &InvoiceDocument) -> Result<Vec<u8>, RenderError> {
        let html = render_html(document);
        debug!(invoice = %document.invoice_number, bytes = html.len(), "Submitting invoice to PDFShift");

        // The API key is the basic-auth username with an empty password
        let response = self
            .client
            .post(&self.url)
            .basic_auth(&self.api_key, Some(""))
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&ConvertRequest { source: &html })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RenderError::Timeout(self.timeout_secs)
                } else {
                    RenderError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RenderError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RenderError::Request(e.to_string()))?;

        if bytes.is_empty() {
            return Err(RenderError::EmptyOutput);
        }

        Ok(bytes.to_vec())
    }
}
