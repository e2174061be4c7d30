//! Local HTML to PDF conversion with a headless Chromium binary.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::InvoiceConfig;
use crate::services::invoice::{InvoiceDocument, InvoiceRenderer, RenderError, render_html};

pub struct ChromiumRenderer {
    binary: String,
    work_dir: PathBuf,
    timeout_secs: u64,
}

impl ChromiumRenderer {
    #[must_use]
    pub fn new(config: &InvoiceConfig) -> Self {
        Self {
            binary: config.chromium_path.clone(),
            work_dir: std::env::temp_dir(),
            timeout_secs: config.render_timeout_seconds,
        }
    }

    async fn print_to_pdf(&self, input: &Path, output: &Path) -> Result<Vec<u8>, RenderError> {
        let mut command = Command::new(&self.binary);
        command
            .arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--no-pdf-header-footer")
            .arg(format!("--print-to-pdf={}", output.display()))
            .arg(format!("file://{}", input.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let result = tokio::time::timeout(Duration::from_secs(self.timeout_secs), command.output())
            .await
            .map_err(|_| RenderError::Timeout(self.timeout_secs))?
            .map_err(|e| RenderError::Process(format!("failed to spawn {}: {e}", self.binary)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(RenderError::Process(format!(
                "{} exited with {}: {}",
                self.binary,
                result.status,
                stderr.trim()
            )));
        }

        let pdf = tokio::fs::read(output)
            .await
            .map_err(|e| RenderError::Process(format!("missing output file: {e}")))?;

        if pdf.is_empty() {
            return Err(RenderError::EmptyOutput);
        }
        Ok(pdf)
    }
}

#[async_trait::async_trait]
impl InvoiceRenderer for ChromiumRenderer {
    fn name(&self) -> &'static str {
        "chromium"
    }

    async fn render(&self, document: &InvoiceDocument) -> Result<Vec<u8>, RenderError> {
        let stem = format!("marketbook-invoice-{}", uuid::Uuid::new_v4());
        let input = self.work_dir.join(format!("{stem}.html"));
        let output = self.work_dir.join(format!("{stem}.pdf"));

        tokio::fs::write(&input, render_html(document))
            .await
            .map_err(|e| RenderError::Process(format!("failed to write HTML: {e}")))?;

        debug!(invoice = %document.invoice_number, path = %input.display(), "Printing invoice with Chromium");
        let result = self.print_to_pdf(&input, &output).await;

        for path in [&input, &output] {
            if let Err(e) = tokio::fs::remove_file(path).await
                && e.kind() != std::io::ErrorKind::NotFound
            {
                warn!(path = %path.display(), error = %e, "Failed to remove render scratch file");
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InvoiceConfig;
    use crate::domain::Money;
    use crate::services::invoice::{BillTo, Issuer};

    fn document() -> InvoiceDocument {
        InvoiceDocument {
            brand: "Marketbook".to_string(),
            currency_symbol: "₦".to_string(),
            issuer: Issuer {
                name: "Ada".to_string(),
                street: "1 Road".to_string(),
                locality: "Lagos".to_string(),
                country: "Nigeria".to_string(),
            },
            invoice_number: "INV-000001".to_string(),
            file_name: "invoice-1.pdf".to_string(),
            issue_date: "01/01/2026".to_string(),
            due_date: "01/31/2026".to_string(),
            bill_to: BillTo {
                name: "Customer".to_string(),
                address: None,
                email: None,
            },
            line_items: Vec::new(),
            subtotal: Money::ZERO,
            tax: Money::ZERO,
            total: Money::ZERO,
            status_label: "Pending".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_process_error() {
        let config = InvoiceConfig {
            chromium_path: "/nonexistent/marketbook-chromium".to_string(),
            ..InvoiceConfig::default()
        };
        let renderer = ChromiumRenderer::new(&config);

        let err = renderer.render(&document()).await.unwrap_err();
        assert!(matches!(err, RenderError::Process(_)));
    }
}
