use html_escape::encode_text;
use std::fmt::{self, Write};

use super::InvoiceDocument;

const STYLE: &str = "\
body { font-family: Helvetica, Arial, sans-serif; color: #1f2933; margin: 40px; }
.header { display: flex; justify-content: space-between; border-bottom: 2px solid #1f6feb; padding-bottom: 16px; }
.brand { font-size: 26px; font-weight: bold; color: #1f6feb; margin: 0 0 8px 0; }
.issuer p, .meta p, .bill-to p { margin: 2px 0; }
.meta { text-align: right; }
.meta h2 { margin: 0 0 8px 0; letter-spacing: 2px; }
.bill-to { margin: 24px 0; }
.bill-to h3 { margin: 0 0 6px 0; font-size: 14px; text-transform: uppercase; color: #52606d; }
table { width: 100%; border-collapse: collapse; margin-top: 16px; }
th { background: #f0f4f8; text-align: left; padding: 10px; font-size: 13px; }
td { padding: 10px; border-bottom: 1px solid #e4e7eb; font-size: 13px; }
td.num, th.num { text-align: right; }
.detail { color: #7b8794; font-size: 12px; }
.totals { width: 40%; margin-left: auto; margin-top: 16px; }
.totals td { border: none; padding: 4px 10px; }
.totals tr.total td { font-weight: bold; font-size: 16px; border-top: 2px solid #1f2933; }
.status { margin-top: 24px; font-size: 14px; }
.footer { margin-top: 40px; text-align: center; color: #7b8794; font-size: 12px; }
";

/// Self-contained HTML for the document. Identical input gives identical
/// output and all user text is escaped.
#[must_use]
pub fn render_html(doc: &InvoiceDocument) -> String {
    let mut html = String::with_capacity(4096);
    write_document(&mut html, doc)
        .map(|()| html)
        .unwrap_or_default()
}

fn write_document(html: &mut String, doc: &InvoiceDocument) -> fmt::Result {
    write!(
        html,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Invoice {number}</title>\
         <style>{STYLE}</style></head><body>",
        number = encode_text(&doc.invoice_number),
    )?;

    write!(
        html,
        "<div class=\"header\"><div class=\"issuer\">\
         <h1 class=\"brand\">{brand}</h1>\
         <p>{name}</p><p>{street}</p><p>{locality}</p><p>{country}</p></div>\
         <div class=\"meta\"><h2>INVOICE</h2>\
         <p>Invoice #: {number}</p><p>Date: {issued}</p><p>Due Date: {due}</p></div></div>",
        brand = encode_text(&doc.brand),
        name = encode_text(&doc.issuer.name),
        street = encode_text(&doc.issuer.street),
        locality = encode_text(&doc.issuer.locality),
        country = encode_text(&doc.issuer.country),
        number = encode_text(&doc.invoice_number),
        issued = encode_text(&doc.issue_date),
        due = encode_text(&doc.due_date),
    )?;

    write!(
        html,
        "<div class=\"bill-to\"><h3>Bill To</h3><p>{}</p>",
        encode_text(&doc.bill_to.name)
    )?;
    if let Some(address) = &doc.bill_to.address {
        write!(html, "<p>{}</p>", encode_text(address))?;
    }
    if let Some(email) = &doc.bill_to.email {
        write!(html, "<p>{}</p>", encode_text(email))?;
    }
    html.push_str("</div>");

    html.push_str(
        "<table><thead><tr><th>Description</th><th class=\"num\">Qty</th>\
         <th class=\"num\">Unit Price</th><th class=\"num\">Amount</th></tr></thead><tbody>",
    );
    for line in &doc.line_items {
        write!(html, "<tr><td>{}", encode_text(&line.description))?;
        if let Some(detail) = &line.detail {
            write!(html, "<div class=\"detail\">{}</div>", encode_text(detail))?;
        }
        write!(
            html,
            "</td><td class=\"num\">{qty}</td><td class=\"num\">{unit}</td>\
             <td class=\"num\">{amount}</td></tr>",
            qty = line.quantity,
            unit = encode_text(&doc.money(line.unit_price)),
            amount = encode_text(&doc.money(line.amount)),
        )?;
    }
    html.push_str("</tbody></table>");

    write!(
        html,
        "<table class=\"totals\">\
         <tr><td>Subtotal</td><td class=\"num\">{subtotal}</td></tr>\
         <tr><td>Tax</td><td class=\"num\">{tax}</td></tr>\
         <tr class=\"total\"><td>Total</td><td class=\"num\">{total}</td></tr></table>\
         <p class=\"status\">Status: <strong>{status}</strong></p>\
         <div class=\"footer\">Thank you for your business!</div></body></html>",
        subtotal = encode_text(&doc.money(doc.subtotal)),
        tax = encode_text(&doc.money(doc.tax)),
        total = encode_text(&doc.money(doc.total)),
        status = encode_text(&doc.status_label),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Money;
    use crate::services::invoice::{BillTo, Issuer, LineItem};

    fn document(bill_to: BillTo) -> InvoiceDocument {
        InvoiceDocument {
            brand: "Marketbook&solution".to_string(),
            currency_symbol: "₦".to_string(),
            issuer: Issuer {
                name: "Ada <Stores>".to_string(),
                street: "Street address not provided".to_string(),
                locality: "City, State".to_string(),
                country: "Country".to_string(),
            },
            invoice_number: "INV-000001".to_string(),
            file_name: "invoice-1.pdf".to_string(),
            issue_date: "03/02/2026".to_string(),
            due_date: "04/04/2026".to_string(),
            bill_to,
            line_items: vec![LineItem {
                description: "Chair".to_string(),
                detail: None,
                quantity: 1,
                unit_price: Money::from_minor_units(123_450),
                amount: Money::from_minor_units(123_450),
            }],
            subtotal: Money::from_minor_units(123_450),
            tax: Money::ZERO,
            total: Money::from_minor_units(123_450),
            status_label: "Paid".to_string(),
        }
    }

    #[test]
    fn test_escapes_user_text() {
        let html = render_html(&document(BillTo {
            name: "Customer".to_string(),
            address: None,
            email: None,
        }));

        assert!(html.contains("Marketbook&amp;solution"));
        assert!(html.contains("Ada &lt;Stores&gt;"));
        assert!(!html.contains("<Stores>"));
    }

    #[test]
    fn test_optional_customer_lines_are_omitted() {
        let without = render_html(&document(BillTo {
            name: "Customer".to_string(),
            address: None,
            email: None,
        }));
        let with = render_html(&document(BillTo {
            name: "Jane".to_string(),
            address: Some("5 Broad St".to_string()),
            email: Some("jane@example.com".to_string()),
        }));

        assert!(without.contains("<h3>Bill To</h3><p>Customer</p></div>"));
        assert!(with.contains("<p>Jane</p><p>5 Broad St</p><p>jane@example.com</p></div>"));
    }

    #[test]
    fn test_amounts_and_status() {
        let doc = document(BillTo {
            name: "Customer".to_string(),
            address: None,
            email: None,
        });
        let html = render_html(&doc);

        assert!(html.contains("₦1,234.50"));
        assert!(html.contains("₦0.00"));
        assert!(html.contains("Status: <strong>Paid</strong>"));
        assert_eq!(html, render_html(&doc));
    }
}
