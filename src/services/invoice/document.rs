use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::config::InvoiceConfig;
use crate::db::{Item, User, parse_timestamp};
use crate::domain::Money;

const STREET_PLACEHOLDER: &str = "Street address not provided";
const CITY_PLACEHOLDER: &str = "City";
const STATE_PLACEHOLDER: &str = "State";
const COUNTRY_PLACEHOLDER: &str = "Country";
const CUSTOMER_PLACEHOLDER: &str = "Customer";

#[derive(Debug, Clone)]
pub struct InvoiceSettings {
    pub brand_name: String,
    pub currency_symbol: String,
    pub due_days: i64,
}

impl From<&InvoiceConfig> for InvoiceSettings {
    fn from(config: &InvoiceConfig) -> Self {
        Self {
            brand_name: config.brand_name.clone(),
            currency_symbol: config.currency_symbol.clone(),
            due_days: config.due_days,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issuer {
    pub name: String,
    pub street: String,
    /// `City, State Zip`
    pub locality: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillTo {
    pub name: String,
    pub address: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub description: String,
    pub detail: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceDocument {
    pub brand: String,
    pub currency_symbol: String,
    pub issuer: Issuer,
    pub invoice_number: String,
    pub file_name: String,
    pub issue_date: String,
    pub due_date: String,
    pub bill_to: BillTo,
    pub line_items: Vec<LineItem>,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub status_label: String,
}

impl InvoiceDocument {
    /// Builds the invoice for `item` as issued by `owner` at `generated_at`.
    #[must_use]
    pub fn build(
        item: &Item,
        owner: &User,
        settings: &InvoiceSettings,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let billing = &owner.billing_address;
        let or_placeholder = |value: Option<&String>, placeholder: &str| {
            value.map_or_else(|| placeholder.to_string(), Clone::clone)
        };

        let locality = format!(
            "{}, {} {}",
            or_placeholder(billing.city.as_ref(), CITY_PLACEHOLDER),
            or_placeholder(billing.state.as_ref(), STATE_PLACEHOLDER),
            billing.zip_code.as_deref().unwrap_or_default(),
        )
        .trim_end()
        .to_string();

        let issuer = Issuer {
            name: owner.name.clone(),
            street: or_placeholder(billing.street.as_ref(), STREET_PLACEHOLDER),
            locality,
            country: or_placeholder(billing.country.as_ref(), COUNTRY_PLACEHOLDER),
        };

        let bill_to = BillTo {
            name: or_placeholder(item.customer_name.as_ref(), CUSTOMER_PLACEHOLDER),
            address: item.customer_address.clone(),
            email: item.customer_email.clone(),
        };

        let line_items = vec![LineItem {
            description: item.title.clone(),
            detail: item.description.clone(),
            quantity: 1,
            unit_price: item.amount,
            amount: item.amount,
        }];

        let subtotal: Money = line_items.iter().map(|line| line.amount).sum();
        let tax = Money::ZERO;
        let total = subtotal.checked_add(tax).unwrap_or(subtotal);

        let issued_at = parse_timestamp(&item.created_at).unwrap_or(generated_at);
        let due_at = generated_at + Duration::days(settings.due_days);

        Self {
            brand: settings.brand_name.clone(),
            currency_symbol: settings.currency_symbol.clone(),
            issuer,
            invoice_number: format!("INV-{:06}", item.id.value()),
            file_name: format!("invoice-{}.pdf", item.id),
            issue_date: format_date(issued_at),
            due_date: format_date(due_at),
            bill_to,
            line_items,
            subtotal,
            tax,
            total,
            status_label: item.status.label().to_string(),
        }
    }

    /// Amount with the configured currency glyph.
    #[must_use]
    pub fn money(&self, amount: Money) -> String {
        amount.display_with(&self.currency_symbol)
    }
}

/// `MM/DD/YYYY`
#[must_use]
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%m/%d/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BillingAddress, ItemId, ItemStatus, UserId};
    use chrono::TimeZone;

    fn settings() -> InvoiceSettings {
        InvoiceSettings::from(&InvoiceConfig::default())
    }

    fn owner(billing: BillingAddress) -> User {
        User {
            id: UserId::new(1),
            name: "Ada Stores".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            avatar: None,
            billing_address: billing,
            is_admin_registered: false,
            created_at: "2026-03-01T09:00:00.000Z".to_string(),
            updated_at: "2026-03-01T09:00:00.000Z".to_string(),
        }
    }

    fn item() -> Item {
        Item {
            id: ItemId::new(42),
            user_id: UserId::new(1),
            title: "Chair".to_string(),
            description: None,
            amount: Money::from_minor_units(9_999),
            status: ItemStatus::Pending,
            image: None,
            customer_email: Some("c@x.com".to_string()),
            customer_name: None,
            customer_address: None,
            created_at: "2026-03-02T10:30:00.000Z".to_string(),
            updated_at: "2026-03-02T10:30:00.000Z".to_string(),
        }
    }

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_placeholders_for_missing_billing_and_customer() {
        let doc = InvoiceDocument::build(
            &item(),
            &owner(BillingAddress::default()),
            &settings(),
            generated_at(),
        );

        assert_eq!(doc.issuer.street, "Street address not provided");
        assert_eq!(doc.issuer.locality, "City, State");
        assert_eq!(doc.issuer.country, "Country");
        assert_eq!(doc.bill_to.name, "Customer");
        assert_eq!(doc.bill_to.address, None);
    }

    #[test]
    fn test_totals_dates_and_labels() {
        let billing = BillingAddress {
            street: Some("1 Marina".into()),
            city: Some("Lagos".into()),
            state: Some("LA".into()),
            zip_code: Some("101001".into()),
            country: Some("Nigeria".into()),
        };
        let doc = InvoiceDocument::build(&item(), &owner(billing), &settings(), generated_at());

        assert_eq!(doc.issuer.locality, "Lagos, LA 101001");
        assert_eq!(doc.invoice_number, "INV-000042");
        assert_eq!(doc.file_name, "invoice-42.pdf");
        assert_eq!(doc.issue_date, "03/02/2026");
        assert_eq!(doc.due_date, "04/04/2026");
        assert_eq!(doc.line_items.len(), 1);
        assert_eq!(doc.money(doc.total), "₦99.99");
        assert_eq!(doc.money(doc.tax), "₦0.00");
        assert_eq!(doc.status_label, "Pending");
    }

    #[test]
    fn test_build_is_deterministic() {
        let owner = owner(BillingAddress::default());
        let a = InvoiceDocument::build(&item(), &owner, &settings(), generated_at());
        let b = InvoiceDocument::build(&item(), &owner, &settings(), generated_at());
        assert_eq!(a, b);
    }
}
