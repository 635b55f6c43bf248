//! Value objects carried on an order record.

use chrono::{DateTime, Utc};
use common::{ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::money::Money;

use super::status::OrderStatus;

/// Human-readable order code, e.g. `ORD-20250424-3F9A1C`.
///
/// Generated with a random suffix; the unique index at the persistence
/// layer is the actual uniqueness guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderCode(String);

impl OrderCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrderCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Per-day sequenced invoice number, e.g. `INV-20250424-0001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for InvoiceNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Postal address for shipping or billing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub phone: String,
    pub district: String,
    pub address_line: String,
    pub postal_code: String,
}

/// Optional product variant selection on a line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Variant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

/// A line item as submitted by the client: product reference and quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftLine {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,
}

/// A priced line item on a committed order.
///
/// Title and unit price are captured at order time so the record stays
/// meaningful even if the product is later repriced or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub title: String,
    pub quantity: u32,
    pub unit_price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,
}

impl OrderLine {
    /// Returns `unit_price * quantity`.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// How the order is to be paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "sslcommerz")]
    Sslcommerz,
    #[serde(rename = "cash-on-delivery")]
    CashOnDelivery,
}

impl PaymentMethod {
    /// The gateway label recorded on payment details.
    pub fn gateway(&self) -> &'static str {
        match self {
            PaymentMethod::Sslcommerz => "SSLCommerz",
            PaymentMethod::CashOnDelivery => "COD",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Sslcommerz => "sslcommerz",
            PaymentMethod::CashOnDelivery => "cash-on-delivery",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment record stored with the order.
///
/// Only the method tag and an opaque transaction id are kept here;
/// gateway integration happens in an external collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub gateway: String,
    pub method: PaymentMethod,
    pub amount: Money,
    pub currency: String,
    pub transaction_id: String,
}

/// One entry in the append-only status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub changed_at: DateTime<Utc>,
    pub changed_by: UserId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_line_total() {
        let line = OrderLine {
            product_id: ProductId::new(),
            title: "Widget".to_string(),
            quantity: 3,
            unit_price: Money::from_minor(500),
            variant: None,
        };
        assert_eq!(line.line_total().minor(), 1500);
    }

    #[test]
    fn test_payment_method_serde_names() {
        let json = serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap();
        assert_eq!(json, "\"cash-on-delivery\"");
        let back: PaymentMethod = serde_json::from_str("\"sslcommerz\"").unwrap();
        assert_eq!(back, PaymentMethod::Sslcommerz);
    }

    #[test]
    fn test_payment_method_gateway() {
        assert_eq!(PaymentMethod::Sslcommerz.gateway(), "SSLCommerz");
        assert_eq!(PaymentMethod::CashOnDelivery.gateway(), "COD");
    }

    #[test]
    fn test_order_code_transparent_serde() {
        let code = OrderCode::new("ORD-20250424-ABC123");
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"ORD-20250424-ABC123\"");
    }

    #[test]
    fn test_variant_skips_absent_fields() {
        let variant = Variant {
            color: Some("red".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&variant).unwrap();
        assert_eq!(json, serde_json::json!({"color": "red"}));
    }
}
