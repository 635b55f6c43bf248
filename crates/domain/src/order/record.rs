//! The order aggregate root as one denormalized record.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use common::{CouponId, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::money::Money;

use super::OrderValidationError;
use super::status::{OrderStatus, PaymentStatus};
use super::value_objects::{
    Address, DraftLine, InvoiceNumber, OrderCode, OrderLine, PaymentDetails, PaymentMethod,
    StatusChange,
};

/// A committed order. Orders are permanent audit records: after creation
/// the core only appends to `status_history` (updating `status` with it);
/// `payment_status` and `delivered_at` belong to external collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub code: OrderCode,
    pub invoice_number: InvoiceNumber,
    pub user_id: UserId,
    pub lines: Vec<OrderLine>,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub status: OrderStatus,
    pub status_history: Vec<StatusChange>,
    pub payment_status: PaymentStatus,
    pub payment: PaymentDetails,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub shipping_fee: Money,
    pub final_amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_id: Option<CouponId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the line for a product, if present.
    pub fn line(&self, product_id: ProductId) -> Option<&OrderLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// True once the order can no longer change status under the strict
    /// policy.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// The order-creation input as accepted from the client, before products
/// are resolved and priced.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderDraft {
    pub lines: Vec<DraftLine>,
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
    pub coupon_id: Option<CouponId>,
    pub notes: Option<String>,
    pub payment_method: PaymentMethod,
}

impl OrderDraft {
    /// Checks the draft's shape: at least one line, positive quantities,
    /// no product listed twice.
    pub fn validate(&self) -> Result<(), OrderValidationError> {
        if self.lines.is_empty() {
            return Err(OrderValidationError::NoLines);
        }

        let mut seen = HashSet::with_capacity(self.lines.len());
        for line in &self.lines {
            if line.quantity == 0 {
                return Err(OrderValidationError::ZeroQuantity {
                    product_id: line.product_id,
                });
            }
            if !seen.insert(line.product_id) {
                return Err(OrderValidationError::DuplicateLine {
                    product_id: line.product_id,
                });
            }
        }

        Ok(())
    }

    /// The billing address, falling back to the shipping address.
    pub fn billing_or_shipping(&self) -> &Address {
        self.billing_address.as_ref().unwrap_or(&self.shipping_address)
    }

    /// All product ids referenced by the draft.
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.lines.iter().map(|l| l.product_id).collect()
    }
}
