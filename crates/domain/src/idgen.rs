//! Order code, invoice number, and transaction id generation.
//!
//! Codes carry a random suffix; uniqueness is ultimately enforced by the
//! store's unique indexes, with the coordinator retrying on collision.

use chrono::{DateTime, Utc};
use common::UserId;
use uuid::Uuid;

use crate::order::{InvoiceNumber, OrderCode};

/// Formats a timestamp as the `YYYYMMDD` day stamp used in identifiers.
fn day_stamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d").to_string()
}

/// Generates an order code like `ORD-20250424-3F9A1C`.
///
/// The suffix is 6 uppercase hex characters of fresh UUID entropy, so
/// collisions are possible within a day; callers must treat the unique
/// index as the real guarantee and retry with a fresh code.
pub fn order_code(now: DateTime<Utc>) -> OrderCode {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(6)
        .collect::<String>()
        .to_uppercase();
    OrderCode::new(format!("ORD-{}-{}", day_stamp(now), suffix))
}

/// Formats an invoice number like `INV-20250424-0001` from a per-day
/// sequence issued by the store's atomic counter.
pub fn invoice_number(now: DateTime<Utc>, sequence: u32) -> InvoiceNumber {
    InvoiceNumber::new(format!("INV-{}-{:04}", day_stamp(now), sequence))
}

/// Builds the opaque transaction id recorded on payment details:
/// `{user}-{unix_millis}-{10 random alphanumerics}`.
pub fn transaction_id(user: UserId, now: DateTime<Utc>) -> String {
    let entropy: String = Uuid::new_v4().simple().to_string().chars().take(10).collect();
    format!("{}-{}-{}", user, now.timestamp_millis(), entropy)
}
