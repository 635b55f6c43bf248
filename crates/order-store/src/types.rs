//! Storage-facing value types: product snapshots, reservations, paging.

use common::{ProductId, UserId};
use domain::{Money, Order};
use serde::Serialize;

/// A product as read for order placement: current price and stock.
///
/// The catalog itself is owned by an external collaborator; the order
/// core reads these fields and mutates only `stock`, through the guarded
/// decrement.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub title: String,
    pub stock: i64,
    pub base_price: Money,
    pub final_price: Option<Money>,
}

impl ProductSnapshot {
    /// The price charged at order time: `final_price` if set, else
    /// `base_price`.
    pub fn effective_price(&self) -> Money {
        self.final_price.unwrap_or(self.base_price)
    }
}

/// One guarded stock decrement: applied only if `stock >= quantity`
/// holds at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockReservation {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Filter for order listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    /// Restrict to orders placed by this user.
    pub user_id: Option<UserId>,
}

/// A page request, 1-based.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, 100),
        }
    }

    /// Rows to skip before this page.
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

/// Pagination metadata returned alongside a page of orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl Pagination {
    pub fn new(page: PageRequest, total_count: u64) -> Self {
        let total_pages = total_count.div_ceil(page.limit as u64) as u32;
        Self {
            current_page: page.page,
            total_pages,
            total_count,
            has_next_page: page.page < total_pages,
            has_previous_page: page.page > 1,
        }
    }
}

/// One page of orders, newest first.
#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub pagination: Pagination,
}
