//! Storage layer for the order backend.
//!
//! The central contract is [`OrderStore::create_order`]: the order insert
//! and every stock decrement happen as one atomic unit, with each
//! decrement guarded by `stock >= quantity` evaluated at write time. Two
//! implementations are provided:
//! - [`InMemoryOrderStore`] for tests (a single write lock plays the role
//!   of the transaction)
//! - [`PostgresOrderStore`] backed by sqlx transactions

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use store::OrderStore;
pub use types::{OrderFilter, OrderPage, PageRequest, Pagination, ProductSnapshot, StockReservation};
