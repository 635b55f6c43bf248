//! Order transaction coordination.
//!
//! [`CheckoutCoordinator`] drives a single order-creation attempt through
//! validating, pricing, and reserving+persisting, and fires the notify
//! sink only after the storage transaction has committed. All
//! collaborators are injected through the constructor so the coordinator
//! can be exercised against the in-memory store and a recording sink.

pub mod coordinator;
pub mod error;
pub mod notify;

pub use coordinator::{CheckoutConfig, CheckoutCoordinator};
pub use error::{CheckoutError, ErrorCategory};
pub use notify::{LoggingNotifySink, NotifyError, NotifySink, RecordingNotifySink};
