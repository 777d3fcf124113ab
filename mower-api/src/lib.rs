//! Wire-level contract for robot mower devices
//!
//! This crate defines what the reconciliation engine needs to know about the
//! device protocol and nothing more:
//!
//! - [`Property`] and [`Action`] — the closed identifier sets the device
//!   exposes, with their transport addresses ([`PropertyAddress`],
//!   [`ActionAddress`])
//! - [`Transport`] — the request/response facility the engine consumes
//!   (`get_properties` / `set_property` / `action`)
//! - [`ApiError`] — transport-level failures
//!
//! The engine treats the transport as stateless; connection and session
//! management belong to the transport implementation, not to this contract.

pub mod error;
pub mod property;
pub mod transport;

pub use error::{ApiError, Result};
pub use property::{Action, ActionAddress, Property, PropertyAddress};
pub use transport::{
    request_in_batches, ActionResult, PropertyRequest, PropertyResult, Transport, MAX_BATCH_SIZE,
};
