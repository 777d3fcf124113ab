//! SDK error types

use mower_api::{Action, ApiError, Property};
use thiserror::Error;

/// Errors surfaced by the device facade
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The transport failed or the device did not answer
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The device exceeded the consecutive poll failure threshold
    #[error("device is unavailable")]
    Unavailable,

    /// The action is not valid in the current device state
    #[error("action {action:?} is not available")]
    ActionUnavailable { action: Action },

    /// The action is not supported by this device generation
    #[error("action {action:?} is not supported")]
    ActionNotSupported { action: Action },

    /// The value failed local validation before it was sent
    #[error("invalid value for {property:?}: {reason}")]
    InvalidValue { property: Property, reason: String },

    /// The device answered the write with a non-zero result code
    #[error("device rejected write to {property:?} with code {code}")]
    WriteRejected { property: Property, code: i32 },

    /// The property cannot be written on this device
    #[error("property {property:?} is not writable")]
    NotWritable { property: Property },

    /// The request conflicts with the current device state
    #[error("operation not permitted: {reason}")]
    NotPermitted { reason: &'static str },
}

pub type Result<T> = std::result::Result<T, DeviceError>;
