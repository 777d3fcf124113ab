//! Mower SDK
//!
//! High-level facade over one robot mower: adaptive polling, optimistic
//! writes with rollback, table-driven action dispatch, and availability
//! tracking, built on the reconciliation core in `mower-state` and the
//! transport contract in `mower-api`.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mower_api::{Action, Property};
//! use mower_sdk::MowerDevice;
//! use mower_state::{DeviceCapabilities, Value};
//!
//! let transport = Arc::new(MyTransport::connect("192.168.1.40")?);
//! let caps = DeviceCapabilities { new_state: true, ..Default::default() };
//! let device = MowerDevice::new(transport, caps);
//!
//! device.listen(Property::BatteryLevel, |_, previous| {
//!     println!("battery was {previous:?}");
//! });
//! device.listen_availability(|available| {
//!     println!("available: {available}");
//! });
//!
//! device.start_polling();
//! device.set(Property::Volume, Value::Int(60))?;
//! device.start()?;
//! ```

pub mod device;
pub mod dispatcher;
pub mod error;
pub mod scheduler;

pub use device::MowerDevice;
pub use dispatcher::{CommandSpec, CommandTable};
pub use error::{DeviceError, Result};
pub use scheduler::{
    next_interval, Availability, IntervalInputs, PollHealth, PollTimer, FAILURE_THRESHOLD,
};

pub use mower_api::{Action, ActionResult, Property, Transport};
pub use mower_state::{
    DerivedStatus, DeviceCapabilities, GoToZoneSettings, StoreConfig, Value,
};
