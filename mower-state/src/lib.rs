//! Mower State Reconciliation
//!
//! The in-memory model of one robot mower: a property store that stays
//! consistent under racing polls and optimistic writes, change
//! notification with panic isolation, and a pure interpretation layer
//! turning raw device codes into the predicates downstream consumers
//! reason with.
//!
//! # Architecture
//!
//! ```text
//! Poll results ──► PropertyStore ──► ChangeNotifier ──► Listeners
//! Local writes ──►      │
//!                       └──► StatusView (derived predicates, on demand)
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use mower_api::Property;
//! use mower_state::{PollSample, PropertyStore, StatusView, Value};
//! use mower_state::DeviceCapabilities;
//!
//! let mut store = PropertyStore::default();
//! store.apply(&[
//!     PollSample { property: Property::Status, value: Some(Value::Int(2)) },
//!     PollSample { property: Property::TaskStatus, value: Some(Value::Int(1)) },
//! ]);
//!
//! let caps = DeviceCapabilities { new_state: true, ..Default::default() };
//! let view = StatusView::new(&store, caps, None);
//! assert!(view.started());
//! assert!(view.auto_cleaning());
//! ```

pub mod ai;
pub mod notify;
pub mod status;
pub mod store;
pub mod types;
pub mod value;

pub use ai::{AiFlag, AiSettings};
pub use notify::{ChangeListener, ChangeNotifier, ChangedListener, ErrorListener, ListenerPanicked};
pub use status::{DerivedStatus, StatusView};
pub use store::{
    ApplyOutcome, ChangeEvent, PollSample, PropertyStore, StagedWrite, StoreConfig,
};
pub use types::{
    ChargingStatus, DeviceCapabilities, ErrorCode, GoToZoneSettings, MapBackupStatus,
    MapRecoveryStatus, MowerState, MowerStatus, RelocationStatus, Shortcut, TaskStatus,
};
pub use value::Value;
