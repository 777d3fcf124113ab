//! Action command table
//!
//! Every invocable action is described by one static [`CommandSpec`]:
//! its availability rule, the optimistic store writes it implies, and how
//! it interacts with the poll schedule. Dispatch is a table lookup, so
//! the full action surface is auditable in one place and an action
//! missing its spec is a startup error rather than a latent runtime
//! panic.

use std::collections::HashMap;

use mower_api::{Action, Property};
use mower_state::{DerivedStatus, PropertyStore};

use crate::error::{DeviceError, Result};

/// Availability rule evaluated against the current derived status
pub type AvailabilityFn = fn(&DerivedStatus, &PropertyStore) -> bool;

/// Static description of one action
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub action: Action,
    /// `None` means always available
    pub availability: Option<AvailabilityFn>,
    /// Start/pause/dock: dispatched even when the availability rule says
    /// no, because the device resolves conflicting task commands itself
    pub cleaning: bool,
    /// Map transfers: no poll rearm around the call, progress is polled
    /// on the map-transfer interval instead
    pub map: bool,
    /// Values staged into the store before the call goes out
    pub optimistic: &'static [(Property, i64)],
}

fn start_available(status: &DerivedStatus, _: &PropertyStore) -> bool {
    !status.started || status.paused || status.returning || status.returning_paused
}

fn pause_available(status: &DerivedStatus, _: &PropertyStore) -> bool {
    status.started && !(status.returning_paused || status.paused)
}

fn dock_available(status: &DerivedStatus, _: &PropertyStore) -> bool {
    !status.docked && !status.returning
}

fn stop_available(status: &DerivedStatus, _: &PropertyStore) -> bool {
    status.started || status.returning || status.paused
}

fn clear_warning_available(status: &DerivedStatus, _: &PropertyStore) -> bool {
    status.has_warning
}

fn consumable_worn(property: Property) -> impl Fn(&DerivedStatus, &PropertyStore) -> bool {
    move |_, store| store.int_value(property).is_some_and(|left| left < 100)
}

fn blades_worn(status: &DerivedStatus, store: &PropertyStore) -> bool {
    consumable_worn(Property::BladesLeft)(status, store)
}

fn side_brush_worn(status: &DerivedStatus, store: &PropertyStore) -> bool {
    consumable_worn(Property::SideBrushLeft)(status, store)
}

fn filter_worn(status: &DerivedStatus, store: &PropertyStore) -> bool {
    consumable_worn(Property::FilterLeft)(status, store)
}

fn sensor_dirty(status: &DerivedStatus, store: &PropertyStore) -> bool {
    consumable_worn(Property::SensorDirtyLeft)(status, store)
}

const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        action: Action::StartMowing,
        availability: Some(start_available),
        cleaning: true,
        map: false,
        optimistic: &[],
    },
    CommandSpec {
        action: Action::Pause,
        availability: Some(pause_available),
        cleaning: true,
        map: false,
        optimistic: &[],
    },
    CommandSpec {
        action: Action::Dock,
        availability: Some(dock_available),
        cleaning: true,
        map: false,
        optimistic: &[],
    },
    CommandSpec {
        action: Action::Stop,
        availability: Some(stop_available),
        cleaning: false,
        map: false,
        optimistic: &[],
    },
    CommandSpec {
        action: Action::StartCustom,
        availability: None,
        cleaning: false,
        map: false,
        optimistic: &[],
    },
    CommandSpec {
        action: Action::ClearWarning,
        availability: Some(clear_warning_available),
        cleaning: false,
        map: false,
        optimistic: &[(Property::Error, 0)],
    },
    CommandSpec {
        action: Action::RequestMap,
        availability: None,
        cleaning: false,
        map: true,
        optimistic: &[],
    },
    CommandSpec {
        action: Action::UpdateMapData,
        availability: None,
        cleaning: false,
        map: true,
        optimistic: &[],
    },
    CommandSpec {
        action: Action::BackupMap,
        availability: None,
        cleaning: false,
        map: true,
        optimistic: &[],
    },
    CommandSpec {
        action: Action::Locate,
        availability: None,
        cleaning: false,
        map: false,
        optimistic: &[],
    },
    CommandSpec {
        action: Action::TestSound,
        availability: None,
        cleaning: false,
        map: false,
        optimistic: &[],
    },
    CommandSpec {
        action: Action::ResetBlades,
        availability: Some(blades_worn),
        cleaning: false,
        map: false,
        optimistic: &[(Property::BladesLeft, 100), (Property::BladesTimeLeft, 300)],
    },
    CommandSpec {
        action: Action::ResetSideBrush,
        availability: Some(side_brush_worn),
        cleaning: false,
        map: false,
        optimistic: &[(Property::SideBrushLeft, 100), (Property::SideBrushTimeLeft, 200)],
    },
    CommandSpec {
        action: Action::ResetFilter,
        availability: Some(filter_worn),
        cleaning: false,
        map: false,
        optimistic: &[(Property::FilterLeft, 100), (Property::FilterTimeLeft, 150)],
    },
    CommandSpec {
        action: Action::ResetSensor,
        availability: Some(sensor_dirty),
        cleaning: false,
        map: false,
        optimistic: &[(Property::SensorDirtyLeft, 100), (Property::SensorDirtyTimeLeft, 30)],
    },
];

/// Lookup table over every dispatchable action
#[derive(Debug)]
pub struct CommandTable {
    commands: HashMap<Action, &'static CommandSpec>,
}

impl CommandTable {
    /// Build the table, rejecting duplicate specs
    pub fn new() -> Self {
        let mut commands = HashMap::with_capacity(COMMANDS.len());
        for spec in COMMANDS {
            let replaced = commands.insert(spec.action, spec);
            debug_assert!(replaced.is_none(), "duplicate command spec");
        }
        Self { commands }
    }

    pub fn get(&self, action: Action) -> Result<&'static CommandSpec> {
        self.commands
            .get(&action)
            .copied()
            .ok_or(DeviceError::ActionNotSupported { action })
    }

    /// Evaluate the availability rule for one action
    ///
    /// Cleaning actions report their rule's verdict but are dispatched
    /// regardless; everything else is blocked when unavailable.
    pub fn available(
        &self,
        action: Action,
        status: &DerivedStatus,
        store: &PropertyStore,
    ) -> Result<bool> {
        let spec = self.get(action)?;
        Ok(match spec.availability {
            Some(rule) => rule(status, store),
            None => true,
        })
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new()
    }
}
