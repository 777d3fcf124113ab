//! Derived status interpretation
//!
//! Everything in this module is a pure function of the property store, the
//! device capabilities, and the ephemeral go-to-zone override. Nothing
//! here is cached or stored; consumers ask again after every change
//! notification. The predicate definitions mirror the first-party app, so
//! a card showing "paused" here matches what the vendor app would show.
//!
//! The precedence chains are deliberate and load-bearing. `state` consults
//! `started`/`docked`/`charging`, which consult `status` and
//! `charging_status`, which consult the override. Reordering them changes
//! observable behavior.

use serde_json::Value as JsonValue;

use mower_api::Property;

use crate::store::PropertyStore;
use crate::types::{
    ChargingStatus, DeviceCapabilities, ErrorCode, GoToZoneSettings, MapBackupStatus,
    MapRecoveryStatus, MowerState, MowerStatus, RelocationStatus, Shortcut, TaskStatus,
};

// ============================================================================
// StatusView
// ============================================================================

/// Borrowing interpreter over one device's store
///
/// Constructed on demand; holds no state of its own.
#[derive(Debug, Clone, Copy)]
pub struct StatusView<'a> {
    store: &'a PropertyStore,
    capability: DeviceCapabilities,
    go_to_zone: Option<&'a GoToZoneSettings>,
}

impl<'a> StatusView<'a> {
    pub fn new(
        store: &'a PropertyStore,
        capability: DeviceCapabilities,
        go_to_zone: Option<&'a GoToZoneSettings>,
    ) -> Self {
        Self { store, capability, go_to_zone }
    }

    // ------------------------------------------------------------------
    // Enumerated states
    // ------------------------------------------------------------------

    /// Activity status, with the go-to-zone and phantom-charging overrides
    ///
    /// An emulated cruise runs as a zone task on the device, so the zone
    /// code is reported as cruising while the override is active. Some
    /// firmware keeps reporting the charging code after the device left
    /// the dock; when the charger disagrees, idle wins.
    pub fn status(&self) -> MowerStatus {
        let Some(code) = self.store.int_value(Property::Status) else {
            return MowerStatus::Unknown;
        };
        let status = MowerStatus::from_code(code);
        if self.go_to_zone.is_some() && status == MowerStatus::ZoneCleaning {
            return MowerStatus::CruisingPoint;
        }
        if status == MowerStatus::Charging && !self.charging() {
            return MowerStatus::Idle;
        }
        status
    }

    /// Task status, with zone codes remapped while a cruise is emulated
    pub fn task_status(&self) -> TaskStatus {
        let Some(code) = self.store.int_value(Property::TaskStatus) else {
            return TaskStatus::Unknown;
        };
        let task_status = TaskStatus::from_code(code);
        if self.go_to_zone.is_some() {
            if task_status == TaskStatus::ZoneCleaning {
                return TaskStatus::CruisingPoint;
            }
            if task_status == TaskStatus::ZoneCleaningPaused {
                return TaskStatus::CruisingPointPaused;
            }
        }
        task_status
    }

    /// Charging status, promoting full-battery charging to completed
    ///
    /// Older firmware never reports the completed code; a full battery on
    /// the charger means the same thing.
    pub fn charging_status(&self) -> ChargingStatus {
        let Some(code) = self.store.int_value(Property::ChargingStatus) else {
            return ChargingStatus::Unknown;
        };
        let charging_status = ChargingStatus::from_code(code);
        if charging_status == ChargingStatus::Charging && self.battery_level() == Some(100) {
            return ChargingStatus::ChargingCompleted;
        }
        charging_status
    }

    pub fn relocation_status(&self) -> RelocationStatus {
        match self.store.int_value(Property::RelocationStatus) {
            Some(code) => RelocationStatus::from_code(code),
            None => RelocationStatus::Unknown,
        }
    }

    pub fn map_backup_status(&self) -> MapBackupStatus {
        match self.store.int_value(Property::MapBackupStatus) {
            Some(code) => MapBackupStatus::from_code(code),
            None => MapBackupStatus::Unknown,
        }
    }

    pub fn map_recovery_status(&self) -> MapRecoveryStatus {
        match self.store.int_value(Property::MapRecoveryStatus) {
            Some(code) => MapRecoveryStatus::from_code(code),
            None => MapRecoveryStatus::Unknown,
        }
    }

    /// Effective device state, resolved the way the first-party app does
    ///
    /// Raw idle is promoted to paused while a task is suspended, and to
    /// charging / charging-completed while docked, because downstream
    /// consumers treat "idle" as "nothing going on".
    pub fn state(&self) -> MowerState {
        let Some(code) = self.store.int_value(Property::State) else {
            return MowerState::Unknown;
        };
        let state = MowerState::from_code(code, self.capability.new_state);

        if self.go_to_zone.is_some()
            && (state == MowerState::Idle || state == MowerState::Mowing)
        {
            return if self.paused() {
                MowerState::MonitoringPaused
            } else {
                MowerState::Monitoring
            };
        }

        if state == MowerState::Idle {
            if self.started() || self.cleaning_paused() || self.fast_mapping_paused() {
                return MowerState::Paused;
            }
            if self.docked() {
                if self.charging() {
                    return MowerState::Charging;
                }
                if self.charging_status() == ChargingStatus::ChargingCompleted {
                    return MowerState::ChargingCompleted;
                }
            }
        }
        state
    }

    /// Current fault code
    ///
    /// Codes the device clears on its own (low-battery shutdown and one
    /// known-noisy warning) read as no-error so they never surface as a
    /// fault or a dismissable warning. An unreported code reads as
    /// unknown, not as no-error.
    pub fn error(&self) -> ErrorCode {
        match self.store.int_value(Property::Error) {
            Some(code) => {
                let code = ErrorCode(code);
                if code == ErrorCode::LOW_BATTERY_TURN_OFF || code == ErrorCode::UNKNOWN_WARNING_2 {
                    ErrorCode::NO_ERROR
                } else {
                    code
                }
            }
            None => ErrorCode::UNKNOWN,
        }
    }

    pub fn battery_level(&self) -> Option<i64> {
        self.store.int_value(Property::BatteryLevel)
    }

    // ------------------------------------------------------------------
    // Predicates
    // ------------------------------------------------------------------

    /// True while the device has an active (possibly suspended) task
    ///
    /// Gates settings writes that would corrupt the running task.
    pub fn started(&self) -> bool {
        let task_status = self.task_status();
        if task_status != TaskStatus::Completed && task_status != TaskStatus::DockingPaused {
            return true;
        }
        if self.cleaning_paused() {
            return true;
        }
        matches!(
            self.status(),
            MowerStatus::Cleaning
                | MowerStatus::SegmentCleaning
                | MowerStatus::ZoneCleaning
                | MowerStatus::SpotCleaning
                | MowerStatus::PartCleaning
                | MowerStatus::FastMapping
                | MowerStatus::CruisingPath
                | MowerStatus::CruisingPoint
                | MowerStatus::Shortcut
        )
    }

    /// True while an active task is suspended
    pub fn paused(&self) -> bool {
        if self.cleaning_paused() || self.cruising_paused() {
            return true;
        }
        self.started()
            && matches!(
                self.status(),
                MowerStatus::Paused
                    | MowerStatus::Sleeping
                    | MowerStatus::Idle
                    | MowerStatus::Standby
            )
    }

    /// True while the device is moving
    pub fn running(&self) -> bool {
        let charging_status = self.charging_status();
        if charging_status == ChargingStatus::Charging
            || charging_status == ChargingStatus::ChargingCompleted
        {
            return false;
        }
        matches!(
            self.status(),
            MowerStatus::Cleaning
                | MowerStatus::BackHome
                | MowerStatus::PartCleaning
                | MowerStatus::FollowWall
                | MowerStatus::RemoteControl
                | MowerStatus::SegmentCleaning
                | MowerStatus::ZoneCleaning
                | MowerStatus::SpotCleaning
                | MowerStatus::FastMapping
                | MowerStatus::CruisingPath
                | MowerStatus::CruisingPoint
                | MowerStatus::SummonClean
                | MowerStatus::Shortcut
                | MowerStatus::PersonFollow
        )
    }

    /// True while the device is on its dock
    pub fn docked(&self) -> bool {
        let charging_status = self.charging_status();
        (charging_status == ChargingStatus::Charging
            || charging_status == ChargingStatus::ChargingCompleted)
            && !(self.running()
                && !self.returning()
                && !self.fast_mapping()
                && !self.cruising())
    }

    pub fn charging(&self) -> bool {
        self.charging_status() == ChargingStatus::Charging
    }

    pub fn returning(&self) -> bool {
        self.status() == MowerStatus::BackHome
    }

    pub fn returning_paused(&self) -> bool {
        matches!(
            self.task_status(),
            TaskStatus::DockingPaused
                | TaskStatus::AutoDockingPaused
                | TaskStatus::SegmentDockingPaused
                | TaskStatus::ZoneDockingPaused
        )
    }

    pub fn sleeping(&self) -> bool {
        self.status() == MowerStatus::Sleeping
    }

    /// True when the device is awake, moving or not
    pub fn active(&self) -> bool {
        self.status() == MowerStatus::Standby || self.running()
    }

    /// True while the task is suspended waiting for a recharge
    pub fn cleaning_paused(&self) -> bool {
        self.store.bool_value(Property::CleaningPaused).unwrap_or(false)
    }

    /// True while the device is navigating to a point or along a path
    ///
    /// Without native support, an active go-to-zone override counts as
    /// cruising regardless of the reported codes.
    pub fn cruising(&self) -> bool {
        if !self.capability.cruising {
            return self.go_to_zone.is_some();
        }
        matches!(
            self.task_status(),
            TaskStatus::CruisingPath
                | TaskStatus::CruisingPoint
                | TaskStatus::CruisingPathPaused
                | TaskStatus::CruisingPointPaused
        ) || matches!(
            self.status(),
            MowerStatus::CruisingPath | MowerStatus::CruisingPoint
        )
    }

    pub fn cruising_paused(&self) -> bool {
        if self.capability.cruising {
            return matches!(
                self.task_status(),
                TaskStatus::CruisingPathPaused | TaskStatus::CruisingPointPaused
            );
        }
        self.go_to_zone.is_some()
            && self.started()
            && matches!(
                self.status(),
                MowerStatus::Paused
                    | MowerStatus::Sleeping
                    | MowerStatus::Idle
                    | MowerStatus::Standby
            )
    }

    pub fn fast_mapping(&self) -> bool {
        self.task_status() == TaskStatus::FastMapping
            || self.status() == MowerStatus::FastMapping
            || self.fast_mapping_paused()
    }

    /// True when a mapping run was suspended by the user
    ///
    /// Resuming needs a dedicated start call; the regular start action
    /// will not continue a mapping run.
    pub fn fast_mapping_paused(&self) -> bool {
        let task_status = self.task_status();
        if task_status != TaskStatus::FastMapping && task_status != TaskStatus::MapCleaningPaused {
            return false;
        }
        // Raw state, on purpose: the resolved state consults this predicate
        matches!(self.store.int_value(Property::State), Some(2) | Some(3) | Some(4))
    }

    pub fn zone_cleaning(&self) -> bool {
        self.started()
            && matches!(
                self.task_status(),
                TaskStatus::ZoneCleaning
                    | TaskStatus::ZoneCleaningPaused
                    | TaskStatus::ZoneDockingPaused
            )
    }

    pub fn spot_cleaning(&self) -> bool {
        self.started()
            && (matches!(
                self.task_status(),
                TaskStatus::SpotCleaning | TaskStatus::SpotCleaningPaused
            ) || self.status() == MowerStatus::SpotCleaning)
    }

    pub fn segment_cleaning(&self) -> bool {
        self.started()
            && matches!(
                self.task_status(),
                TaskStatus::SegmentCleaning
                    | TaskStatus::SegmentCleaningPaused
                    | TaskStatus::SegmentDockingPaused
            )
    }

    pub fn auto_cleaning(&self) -> bool {
        self.started()
            && matches!(
                self.task_status(),
                TaskStatus::AutoCleaning
                    | TaskStatus::AutoCleaningPaused
                    | TaskStatus::AutoDockingPaused
            )
    }

    /// True when the active task was launched by a schedule
    pub fn scheduled_clean(&self) -> bool {
        if !self.started() {
            return false;
        }
        matches!(
            self.store.int_value(Property::ScheduledClean),
            Some(1) | Some(2) | Some(4)
        )
    }

    /// True when the active task is a running shortcut routine
    pub fn shortcut_task(&self) -> bool {
        self.started() && self.shortcuts().iter().any(|s| s.running)
    }

    /// True when per-segment cleaning customization is in effect
    pub fn customized_cleaning(&self) -> bool {
        self.capability.custom_cleaning_mode
            && self.store.bool_value(Property::CustomizedCleaning).unwrap_or(false)
    }

    pub fn has_error(&self) -> bool {
        let error = self.error();
        error.is_error() && !self.has_warning()
    }

    pub fn has_warning(&self) -> bool {
        self.error().is_warning()
    }

    // ------------------------------------------------------------------
    // Shortcuts
    // ------------------------------------------------------------------

    /// Parse the shortcut list blob
    ///
    /// Names arrive base64-encoded and are kept verbatim; the engine only
    /// cares about the running flag. A missing or malformed blob is an
    /// empty list.
    pub fn shortcuts(&self) -> Vec<Shortcut> {
        let Some(raw) = self.store.value(Property::Shortcuts).and_then(|v| v.as_str()) else {
            return Vec::new();
        };
        let Ok(JsonValue::Array(entries)) = serde_json::from_str::<JsonValue>(raw) else {
            return Vec::new();
        };
        entries
            .iter()
            .filter_map(|entry| {
                let id = entry.get("id")?.as_i64()?;
                let name = entry
                    .get("name")
                    .and_then(JsonValue::as_str)
                    .unwrap_or_default()
                    .to_string();
                let running = matches!(
                    entry.get("state").and_then(JsonValue::as_str),
                    Some("0") | Some("1")
                );
                Some(Shortcut { id, name, running })
            })
            .collect()
    }

    /// Capture every derivation into a comparable snapshot
    pub fn snapshot(&self) -> DerivedStatus {
        DerivedStatus {
            state: self.state(),
            status: self.status(),
            task_status: self.task_status(),
            charging_status: self.charging_status(),
            error: self.error(),
            battery_level: self.battery_level(),
            started: self.started(),
            paused: self.paused(),
            running: self.running(),
            returning: self.returning(),
            returning_paused: self.returning_paused(),
            docked: self.docked(),
            charging: self.charging(),
            sleeping: self.sleeping(),
            active: self.active(),
            cleaning_paused: self.cleaning_paused(),
            cruising: self.cruising(),
            cruising_paused: self.cruising_paused(),
            fast_mapping: self.fast_mapping(),
            fast_mapping_paused: self.fast_mapping_paused(),
            zone_cleaning: self.zone_cleaning(),
            spot_cleaning: self.spot_cleaning(),
            segment_cleaning: self.segment_cleaning(),
            auto_cleaning: self.auto_cleaning(),
            scheduled_clean: self.scheduled_clean(),
            shortcut_task: self.shortcut_task(),
            customized_cleaning: self.customized_cleaning(),
            has_error: self.has_error(),
            has_warning: self.has_warning(),
        }
    }
}

// ============================================================================
// DerivedStatus
// ============================================================================

/// Frozen result of one full derivation pass
///
/// Recomputed on demand, compared to detect derived-level changes that raw
/// property events alone would miss (a battery tick flipping
/// charging-completed, for example).
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedStatus {
    pub state: MowerState,
    pub status: MowerStatus,
    pub task_status: TaskStatus,
    pub charging_status: ChargingStatus,
    pub error: ErrorCode,
    pub battery_level: Option<i64>,
    pub started: bool,
    pub paused: bool,
    pub running: bool,
    pub returning: bool,
    pub returning_paused: bool,
    pub docked: bool,
    pub charging: bool,
    pub sleeping: bool,
    pub active: bool,
    pub cleaning_paused: bool,
    pub cruising: bool,
    pub cruising_paused: bool,
    pub fast_mapping: bool,
    pub fast_mapping_paused: bool,
    pub zone_cleaning: bool,
    pub spot_cleaning: bool,
    pub segment_cleaning: bool,
    pub auto_cleaning: bool,
    pub scheduled_clean: bool,
    pub shortcut_task: bool,
    pub customized_cleaning: bool,
    pub has_error: bool,
    pub has_warning: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PollSample;
    use crate::value::Value;
    use proptest::prelude::*;

    fn store_with(entries: &[(Property, i64)]) -> PropertyStore {
        let mut store = PropertyStore::default();
        let batch: Vec<PollSample> = entries
            .iter()
            .map(|(property, value)| PollSample {
                property: *property,
                value: Some(Value::Int(*value)),
            })
            .collect();
        store.apply(&batch);
        store
    }

    fn caps() -> DeviceCapabilities {
        DeviceCapabilities { cruising: true, new_state: true, ..Default::default() }
    }

    fn view(store: &PropertyStore) -> StatusView<'_> {
        StatusView::new(store, caps(), None)
    }

    #[test]
    fn test_idle_with_active_task_resolves_to_paused() {
        // Raw state idle, task auto cleaning: the app shows paused
        let store = store_with(&[
            (Property::State, 2),
            (Property::Status, 1),
            (Property::TaskStatus, 1),
        ]);
        let view = view(&store);
        assert!(view.started());
        assert_eq!(view.state(), MowerState::Paused);
    }

    #[test]
    fn test_idle_without_task_stays_idle() {
        let store = store_with(&[
            (Property::State, 2),
            (Property::Status, 0),
            (Property::TaskStatus, 0),
            (Property::ChargingStatus, 2),
        ]);
        let view = view(&store);
        assert!(!view.started());
        assert_eq!(view.state(), MowerState::Idle);
    }

    #[test]
    fn test_idle_on_dock_resolves_to_charging() {
        let store = store_with(&[
            (Property::State, 2),
            (Property::Status, 6),
            (Property::TaskStatus, 0),
            (Property::ChargingStatus, 1),
            (Property::BatteryLevel, 70),
        ]);
        assert_eq!(view(&store).state(), MowerState::Charging);
    }

    #[test]
    fn test_full_battery_promotes_charging_to_completed() {
        let store = store_with(&[
            (Property::State, 2),
            (Property::Status, 6),
            (Property::TaskStatus, 0),
            (Property::ChargingStatus, 1),
            (Property::BatteryLevel, 100),
        ]);
        let view = view(&store);
        assert_eq!(view.charging_status(), ChargingStatus::ChargingCompleted);
        assert!(!view.charging());
        assert_eq!(view.state(), MowerState::ChargingCompleted);
    }

    #[test]
    fn test_charging_status_without_charger_resolves_to_idle() {
        // Firmware stuck on the charging status code after undocking
        let store = store_with(&[
            (Property::Status, 6),
            (Property::ChargingStatus, 2),
        ]);
        assert_eq!(view(&store).status(), MowerStatus::Idle);
    }

    #[test]
    fn test_returning_is_back_home_status() {
        let store = store_with(&[
            (Property::Status, 3),
            (Property::TaskStatus, 1),
            (Property::ChargingStatus, 5),
        ]);
        let view = view(&store);
        assert!(view.returning());
        assert!(view.running());
        assert!(!view.docked());
    }

    #[test]
    fn test_go_to_zone_override_remaps_zone_codes() {
        let store = store_with(&[
            (Property::State, 1),
            (Property::Status, 19),
            (Property::TaskStatus, 2),
            (Property::ChargingStatus, 2),
        ]);
        let zone = GoToZoneSettings { x: 120, y: -40, stop: true, cleaning_mode: None, size: 50 };
        let view = StatusView::new(&store, caps(), Some(&zone));
        assert_eq!(view.status(), MowerStatus::CruisingPoint);
        assert_eq!(view.task_status(), TaskStatus::CruisingPoint);
        assert_eq!(view.state(), MowerState::Monitoring);
        assert!(view.cruising());
    }

    #[test]
    fn test_go_to_zone_paused_resolves_to_monitoring_paused() {
        let store = store_with(&[
            (Property::State, 2),
            (Property::Status, 1),
            (Property::TaskStatus, 7),
            (Property::ChargingStatus, 2),
        ]);
        let zone = GoToZoneSettings { x: 0, y: 0, stop: false, cleaning_mode: None, size: 50 };
        let view = StatusView::new(&store, caps(), Some(&zone));
        assert_eq!(view.task_status(), TaskStatus::CruisingPointPaused);
        assert!(view.cruising_paused());
        assert_eq!(view.state(), MowerState::MonitoringPaused);
    }

    #[test]
    fn test_emulated_cruising_without_capability() {
        let store = store_with(&[
            (Property::Status, 19),
            (Property::TaskStatus, 2),
        ]);
        let zone = GoToZoneSettings { x: 0, y: 0, stop: false, cleaning_mode: None, size: 50 };
        let caps = DeviceCapabilities { cruising: false, new_state: true, ..Default::default() };
        assert!(StatusView::new(&store, caps, Some(&zone)).cruising());
        assert!(!StatusView::new(&store, caps, None).cruising());
    }

    #[test]
    fn test_warning_code_is_not_an_error() {
        let store = store_with(&[(Property::Error, 47)]);
        let view = view(&store);
        assert!(view.has_warning());
        assert!(!view.has_error());
    }

    #[test]
    fn test_low_battery_code_is_suppressed() {
        let store = store_with(&[(Property::Error, 20)]);
        let view = view(&store);
        assert!(!view.has_error());
        assert!(!view.has_warning());
    }

    #[test]
    fn test_self_clearing_codes_read_as_no_error() {
        // Low-battery shutdown and the noisy warning resolve on their
        // own; neither is a fault nor dismissable
        for code in [75, 122] {
            let store = store_with(&[(Property::Error, code)]);
            let view = view(&store);
            assert_eq!(view.error(), ErrorCode::NO_ERROR, "code {code}");
            assert!(!view.has_warning(), "code {code}");
            assert!(!view.has_error(), "code {code}");
        }
    }

    #[test]
    fn test_unreported_error_reads_unknown() {
        let store = store_with(&[]);
        let view = view(&store);
        assert_eq!(view.error(), ErrorCode::UNKNOWN);
        assert!(!view.has_error());
        assert!(!view.has_warning());
    }

    #[test]
    fn test_scheduled_clean_requires_started() {
        let store = store_with(&[
            (Property::Status, 2),
            (Property::TaskStatus, 1),
            (Property::ScheduledClean, 2),
        ]);
        assert!(view(&store).scheduled_clean());

        let idle = store_with(&[
            (Property::Status, 0),
            (Property::TaskStatus, 0),
            (Property::ScheduledClean, 2),
        ]);
        assert!(!view(&idle).scheduled_clean());
    }

    #[test]
    fn test_shortcut_task_parses_running_state() {
        let mut store = store_with(&[
            (Property::Status, 25),
            (Property::TaskStatus, 1),
        ]);
        store.apply(&[PollSample {
            property: Property::Shortcuts,
            value: Some(Value::Str(
                r#"[{"id": 3, "name": "bW93IGxhd24=", "state": "1"}]"#.into(),
            )),
        }]);
        let view = view(&store);
        assert_eq!(view.shortcuts().len(), 1);
        assert!(view.shortcut_task());
    }

    #[test]
    fn test_malformed_shortcut_blob_is_empty() {
        let mut store = PropertyStore::default();
        store.apply(&[PollSample {
            property: Property::Shortcuts,
            value: Some(Value::Str("not json".into())),
        }]);
        assert!(view(&store).shortcuts().is_empty());
    }

    #[test]
    fn test_fast_mapping_paused_needs_idle_like_state() {
        let store = store_with(&[
            (Property::State, 3),
            (Property::Status, 1),
            (Property::TaskStatus, 5),
        ]);
        let view = view(&store);
        assert!(view.fast_mapping_paused());
        assert!(view.fast_mapping());
        assert_eq!(view.state(), MowerState::Paused);
    }

    #[test]
    fn test_snapshot_equality_detects_derived_change() {
        let before = store_with(&[
            (Property::Status, 6),
            (Property::ChargingStatus, 1),
            (Property::BatteryLevel, 99),
        ]);
        let after = store_with(&[
            (Property::Status, 6),
            (Property::ChargingStatus, 1),
            (Property::BatteryLevel, 100),
        ]);
        // Same raw charging code, different derived status
        assert_ne!(view(&before).snapshot(), view(&after).snapshot());
    }

    proptest! {
        #[test]
        fn test_docked_and_running_are_mutually_exclusive(
            state in -1i64..30,
            status in -1i64..27,
            task_status in -1i64..25,
            charging in -1i64..6,
            battery in 0i64..101,
        ) {
            let store = store_with(&[
                (Property::State, state),
                (Property::Status, status),
                (Property::TaskStatus, task_status),
                (Property::ChargingStatus, charging),
                (Property::BatteryLevel, battery),
            ]);
            let view = view(&store);
            prop_assert!(!(view.docked() && view.running()));
        }

        #[test]
        fn test_interpretation_is_pure(
            status in -1i64..27,
            task_status in -1i64..25,
            charging in -1i64..6,
        ) {
            let store = store_with(&[
                (Property::Status, status),
                (Property::TaskStatus, task_status),
                (Property::ChargingStatus, charging),
            ]);
            let view = view(&store);
            prop_assert_eq!(view.snapshot(), view.snapshot());
        }
    }
}
