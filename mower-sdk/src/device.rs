//! Device facade
//!
//! [`MowerDevice`] owns the property store, the notifier, the command
//! table, and the poll timer for one device, and enforces the ordering
//! rules between them: transport calls are never issued while the store
//! lock is held, and change listeners run after the store has committed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use mower_api::{
    request_in_batches, Action, ActionResult, ApiError, Property, PropertyAddress,
    PropertyRequest, Transport,
};
use mower_state::{
    ChangeEvent, ChangeNotifier, DerivedStatus, DeviceCapabilities, GoToZoneSettings,
    MapBackupStatus, MapRecoveryStatus, PollSample, PropertyStore, StatusView, StoreConfig,
    TaskStatus, Value,
};

use crate::dispatcher::{CommandSpec, CommandTable};
use crate::error::{DeviceError, Result};
use crate::scheduler::{next_interval, Availability, IntervalInputs, PollHealth, PollTimer};

/// Settings properties are refreshed at most this often
const SETTINGS_REFRESH: Duration = Duration::from_millis(9500);

/// Edge length of the emulated single-point zone, in map units
const GO_TO_ZONE_SIZE: i32 = 50;

/// Status codes accepted by the custom-start action
const ZONE_CLEANING_STATUS: i64 = 19;
const CRUISING_POINT_STATUS: i64 = 23;
const FAST_MAPPING_STATUS: i64 = 21;

/// Codes staged optimistically ahead of task commands
const STATE_MOWING: i64 = 1;
const STATE_PAUSED: i64 = 3;
const STATE_MONITORING_PAUSED: i64 = 99;
const STATUS_PAUSED: i64 = 1;
const STATUS_CLEANING: i64 = 2;
const STATUS_STANDBY: i64 = 17;
const TASK_COMPLETED: i64 = 0;
const TASK_AUTO_CLEANING: i64 = 1;
const TASK_CRUISING_POINT_PAUSED: i64 = 23;

/// Parameter ids on the custom-start action payload
const CUSTOM_START_STATUS_PIID: u16 = 1;
const CUSTOM_START_PARAMETERS_PIID: u16 = 10;

/// Properties polled on every cycle
const VOLATILE_PROPERTIES: &[Property] = &[
    Property::State,
    Property::Error,
    Property::BatteryLevel,
    Property::ChargingStatus,
    Property::Status,
    Property::TaskStatus,
    Property::WarnStatus,
    Property::RelocationStatus,
    Property::CleaningPaused,
    Property::CleaningCancel,
    Property::ScheduledClean,
    Property::TaskType,
    Property::MapRecoveryStatus,
];

/// Properties polled while the device is moving
const ACTIVITY_PROPERTIES: &[Property] = &[Property::CleanedArea, Property::CleaningTime];

/// Properties refreshed on the slow settings cadence
const SETTINGS_PROPERTIES: &[Property] = &[
    Property::ResumeCleaning,
    Property::ObstacleAvoidance,
    Property::AiDetection,
    Property::CleaningMode,
    Property::IntelligentRecognition,
    Property::CustomizedCleaning,
    Property::ChildLock,
    Property::OffPeakCharging,
    Property::Dnd,
    Property::DndStart,
    Property::DndEnd,
    Property::DndTask,
    Property::MultiFloorMap,
    Property::Volume,
    Property::VoicePacketId,
    Property::VoiceAssistant,
    Property::VoiceAssistantLanguage,
    Property::Timezone,
    Property::CruiseSchedule,
    Property::MapSaving,
    Property::Shortcuts,
    Property::AutoSwitchSettings,
    Property::CameraLightBrightness,
    Property::BladesTimeLeft,
    Property::BladesLeft,
    Property::SideBrushTimeLeft,
    Property::SideBrushLeft,
    Property::FilterLeft,
    Property::FilterTimeLeft,
    Property::SensorDirtyLeft,
    Property::SensorDirtyTimeLeft,
    Property::FirstCleaningDate,
    Property::TotalCleaningTime,
    Property::CleaningCount,
    Property::TotalCleanedArea,
];

/// Map list blobs, refreshed with settings while the device is not moving
const MAP_LIST_PROPERTIES: &[Property] = &[Property::MapList, Property::RecoveryMapList];

/// Properties the facade accepts writes for
const WRITABLE_PROPERTIES: &[Property] = &[
    Property::ResumeCleaning,
    Property::ObstacleAvoidance,
    Property::AiDetection,
    Property::CleaningMode,
    Property::IntelligentRecognition,
    Property::CustomizedCleaning,
    Property::ChildLock,
    Property::DndTask,
    Property::MultiFloorMap,
    Property::Volume,
    Property::VoicePacketId,
    Property::Timezone,
    Property::MapSaving,
    Property::AutoSwitchSettings,
    Property::Shortcuts,
    Property::VoiceAssistant,
    Property::CruiseSchedule,
    Property::CameraLightBrightness,
    Property::VoiceAssistantLanguage,
    Property::OffPeakCharging,
];

type AvailabilityListener = Arc<dyn Fn(bool) + Send + Sync>;

struct DeviceInner {
    transport: Arc<dyn Transport>,
    capability: DeviceCapabilities,
    store: Mutex<PropertyStore>,
    notifier: ChangeNotifier,
    commands: CommandTable,
    timer: PollTimer,
    health: Mutex<PollHealth>,
    polling: AtomicBool,
    go_to_zone: Mutex<Option<GoToZoneSettings>>,
    last_change: Mutex<Option<Instant>>,
    last_settings_poll: Mutex<Option<Instant>>,
    availability_listeners: RwLock<Vec<AvailabilityListener>>,
}

/// One reconciled device
///
/// Cheap to clone; clones share the same store, listeners and timer.
///
/// # Example
///
/// ```rust,ignore
/// let device = MowerDevice::new(transport, capability);
/// device.listen(Property::BatteryLevel, |_, previous| {
///     println!("battery was {previous:?}");
/// });
/// device.start_polling();
/// device.dispatch_action(Action::StartMowing, &[])?;
/// ```
#[derive(Clone)]
pub struct MowerDevice {
    inner: Arc<DeviceInner>,
}

impl MowerDevice {
    pub fn new(transport: Arc<dyn Transport>, capability: DeviceCapabilities) -> Self {
        Self::with_config(transport, capability, StoreConfig::default())
    }

    pub fn with_config(
        transport: Arc<dyn Transport>,
        capability: DeviceCapabilities,
        config: StoreConfig,
    ) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<DeviceInner>| {
            let weak = weak.clone();
            let timer = PollTimer::new(move || {
                if let Some(inner) = weak.upgrade() {
                    MowerDevice { inner }.update();
                }
            });
            DeviceInner {
                transport,
                capability,
                store: Mutex::new(PropertyStore::new(config)),
                notifier: ChangeNotifier::new(),
                commands: CommandTable::new(),
                timer,
                health: Mutex::new(PollHealth::default()),
                polling: AtomicBool::new(false),
                go_to_zone: Mutex::new(None),
                last_change: Mutex::new(None),
                last_settings_poll: Mutex::new(None),
                availability_listeners: RwLock::new(Vec::new()),
            }
        });
        Self { inner }
    }

    /// Begin polling; the first cycle runs immediately
    pub fn start_polling(&self) {
        self.inner.timer.schedule(Duration::ZERO);
    }

    /// Stop polling; in-flight cycles finish normally
    pub fn stop_polling(&self) {
        self.inner.timer.cancel();
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn value(&self, property: Property) -> Option<Value> {
        self.inner.store.lock().value(property).cloned()
    }

    pub fn available(&self) -> bool {
        self.inner.health.lock().available()
    }

    pub fn capability(&self) -> DeviceCapabilities {
        self.inner.capability
    }

    pub fn go_to_zone(&self) -> Option<GoToZoneSettings> {
        self.inner.go_to_zone.lock().clone()
    }

    /// Compute the full derived status snapshot
    pub fn derived_status(&self) -> DerivedStatus {
        let store = self.inner.store.lock();
        let zone = self.inner.go_to_zone.lock();
        StatusView::new(&store, self.inner.capability, zone.as_ref()).snapshot()
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    /// Subscribe to changes of one property
    pub fn listen<F>(&self, property: Property, listener: F)
    where
        F: Fn(Property, Option<&Value>) + Send + Sync + 'static,
    {
        self.inner.notifier.on_change(property, listener);
    }

    /// Subscribe to changes of every property
    pub fn listen_any<F>(&self, listener: F)
    where
        F: Fn(Property, Option<&Value>) + Send + Sync + 'static,
    {
        self.inner.notifier.on_any_change(listener);
    }

    /// Subscribe to the once-per-batch changed signal
    ///
    /// Fires after a reconciliation batch in which any non-silent
    /// property changed; silent bookkeeping properties (map lists and
    /// the like) never trigger it.
    pub fn listen_changed<F>(&self, listener: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.notifier.on_changed(listener);
    }

    /// Subscribe to engine failures
    pub fn listen_error<F>(&self, listener: F)
    where
        F: Fn(&(dyn std::error::Error + 'static)) + Send + Sync + 'static,
    {
        self.inner.notifier.on_error(listener);
    }

    /// Subscribe to availability transitions
    pub fn listen_availability<F>(&self, listener: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.inner
            .availability_listeners
            .write()
            .push(Arc::new(listener));
    }

    // ------------------------------------------------------------------
    // Go-to-zone override
    // ------------------------------------------------------------------

    /// Install the emulated-cruise override
    ///
    /// While installed, zone-task codes are interpreted as cruising. The
    /// override clears itself when the device reports the task completed.
    pub fn set_go_to_zone(&self, settings: GoToZoneSettings) {
        *self.inner.go_to_zone.lock() = Some(settings);
    }

    pub fn clear_go_to_zone(&self) {
        self.restore_go_to_zone(false);
    }

    /// Navigate to a point
    ///
    /// Devices with native cruising run a single-point cruise task.
    /// Older firmwares emulate it: a one-cell zone clean is synthesized
    /// around the target and the override is installed so the
    /// interpreter reports the task as cruising. The override is
    /// restored when the task ends.
    pub fn go_to(&self, x: i32, y: i32) -> Result<ActionResult> {
        let battery = self
            .inner
            .store
            .lock()
            .int_value(Property::BatteryLevel);
        if battery.is_some_and(|level| level < 15) {
            return Err(DeviceError::NotPermitted {
                reason: "battery too low to navigate",
            });
        }

        if self.inner.capability.cruising {
            let target = serde_json::json!({ "tpoint": [[x, y, 0, 0]] });
            return self.start_custom(CRUISING_POINT_STATUS, Some(target));
        }

        let previous_mode = self
            .inner
            .store
            .lock()
            .int_value(Property::CleaningMode)
            .map(|mode| mode as i32);
        *self.inner.go_to_zone.lock() = Some(GoToZoneSettings {
            x,
            y,
            stop: true,
            cleaning_mode: previous_mode,
            size: GO_TO_ZONE_SIZE,
        });

        let half = i64::from(GO_TO_ZONE_SIZE / 2);
        let (x, y) = (i64::from(x), i64::from(y));
        let zone = serde_json::json!({
            "areas": [[x - half, y - half, x + half, y + half, 1, 0, 1]]
        });
        let result = self.start_custom(ZONE_CLEANING_STATUS, Some(zone));
        if result.is_err() {
            *self.inner.go_to_zone.lock() = None;
        }
        result
    }

    /// Start a new task or resume a paused one
    ///
    /// Pause sub-states resume through their own channel: a paused
    /// mapping run restarts mapping, a paused return resumes docking,
    /// and a paused cruise restarts the cruise it interrupted. The
    /// expected status codes are staged before the command goes out so
    /// listeners see the transition immediately.
    pub fn start(&self) -> Result<ActionResult> {
        if !self.available() {
            return Err(DeviceError::Unavailable);
        }
        let status = self.derived_status();
        if status.fast_mapping_paused {
            return self.start_custom(FAST_MAPPING_STATUS, None);
        }
        if status.returning_paused {
            return self.dispatch_action(Action::Dock, &[]);
        }
        if self.inner.capability.cruising {
            if status.cruising_paused {
                let resume = self
                    .inner
                    .store
                    .lock()
                    .int_value(Property::Status)
                    .unwrap_or(STATUS_CLEANING);
                return self.start_custom(resume, None);
            }
        } else if !status.paused {
            self.restore_go_to_zone(false);
        }

        if !status.started {
            self.stage_status(&[
                (Property::State, STATE_MOWING),
                (Property::Status, STATUS_CLEANING),
                (Property::TaskStatus, TASK_AUTO_CLEANING),
            ]);
        } else if status.paused
            && !status.cleaning_paused
            && !status.cruising
            && !status.scheduled_clean
        {
            let mut updates = vec![(Property::Status, STATUS_CLEANING)];
            if status.task_status != TaskStatus::Completed {
                updates.push((Property::State, STATE_MOWING));
            }
            self.stage_status(&updates);
        }
        self.dispatch_action(Action::StartMowing, &[])
    }

    /// Suspend the active task
    pub fn pause(&self) -> Result<ActionResult> {
        if !self.available() {
            return Err(DeviceError::Unavailable);
        }
        let status = self.derived_status();
        if !status.paused && status.started {
            let state = if status.cruising && !self.inner.capability.cruising {
                STATE_MONITORING_PAUSED
            } else {
                STATE_PAUSED
            };
            let mut updates = vec![
                (Property::State, state),
                (Property::Status, STATUS_PAUSED),
            ];
            if self.go_to_zone().is_some() {
                updates.push((Property::TaskStatus, TASK_CRUISING_POINT_PAUSED));
            }
            self.stage_status(&updates);
        }
        self.dispatch_action(Action::Pause, &[])
    }

    /// Stop the active task
    ///
    /// A mapping run is ended by sending the device home instead. The
    /// availability rule is checked before the completed status is
    /// staged, otherwise the staging would make the stop look redundant.
    pub fn stop(&self) -> Result<ActionResult> {
        let status = self.derived_status();
        if status.fast_mapping {
            return self.dispatch_action(Action::Dock, &[]);
        }
        let spec = self.inner.commands.get(Action::Stop)?;
        if !self.available() {
            return Err(DeviceError::Unavailable);
        }
        if !self.action_allowed(Action::Stop)? {
            return Err(DeviceError::ActionUnavailable { action: Action::Stop });
        }
        if status.started {
            self.stage_status(&[
                (Property::TaskStatus, TASK_COMPLETED),
                (Property::Status, STATUS_STANDBY),
            ]);
        }
        let result = self.send_action(spec, &[])?;
        // A stop already happened; only the displaced mode needs restoring
        self.restore_go_to_zone(false);
        Ok(result)
    }

    /// Start a custom task (zone, spot or cruise) by target status code
    pub fn start_custom(
        &self,
        status: i64,
        parameters: Option<JsonValue>,
    ) -> Result<ActionResult> {
        // Starting anything but the emulated zone ends a pending cruise
        if !self.inner.capability.cruising && status != ZONE_CLEANING_STATUS {
            self.restore_go_to_zone(false);
        }
        if status != FAST_MAPPING_STATUS && self.derived_status().fast_mapping {
            return Err(DeviceError::NotPermitted {
                reason: "cannot start cleaning while fast mapping",
            });
        }
        let mut params = vec![serde_json::json!({
            "piid": CUSTOM_START_STATUS_PIID,
            "value": status,
        })];
        if let Some(parameters) = parameters {
            params.push(serde_json::json!({
                "piid": CUSTOM_START_PARAMETERS_PIID,
                "value": parameters,
            }));
        }
        self.dispatch_action(Action::StartCustom, &params)
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Write a property optimistically
    ///
    /// The store takes the value immediately and listeners fire before
    /// the device is asked. `Ok(false)` means the store already held the
    /// value and nothing was sent. Rejection and transport failure both
    /// roll the store back to the pre-write value.
    pub fn set(&self, property: Property, value: Value) -> Result<bool> {
        if !WRITABLE_PROPERTIES.contains(&property) {
            return Err(DeviceError::NotWritable { property });
        }
        validate(property, &value)?;
        if property == Property::CleaningMode {
            self.check_cleaning_mode_allowed()?;
        }
        if !self.available() {
            return Err(DeviceError::Unavailable);
        }
        let address = property
            .address()
            .ok_or(DeviceError::NotWritable { property })?;

        // Rearm far out; the outcome below pulls the next poll closer
        self.inner.timer.schedule(Duration::from_secs(10));

        let staged = {
            let mut store = self.inner.store.lock();
            store.stage_dirty(property, value.clone())
        };
        let Some(staged) = staged else {
            self.inner.timer.schedule(Duration::from_secs(1));
            return Ok(false);
        };
        self.mark_changed();
        self.inner.notifier.dispatch(&staged.event);

        match self.inner.transport.set_property(address, value.to_json()) {
            Ok(0) => {
                info!(?property, "write accepted");
                self.inner.store.lock().commit(property);
                self.inner.timer.schedule(Duration::from_secs(2));
                Ok(true)
            }
            Ok(code) => {
                warn!(?property, code, "write rejected");
                self.rollback_and_notify(property);
                self.inner.timer.schedule(Duration::from_secs(2));
                Err(DeviceError::WriteRejected { property, code })
            }
            Err(error) => {
                self.rollback_and_notify(property);
                self.inner.timer.schedule(Duration::from_secs(1));
                Err(error.into())
            }
        }
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// Invoke a device action through the command table
    pub fn dispatch_action(&self, action: Action, params: &[JsonValue]) -> Result<ActionResult> {
        let spec = self.inner.commands.get(action)?;
        if !self.available() {
            return Err(DeviceError::Unavailable);
        }
        if !spec.cleaning && !self.action_allowed(action)? {
            return Err(DeviceError::ActionUnavailable { action });
        }
        self.send_action(spec, params)
    }

    fn action_allowed(&self, action: Action) -> Result<bool> {
        let store = self.inner.store.lock();
        let zone = self.inner.go_to_zone.lock();
        let status = StatusView::new(&store, self.inner.capability, zone.as_ref()).snapshot();
        self.inner.commands.available(action, &status, &store)
    }

    fn send_action(
        &self,
        spec: &'static CommandSpec,
        params: &[JsonValue],
    ) -> Result<ActionResult> {
        let action = spec.action;
        if !spec.map {
            self.inner.timer.schedule(Duration::from_secs(10));
        }

        let mut staged_events: Vec<ChangeEvent> = Vec::new();
        if !spec.optimistic.is_empty() {
            let mut store = self.inner.store.lock();
            for (property, value) in spec.optimistic {
                if let Some(staged) = store.stage_dirty(*property, Value::Int(*value)) {
                    staged_events.push(staged.event);
                }
            }
        }
        self.inner.notifier.dispatch_all(&staged_events);

        let result = match self.inner.transport.action(action.address(), params) {
            Ok(result) => result,
            Err(error) => {
                warn!(?action, %error, "action failed to send");
                self.inner.timer.schedule(Duration::from_secs(1));
                return Err(error.into());
            }
        };

        if !spec.map {
            self.inner.timer.schedule(Duration::from_secs(6));
        }
        if result.ok() {
            info!(?action, "action accepted");
            self.mark_changed();
            Ok(result)
        } else {
            warn!(?action, code = result.code, "action rejected");
            Err(DeviceError::Api(ApiError::Rejected(result.code)))
        }
    }

    // ------------------------------------------------------------------
    // Pushed values
    // ------------------------------------------------------------------

    /// Apply a value pushed by the device outside the poll cycle
    pub fn handle_push(&self, address: PropertyAddress, raw: &JsonValue) {
        let Some(property) = Property::from_address(address) else {
            debug!(?address, "pushed value for unknown property");
            return;
        };
        let sample = PollSample { property, value: Value::from_json(raw) };
        let outcome = self.inner.store.lock().apply(&[sample]);
        self.after_apply(&outcome.events, outcome.changed);
    }

    // ------------------------------------------------------------------
    // Poll cycle
    // ------------------------------------------------------------------

    /// Run one poll cycle immediately
    ///
    /// This is what the timer invokes; callers may also use it to force a
    /// refresh. Failures feed the availability tracking and the error
    /// sink rather than being returned.
    pub fn update(&self) {
        // A cycle that outlives its interval must not stack a second one
        if self.inner.polling.swap(true, Ordering::SeqCst) {
            debug!("poll cycle already running");
            return;
        }
        let result = self.poll_once();
        self.inner.polling.store(false, Ordering::SeqCst);

        let transition = {
            let mut health = self.inner.health.lock();
            match &result {
                Ok(()) => health.record_success(),
                Err(_) => health.record_failure(Instant::now()),
            }
        };
        if let Err(error) = result {
            self.inner.notifier.report_error(&error);
        }
        match transition {
            Availability::BecameAvailable => self.notify_availability(true),
            Availability::BecameUnavailable => self.notify_availability(false),
            Availability::Unchanged => {}
        }

        self.inner.timer.schedule(self.current_interval());
    }

    fn poll_once(&self) -> Result<()> {
        let now = Instant::now();
        let properties = self.poll_properties(now);
        let requests: Vec<PropertyRequest> = properties
            .iter()
            .filter_map(|property| {
                property.address().map(|address| PropertyRequest {
                    did: property.id(),
                    address,
                })
            })
            .collect();

        // Transport runs unlocked; listeners may call back into the device
        let results = request_in_batches(self.inner.transport.as_ref(), &requests)?;

        let samples: Vec<PollSample> = results
            .iter()
            .filter_map(|result| {
                let property = Property::from_id(result.did)?;
                let value = if result.ok() {
                    result.value.as_ref().and_then(Value::from_json)
                } else {
                    None
                };
                Some(PollSample { property, value })
            })
            .collect();

        let (outcome, restored) = {
            let mut store = self.inner.store.lock();
            let outcome = store.apply(&samples);
            let restored = store.sweep_restore();
            (outcome, restored)
        };
        let changed = outcome.changed;
        let mut events = outcome.events;
        events.extend(restored);
        self.after_apply(&events, changed);
        Ok(())
    }

    /// Assemble the property list for this cycle
    fn poll_properties(&self, now: Instant) -> Vec<Property> {
        let mut properties: Vec<Property> = VOLATILE_PROPERTIES.to_vec();
        if self.inner.capability.backup_map {
            properties.push(Property::MapBackupStatus);
        }

        let status = self.derived_status();
        if status.active {
            properties.extend_from_slice(ACTIVITY_PROPERTIES);
        }

        let settings_due = {
            let last = self.inner.last_settings_poll.lock();
            match *last {
                Some(at) => now.duration_since(at) >= SETTINGS_REFRESH,
                None => true,
            }
        };
        if settings_due {
            *self.inner.last_settings_poll.lock() = Some(now);
            properties.extend_from_slice(SETTINGS_PROPERTIES);
            if !status.running {
                properties.extend_from_slice(MAP_LIST_PROPERTIES);
            }
        }
        properties
    }

    fn after_apply(&self, events: &[ChangeEvent], changed: bool) {
        if changed {
            *self.inner.last_change.lock() = Some(Instant::now());
        }

        // A finished task ends any emulated cruise
        if events
            .iter()
            .any(|event| event.property == Property::TaskStatus)
        {
            let completed = {
                let store = self.inner.store.lock();
                let zone = self.inner.go_to_zone.lock();
                StatusView::new(&store, self.inner.capability, zone.as_ref()).task_status()
                    == TaskStatus::Completed
            };
            if completed {
                self.restore_go_to_zone(true);
            }
        }

        // So does a fault, but only on a transition, not on the error
        // state the device was first seen in
        if events
            .iter()
            .any(|event| event.property == Property::Error && event.previous.is_some())
        {
            let faulted = {
                let store = self.inner.store.lock();
                let zone = self.inner.go_to_zone.lock();
                zone.is_some()
                    && StatusView::new(&store, self.inner.capability, zone.as_ref()).has_error()
            };
            if faulted {
                self.restore_go_to_zone(true);
            }
        }

        self.inner.notifier.dispatch_all(events);
        if changed {
            self.inner.notifier.notify_changed();
        }
    }

    fn current_interval(&self) -> Duration {
        let now = Instant::now();
        let status = self.derived_status();
        let inputs = IntervalInputs {
            map_transfer: matches!(
                self.map_transfer_status(),
                (MapBackupStatus::Running, _) | (_, MapRecoveryStatus::Running)
            ),
            since_failure: self.inner.health.lock().since_failure(now),
            since_change: self
                .inner
                .last_change
                .lock()
                .map(|at| now.duration_since(at)),
            active: status.active,
            started: status.started,
            running: status.running,
        };
        next_interval(&inputs)
    }

    fn map_transfer_status(&self) -> (MapBackupStatus, MapRecoveryStatus) {
        let store = self.inner.store.lock();
        let zone = self.inner.go_to_zone.lock();
        let view = StatusView::new(&store, self.inner.capability, zone.as_ref());
        (view.map_backup_status(), view.map_recovery_status())
    }

    /// Stage status codes ahead of a task command
    ///
    /// These properties are in the undirtied set, so the next poll
    /// overwrites them with whatever the device actually reports.
    fn stage_status(&self, updates: &[(Property, i64)]) {
        let mut events = Vec::new();
        {
            let mut store = self.inner.store.lock();
            for (property, value) in updates {
                if let Some(staged) = store.stage_dirty(*property, Value::Int(*value)) {
                    events.push(staged.event);
                }
            }
        }
        self.inner.notifier.dispatch_all(&events);
    }

    /// Drop the emulated-cruise override, undoing its side effects
    ///
    /// Restores the cleaning mode the override displaced and, when the
    /// override asked for it, stops the device once the target is
    /// reached. Both are best-effort; the next poll reconciles anyway.
    fn restore_go_to_zone(&self, stop: bool) {
        let Some(settings) = self.inner.go_to_zone.lock().take() else {
            return;
        };
        debug!("clearing go-to-zone override");

        if let Some(mode) = settings.cleaning_mode {
            let current = self.inner.store.lock().int_value(Property::CleaningMode);
            if current != Some(i64::from(mode)) {
                if let Err(error) = self.set(Property::CleaningMode, Value::Int(i64::from(mode))) {
                    warn!(%error, "failed to restore cleaning mode");
                }
            }
        }

        if stop && settings.stop && self.derived_status().started {
            self.inner.timer.schedule(Duration::from_secs(10));
            if let Err(error) = self.inner.transport.action(Action::Stop.address(), &[]) {
                warn!(%error, "failed to stop after navigation");
            }
        }
    }

    /// Cleaning mode cannot change while a task that owns it is running
    fn check_cleaning_mode_allowed(&self) -> Result<()> {
        let status = self.derived_status();
        if status.cruising {
            return Err(DeviceError::NotPermitted {
                reason: "cannot change cleaning mode while cruising",
            });
        }
        if status.scheduled_clean || status.shortcut_task {
            return Err(DeviceError::NotPermitted {
                reason: "cannot change cleaning mode during a scheduled or shortcut task",
            });
        }
        if status.started
            && status.customized_cleaning
            && !(status.zone_cleaning || status.spot_cleaning)
        {
            return Err(DeviceError::NotPermitted {
                reason: "cannot change cleaning mode while customized cleaning is enabled",
            });
        }
        Ok(())
    }

    fn rollback_and_notify(&self, property: Property) {
        let event = self.inner.store.lock().rollback(property);
        if let Some(event) = event {
            self.inner.notifier.dispatch(&event);
        }
    }

    fn mark_changed(&self) {
        *self.inner.last_change.lock() = Some(Instant::now());
        // Settings may have moved; refresh them on the next cycle
        *self.inner.last_settings_poll.lock() = None;
    }

    fn notify_availability(&self, available: bool) {
        info!(available, "device availability changed");
        let listeners = self.inner.availability_listeners.read().clone();
        for listener in listeners {
            listener(available);
        }
    }
}

impl std::fmt::Debug for MowerDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MowerDevice")
            .field("available", &self.available())
            .field("capability", &self.inner.capability)
            .finish_non_exhaustive()
    }
}

/// Range checks applied before a value leaves the process
fn validate(property: Property, value: &Value) -> Result<()> {
    let out_of_range = |reason: &str| {
        Err(DeviceError::InvalidValue {
            property,
            reason: reason.to_string(),
        })
    };
    match property {
        Property::Volume => match value.as_int() {
            Some(volume) if (0..=100).contains(&volume) => Ok(()),
            _ => out_of_range("volume must be 0-100"),
        },
        Property::CameraLightBrightness => match value.as_int() {
            Some(brightness) if (40..=100).contains(&brightness) => Ok(()),
            _ => out_of_range("brightness must be 40-100"),
        },
        _ => Ok(()),
    }
}
