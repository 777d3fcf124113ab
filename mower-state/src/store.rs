//! Property store with optimistic-write reconciliation
//!
//! The store is the authoritative key→value map for one device. It has no
//! knowledge of property semantics; its single job is keeping the map
//! consistent while two writers race each other:
//!
//! - periodic polls, which may return stale values captured before a local
//!   write reached the device
//! - optimistic local writes, which must be visible immediately but can be
//!   rejected or silently ignored by the device
//!
//! Reconciliation is purely timestamp-based. A staged write is protected by
//! the *discard window*: polled values that contradict it within the window
//! are treated as echoes of a pre-write read and dropped. It is bounded by
//! the *restore window*: if no poll ever confirms the written value, the
//! pre-write value is reinstated and the device is assumed to have ignored
//! the write.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use mower_api::Property;

use crate::value::Value;

// ============================================================================
// Configuration
// ============================================================================

/// Tuning knobs and property classification for a [`PropertyStore`]
///
/// The three sets are deliberately configuration rather than constants: the
/// exact membership mirrors observed firmware behavior and may need
/// adjustment per device generation.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// How long a staged write shields the store from contradicting polls
    pub discard_window: Duration,

    /// How long an unconfirmed staged write survives before reverting
    pub restore_window: Duration,

    /// Properties whose changes do not raise the batch-level changed flag
    /// (expensive blobs consumers re-render separately)
    pub silent: HashSet<Property>,

    /// Properties decoded further by secondary handlers; their change
    /// events are flagged so generic logging can skip the raw blob
    pub custom: HashSet<Property>,

    /// Properties never tracked dirty: volatile status codes the device
    /// echoes back immediately, where stale-poll protection would do more
    /// harm than good
    pub undirtied: HashSet<Property>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            discard_window: Duration::from_secs(5),
            restore_window: Duration::from_secs(15),
            silent: HashSet::from([
                Property::MapList,
                Property::RecoveryMapList,
                Property::AutoSwitchSettings,
                Property::AiDetection,
            ]),
            custom: HashSet::from([
                Property::AutoSwitchSettings,
                Property::AiDetection,
                Property::MapList,
                Property::SerialNumber,
            ]),
            undirtied: HashSet::from([
                Property::Error,
                Property::State,
                Property::Status,
                Property::TaskStatus,
                Property::AutoSwitchSettings,
                Property::CameraLightBrightness,
                Property::AiDetection,
                Property::Shortcuts,
                Property::MapBackupStatus,
                Property::MapRecoveryStatus,
                Property::OffPeakCharging,
            ]),
        }
    }
}

// ============================================================================
// Events and outcomes
// ============================================================================

/// One committed value change, carrying the previous value for listeners
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub property: Property,
    pub previous: Option<Value>,
    /// True for properties in [`StoreConfig::custom`]
    pub custom: bool,
}

/// Result of applying one poll batch
#[derive(Debug, Clone, Default)]
pub struct ApplyOutcome {
    /// Per-property change events, in batch order
    pub events: Vec<ChangeEvent>,
    /// True if any property outside the silent set changed
    pub changed: bool,
}

/// One entry of a poll batch handed to [`PropertyStore::apply`]
#[derive(Debug, Clone, PartialEq)]
pub struct PollSample {
    pub property: Property,
    /// `None` when the device reported the property unavailable
    pub value: Option<Value>,
}

/// A successfully staged optimistic write
#[derive(Debug, Clone, PartialEq)]
pub struct StagedWrite {
    /// Value to restore on rollback
    pub previous: Option<Value>,
    /// Change event for immediate dispatch
    pub event: ChangeEvent,
}

/// Pending local write awaiting confirmation or timeout
#[derive(Debug, Clone, PartialEq)]
struct DirtyEntry {
    pending: Value,
    previous: Option<Value>,
    staged_at: Instant,
}

// ============================================================================
// PropertyStore
// ============================================================================

/// Authoritative property map for one device
///
/// Owned exclusively by the engine instance; not shared across devices.
/// All mutating operations return the change events they produced instead
/// of invoking listeners themselves, so the caller controls dispatch order
/// and can issue transport calls without holding any lock.
#[derive(Debug)]
pub struct PropertyStore {
    config: StoreConfig,
    data: HashMap<Property, Value>,
    dirty: HashMap<Property, DirtyEntry>,
}

impl PropertyStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            data: HashMap::new(),
            dirty: HashMap::new(),
        }
    }

    /// Current committed (or optimistically staged) value
    pub fn value(&self, property: Property) -> Option<&Value> {
        self.data.get(&property)
    }

    /// Integer view of a property, coercing bools and numeric strings
    pub fn int_value(&self, property: Property) -> Option<i64> {
        self.value(property).and_then(Value::as_int)
    }

    /// Boolean view of a property
    pub fn bool_value(&self, property: Property) -> Option<bool> {
        self.value(property).and_then(Value::as_bool)
    }

    pub fn contains(&self, property: Property) -> bool {
        self.data.contains_key(&property)
    }

    /// Number of writes still awaiting confirmation
    pub fn pending_writes(&self) -> usize {
        self.dirty.len()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Drop all pending-write tracking (used after a reconnect, when any
    /// in-flight write is unaccounted for anyway)
    pub fn clear_pending(&mut self) {
        self.dirty.clear();
    }

    // ------------------------------------------------------------------
    // Poll reconciliation
    // ------------------------------------------------------------------

    /// Apply one batch of polled results
    pub fn apply(&mut self, batch: &[PollSample]) -> ApplyOutcome {
        self.apply_at(batch, Instant::now())
    }

    /// Apply one batch of polled results at an explicit instant
    ///
    /// For each sample: a contradicting value inside the discard window is
    /// dropped (stale read from before the write), clearing the dirty
    /// entry either way; otherwise the value is committed and a change
    /// event is produced if it differs from the stored one. Unavailable
    /// samples are skipped.
    pub fn apply_at(&mut self, batch: &[PollSample], now: Instant) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();

        for sample in batch {
            let property = sample.property;
            let value = match &sample.value {
                Some(value) => value.clone(),
                None => {
                    debug!(?property, "property not available");
                    continue;
                }
            };

            if let Some(entry) = self.dirty.remove(&property) {
                if entry.pending != value
                    && now.duration_since(entry.staged_at) < self.config.discard_window
                {
                    info!(?property, pending = %entry.pending, polled = %value,
                        "discarding stale polled value");
                    continue;
                }
            }

            let previous = self.data.get(&property).cloned();
            if previous.as_ref() == Some(&value) {
                continue;
            }

            let custom = self.config.custom.contains(&property);
            if !self.config.silent.contains(&property) {
                outcome.changed = true;
            }
            if !custom {
                match &previous {
                    Some(previous) => info!(?property, %previous, new = %value, "property changed"),
                    None => info!(?property, new = %value, "property added"),
                }
            }

            self.data.insert(property, value);
            outcome.events.push(ChangeEvent { property, previous, custom });
        }

        outcome
    }

    // ------------------------------------------------------------------
    // Optimistic writes
    // ------------------------------------------------------------------

    /// Stage a local write optimistically
    pub fn stage_dirty(&mut self, property: Property, value: Value) -> Option<StagedWrite> {
        self.stage_dirty_at(property, value, Instant::now())
    }

    /// Stage a local write optimistically at an explicit instant
    ///
    /// The new value is written immediately so readers and listeners see it
    /// before the device confirms. Returns `None` when the stored value
    /// already equals the write (nothing to send). A property in the
    /// undirtied set is updated but not tracked; everything else gets a
    /// dirty entry, replacing any prior one for the same property.
    pub fn stage_dirty_at(
        &mut self,
        property: Property,
        value: Value,
        now: Instant,
    ) -> Option<StagedWrite> {
        let previous = self.data.get(&property).cloned();
        if previous.as_ref() == Some(&value) {
            return None;
        }

        if !self.config.undirtied.contains(&property) {
            self.dirty.insert(
                property,
                DirtyEntry {
                    pending: value.clone(),
                    previous: previous.clone(),
                    staged_at: now,
                },
            );
        }

        self.data.insert(property, value);
        let custom = self.config.custom.contains(&property);
        Some(StagedWrite {
            previous: previous.clone(),
            event: ChangeEvent { property, previous, custom },
        })
    }

    /// Mark a staged write acknowledged by the device
    pub fn commit(&mut self, property: Property) {
        self.commit_at(property, Instant::now());
    }

    /// Mark a staged write acknowledged by the device, restarting its clock
    ///
    /// The optimistic value stays in place and the entry stays armed: a
    /// poll that was already in flight when the write went out can still
    /// deliver the pre-write value after the acknowledgement, so discard
    /// protection must outlive the ack. Restarting the clock also counts
    /// the silent-ignore (restore) window from the moment the device
    /// accepted the write rather than from when it was staged.
    pub fn commit_at(&mut self, property: Property, now: Instant) {
        if let Some(entry) = self.dirty.get_mut(&property) {
            entry.staged_at = now;
        }
    }

    /// Undo a staged write after the device rejected it
    ///
    /// Restores the pre-write value and returns the change event to
    /// dispatch, or `None` if nothing was pending.
    pub fn rollback(&mut self, property: Property) -> Option<ChangeEvent> {
        let entry = self.dirty.remove(&property)?;
        let staged = self.data.get(&property).cloned();
        match entry.previous {
            Some(previous) => {
                self.data.insert(property, previous);
            }
            None => {
                self.data.remove(&property);
            }
        }
        Some(ChangeEvent {
            property,
            previous: staged,
            custom: self.config.custom.contains(&property),
        })
    }

    /// Revert writes the device silently ignored
    ///
    /// Any dirty entry older than the restore window whose pending value
    /// was never superseded by a real poll is rolled back to its pre-write
    /// value, producing one change event per reverted property. Entries
    /// whose stored value has since moved on are simply dropped.
    pub fn sweep_restore(&mut self) -> Vec<ChangeEvent> {
        self.sweep_restore_at(Instant::now())
    }

    /// Revert silently ignored writes, judged at an explicit instant
    pub fn sweep_restore_at(&mut self, now: Instant) -> Vec<ChangeEvent> {
        let expired: Vec<Property> = self
            .dirty
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.staged_at) >= self.config.restore_window)
            .map(|(property, _)| *property)
            .collect();

        let mut events = Vec::new();
        for property in expired {
            let entry = match self.dirty.remove(&property) {
                Some(entry) => entry,
                None => continue,
            };
            let Some(previous) = entry.previous else {
                continue;
            };
            let stored = self.data.get(&property);
            if stored.is_none() || stored == Some(&entry.pending) {
                info!(?property, restored = %previous, ignored = %entry.pending,
                    "restoring value for silently ignored write");
                let staged = self.data.insert(property, previous);
                events.push(ChangeEvent {
                    property,
                    previous: staged,
                    custom: self.config.custom.contains(&property),
                });
            }
        }
        events
    }
}

impl Default for PropertyStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PropertyStore {
        PropertyStore::default()
    }

    fn sample(property: Property, value: i64) -> PollSample {
        PollSample { property, value: Some(Value::Int(value)) }
    }

    #[test]
    fn test_apply_commits_and_reports_changes() {
        let mut store = store();
        let outcome = store.apply(&[sample(Property::BatteryLevel, 80)]);

        assert_eq!(store.int_value(Property::BatteryLevel), Some(80));
        assert!(outcome.changed);
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].previous, None);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut store = store();
        let first = store.apply(&[sample(Property::BatteryLevel, 80)]);
        let second = store.apply(&[sample(Property::BatteryLevel, 80)]);

        assert_eq!(first.events.len(), 1);
        assert!(second.events.is_empty());
        assert!(!second.changed);
    }

    #[test]
    fn test_change_event_carries_previous_value() {
        let mut store = store();
        store.apply(&[sample(Property::BatteryLevel, 80)]);
        let outcome = store.apply(&[sample(Property::BatteryLevel, 75)]);

        assert_eq!(outcome.events[0].previous, Some(Value::Int(80)));
    }

    #[test]
    fn test_unavailable_samples_are_skipped() {
        let mut store = store();
        let outcome = store.apply(&[PollSample { property: Property::Volume, value: None }]);
        assert!(outcome.events.is_empty());
        assert!(!store.contains(Property::Volume));
    }

    #[test]
    fn test_silent_property_does_not_raise_changed() {
        let mut store = store();
        let outcome = store.apply(&[PollSample {
            property: Property::MapList,
            value: Some(Value::Str("[]".into())),
        }]);

        assert!(!outcome.changed);
        assert_eq!(outcome.events.len(), 1);
        assert!(outcome.events[0].custom);
    }

    #[test]
    fn test_poll_inside_discard_window_is_discarded() {
        let mut store = store();
        let t0 = Instant::now();
        store.apply_at(&[sample(Property::BatteryLevel, 60)], t0);
        store.stage_dirty_at(Property::BatteryLevel, Value::Int(80), t0);

        // Stale echo two seconds later: staged value wins
        let outcome = store.apply_at(&[sample(Property::BatteryLevel, 60)], t0 + Duration::from_secs(2));
        assert!(outcome.events.is_empty());
        assert_eq!(store.int_value(Property::BatteryLevel), Some(80));
        // Entry is cleared either way; no further protection
        assert_eq!(store.pending_writes(), 0);
    }

    #[test]
    fn test_poll_after_discard_window_wins() {
        let mut store = store();
        let t0 = Instant::now();
        store.apply_at(&[sample(Property::BatteryLevel, 60)], t0);
        store.stage_dirty_at(Property::BatteryLevel, Value::Int(80), t0);

        let outcome = store.apply_at(&[sample(Property::BatteryLevel, 61)], t0 + Duration::from_secs(7));
        assert_eq!(store.int_value(Property::BatteryLevel), Some(61));
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].previous, Some(Value::Int(80)));
        assert_eq!(store.pending_writes(), 0);
    }

    #[test]
    fn test_poll_confirming_pending_value_clears_entry() {
        let mut store = store();
        let t0 = Instant::now();
        store.stage_dirty_at(Property::Volume, Value::Int(55), t0);

        let outcome = store.apply_at(&[sample(Property::Volume, 55)], t0 + Duration::from_secs(1));
        assert!(outcome.events.is_empty());
        assert_eq!(store.pending_writes(), 0);

        // The write is confirmed; restore sweep must not touch it
        let restored = store.sweep_restore_at(t0 + Duration::from_secs(20));
        assert!(restored.is_empty());
        assert_eq!(store.int_value(Property::Volume), Some(55));
    }

    #[test]
    fn test_stage_returns_previous_and_event() {
        let mut store = store();
        store.apply(&[sample(Property::Volume, 30)]);

        let staged = store.stage_dirty(Property::Volume, Value::Int(70)).unwrap();
        assert_eq!(staged.previous, Some(Value::Int(30)));
        assert_eq!(staged.event.previous, Some(Value::Int(30)));
        assert_eq!(store.int_value(Property::Volume), Some(70));
    }

    #[test]
    fn test_stage_same_value_is_a_no_op() {
        let mut store = store();
        store.apply(&[sample(Property::Volume, 30)]);
        assert!(store.stage_dirty(Property::Volume, Value::Int(30)).is_none());
        assert_eq!(store.pending_writes(), 0);
    }

    #[test]
    fn test_restage_replaces_prior_entry() {
        let mut store = store();
        let t0 = Instant::now();
        store.apply_at(&[sample(Property::Volume, 30)], t0);
        store.stage_dirty_at(Property::Volume, Value::Int(50), t0);
        store.stage_dirty_at(Property::Volume, Value::Int(70), t0 + Duration::from_secs(1));

        assert_eq!(store.pending_writes(), 1);
        // Restore after timeout reverts to the value seen at the second stage
        let events = store.sweep_restore_at(t0 + Duration::from_secs(20));
        assert_eq!(events.len(), 1);
        assert_eq!(store.int_value(Property::Volume), Some(50));
    }

    #[test]
    fn test_undirtied_property_is_not_tracked() {
        let mut store = store();
        store.apply(&[sample(Property::TaskStatus, 0)]);
        let staged = store.stage_dirty(Property::TaskStatus, Value::Int(1)).unwrap();

        assert_eq!(staged.previous, Some(Value::Int(0)));
        assert_eq!(store.pending_writes(), 0);
        // Any poll overwrites immediately, window or not
        store.apply(&[sample(Property::TaskStatus, 0)]);
        assert_eq!(store.int_value(Property::TaskStatus), Some(0));
    }

    #[test]
    fn test_rollback_restores_previous_value() {
        let mut store = store();
        store.apply(&[sample(Property::Volume, 30)]);
        store.stage_dirty(Property::Volume, Value::Int(70));

        let event = store.rollback(Property::Volume).unwrap();
        assert_eq!(store.int_value(Property::Volume), Some(30));
        assert_eq!(event.previous, Some(Value::Int(70)));
        assert_eq!(store.pending_writes(), 0);
    }

    #[test]
    fn test_rollback_of_first_write_removes_value() {
        let mut store = store();
        store.stage_dirty(Property::Volume, Value::Int(70));
        store.rollback(Property::Volume);
        assert!(!store.contains(Property::Volume));
    }

    #[test]
    fn test_sweep_restores_unconfirmed_write_once() {
        let mut store = store();
        let t0 = Instant::now();
        store.apply_at(&[sample(Property::Volume, 30)], t0);
        store.stage_dirty_at(Property::Volume, Value::Int(70), t0);

        // Before the window: nothing happens
        assert!(store.sweep_restore_at(t0 + Duration::from_secs(10)).is_empty());

        // Past the window: exactly one change event, previous = staged value
        let events = store.sweep_restore_at(t0 + Duration::from_secs(16));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].previous, Some(Value::Int(70)));
        assert_eq!(store.int_value(Property::Volume), Some(30));

        // Second sweep finds nothing
        assert!(store.sweep_restore_at(t0 + Duration::from_secs(30)).is_empty());
    }

    #[test]
    fn test_commit_restarts_protection_clock() {
        let mut store = store();
        let t0 = Instant::now();
        store.apply_at(&[sample(Property::Volume, 30)], t0);
        store.stage_dirty_at(Property::Volume, Value::Int(70), t0);

        // Ack arrives at t+4; a stale echo at t+8 is still inside the
        // window counted from the ack
        store.commit_at(Property::Volume, t0 + Duration::from_secs(4));
        store.apply_at(&[sample(Property::Volume, 30)], t0 + Duration::from_secs(8));
        assert_eq!(store.int_value(Property::Volume), Some(70));
    }

    #[test]
    fn test_clear_pending_disarms_protection() {
        let mut store = store();
        let t0 = Instant::now();
        store.stage_dirty_at(Property::Volume, Value::Int(70), t0);
        store.clear_pending();

        store.apply_at(&[sample(Property::Volume, 30)], t0 + Duration::from_secs(1));
        assert_eq!(store.int_value(Property::Volume), Some(30));
    }
}
