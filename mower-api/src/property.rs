//! Property and action identifiers with their transport addresses
//!
//! Every value the device exposes is addressed two ways: by a stable
//! engine-side identifier (the enum discriminant, used as the `did` in
//! requests) and by a `(service, property)` pair on the wire. The engine
//! only ever reasons about the enum; the address pair is handed to the
//! transport verbatim.

use serde::{Deserialize, Serialize};

// ============================================================================
// Addresses
// ============================================================================

/// Wire address of a readable/writable property: `(siid, piid)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyAddress {
    pub siid: u16,
    pub piid: u16,
}

/// Wire address of an invocable action: `(siid, aiid)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionAddress {
    pub siid: u16,
    pub aiid: u16,
}

const fn addr(siid: u16, piid: u16) -> PropertyAddress {
    PropertyAddress { siid, piid }
}

const fn action_addr(siid: u16, aiid: u16) -> ActionAddress {
    ActionAddress { siid, aiid }
}

// ============================================================================
// Properties
// ============================================================================

/// Device properties known to the engine
///
/// Discriminants are the stable `did` values used in batched requests and
/// in the engine's property store. The set is closed on purpose: values for
/// identifiers outside this set are dropped at the transport boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u16)]
pub enum Property {
    State = 0,
    Error = 1,
    BatteryLevel = 2,
    ChargingStatus = 3,
    OffPeakCharging = 4,
    Status = 5,
    CleaningTime = 6,
    CleanedArea = 7,
    TaskStatus = 11,
    ResumeCleaning = 15,
    SerialNumber = 18,
    CleaningPaused = 21,
    RelocationStatus = 24,
    ObstacleAvoidance = 25,
    AiDetection = 26,
    CleaningMode = 27,
    CustomizedCleaning = 30,
    ChildLock = 31,
    CleaningCancel = 34,
    WarnStatus = 39,
    ScheduledClean = 51,
    Shortcuts = 52,
    IntelligentRecognition = 53,
    AutoSwitchSettings = 54,
    TaskType = 62,
    CleaningProgress = 67,
    Dnd = 70,
    DndStart = 71,
    DndEnd = 72,
    DndTask = 73,
    MultiFloorMap = 80,
    MapList = 81,
    RecoveryMapList = 82,
    MapRecoveryStatus = 84,
    MapBackupStatus = 86,
    Volume = 88,
    VoicePacketId = 89,
    VoiceAssistant = 92,
    VoiceAssistantLanguage = 93,
    Timezone = 98,
    CruiseSchedule = 102,
    BladesTimeLeft = 103,
    BladesLeft = 104,
    SideBrushTimeLeft = 105,
    SideBrushLeft = 106,
    FilterLeft = 107,
    FilterTimeLeft = 108,
    FirstCleaningDate = 109,
    TotalCleaningTime = 110,
    CleaningCount = 111,
    TotalCleanedArea = 112,
    MapSaving = 115,
    SensorDirtyLeft = 120,
    SensorDirtyTimeLeft = 121,
    CameraLightBrightness = 172,
}

impl Property {
    /// Stable identifier used as the `did` in transport requests
    pub const fn id(self) -> u16 {
        self as u16
    }

    /// Wire address for this property, if the device maps it
    ///
    /// Properties without an address are engine-internal or delivered only
    /// through pushed messages and cannot be requested directly.
    pub const fn address(self) -> Option<PropertyAddress> {
        Some(match self {
            Property::State => addr(2, 1),
            Property::Error => addr(2, 2),
            Property::BatteryLevel => addr(3, 1),
            Property::ChargingStatus => addr(3, 2),
            Property::OffPeakCharging => addr(3, 3),
            Property::Status => addr(4, 1),
            Property::CleaningTime => addr(4, 2),
            Property::CleanedArea => addr(4, 3),
            Property::TaskStatus => addr(4, 7),
            Property::ResumeCleaning => addr(4, 11),
            Property::SerialNumber => addr(4, 14),
            Property::CleaningPaused => addr(4, 17),
            Property::RelocationStatus => addr(4, 20),
            Property::ObstacleAvoidance => addr(4, 21),
            Property::AiDetection => addr(4, 22),
            Property::CleaningMode => addr(4, 23),
            Property::CustomizedCleaning => addr(4, 26),
            Property::ChildLock => addr(4, 27),
            Property::CleaningCancel => addr(4, 30),
            Property::WarnStatus => addr(4, 35),
            Property::ScheduledClean => addr(4, 47),
            Property::Shortcuts => addr(4, 48),
            Property::IntelligentRecognition => addr(4, 49),
            Property::AutoSwitchSettings => addr(4, 50),
            Property::TaskType => addr(4, 58),
            Property::CleaningProgress => addr(4, 63),
            Property::Dnd => addr(5, 1),
            Property::DndStart => addr(5, 2),
            Property::DndEnd => addr(5, 3),
            Property::DndTask => addr(5, 4),
            Property::MultiFloorMap => addr(6, 7),
            Property::MapList => addr(6, 8),
            Property::RecoveryMapList => addr(6, 9),
            Property::MapRecoveryStatus => addr(6, 11),
            Property::MapBackupStatus => addr(6, 14),
            Property::Volume => addr(7, 1),
            Property::VoicePacketId => addr(7, 2),
            Property::VoiceAssistant => addr(7, 5),
            Property::VoiceAssistantLanguage => addr(7, 10),
            Property::Timezone => addr(8, 1),
            Property::CruiseSchedule => addr(8, 5),
            Property::BladesTimeLeft => addr(9, 1),
            Property::BladesLeft => addr(9, 2),
            Property::SideBrushTimeLeft => addr(10, 1),
            Property::SideBrushLeft => addr(10, 2),
            Property::FilterLeft => addr(11, 1),
            Property::FilterTimeLeft => addr(11, 2),
            Property::FirstCleaningDate => addr(12, 1),
            Property::TotalCleaningTime => addr(12, 2),
            Property::CleaningCount => addr(12, 3),
            Property::TotalCleanedArea => addr(12, 4),
            Property::MapSaving => addr(13, 1),
            Property::SensorDirtyLeft => addr(16, 1),
            Property::SensorDirtyTimeLeft => addr(16, 2),
            Property::CameraLightBrightness => addr(10001, 5),
        })
    }

    /// Resolve an incoming `did` back to a property
    pub fn from_id(id: u16) -> Option<Self> {
        ALL_PROPERTIES.iter().copied().find(|p| p.id() == id)
    }

    /// Resolve a wire address back to a property (for pushed messages)
    pub fn from_address(address: PropertyAddress) -> Option<Self> {
        ALL_PROPERTIES
            .iter()
            .copied()
            .find(|p| p.address() == Some(address))
    }
}

/// Every property the engine knows about, in identifier order
pub const ALL_PROPERTIES: &[Property] = &[
    Property::State,
    Property::Error,
    Property::BatteryLevel,
    Property::ChargingStatus,
    Property::OffPeakCharging,
    Property::Status,
    Property::CleaningTime,
    Property::CleanedArea,
    Property::TaskStatus,
    Property::ResumeCleaning,
    Property::SerialNumber,
    Property::CleaningPaused,
    Property::RelocationStatus,
    Property::ObstacleAvoidance,
    Property::AiDetection,
    Property::CleaningMode,
    Property::CustomizedCleaning,
    Property::ChildLock,
    Property::CleaningCancel,
    Property::WarnStatus,
    Property::ScheduledClean,
    Property::Shortcuts,
    Property::IntelligentRecognition,
    Property::AutoSwitchSettings,
    Property::TaskType,
    Property::CleaningProgress,
    Property::Dnd,
    Property::DndStart,
    Property::DndEnd,
    Property::DndTask,
    Property::MultiFloorMap,
    Property::MapList,
    Property::RecoveryMapList,
    Property::MapRecoveryStatus,
    Property::MapBackupStatus,
    Property::Volume,
    Property::VoicePacketId,
    Property::VoiceAssistant,
    Property::VoiceAssistantLanguage,
    Property::Timezone,
    Property::CruiseSchedule,
    Property::BladesTimeLeft,
    Property::BladesLeft,
    Property::SideBrushTimeLeft,
    Property::SideBrushLeft,
    Property::FilterLeft,
    Property::FilterTimeLeft,
    Property::FirstCleaningDate,
    Property::TotalCleaningTime,
    Property::CleaningCount,
    Property::TotalCleanedArea,
    Property::MapSaving,
    Property::SensorDirtyLeft,
    Property::SensorDirtyTimeLeft,
    Property::CameraLightBrightness,
];

// ============================================================================
// Actions
// ============================================================================

/// Device actions known to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    StartMowing,
    Pause,
    Dock,
    Stop,
    StartCustom,
    ClearWarning,
    RequestMap,
    UpdateMapData,
    BackupMap,
    Locate,
    TestSound,
    ResetBlades,
    ResetSideBrush,
    ResetFilter,
    ResetSensor,
}

impl Action {
    /// Wire address for this action
    pub const fn address(self) -> ActionAddress {
        match self {
            Action::StartMowing => action_addr(5, 1),
            Action::Pause => action_addr(5, 4),
            Action::Dock => action_addr(5, 3),
            Action::Stop => action_addr(5, 2),
            Action::StartCustom => action_addr(4, 1),
            Action::ClearWarning => action_addr(4, 3),
            Action::RequestMap => action_addr(6, 1),
            Action::UpdateMapData => action_addr(6, 2),
            Action::BackupMap => action_addr(6, 3),
            Action::Locate => action_addr(7, 1),
            Action::TestSound => action_addr(7, 2),
            Action::ResetBlades => action_addr(9, 1),
            Action::ResetSideBrush => action_addr(10, 1),
            Action::ResetFilter => action_addr(11, 1),
            Action::ResetSensor => action_addr(16, 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_ids_are_unique() {
        let mut ids: Vec<u16> = ALL_PROPERTIES.iter().map(|p| p.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), ALL_PROPERTIES.len());
    }

    #[test]
    fn test_from_id_round_trip() {
        for prop in ALL_PROPERTIES {
            assert_eq!(Property::from_id(prop.id()), Some(*prop));
        }
        assert_eq!(Property::from_id(9999), None);
    }

    #[test]
    fn test_status_addresses() {
        assert_eq!(Property::State.address(), Some(addr(2, 1)));
        assert_eq!(Property::Status.address(), Some(addr(4, 1)));
        assert_eq!(Property::TaskStatus.address(), Some(addr(4, 7)));
        assert_eq!(Property::ChargingStatus.address(), Some(addr(3, 2)));
    }

    #[test]
    fn test_action_addresses() {
        assert_eq!(Action::StartMowing.address(), action_addr(5, 1));
        assert_eq!(Action::Stop.address(), action_addr(5, 2));
        assert_eq!(Action::ClearWarning.address(), action_addr(4, 3));
    }
}
