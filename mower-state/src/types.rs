//! Typed views of raw device codes
//!
//! Raw property values are integer codes defined by the device firmware.
//! Each enum here mirrors one code table; decoding is total, with codes
//! outside the table collapsing to `Unknown` so a firmware update can never
//! break the engine. Newer firmware renumbered part of the state table, so
//! decoding the state code needs the device generation (see
//! [`MowerState::from_code`]).

use tracing::debug;

// ============================================================================
// Capabilities
// ============================================================================

/// Feature switches that vary per device generation
///
/// Derived from the device model at session setup, fixed afterwards. The
/// interpreter and the dispatcher consult these instead of probing the
/// device.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceCapabilities {
    /// Device supports cruising (point/path navigation) natively
    pub cruising: bool,
    /// Device reports state with the renumbered code table
    pub new_state: bool,
    /// Device supports cloud map backup and recovery
    pub backup_map: bool,
    /// Device supports per-segment cleaning customization
    pub custom_cleaning_mode: bool,
}

// ============================================================================
// Coordinate-cruise emulation
// ============================================================================

/// Parameters of an emulated go-to-coordinate task
///
/// Devices without native cruising run a minimal zone task around the
/// target instead; while these settings are present, zone-task codes are
/// reinterpreted as cruising.
#[derive(Debug, Clone, PartialEq)]
pub struct GoToZoneSettings {
    pub x: i32,
    pub y: i32,
    /// Stop the device once the zone is reached
    pub stop: bool,
    pub cleaning_mode: Option<i32>,
    /// Edge length of the emulated zone, in map units
    pub size: i32,
}

// ============================================================================
// State
// ============================================================================

/// Overall device state (renumbered table used by current firmware)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MowerState {
    Unknown,
    Mowing,
    Idle,
    Paused,
    Error,
    Returning,
    Charging,
    Building,
    ChargingCompleted,
    Upgrading,
    CleanSummon,
    StationReset,
    RemoteControl,
    SmartCharging,
    SecondCleaning,
    HumanFollowing,
    SpotCleaning,
    WaitingForTask,
    StationCleaning,
    Shortcut,
    Monitoring,
    MonitoringPaused,
}

impl MowerState {
    /// Decode a raw state code
    ///
    /// Older firmware numbers the codes above 18 differently; `new_state`
    /// selects the table. Codes 18 and below are identical in both.
    pub fn from_code(code: i64, new_state: bool) -> Self {
        let code = if !new_state && code > 18 {
            match code {
                19 => 23, // remote control
                21 => 98, // monitoring
                26 => 24, // smart charging
                other => other,
            }
        } else {
            code
        };
        match code {
            1 => MowerState::Mowing,
            2 => MowerState::Idle,
            3 => MowerState::Paused,
            4 => MowerState::Error,
            5 => MowerState::Returning,
            6 => MowerState::Charging,
            11 => MowerState::Building,
            13 => MowerState::ChargingCompleted,
            14 => MowerState::Upgrading,
            15 => MowerState::CleanSummon,
            16 => MowerState::StationReset,
            23 => MowerState::RemoteControl,
            24 => MowerState::SmartCharging,
            25 => MowerState::SecondCleaning,
            26 => MowerState::HumanFollowing,
            27 => MowerState::SpotCleaning,
            29 => MowerState::WaitingForTask,
            30 => MowerState::StationCleaning,
            97 => MowerState::Shortcut,
            98 => MowerState::Monitoring,
            99 => MowerState::MonitoringPaused,
            other => {
                debug!(code = other, "state code not supported");
                MowerState::Unknown
            }
        }
    }
}

// ============================================================================
// Status
// ============================================================================

/// Activity status, the primary input to the derived predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MowerStatus {
    Unknown,
    Idle,
    Paused,
    Cleaning,
    BackHome,
    PartCleaning,
    FollowWall,
    Charging,
    Ota,
    Fct,
    WifiSet,
    PowerOff,
    Factory,
    Error,
    RemoteControl,
    Sleeping,
    SelfRepair,
    FactoryFunctionTest,
    Standby,
    SegmentCleaning,
    ZoneCleaning,
    SpotCleaning,
    FastMapping,
    CruisingPath,
    CruisingPoint,
    SummonClean,
    Shortcut,
    PersonFollow,
}

impl MowerStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => MowerStatus::Idle,
            1 => MowerStatus::Paused,
            2 => MowerStatus::Cleaning,
            3 => MowerStatus::BackHome,
            4 => MowerStatus::PartCleaning,
            5 => MowerStatus::FollowWall,
            6 => MowerStatus::Charging,
            7 => MowerStatus::Ota,
            8 => MowerStatus::Fct,
            9 => MowerStatus::WifiSet,
            10 => MowerStatus::PowerOff,
            11 => MowerStatus::Factory,
            12 => MowerStatus::Error,
            13 => MowerStatus::RemoteControl,
            14 => MowerStatus::Sleeping,
            15 => MowerStatus::SelfRepair,
            16 => MowerStatus::FactoryFunctionTest,
            17 => MowerStatus::Standby,
            18 => MowerStatus::SegmentCleaning,
            19 => MowerStatus::ZoneCleaning,
            20 => MowerStatus::SpotCleaning,
            21 => MowerStatus::FastMapping,
            22 => MowerStatus::CruisingPath,
            23 => MowerStatus::CruisingPoint,
            24 => MowerStatus::SummonClean,
            25 => MowerStatus::Shortcut,
            26 => MowerStatus::PersonFollow,
            other => {
                debug!(code = other, "status code not supported");
                MowerStatus::Unknown
            }
        }
    }
}

// ============================================================================
// Task status
// ============================================================================

/// Kind and phase of the task the device is executing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Unknown,
    Completed,
    AutoCleaning,
    ZoneCleaning,
    SegmentCleaning,
    SpotCleaning,
    FastMapping,
    AutoCleaningPaused,
    ZoneCleaningPaused,
    SegmentCleaningPaused,
    SpotCleaningPaused,
    MapCleaningPaused,
    DockingPaused,
    AutoDockingPaused,
    SegmentDockingPaused,
    ZoneDockingPaused,
    CruisingPath,
    CruisingPathPaused,
    CruisingPoint,
    CruisingPointPaused,
    SummonCleanPaused,
}

impl TaskStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => TaskStatus::Completed,
            1 => TaskStatus::AutoCleaning,
            2 => TaskStatus::ZoneCleaning,
            3 => TaskStatus::SegmentCleaning,
            4 => TaskStatus::SpotCleaning,
            5 => TaskStatus::FastMapping,
            6 => TaskStatus::AutoCleaningPaused,
            7 => TaskStatus::ZoneCleaningPaused,
            8 => TaskStatus::SegmentCleaningPaused,
            9 => TaskStatus::SpotCleaningPaused,
            10 => TaskStatus::MapCleaningPaused,
            11 => TaskStatus::DockingPaused,
            16 => TaskStatus::AutoDockingPaused,
            17 => TaskStatus::SegmentDockingPaused,
            18 => TaskStatus::ZoneDockingPaused,
            20 => TaskStatus::CruisingPath,
            21 => TaskStatus::CruisingPathPaused,
            22 => TaskStatus::CruisingPoint,
            23 => TaskStatus::CruisingPointPaused,
            24 => TaskStatus::SummonCleanPaused,
            other => {
                debug!(code = other, "task status code not supported");
                TaskStatus::Unknown
            }
        }
    }
}

// ============================================================================
// Charging status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChargingStatus {
    Unknown,
    Charging,
    NotCharging,
    ChargingCompleted,
    ReturnToCharge,
}

impl ChargingStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => ChargingStatus::Charging,
            2 => ChargingStatus::NotCharging,
            3 => ChargingStatus::ChargingCompleted,
            5 => ChargingStatus::ReturnToCharge,
            other => {
                debug!(code = other, "charging status code not supported");
                ChargingStatus::Unknown
            }
        }
    }
}

// ============================================================================
// Relocation status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelocationStatus {
    Unknown,
    Located,
    Locating,
    Failed,
    Success,
}

impl RelocationStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => RelocationStatus::Located,
            1 => RelocationStatus::Locating,
            10 => RelocationStatus::Failed,
            11 => RelocationStatus::Success,
            other => {
                debug!(code = other, "relocation status code not supported");
                RelocationStatus::Unknown
            }
        }
    }
}

// ============================================================================
// Map backup / recovery
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapBackupStatus {
    Unknown,
    Idle,
    Running,
    Success,
    Fail,
}

impl MapBackupStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => MapBackupStatus::Idle,
            2 => MapBackupStatus::Running,
            3 => MapBackupStatus::Success,
            4 => MapBackupStatus::Fail,
            _ => MapBackupStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapRecoveryStatus {
    Unknown,
    Idle,
    Running,
    Success,
    Fail,
}

impl MapRecoveryStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => MapRecoveryStatus::Idle,
            2 => MapRecoveryStatus::Running,
            3 => MapRecoveryStatus::Success,
            4 | 5 => MapRecoveryStatus::Fail,
            _ => MapRecoveryStatus::Unknown,
        }
    }
}

// ============================================================================
// Error codes
// ============================================================================

/// Raw fault code, kept as a transparent wrapper
///
/// The table is large and grows with firmware releases; the engine only
/// needs to classify codes, not enumerate them, so unknown codes stay
/// representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub i64);

impl ErrorCode {
    /// The device has never reported a code
    pub const UNKNOWN: ErrorCode = ErrorCode(-1);
    pub const NO_ERROR: ErrorCode = ErrorCode(0);
    pub const BATTERY_LOW: ErrorCode = ErrorCode(20);
    pub const BLOCKED: ErrorCode = ErrorCode(47);
    pub const LOW_BATTERY_TURN_OFF: ErrorCode = ErrorCode(75);
    pub const STATION_DISCONNECTED: ErrorCode = ErrorCode(117);
    pub const UNKNOWN_WARNING_2: ErrorCode = ErrorCode(122);
    pub const SELF_TEST_FAILED: ErrorCode = ErrorCode(123);
    pub const RETURN_TO_CHARGE_FAILED: ErrorCode = ErrorCode(1000);

    /// Dismissable warnings, reported but not surfaced as faults
    pub const WARNING_CODES: &'static [ErrorCode] = &[
        ErrorCode::BLOCKED,
        ErrorCode::STATION_DISCONNECTED,
        ErrorCode::SELF_TEST_FAILED,
        ErrorCode::LOW_BATTERY_TURN_OFF,
        ErrorCode::UNKNOWN_WARNING_2,
    ];

    pub fn is_warning(self) -> bool {
        self.0 > 0 && ErrorCode::WARNING_CODES.contains(&self)
    }

    /// True for codes that should surface as a device fault
    ///
    /// Warnings and the low-battery code do not count: low battery
    /// announces an automatic recharge, not a fault.
    pub fn is_error(self) -> bool {
        self.0 > 0 && !self.is_warning() && self != ErrorCode::BATTERY_LOW
    }
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        ErrorCode(code)
    }
}

// ============================================================================
// Shortcuts
// ============================================================================

/// One user-defined shortcut routine
#[derive(Debug, Clone, PartialEq)]
pub struct Shortcut {
    pub id: i64,
    pub name: String,
    pub running: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_new_table() {
        assert_eq!(MowerState::from_code(1, true), MowerState::Mowing);
        assert_eq!(MowerState::from_code(23, true), MowerState::RemoteControl);
        assert_eq!(MowerState::from_code(98, true), MowerState::Monitoring);
    }

    #[test]
    fn test_state_legacy_remap() {
        assert_eq!(MowerState::from_code(19, false), MowerState::RemoteControl);
        assert_eq!(MowerState::from_code(21, false), MowerState::Monitoring);
        assert_eq!(MowerState::from_code(26, false), MowerState::SmartCharging);
        // Codes up to 18 are shared between the tables
        assert_eq!(MowerState::from_code(6, false), MowerState::Charging);
    }

    #[test]
    fn test_unknown_codes_fall_back() {
        assert_eq!(MowerState::from_code(500, true), MowerState::Unknown);
        assert_eq!(MowerStatus::from_code(-3), MowerStatus::Unknown);
        assert_eq!(TaskStatus::from_code(99), TaskStatus::Unknown);
        assert_eq!(ChargingStatus::from_code(4), ChargingStatus::Unknown);
    }

    #[test]
    fn test_error_classification() {
        assert!(!ErrorCode::NO_ERROR.is_error());
        assert!(!ErrorCode::NO_ERROR.is_warning());
        assert!(ErrorCode(3).is_error());
        assert!(!ErrorCode::BATTERY_LOW.is_error());
        assert!(ErrorCode::BLOCKED.is_warning());
        assert!(!ErrorCode::BLOCKED.is_error());
        assert!(ErrorCode::RETURN_TO_CHARGE_FAILED.is_error());
    }

    #[test]
    fn test_map_recovery_fail_codes_collapse() {
        assert_eq!(MapRecoveryStatus::from_code(4), MapRecoveryStatus::Fail);
        assert_eq!(MapRecoveryStatus::from_code(5), MapRecoveryStatus::Fail);
        assert_eq!(MapRecoveryStatus::from_code(2), MapRecoveryStatus::Running);
    }
}
