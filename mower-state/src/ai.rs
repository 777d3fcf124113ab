//! AI obstacle-detection settings
//!
//! The detection property is one value with two firmware-dependent
//! encodings: an integer bitmask on newer firmware, a JSON object of named
//! switches on older firmware. Both normalize into the same flag map, so
//! consumers never see the encoding.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::value::Value;

/// One AI detection switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AiFlag {
    FurnitureDetection,
    ObstacleDetection,
    ObstaclePicture,
    FluidDetection,
    PetDetection,
    ObstacleImageUpload,
    Image,
    PetAvoidance,
    FuzzyObstacleDetection,
    PetPicture,
    PetFocusedDetection,
    LargeParticlesBoost,
    HumanDetection,
}

impl AiFlag {
    /// Bit assigned to this flag in the bitmask encoding, if any
    pub const fn bit(self) -> Option<u32> {
        Some(match self {
            AiFlag::FurnitureDetection => 1,
            AiFlag::ObstacleDetection => 2,
            AiFlag::ObstaclePicture => 4,
            AiFlag::FluidDetection => 8,
            AiFlag::PetDetection => 16,
            AiFlag::ObstacleImageUpload => 32,
            AiFlag::Image => 64,
            AiFlag::PetAvoidance => 128,
            AiFlag::FuzzyObstacleDetection => 256,
            AiFlag::PetPicture => 512,
            AiFlag::PetFocusedDetection => 1024,
            AiFlag::LargeParticlesBoost => 2048,
            AiFlag::HumanDetection => return None,
        })
    }

    /// Key naming this flag in the JSON encoding, if any
    pub const fn key(self) -> Option<&'static str> {
        Some(match self {
            AiFlag::ObstacleDetection => "obstacle_detect_switch",
            AiFlag::ObstacleImageUpload => "obstacle_app_display_switch",
            AiFlag::PetDetection => "whether_have_pet",
            AiFlag::HumanDetection => "human_detect_switch",
            AiFlag::FurnitureDetection => "furniture_detect_switch",
            AiFlag::FluidDetection => "fluid_detect_switch",
            _ => return None,
        })
    }

    const ALL: &'static [AiFlag] = &[
        AiFlag::FurnitureDetection,
        AiFlag::ObstacleDetection,
        AiFlag::ObstaclePicture,
        AiFlag::FluidDetection,
        AiFlag::PetDetection,
        AiFlag::ObstacleImageUpload,
        AiFlag::Image,
        AiFlag::PetAvoidance,
        AiFlag::FuzzyObstacleDetection,
        AiFlag::PetPicture,
        AiFlag::PetFocusedDetection,
        AiFlag::LargeParticlesBoost,
        AiFlag::HumanDetection,
    ];
}

/// Normalized AI detection settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AiSettings {
    flags: BTreeMap<AiFlag, bool>,
    /// True when the device used the bitmask encoding
    bitmask: bool,
}

impl AiSettings {
    /// Decode the raw detection property, whichever encoding it uses
    ///
    /// Returns `None` for values that are neither an integer nor a JSON
    /// object; such values are logged and ignored rather than clearing
    /// previously decoded settings.
    pub fn decode(raw: &Value) -> Option<Self> {
        match raw {
            Value::Int(mask) => Some(Self::from_bitmask(*mask)),
            Value::Bool(enabled) => Some(Self::from_bitmask(if *enabled {
                AiFlag::ObstacleDetection.bit().unwrap_or(0) as i64
            } else {
                0
            })),
            Value::Str(raw) => match serde_json::from_str::<JsonValue>(raw) {
                Ok(JsonValue::Object(settings)) => {
                    let mut flags = BTreeMap::new();
                    for flag in AiFlag::ALL {
                        if let Some(key) = flag.key() {
                            if let Some(value) = settings.get(key) {
                                flags.insert(*flag, truthy(value));
                            }
                        }
                    }
                    Some(Self { flags, bitmask: false })
                }
                _ => {
                    debug!(%raw, "unparseable detection settings");
                    None
                }
            },
        }
    }

    fn from_bitmask(mask: i64) -> Self {
        let mut flags = BTreeMap::new();
        for flag in AiFlag::ALL {
            if let Some(bit) = flag.bit() {
                flags.insert(*flag, mask & i64::from(bit) != 0);
            }
        }
        Self { flags, bitmask: true }
    }

    /// State of one switch; `None` when the encoding does not carry it
    pub fn get(&self, flag: AiFlag) -> Option<bool> {
        self.flags.get(&flag).copied()
    }

    pub fn enabled(&self, flag: AiFlag) -> bool {
        self.get(flag).unwrap_or(false)
    }

    pub fn flags(&self) -> &BTreeMap<AiFlag, bool> {
        &self.flags
    }

    /// Re-encode with one flag changed, in the encoding the device used
    pub fn encode_with(&self, flag: AiFlag, enabled: bool) -> Option<Value> {
        if self.bitmask {
            let mut mask: i64 = 0;
            for (f, on) in &self.flags {
                let on = if *f == flag { enabled } else { *on };
                if on {
                    mask |= i64::from(f.bit()?);
                }
            }
            if !self.flags.contains_key(&flag) {
                if enabled {
                    mask |= i64::from(flag.bit()?);
                }
            }
            Some(Value::Int(mask))
        } else {
            let key = flag.key()?;
            let mut settings = serde_json::Map::new();
            for (f, on) in &self.flags {
                if let Some(k) = f.key() {
                    settings.insert(k.to_string(), JsonValue::from(i32::from(*on)));
                }
            }
            settings.insert(key.to_string(), JsonValue::from(i32::from(enabled)));
            Some(Value::Str(JsonValue::Object(settings).to_string()))
        }
    }
}

fn truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_i64().unwrap_or(0) != 0,
        JsonValue::String(s) => s == "1" || s == "true",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmask_decoding() {
        let settings = AiSettings::decode(&Value::Int(2 | 16 | 2048)).unwrap();
        assert!(settings.enabled(AiFlag::ObstacleDetection));
        assert!(settings.enabled(AiFlag::PetDetection));
        assert!(settings.enabled(AiFlag::LargeParticlesBoost));
        assert!(!settings.enabled(AiFlag::FluidDetection));
        // No bit assigned in this encoding
        assert_eq!(settings.get(AiFlag::HumanDetection), None);
    }

    #[test]
    fn test_json_decoding() {
        let raw = Value::Str(
            r#"{"obstacle_detect_switch": 1, "whether_have_pet": 0, "human_detect_switch": 1}"#
                .into(),
        );
        let settings = AiSettings::decode(&raw).unwrap();
        assert!(settings.enabled(AiFlag::ObstacleDetection));
        assert!(!settings.enabled(AiFlag::PetDetection));
        assert!(settings.enabled(AiFlag::HumanDetection));
        // Key absent from the payload
        assert_eq!(settings.get(AiFlag::FluidDetection), None);
    }

    #[test]
    fn test_both_encodings_normalize_identically() {
        let mask = AiSettings::decode(&Value::Int(2)).unwrap();
        let json = AiSettings::decode(&Value::Str(r#"{"obstacle_detect_switch": 1}"#.into()))
            .unwrap();
        assert_eq!(mask.enabled(AiFlag::ObstacleDetection), true);
        assert_eq!(json.enabled(AiFlag::ObstacleDetection), true);
    }

    #[test]
    fn test_garbage_decodes_to_none() {
        assert_eq!(AiSettings::decode(&Value::Str("not json".into())), None);
        assert_eq!(AiSettings::decode(&Value::Str("[1, 2]".into())), None);
    }

    #[test]
    fn test_encode_with_flips_one_bit() {
        let settings = AiSettings::decode(&Value::Int(2 | 16)).unwrap();
        let encoded = settings.encode_with(AiFlag::PetDetection, false).unwrap();
        assert_eq!(encoded, Value::Int(2));
    }

    #[test]
    fn test_encode_with_keeps_json_encoding() {
        let settings = AiSettings::decode(&Value::Str(r#"{"obstacle_detect_switch": 0}"#.into()))
            .unwrap();
        let encoded = settings.encode_with(AiFlag::ObstacleDetection, true).unwrap();
        let reparsed = AiSettings::decode(&encoded).unwrap();
        assert!(reparsed.enabled(AiFlag::ObstacleDetection));
    }

    #[test]
    fn test_json_encoding_cannot_express_bit_only_flags() {
        let settings = AiSettings::decode(&Value::Str(r#"{"obstacle_detect_switch": 1}"#.into()))
            .unwrap();
        assert_eq!(settings.encode_with(AiFlag::LargeParticlesBoost, true), None);
    }
}
