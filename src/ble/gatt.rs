//! GATT identities of the supported peripherals.

use uuid::Uuid;

/// Bluetooth base UUID `0000xxxx-0000-1000-8000-00805f9b34fb`
const BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5f9b_34fb;

/// Expand a 16-bit assigned number against the Bluetooth base UUID.
pub const fn short_uuid(short: u16) -> Uuid {
    Uuid::from_u128(BASE_UUID | ((short as u128) << 96))
}

pub const BODY_COMPOSITION_SERVICE: Uuid = short_uuid(0x181B);
pub const BODY_COMPOSITION_MEASUREMENT: Uuid = short_uuid(0x2A9C);
pub const BLOOD_PRESSURE_SERVICE: Uuid = short_uuid(0x1810);
pub const BLOOD_PRESSURE_MEASUREMENT: Uuid = short_uuid(0x2A35);

/// Decoder selected for a characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacteristicKind {
    BodyComposition,
    BloodPressure,
}

impl CharacteristicKind {
    pub fn from_uuid(uuid: &Uuid) -> Option<Self> {
        if *uuid == BODY_COMPOSITION_MEASUREMENT {
            Some(Self::BodyComposition)
        } else if *uuid == BLOOD_PRESSURE_MEASUREMENT {
            Some(Self::BloodPressure)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_uuid_expansion() {
        assert_eq!(
            BLOOD_PRESSURE_MEASUREMENT.to_string(),
            "00002a35-0000-1000-8000-00805f9b34fb"
        );
        assert_eq!(
            BODY_COMPOSITION_SERVICE.to_string(),
            "0000181b-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_kind_lookup() {
        assert_eq!(
            CharacteristicKind::from_uuid(&BODY_COMPOSITION_MEASUREMENT),
            Some(CharacteristicKind::BodyComposition)
        );
        assert_eq!(CharacteristicKind::from_uuid(&short_uuid(0x2A37)), None);
    }
}
