use async_trait::async_trait;

use calibration_core::ports::LabwarePort;
use calibration_core::{LabwareError, TipRackGeometry};

/// (load name, display name, nominal tip length in mm)
const TIP_RACKS: &[(&str, &str, f64)] = &[
    ("opentrons_96_tiprack_20ul", "Opentrons 96 Tip Rack 20 µL", 39.2),
    ("opentrons_96_tiprack_300ul", "Opentrons 96 Tip Rack 300 µL", 59.3),
    ("opentrons_96_tiprack_1000ul", "Opentrons 96 Tip Rack 1000 µL", 88.0),
];

/// The standard tip racks, compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinTipRacks;

impl BuiltinTipRacks {
    pub fn load_names() -> impl Iterator<Item = &'static str> {
        TIP_RACKS.iter().map(|(name, _, _)| *name)
    }
}

#[async_trait]
impl LabwarePort for BuiltinTipRacks {
    async fn load_tip_rack(&self, load_name: &str) -> Result<TipRackGeometry, LabwareError> {
        TIP_RACKS
            .iter()
            .find(|(name, _, _)| *name == load_name)
            .map(|(name, display, length)| TipRackGeometry {
                load_name: name.to_string(),
                display_name: display.to_string(),
                tip_length: *length,
            })
            .ok_or_else(|| LabwareError::NotFound(load_name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_known_racks() {
        let racks = BuiltinTipRacks;
        let geometry = racks.load_tip_rack("opentrons_96_tiprack_1000ul").await.unwrap();
        assert_eq!(geometry.tip_length, 88.0);
        assert_eq!(BuiltinTipRacks::load_names().count(), 3);
    }

    #[tokio::test]
    async fn unknown_rack_is_not_found() {
        let err = BuiltinTipRacks.load_tip_rack("opentrons_96_tiprack_10ul").await.unwrap_err();
        assert!(matches!(err, LabwareError::NotFound(name) if name == "opentrons_96_tiprack_10ul"));
    }
}
