use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::types::Point;

/// Environment variable naming a JSON settings file.
pub const CONFIG_ENV: &str = "TIPCAL_CONFIG";

/// How `confirm_tip_attached` decides that a tip is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipVerification {
    /// Ask the hardware whether the instrument reports a tip.
    #[default]
    QueryHardware,
    /// Accept any tip that a prior `pick_up_tip` reported as picked up.
    TrustPickUp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationSettings {
    /// Nozzle position above the calibration block, deck coordinates.
    pub nozzle_reference_pose: Point,

    pub tip_verification: TipVerification,

    /// Maximum number of events kept per session history.
    pub history_capacity: usize,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            nozzle_reference_pose: Point::new(12.13, 9.0, 40.0),
            tip_verification: TipVerification::QueryHardware,
            history_capacity: 256,
        }
    }
}

impl CalibrationSettings {
    /// Load from `$TIPCAL_CONFIG` when set, otherwise use defaults.
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load_from(path.trim()),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let settings: Self = serde_json::from_str(&content)
            .with_context(|| format!("parsing settings in {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.nozzle_reference_pose.is_finite() {
            anyhow::bail!("nozzle_reference_pose must be finite");
        }
        if self.history_capacity == 0 {
            anyhow::bail!("history_capacity must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"tip_verification": "trust_pick_up"}}"#).unwrap();

        let settings = CalibrationSettings::load_from(file.path()).unwrap();
        assert_eq!(settings.tip_verification, TipVerification::TrustPickUp);
        assert_eq!(settings.history_capacity, 256);
        assert_eq!(settings.nozzle_reference_pose, Point::new(12.13, 9.0, 40.0));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"history_capacity": 0}}"#).unwrap();
        assert!(CalibrationSettings::load_from(file.path()).is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = CalibrationSettings::load_from("/nonexistent/tipcal.json").unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/tipcal.json"));
    }
}
