use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CalibrationError;
use crate::types::Point;

/// Names of the commands a client may send. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandName {
    LoadLabware,
    MoveToMeasureNozzleOffset,
    Jog,
    SaveNozzlePosition,
    PickUpTip,
    InvalidateTip,
    ConfirmTipAttached,
    SaveTipPosition,
    ExitSession,
}

impl CommandName {
    pub const ALL: [CommandName; 9] = [
        CommandName::LoadLabware,
        CommandName::MoveToMeasureNozzleOffset,
        CommandName::Jog,
        CommandName::SaveNozzlePosition,
        CommandName::PickUpTip,
        CommandName::InvalidateTip,
        CommandName::ConfirmTipAttached,
        CommandName::SaveTipPosition,
        CommandName::ExitSession,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::LoadLabware => "load_labware",
            CommandName::MoveToMeasureNozzleOffset => "move_to_measure_nozzle_offset",
            CommandName::Jog => "jog",
            CommandName::SaveNozzlePosition => "save_nozzle_position",
            CommandName::PickUpTip => "pick_up_tip",
            CommandName::InvalidateTip => "invalidate_tip",
            CommandName::ConfirmTipAttached => "confirm_tip_attached",
            CommandName::SaveTipPosition => "save_tip_position",
            CommandName::ExitSession => "exit_session",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandName {
    type Err = CalibrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandName::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CalibrationError::UnknownCommand(s.to_string()))
    }
}

/// A command together with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationCommand {
    LoadLabware,
    MoveToMeasureNozzleOffset,
    Jog { vector: Point },
    SaveNozzlePosition,
    PickUpTip,
    InvalidateTip,
    ConfirmTipAttached,
    SaveTipPosition,
    ExitSession,
}

#[derive(Debug, Deserialize)]
struct JogPayload {
    vector: [f64; 3],
}

impl CalibrationCommand {
    pub fn jog(x: f64, y: f64, z: f64) -> Self {
        CalibrationCommand::Jog { vector: Point::new(x, y, z) }
    }

    pub fn name(&self) -> CommandName {
        match self {
            CalibrationCommand::LoadLabware => CommandName::LoadLabware,
            CalibrationCommand::MoveToMeasureNozzleOffset => CommandName::MoveToMeasureNozzleOffset,
            CalibrationCommand::Jog { .. } => CommandName::Jog,
            CalibrationCommand::SaveNozzlePosition => CommandName::SaveNozzlePosition,
            CalibrationCommand::PickUpTip => CommandName::PickUpTip,
            CalibrationCommand::InvalidateTip => CommandName::InvalidateTip,
            CalibrationCommand::ConfirmTipAttached => CommandName::ConfirmTipAttached,
            CalibrationCommand::SaveTipPosition => CommandName::SaveTipPosition,
            CalibrationCommand::ExitSession => CommandName::ExitSession,
        }
    }

    /// Parse a wire-level `(name, payload)` pair.
    ///
    /// Payloads of commands that take none are ignored, so `{}` and `null`
    /// are both accepted.
    pub fn parse(name: &str, payload: &serde_json::Value) -> Result<Self, CalibrationError> {
        let name: CommandName = name.parse()?;
        let command = match name {
            CommandName::LoadLabware => CalibrationCommand::LoadLabware,
            CommandName::MoveToMeasureNozzleOffset => CalibrationCommand::MoveToMeasureNozzleOffset,
            CommandName::Jog => {
                let jog: JogPayload = serde_json::from_value(payload.clone()).map_err(|e| {
                    CalibrationError::InvalidPayload {
                        command: name,
                        reason: e.to_string(),
                    }
                })?;
                let vector = Point::from(jog.vector);
                if !vector.is_finite() {
                    return Err(CalibrationError::InvalidPayload {
                        command: name,
                        reason: "vector components must be finite".into(),
                    });
                }
                CalibrationCommand::Jog { vector }
            }
            CommandName::SaveNozzlePosition => CalibrationCommand::SaveNozzlePosition,
            CommandName::PickUpTip => CalibrationCommand::PickUpTip,
            CommandName::InvalidateTip => CalibrationCommand::InvalidateTip,
            CommandName::ConfirmTipAttached => CalibrationCommand::ConfirmTipAttached,
            CommandName::SaveTipPosition => CalibrationCommand::SaveTipPosition,
            CommandName::ExitSession => CalibrationCommand::ExitSession,
        };
        Ok(command)
    }
}

impl fmt::Display for CalibrationCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationCommand::Jog { vector } => write!(f, "jog {}", vector),
            other => f.write_str(other.name().as_str()),
        }
    }
}
