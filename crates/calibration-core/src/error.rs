//! Error types for calibration sessions.
//!
//! Every [`CalibrationError`] leaves the session in the state it was in
//! before the failing command; see [`crate::SessionController`].

use thiserror::Error;
use uuid::Uuid;

use crate::command::CommandName;
use crate::session::SessionState;
use crate::types::Mount;

/// Faults reported by the hardware collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HardwareError {
    #[error("motion fault: {0}")]
    Motion(String),

    #[error("tip fault: {0}")]
    Tip(String),

    #[error("no instrument attached to {0} mount")]
    NoInstrument(Mount),

    #[error("hardware unavailable: {0}")]
    Unavailable(String),
}

/// Faults reported by the labware provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LabwareError {
    #[error("labware definition not found: {0}")]
    NotFound(String),

    #[error("invalid labware definition {load_name}: {reason}")]
    Invalid { load_name: String, reason: String },
}

#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("command {command} is not legal in state {state}")]
    IllegalTransition {
        state: SessionState,
        command: CommandName,
    },

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("invalid payload for {command}: {reason}")]
    InvalidPayload { command: CommandName, reason: String },

    #[error("failed to load labware: {0}")]
    LabwareLoad(#[from] LabwareError),

    #[error("hardware move failed: {0}")]
    HardwareMove(HardwareError),

    #[error("tip pick up failed: {0}")]
    TipPickup(HardwareError),

    #[error("tip not attached: {0}")]
    TipNotAttached(String),

    /// The instrument query failed, so tip presence is unknown.
    #[error("tip check failed")]
    TipCheck(#[source] HardwareError),

    #[error("no position recorded in {0}; jog before saving")]
    IncompleteMeasurement(SessionState),

    #[error("failed to persist calibration: {0}")]
    Persistence(#[source] anyhow::Error),

    #[error("a session is already open on the {mount} mount ({session})")]
    MountInUse { mount: Mount, session: Uuid },

    #[error("session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("session {0} is processing another command")]
    SessionBusy(Uuid),
}

impl CalibrationError {
    /// Stable machine-readable name used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            CalibrationError::IllegalTransition { .. } => "illegal_transition",
            CalibrationError::UnknownCommand(_) => "unknown_command",
            CalibrationError::InvalidPayload { .. } => "invalid_payload",
            CalibrationError::LabwareLoad(_) => "labware_load_error",
            CalibrationError::HardwareMove(_) => "hardware_move_error",
            CalibrationError::TipPickup(_) => "tip_pickup_error",
            CalibrationError::TipNotAttached(_) | CalibrationError::TipCheck(_) => {
                "tip_not_attached_error"
            }
            CalibrationError::IncompleteMeasurement(_) => "incomplete_measurement",
            CalibrationError::Persistence(_) => "persistence_error",
            CalibrationError::MountInUse { .. } => "mount_in_use",
            CalibrationError::SessionNotFound(_) => "session_not_found",
            CalibrationError::SessionBusy(_) => "session_busy",
        }
    }

    /// Hardware faults may succeed on a retry of the same command.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CalibrationError::HardwareMove(_)
                | CalibrationError::TipPickup(_)
                | CalibrationError::TipNotAttached(_)
                | CalibrationError::TipCheck(_)
                | CalibrationError::Persistence(_)
                | CalibrationError::SessionBusy(_)
        )
    }
}
