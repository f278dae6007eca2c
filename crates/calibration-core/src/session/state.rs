use serde::{Deserialize, Serialize};
use std::fmt;

use crate::command::CommandName;

/// Every state a tip-length calibration session can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    SessionStarted,
    LabwareLoaded,
    MeasuringNozzleOffset,
    PreparingPipette,
    MeasuringTipOffset,
    CalibrationComplete,
    /// Terminal. Nothing is legal from here.
    SessionExited,
}

impl SessionState {
    pub const ALL: [SessionState; 7] = [
        SessionState::SessionStarted,
        SessionState::LabwareLoaded,
        SessionState::MeasuringNozzleOffset,
        SessionState::PreparingPipette,
        SessionState::MeasuringTipOffset,
        SessionState::CalibrationComplete,
        SessionState::SessionExited,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::SessionStarted => "sessionStarted",
            SessionState::LabwareLoaded => "labwareLoaded",
            SessionState::MeasuringNozzleOffset => "measuringNozzleOffset",
            SessionState::PreparingPipette => "preparingPipette",
            SessionState::MeasuringTipOffset => "measuringTipOffset",
            SessionState::CalibrationComplete => "calibrationComplete",
            SessionState::SessionExited => "sessionExited",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::SessionExited)
    }

    /// States where jogs accumulate into the position estimate.
    pub fn is_measuring(&self) -> bool {
        matches!(
            self,
            SessionState::MeasuringNozzleOffset | SessionState::MeasuringTipOffset
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The transition table. `None` means the command is illegal in `state`.
pub fn next_state(state: SessionState, command: CommandName) -> Option<SessionState> {
    use CommandName as C;
    use SessionState as S;

    match (state, command) {
        (S::SessionStarted, C::LoadLabware) => Some(S::LabwareLoaded),
        (S::LabwareLoaded, C::MoveToMeasureNozzleOffset) => Some(S::MeasuringNozzleOffset),

        (S::MeasuringNozzleOffset, C::Jog) => Some(S::MeasuringNozzleOffset),
        (S::MeasuringNozzleOffset, C::SaveNozzlePosition) => Some(S::PreparingPipette),

        (S::PreparingPipette, C::Jog | C::PickUpTip | C::InvalidateTip) => {
            Some(S::PreparingPipette)
        }
        (S::PreparingPipette, C::ConfirmTipAttached) => Some(S::MeasuringTipOffset),

        (S::MeasuringTipOffset, C::Jog) => Some(S::MeasuringTipOffset),
        (S::MeasuringTipOffset, C::SaveTipPosition) => Some(S::CalibrationComplete),

        // Abort path: every live state may exit.
        (S::SessionExited, _) => None,
        (_, C::ExitSession) => Some(S::SessionExited),

        _ => None,
    }
}

/// Commands legal in `state`, in declaration order.
pub fn legal_commands(state: SessionState) -> Vec<CommandName> {
    CommandName::ALL
        .iter()
        .copied()
        .filter(|c| next_state(state, *c).is_some())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_names_match_wire_format() {
        for state in SessionState::ALL {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state.as_str()));
        }
    }

    #[test]
    fn exited_has_no_legal_commands() {
        assert!(legal_commands(SessionState::SessionExited).is_empty());
    }

    #[test]
    fn every_live_state_can_exit() {
        for state in SessionState::ALL.iter().filter(|s| !s.is_terminal()) {
            assert_eq!(
                next_state(*state, CommandName::ExitSession),
                Some(SessionState::SessionExited),
                "{} should allow exit_session",
                state
            );
        }
    }

    #[test]
    fn preparing_pipette_commands() {
        let legal = legal_commands(SessionState::PreparingPipette);
        assert_eq!(
            legal,
            vec![
                CommandName::Jog,
                CommandName::PickUpTip,
                CommandName::InvalidateTip,
                CommandName::ConfirmTipAttached,
                CommandName::ExitSession,
            ]
        );
    }

    #[test]
    fn no_path_back_from_complete() {
        assert_eq!(
            legal_commands(SessionState::CalibrationComplete),
            vec![CommandName::ExitSession]
        );
    }
}
