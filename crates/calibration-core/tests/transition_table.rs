mod common;

use calibration_core::session::next_state;
use calibration_core::{CalibrationError, CommandName, SessionState};
use common::{advance_to, rig, sample, satisfy_preconditions};

use CommandName as C;
use SessionState as S;

const TABLE: &[(SessionState, CommandName, SessionState)] = &[
    (S::SessionStarted, C::LoadLabware, S::LabwareLoaded),
    (S::LabwareLoaded, C::MoveToMeasureNozzleOffset, S::MeasuringNozzleOffset),
    (S::MeasuringNozzleOffset, C::Jog, S::MeasuringNozzleOffset),
    (S::MeasuringNozzleOffset, C::SaveNozzlePosition, S::PreparingPipette),
    (S::PreparingPipette, C::Jog, S::PreparingPipette),
    (S::PreparingPipette, C::PickUpTip, S::PreparingPipette),
    (S::PreparingPipette, C::InvalidateTip, S::PreparingPipette),
    (S::PreparingPipette, C::ConfirmTipAttached, S::MeasuringTipOffset),
    (S::MeasuringTipOffset, C::Jog, S::MeasuringTipOffset),
    (S::MeasuringTipOffset, C::SaveTipPosition, S::CalibrationComplete),
    (S::CalibrationComplete, C::ExitSession, S::SessionExited),
    (S::SessionStarted, C::ExitSession, S::SessionExited),
    (S::LabwareLoaded, C::ExitSession, S::SessionExited),
    (S::MeasuringNozzleOffset, C::ExitSession, S::SessionExited),
    (S::PreparingPipette, C::ExitSession, S::SessionExited),
    (S::MeasuringTipOffset, C::ExitSession, S::SessionExited),
];

fn in_table(state: SessionState, command: CommandName) -> bool {
    TABLE.iter().any(|(s, c, _)| *s == state && *c == command)
}

#[test]
fn lookup_matches_table_exactly() {
    for state in S::ALL {
        for command in C::ALL {
            let expected = TABLE
                .iter()
                .find(|(s, c, _)| *s == state && *c == command)
                .map(|(_, _, to)| *to);
            assert_eq!(next_state(state, command), expected, "{} + {}", state, command);
        }
    }
}

#[tokio::test]
async fn every_listed_command_reaches_listed_state() {
    for (from, command, to) in TABLE {
        let mut rig = rig();
        advance_to(&mut rig.controller, *from).await;
        satisfy_preconditions(&mut rig.controller, *command).await;
        assert_eq!(rig.controller.state(), *from);

        let reached = rig.controller.handle_command(sample(*command)).await.unwrap();
        assert_eq!(reached, *to, "{} + {}", from, command);
        assert_eq!(rig.controller.state(), *to);
    }
}

#[tokio::test]
async fn unlisted_commands_are_illegal_and_change_nothing() {
    for state in S::ALL {
        for command in C::ALL.into_iter().filter(|c| !in_table(state, *c)) {
            let mut rig = rig();
            advance_to(&mut rig.controller, state).await;
            let calls_before = rig.hardware.calls().len();
            let measurements_before = rig.controller.measurements().clone();

            let err = rig.controller.handle_command(sample(command)).await.unwrap_err();
            match err {
                CalibrationError::IllegalTransition { state: s, command: c } => {
                    assert_eq!(s, state);
                    assert_eq!(c, command);
                }
                other => panic!("{} + {}: expected IllegalTransition, got {:?}", state, command, other),
            }
            assert_eq!(rig.controller.state(), state);
            assert_eq!(rig.controller.measurements(), &measurements_before);
            assert_eq!(rig.hardware.calls().len(), calls_before, "handler must not run");
        }
    }
}

#[tokio::test]
async fn exit_from_every_live_state() {
    for state in S::ALL.into_iter().filter(|s| !s.is_terminal()) {
        let mut rig = rig();
        advance_to(&mut rig.controller, state).await;
        let reached = rig.controller.handle_command(sample(C::ExitSession)).await.unwrap();
        assert_eq!(reached, S::SessionExited, "exit from {}", state);
    }
}

#[tokio::test]
async fn exited_session_rejects_everything() {
    let mut rig = rig();
    advance_to(&mut rig.controller, S::SessionExited).await;
    for command in C::ALL {
        let err = rig.controller.handle_command(sample(command)).await.unwrap_err();
        assert_eq!(err.kind(), "illegal_transition");
        assert_eq!(rig.controller.state(), S::SessionExited);
    }
    assert!(rig.controller.legal_commands().is_empty());
}
