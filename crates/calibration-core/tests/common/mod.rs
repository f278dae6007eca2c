#![allow(dead_code)]

use calibration_core::mocks::{MemoryStore, RecordingHardware, StaticLabware, TIP_RACK_300};
use calibration_core::{
    CalibrationCommand, CalibrationSettings, CommandName, Mount, SessionController, SessionState,
};
use std::sync::Arc;

pub type Controller = SessionController<RecordingHardware, StaticLabware, MemoryStore>;

pub struct Rig {
    pub hardware: Arc<RecordingHardware>,
    pub store: Arc<MemoryStore>,
    pub controller: Controller,
}

pub fn rig() -> Rig {
    rig_with(CalibrationSettings::default(), RecordingHardware::new())
}

pub fn rig_with(settings: CalibrationSettings, hardware: RecordingHardware) -> Rig {
    let hardware = Arc::new(hardware);
    let store = Arc::new(MemoryStore::new());
    let controller = SessionController::new(
        Mount::Right,
        TIP_RACK_300,
        settings,
        hardware.clone(),
        Arc::new(StaticLabware::standard()),
        store.clone(),
    );
    Rig { hardware, store, controller }
}

/// A representative command for each name.
pub fn sample(name: CommandName) -> CalibrationCommand {
    match name {
        CommandName::LoadLabware => CalibrationCommand::LoadLabware,
        CommandName::MoveToMeasureNozzleOffset => CalibrationCommand::MoveToMeasureNozzleOffset,
        CommandName::Jog => CalibrationCommand::jog(1.0, 1.0, 1.0),
        CommandName::SaveNozzlePosition => CalibrationCommand::SaveNozzlePosition,
        CommandName::PickUpTip => CalibrationCommand::PickUpTip,
        CommandName::InvalidateTip => CalibrationCommand::InvalidateTip,
        CommandName::ConfirmTipAttached => CalibrationCommand::ConfirmTipAttached,
        CommandName::SaveTipPosition => CalibrationCommand::SaveTipPosition,
        CommandName::ExitSession => CalibrationCommand::ExitSession,
    }
}

/// Issue whatever a command needs beforehand to succeed in the current state.
pub async fn satisfy_preconditions(c: &mut Controller, name: CommandName) {
    match name {
        CommandName::SaveNozzlePosition | CommandName::SaveTipPosition => {
            c.handle_command(CalibrationCommand::jog(0.0, 0.0, -1.0)).await.unwrap();
        }
        CommandName::ConfirmTipAttached => {
            c.handle_command(CalibrationCommand::PickUpTip).await.unwrap();
        }
        _ => {}
    }
}

/// Walk the happy path until the controller is in `target`.
pub async fn advance_to(c: &mut Controller, target: SessionState) {
    let path = [
        CommandName::LoadLabware,
        CommandName::MoveToMeasureNozzleOffset,
        CommandName::SaveNozzlePosition,
        CommandName::ConfirmTipAttached,
        CommandName::SaveTipPosition,
        CommandName::ExitSession,
    ];
    for step in path {
        if c.state() == target {
            return;
        }
        satisfy_preconditions(c, step).await;
        c.handle_command(sample(step)).await.unwrap();
    }
    assert_eq!(c.state(), target, "could not reach {}", target);
}
