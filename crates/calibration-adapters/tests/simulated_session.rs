use calibration_adapters::hardware::HOME_POSE;
use calibration_adapters::{BuiltinTipRacks, Fault, FileCalibrationStore, SimulatedHardware};
use calibration_core::ports::{CalibrationStore, HardwareCall};
use calibration_core::{
    CalibrationCommand, CalibrationSettings, Mount, Point, SessionController, SessionState,
};
use std::sync::Arc;

const RACK: &str = "opentrons_96_tiprack_20ul";

struct Bench {
    hardware: Arc<SimulatedHardware>,
    store: Arc<FileCalibrationStore>,
    controller: SessionController<SimulatedHardware, BuiltinTipRacks, FileCalibrationStore>,
    _dir: tempfile::TempDir,
}

fn bench() -> Bench {
    let dir = tempfile::tempdir().unwrap();
    let hardware = Arc::new(SimulatedHardware::new());
    let store = Arc::new(FileCalibrationStore::new(dir.path()));
    let controller = SessionController::new(
        Mount::Left,
        RACK,
        CalibrationSettings::default(),
        hardware.clone(),
        Arc::new(BuiltinTipRacks),
        store.clone(),
    );
    Bench { hardware, store, controller, _dir: dir }
}

#[tokio::test]
async fn full_calibration_against_simulated_gantry() {
    let mut b = bench();
    let reference = CalibrationSettings::default().nozzle_reference_pose;

    b.controller.handle_command(CalibrationCommand::LoadLabware).await.unwrap();
    b.controller.handle_command(CalibrationCommand::MoveToMeasureNozzleOffset).await.unwrap();
    assert_eq!(b.hardware.position(Mount::Left).await, reference);

    b.controller.handle_command(CalibrationCommand::jog(0.0, 0.0, -2.0)).await.unwrap();
    assert_eq!(b.hardware.position(Mount::Left).await, reference + Point::new(0.0, 0.0, -2.0));
    b.controller.handle_command(CalibrationCommand::SaveNozzlePosition).await.unwrap();

    b.controller.handle_command(CalibrationCommand::PickUpTip).await.unwrap();
    assert!(b.hardware.has_tip(Mount::Left).await);
    b.controller.handle_command(CalibrationCommand::ConfirmTipAttached).await.unwrap();
    assert_eq!(b.hardware.position(Mount::Left).await, reference + Point::new(0.0, 0.0, 39.2));

    b.controller.handle_command(CalibrationCommand::jog(0.0, 0.0, -1.5)).await.unwrap();
    let state = b.controller.handle_command(CalibrationCommand::SaveTipPosition).await.unwrap();
    assert_eq!(state, SessionState::CalibrationComplete);

    let record = b.store.load_tip_length(Mount::Left, RACK).await.unwrap().unwrap();
    assert!((record.tip_length - 39.7).abs() < 1e-9);
    assert_eq!(record.pipette_id.as_deref(), Some("SIM-P300-left"));

    b.controller.handle_command(CalibrationCommand::ExitSession).await.unwrap();
    assert!(!b.hardware.has_tip(Mount::Left).await);
    assert_eq!(b.hardware.position(Mount::Left).await, HOME_POSE);
}

#[tokio::test]
async fn one_shot_fault_can_be_retried() {
    let mut b = bench();
    b.controller.handle_command(CalibrationCommand::LoadLabware).await.unwrap();
    b.hardware.fail_next(Fault::Move).await;

    let err = b.controller.handle_command(CalibrationCommand::MoveToMeasureNozzleOffset).await.unwrap_err();
    assert_eq!(err.kind(), "hardware_move_error");
    assert_eq!(b.controller.state(), SessionState::LabwareLoaded);

    let state = b.controller.handle_command(CalibrationCommand::MoveToMeasureNozzleOffset).await.unwrap();
    assert_eq!(state, SessionState::MeasuringNozzleOffset);

    let moves = b
        .hardware
        .calls()
        .await
        .into_iter()
        .filter(|c| matches!(c, HardwareCall::MoveAbsolute(Mount::Left, _)))
        .count();
    assert_eq!(moves, 2);
}

#[tokio::test]
async fn empty_mount_cannot_pick_up() {
    let mut b = bench();
    b.hardware.attach(Mount::Left, None).await;
    b.controller.handle_command(CalibrationCommand::LoadLabware).await.unwrap();
    b.controller.handle_command(CalibrationCommand::MoveToMeasureNozzleOffset).await.unwrap();
    b.controller.handle_command(CalibrationCommand::jog(0.0, 0.0, -1.0)).await.unwrap();
    b.controller.handle_command(CalibrationCommand::SaveNozzlePosition).await.unwrap();

    let err = b.controller.handle_command(CalibrationCommand::PickUpTip).await.unwrap_err();
    assert_eq!(err.kind(), "tip_pickup_error");
    assert_eq!(b.controller.state(), SessionState::PreparingPipette);
}

#[tokio::test]
async fn exit_with_failed_drop_still_exits() {
    let mut b = bench();
    b.controller.handle_command(CalibrationCommand::LoadLabware).await.unwrap();
    b.controller.handle_command(CalibrationCommand::MoveToMeasureNozzleOffset).await.unwrap();
    b.controller.handle_command(CalibrationCommand::jog(0.0, 0.0, -1.0)).await.unwrap();
    b.controller.handle_command(CalibrationCommand::SaveNozzlePosition).await.unwrap();
    b.controller.handle_command(CalibrationCommand::PickUpTip).await.unwrap();
    b.hardware.fail_next(Fault::Drop).await;

    let state = b.controller.handle_command(CalibrationCommand::ExitSession).await.unwrap();
    assert_eq!(state, SessionState::SessionExited);
    assert_eq!(b.controller.last_warnings().len(), 1);
    assert!(b.hardware.has_tip(Mount::Left).await);
    assert_eq!(b.hardware.position(Mount::Left).await, HOME_POSE);
}
