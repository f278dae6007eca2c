use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use tracing::debug;

use calibration_core::ports::{HardwareCall, HardwarePort};
use calibration_core::{HardwareError, InstrumentInfo, Mount, Point};

/// Where a mount rests after homing.
pub const HOME_POSE: Point = Point { x: 0.0, y: 0.0, z: 200.0 };

/// One-shot faults; each fires on the next matching call and then clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    Move,
    PickUp,
    Drop,
    Home,
}

#[derive(Debug, Clone)]
struct MountState {
    position: Point,
    instrument: Option<InstrumentInfo>,
}

#[derive(Debug, Default)]
struct Gantry {
    mounts: HashMap<Mount, MountState>,
    pending: HashSet<Fault>,
    calls: Vec<HardwareCall>,
}

impl Gantry {
    fn take_fault(&mut self, fault: Fault) -> bool {
        self.pending.remove(&fault)
    }

    fn mount(&mut self, mount: Mount) -> &mut MountState {
        self.mounts.entry(mount).or_insert(MountState { position: HOME_POSE, instrument: None })
    }

    fn instrument(&mut self, mount: Mount) -> Result<&mut InstrumentInfo, HardwareError> {
        self.mount(mount)
            .instrument
            .as_mut()
            .ok_or(HardwareError::NoInstrument(mount))
    }
}

/// An in-memory gantry. Positions are tracked per mount; nothing physical
/// moves.
pub struct SimulatedHardware {
    gantry: Mutex<Gantry>,
}

impl SimulatedHardware {
    /// Both mounts homed and fitted with a single-channel P300.
    pub fn new() -> Self {
        let mut gantry = Gantry::default();
        for mount in [Mount::Left, Mount::Right] {
            gantry.mount(mount).instrument = Some(InstrumentInfo {
                model: "p300_single_v2.0".to_string(),
                pipette_id: Some(format!("SIM-P300-{}", mount)),
                channels: 1,
                has_tip: false,
            });
        }
        Self { gantry: Mutex::new(gantry) }
    }

    pub async fn attach(&self, mount: Mount, instrument: Option<InstrumentInfo>) {
        self.gantry.lock().await.mount(mount).instrument = instrument;
    }

    pub async fn fail_next(&self, fault: Fault) {
        self.gantry.lock().await.pending.insert(fault);
    }

    pub async fn position(&self, mount: Mount) -> Point {
        self.gantry.lock().await.mount(mount).position
    }

    pub async fn has_tip(&self, mount: Mount) -> bool {
        self.gantry
            .lock()
            .await
            .mount(mount)
            .instrument
            .as_ref()
            .map(|i| i.has_tip)
            .unwrap_or(false)
    }

    pub async fn calls(&self) -> Vec<HardwareCall> {
        self.gantry.lock().await.calls.clone()
    }
}

impl Default for SimulatedHardware {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HardwarePort for SimulatedHardware {
    async fn move_relative(&self, mount: Mount, vector: Point) -> Result<(), HardwareError> {
        let mut gantry = self.gantry.lock().await;
        gantry.calls.push(HardwareCall::MoveRelative(mount, vector));
        if gantry.take_fault(Fault::Move) {
            return Err(HardwareError::Motion(format!("{} mount stalled while jogging", mount)));
        }
        let state = gantry.mount(mount);
        state.position += vector;
        debug!(mount = %mount, position = %state.position, "jogged");
        Ok(())
    }

    async fn move_absolute(&self, mount: Mount, pose: Point) -> Result<(), HardwareError> {
        let mut gantry = self.gantry.lock().await;
        gantry.calls.push(HardwareCall::MoveAbsolute(mount, pose));
        if gantry.take_fault(Fault::Move) {
            return Err(HardwareError::Motion(format!("{} mount stalled moving to {}", mount, pose)));
        }
        gantry.mount(mount).position = pose;
        debug!(mount = %mount, position = %pose, "moved");
        Ok(())
    }

    async fn pick_up_tip(&self, mount: Mount, tip_length: f64) -> Result<(), HardwareError> {
        let mut gantry = self.gantry.lock().await;
        gantry.calls.push(HardwareCall::PickUpTip(mount, tip_length));
        if gantry.take_fault(Fault::PickUp) {
            return Err(HardwareError::Tip("tip did not seat".into()));
        }
        let instrument = gantry.instrument(mount)?;
        if instrument.has_tip {
            return Err(HardwareError::Tip(format!("{} already carries a tip", instrument.model)));
        }
        instrument.has_tip = true;
        debug!(mount = %mount, tip_length, "tip picked up");
        Ok(())
    }

    async fn drop_tip(&self, mount: Mount) -> Result<(), HardwareError> {
        let mut gantry = self.gantry.lock().await;
        gantry.calls.push(HardwareCall::DropTip(mount));
        if gantry.take_fault(Fault::Drop) {
            return Err(HardwareError::Tip("ejector did not travel".into()));
        }
        gantry.instrument(mount)?.has_tip = false;
        debug!(mount = %mount, "tip dropped");
        Ok(())
    }

    async fn home(&self, mount: Mount) -> Result<(), HardwareError> {
        let mut gantry = self.gantry.lock().await;
        gantry.calls.push(HardwareCall::Home(mount));
        if gantry.take_fault(Fault::Home) {
            return Err(HardwareError::Motion(format!("{} mount limit switch not hit", mount)));
        }
        gantry.mount(mount).position = HOME_POSE;
        debug!(mount = %mount, "homed");
        Ok(())
    }

    async fn query_attached_instrument(&self, mount: Mount) -> Result<Option<InstrumentInfo>, HardwareError> {
        let mut gantry = self.gantry.lock().await;
        gantry.calls.push(HardwareCall::QueryInstrument(mount));
        Ok(gantry.mount(mount).instrument.clone())
    }
}
