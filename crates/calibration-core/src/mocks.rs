//! In-crate collaborators for tests and demos.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{HardwareError, LabwareError};
use crate::ports::{CalibrationStore, HardwarePort, LabwarePort, TipLengthRecord};
use crate::types::{InstrumentInfo, Mount, Point, TipRackGeometry};

pub use crate::ports::HardwareCall;

pub const TIP_RACK_300: &str = "opentrons_96_tiprack_300ul";

/// Fault switches; each stays set until cleared.
#[derive(Debug, Default)]
pub struct Faults {
    pub moves: AtomicBool,
    pub pick_up: AtomicBool,
    pub drop: AtomicBool,
    pub home: AtomicBool,
    pub query: AtomicBool,
    /// Pick up "succeeds" but no tip ends up on the pipette.
    pub silent_miss: AtomicBool,
}

/// Hardware that records every call and never moves anything.
pub struct RecordingHardware {
    calls: Mutex<Vec<HardwareCall>>,
    instruments: Mutex<HashMap<Mount, InstrumentInfo>>,
    pub faults: Faults,
    delay: Option<Duration>,
}

impl RecordingHardware {
    pub fn new() -> Self {
        let mut instruments = HashMap::new();
        for mount in [Mount::Left, Mount::Right] {
            instruments.insert(
                mount,
                InstrumentInfo {
                    model: "p300_single_v2.0".to_string(),
                    pipette_id: Some(format!("P3HS-{}", mount)),
                    channels: 1,
                    has_tip: false,
                },
            );
        }
        Self {
            calls: Mutex::new(Vec::new()),
            instruments: Mutex::new(instruments),
            faults: Faults::default(),
            delay: None,
        }
    }

    /// Every call sleeps for `delay` before completing.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn without_instrument(self, mount: Mount) -> Self {
        self.instruments.lock().unwrap().remove(&mount);
        self
    }

    pub fn calls(&self) -> Vec<HardwareCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn has_tip(&self, mount: Mount) -> bool {
        self.instruments
            .lock()
            .unwrap()
            .get(&mount)
            .map(|i| i.has_tip)
            .unwrap_or(false)
    }

    async fn record(&self, call: HardwareCall) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().unwrap().push(call);
    }

    fn set_tip(&self, mount: Mount, has_tip: bool) {
        if let Some(info) = self.instruments.lock().unwrap().get_mut(&mount) {
            info.has_tip = has_tip;
        }
    }
}

impl Default for RecordingHardware {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HardwarePort for RecordingHardware {
    async fn move_relative(&self, mount: Mount, vector: Point) -> Result<(), HardwareError> {
        self.record(HardwareCall::MoveRelative(mount, vector)).await;
        if self.faults.moves.load(Ordering::SeqCst) {
            return Err(HardwareError::Motion("axis stalled".into()));
        }
        Ok(())
    }

    async fn move_absolute(&self, mount: Mount, pose: Point) -> Result<(), HardwareError> {
        self.record(HardwareCall::MoveAbsolute(mount, pose)).await;
        if self.faults.moves.load(Ordering::SeqCst) {
            return Err(HardwareError::Motion("axis stalled".into()));
        }
        Ok(())
    }

    async fn pick_up_tip(&self, mount: Mount, tip_length: f64) -> Result<(), HardwareError> {
        self.record(HardwareCall::PickUpTip(mount, tip_length)).await;
        if self.faults.pick_up.load(Ordering::SeqCst) {
            return Err(HardwareError::Tip("no tip detected".into()));
        }
        if !self.faults.silent_miss.load(Ordering::SeqCst) {
            self.set_tip(mount, true);
        }
        Ok(())
    }

    async fn drop_tip(&self, mount: Mount) -> Result<(), HardwareError> {
        self.record(HardwareCall::DropTip(mount)).await;
        if self.faults.drop.load(Ordering::SeqCst) {
            return Err(HardwareError::Tip("ejector jammed".into()));
        }
        self.set_tip(mount, false);
        Ok(())
    }

    async fn home(&self, mount: Mount) -> Result<(), HardwareError> {
        self.record(HardwareCall::Home(mount)).await;
        if self.faults.home.load(Ordering::SeqCst) {
            return Err(HardwareError::Motion("limit switch not triggered".into()));
        }
        Ok(())
    }

    async fn query_attached_instrument(&self, mount: Mount) -> Result<Option<InstrumentInfo>, HardwareError> {
        self.record(HardwareCall::QueryInstrument(mount)).await;
        if self.faults.query.load(Ordering::SeqCst) {
            return Err(HardwareError::Unavailable("instrument bus timeout".into()));
        }
        Ok(self.instruments.lock().unwrap().get(&mount).cloned())
    }
}

/// Labware provider backed by a fixed map.
pub struct StaticLabware {
    racks: HashMap<String, TipRackGeometry>,
}

impl StaticLabware {
    pub fn new(racks: impl IntoIterator<Item = TipRackGeometry>) -> Self {
        Self {
            racks: racks.into_iter().map(|r| (r.load_name.clone(), r)).collect(),
        }
    }

    /// Just the 300 µL rack.
    pub fn standard() -> Self {
        Self::new([TipRackGeometry {
            load_name: TIP_RACK_300.to_string(),
            display_name: "Opentrons 96 Tip Rack 300 µL".to_string(),
            tip_length: 59.3,
        }])
    }
}

#[async_trait]
impl LabwarePort for StaticLabware {
    async fn load_tip_rack(&self, load_name: &str) -> Result<TipRackGeometry, LabwareError> {
        self.racks
            .get(load_name)
            .cloned()
            .ok_or_else(|| LabwareError::NotFound(load_name.to_string()))
    }
}

/// Calibration store kept in memory.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<(Mount, String), TipLengthRecord>>,
    pub fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CalibrationStore for MemoryStore {
    async fn save_tip_length(&self, record: &TipLengthRecord) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("calibration storage is read-only");
        }
        self.records
            .lock()
            .unwrap()
            .insert((record.mount, record.tip_rack.clone()), record.clone());
        Ok(())
    }

    async fn load_tip_length(&self, mount: Mount, tip_rack: &str) -> Result<Option<TipLengthRecord>> {
        Ok(self.records.lock().unwrap().get(&(mount, tip_rack.to_string())).cloned())
    }

    async fn list_tip_lengths(&self) -> Result<Vec<TipLengthRecord>> {
        let mut records: Vec<_> = self.records.lock().unwrap().values().cloned().collect();
        records.sort_by(|a, b| (a.mount, &a.tip_rack).cmp(&(b.mount, &b.tip_rack)));
        Ok(records)
    }

    async fn delete_tip_length(&self, mount: Mount, tip_rack: &str) -> Result<bool> {
        Ok(self.records.lock().unwrap().remove(&(mount, tip_rack.to_string())).is_some())
    }
}
