pub mod storage;

pub use storage::{CalibrationStore, TipLengthRecord};

use async_trait::async_trait;

use crate::error::{HardwareError, LabwareError};
use crate::types::{InstrumentInfo, Mount, Point, TipRackGeometry};

/// Motion and tip control for the robot. Shared across sessions; each call
/// names the mount it acts on.
#[async_trait]
pub trait HardwarePort: Send + Sync {
    async fn move_relative(&self, mount: Mount, vector: Point) -> Result<(), HardwareError>;

    async fn move_absolute(&self, mount: Mount, pose: Point) -> Result<(), HardwareError>;

    async fn pick_up_tip(&self, mount: Mount, tip_length: f64) -> Result<(), HardwareError>;

    async fn drop_tip(&self, mount: Mount) -> Result<(), HardwareError>;

    /// Retract the mount to its safe home position.
    async fn home(&self, mount: Mount) -> Result<(), HardwareError>;

    async fn query_attached_instrument(
        &self,
        mount: Mount,
    ) -> Result<Option<InstrumentInfo>, HardwareError>;
}

/// One recorded [`HardwarePort`] call, for adapters that keep a call log.
#[derive(Debug, Clone, PartialEq)]
pub enum HardwareCall {
    MoveRelative(Mount, Point),
    MoveAbsolute(Mount, Point),
    PickUpTip(Mount, f64),
    DropTip(Mount),
    Home(Mount),
    QueryInstrument(Mount),
}

/// Resolves tip rack load names to geometry.
#[async_trait]
pub trait LabwarePort: Send + Sync {
    async fn load_tip_rack(&self, load_name: &str) -> Result<TipRackGeometry, LabwareError>;
}
