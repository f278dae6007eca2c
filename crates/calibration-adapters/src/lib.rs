//! Concrete ports for running calibration sessions outside of tests:
//! a simulated gantry, the built-in tip rack definitions and a JSON file
//! store for finished calibrations.

pub mod hardware;
pub mod labware;
pub mod store;

pub use hardware::{Fault, SimulatedHardware};
pub use labware::BuiltinTipRacks;
pub use store::FileCalibrationStore;
