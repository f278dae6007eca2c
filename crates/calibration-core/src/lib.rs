//! Guided tip-length calibration sessions.
//!
//! A [`SessionController`] walks one pipette mount through
//! `load_labware → move_to_measure_nozzle_offset → jog… → save_nozzle_position
//! → pick_up_tip → confirm_tip_attached → jog… → save_tip_position`,
//! issuing hardware moves through [`ports::HardwarePort`] and handing the
//! finished measurement to [`ports::CalibrationStore`]. `exit_session` is
//! accepted from every live state.
//!
//! [`SessionManager`] keeps one session per mount and serializes commands
//! against each session.

pub mod command;
pub mod controller;
pub mod error;
mod handlers;
pub mod mocks;
pub mod ports;
pub mod session;
pub mod session_manager;
pub mod settings;
pub mod types;

pub use command::{CalibrationCommand, CommandName};
pub use controller::{SessionController, SessionSnapshot};
pub use error::{CalibrationError, HardwareError, LabwareError};
pub use session::{Measurements, SessionState};
pub use session_manager::{CommandOutcome, SessionManager};
pub use settings::{CalibrationSettings, TipVerification};
pub use types::{InstrumentInfo, Mount, Point, TipRackGeometry};
