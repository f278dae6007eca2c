pub mod data;
pub mod history;
pub mod state;

pub use data::{Measurements, PositionEstimate, SessionData};
pub use history::{SessionEvent, SessionEventType, SessionHistory, SessionSummary};
pub use state::{legal_commands, next_state, SessionState};
