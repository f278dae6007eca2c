use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::command::{CalibrationCommand, CommandName};
use crate::error::CalibrationError;
use crate::handlers::{self, HandlerContext};
use crate::ports::{CalibrationStore, HardwarePort, LabwarePort};
use crate::session::{
    legal_commands, next_state, Measurements, SessionData, SessionEventType, SessionHistory,
    SessionState,
};
use crate::settings::CalibrationSettings;
use crate::types::{Mount, Point};

/// Serializable view of a session for transports and logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub mount: Mount,
    pub tip_rack: String,
    pub state: SessionState,
    pub measurements: Measurements,
    pub position_estimate: Option<Point>,
    pub legal_commands: Vec<CommandName>,
}

/// The calibration state machine for one mount.
///
/// `handle_command` takes `&mut self`, so one controller never runs two
/// commands at once. A failed command leaves state, measurements and the
/// position estimate exactly as they were.
pub struct SessionController<H: HardwarePort, L: LabwarePort, S: CalibrationStore> {
    id: Uuid,
    mount: Mount,
    tip_rack: String,
    state: SessionState,
    data: SessionData,
    history: SessionHistory,
    last_warnings: Vec<String>,
    settings: CalibrationSettings,
    hardware: Arc<H>,
    labware: Arc<L>,
    store: Arc<S>,
}

impl<H: HardwarePort, L: LabwarePort, S: CalibrationStore> SessionController<H, L, S> {
    pub fn new(
        mount: Mount,
        tip_rack: impl Into<String>,
        settings: CalibrationSettings,
        hardware: Arc<H>,
        labware: Arc<L>,
        store: Arc<S>,
    ) -> Self {
        let mut history = SessionHistory::new(settings.history_capacity);
        history.add_event(SessionEventType::Started);
        let id = Uuid::new_v4();
        let tip_rack = tip_rack.into();
        info!(session = %id, mount = %mount, tip_rack = %tip_rack, "calibration session started");
        Self {
            id,
            mount,
            tip_rack,
            state: SessionState::SessionStarted,
            data: SessionData::default(),
            history,
            last_warnings: Vec::new(),
            settings,
            hardware,
            labware,
            store,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mount(&self) -> Mount {
        self.mount
    }

    pub fn tip_rack(&self) -> &str {
        &self.tip_rack
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn measurements(&self) -> &Measurements {
        &self.data.measurements
    }

    /// Sum of jogs since the current measuring state was entered.
    pub fn position_estimate(&self) -> Option<Point> {
        self.data.position.offset()
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    /// Release warnings from the most recent command (only `exit_session`
    /// produces any).
    pub fn last_warnings(&self) -> &[String] {
        &self.last_warnings
    }

    pub fn legal_commands(&self) -> Vec<CommandName> {
        legal_commands(self.state)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            mount: self.mount,
            tip_rack: self.tip_rack.clone(),
            state: self.state,
            measurements: self.data.measurements.clone(),
            position_estimate: self.data.position.offset(),
            legal_commands: self.legal_commands(),
        }
    }

    /// Run one command and return the state it leaves the session in.
    pub async fn handle_command(
        &mut self,
        command: CalibrationCommand,
    ) -> Result<SessionState, CalibrationError> {
        let name = command.name();
        let from = self.state;
        self.last_warnings.clear();

        let Some(to) = next_state(from, name) else {
            warn!(session = %self.id, command = %name, state = %from, "illegal command for current state");
            self.history.add_event(SessionEventType::CommandRejected { command: name, state: from });
            return Err(CalibrationError::IllegalTransition { state: from, command: name });
        };

        debug!(session = %self.id, command = %command, state = %from, "handling command");

        let mut working = self.data.clone();
        let ctx = HandlerContext {
            hardware: self.hardware.as_ref(),
            labware: self.labware.as_ref(),
            store: self.store.as_ref(),
            settings: &self.settings,
            mount: self.mount,
            tip_rack: &self.tip_rack,
            state: from,
        };

        let outcome = match command {
            CalibrationCommand::LoadLabware => handlers::load_labware(&ctx, &mut working).await,
            CalibrationCommand::MoveToMeasureNozzleOffset => {
                handlers::move_to_measure_nozzle_offset(&ctx, &mut working).await
            }
            CalibrationCommand::Jog { vector } => handlers::jog(&ctx, &mut working, vector).await,
            CalibrationCommand::SaveNozzlePosition => handlers::save_nozzle_position(&ctx, &mut working),
            CalibrationCommand::PickUpTip => handlers::pick_up_tip(&ctx, &mut working).await,
            CalibrationCommand::InvalidateTip => handlers::invalidate_tip(&ctx, &mut working).await,
            CalibrationCommand::ConfirmTipAttached => {
                handlers::confirm_tip_attached(&ctx, &mut working).await
            }
            CalibrationCommand::SaveTipPosition => handlers::save_tip_position(&ctx, &mut working).await,
            CalibrationCommand::ExitSession => {
                let warnings = handlers::exit_session(&ctx, &mut working).await;
                for message in &warnings {
                    self.history.add_event(SessionEventType::ReleaseWarning { message: message.clone() });
                }
                self.last_warnings = warnings;
                Ok(())
            }
        };

        if let Err(e) = outcome {
            warn!(session = %self.id, command = %name, state = %from, error = %e, "command failed");
            self.history.add_event(SessionEventType::CommandFailed {
                command: name,
                error: e.to_string(),
            });
            return Err(e);
        }

        self.data = working;
        self.state = to;
        self.history.add_event(SessionEventType::CommandApplied { command: name, from, to });
        if from != to {
            info!(session = %self.id, mount = %self.mount, from = %from, to = %to, "session transitioned");
        }
        if to.is_terminal() {
            self.history.add_event(SessionEventType::Exited);
        }
        Ok(to)
    }

    /// Parse a wire-level command and run it.
    pub async fn handle_named(
        &mut self,
        name: &str,
        payload: &serde_json::Value,
    ) -> Result<SessionState, CalibrationError> {
        let command = CalibrationCommand::parse(name, payload)?;
        self.handle_command(command).await
    }
}
