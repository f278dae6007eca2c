use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::command::CalibrationCommand;
use crate::controller::{SessionController, SessionSnapshot};
use crate::error::CalibrationError;
use crate::ports::{CalibrationStore, HardwarePort, LabwarePort};
use crate::session::SessionState;
use crate::settings::CalibrationSettings;
use crate::types::Mount;

/// Result of a command accepted by the manager.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub state: SessionState,
    pub warnings: Vec<String>,
}

struct SessionEntry<H: HardwarePort, L: LabwarePort, S: CalibrationStore> {
    mount: Mount,
    controller: Arc<Mutex<SessionController<H, L, S>>>,
}

/// Owns every live calibration session.
///
/// One session per mount. Commands against a session are serialized by a
/// per-session lock, so a command submitted while another is in flight
/// waits for it (`submit`) or is refused (`try_submit`). Sessions are
/// dropped as soon as they reach `sessionExited`.
pub struct SessionManager<H: HardwarePort, L: LabwarePort, S: CalibrationStore> {
    hardware: Arc<H>,
    labware: Arc<L>,
    store: Arc<S>,
    settings: CalibrationSettings,
    sessions: RwLock<HashMap<Uuid, SessionEntry<H, L, S>>>,
}

impl<H: HardwarePort, L: LabwarePort, S: CalibrationStore> SessionManager<H, L, S> {
    pub fn new(hardware: Arc<H>, labware: Arc<L>, store: Arc<S>, settings: CalibrationSettings) -> Self {
        Self {
            hardware,
            labware,
            store,
            settings,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &CalibrationSettings {
        &self.settings
    }

    /// Open a session on `mount`. Fails with `MountInUse` while another
    /// session on that mount is live.
    pub async fn create_session(&self, mount: Mount, tip_rack: &str) -> Result<Uuid, CalibrationError> {
        let mut sessions = self.sessions.write().await;
        if let Some((id, _)) = sessions.iter().find(|(_, entry)| entry.mount == mount) {
            return Err(CalibrationError::MountInUse { mount, session: *id });
        }

        let controller = SessionController::new(
            mount,
            tip_rack,
            self.settings.clone(),
            self.hardware.clone(),
            self.labware.clone(),
            self.store.clone(),
        );
        let id = controller.id();
        sessions.insert(
            id,
            SessionEntry { mount, controller: Arc::new(Mutex::new(controller)) },
        );
        Ok(id)
    }

    pub async fn session_for_mount(&self, mount: Mount) -> Option<Uuid> {
        self.sessions
            .read()
            .await
            .iter()
            .find(|(_, entry)| entry.mount == mount)
            .map(|(id, _)| *id)
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Run a command, waiting behind any command already in flight.
    pub async fn submit(&self, id: Uuid, command: CalibrationCommand) -> Result<CommandOutcome, CalibrationError> {
        let controller = self.controller(id).await?;
        let mut guard = controller.lock().await;
        let result = Self::run(&mut guard, command).await;
        drop(guard);
        self.reap_if_exited(id, &result).await;
        result
    }

    /// Run a command only if the session is idle.
    pub async fn try_submit(&self, id: Uuid, command: CalibrationCommand) -> Result<CommandOutcome, CalibrationError> {
        let controller = self.controller(id).await?;
        let mut guard = controller.try_lock().map_err(|_| CalibrationError::SessionBusy(id))?;
        let result = Self::run(&mut guard, command).await;
        drop(guard);
        self.reap_if_exited(id, &result).await;
        result
    }

    /// Wire-level entry point: parse the request, run it, describe the result.
    pub async fn submit_request(&self, id: Uuid, request: protocol::CommandRequest) -> protocol::CommandResponse {
        let reply_to = request.id.clone();
        let outcome = match CalibrationCommand::parse(&request.command, &request.data) {
            Ok(command) => self.submit(id, command).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(outcome) => protocol::CommandResponse::ok(outcome.state.as_str(), outcome.warnings, reply_to),
            Err(e) => {
                let state = match &e {
                    CalibrationError::SessionNotFound(_) => None,
                    _ => self.state_of(id).await.map(|s| s.as_str().to_string()),
                };
                protocol::CommandResponse::error(e.kind(), e.to_string(), state, reply_to)
            }
        }
    }

    pub async fn snapshot(&self, id: Uuid) -> Result<SessionSnapshot, CalibrationError> {
        let controller = self.controller(id).await?;
        let guard = controller.lock().await;
        Ok(guard.snapshot())
    }

    pub async fn list(&self) -> Vec<SessionSnapshot> {
        // Clone the handles first so no controller is awaited under the map lock.
        let controllers: Vec<_> = self
            .sessions
            .read()
            .await
            .values()
            .map(|entry| entry.controller.clone())
            .collect();

        let mut snapshots = Vec::with_capacity(controllers.len());
        for controller in controllers {
            snapshots.push(controller.lock().await.snapshot());
        }
        snapshots.sort_by_key(|s| s.mount);
        snapshots
    }

    /// Abort every live session, e.g. on shutdown.
    pub async fn exit_all(&self) -> Vec<(Uuid, Result<CommandOutcome, CalibrationError>)> {
        let ids: Vec<Uuid> = self.sessions.read().await.keys().copied().collect();
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            let result = self.submit(id, CalibrationCommand::ExitSession).await;
            results.push((id, result));
        }
        results
    }

    async fn controller(&self, id: Uuid) -> Result<Arc<Mutex<SessionController<H, L, S>>>, CalibrationError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .map(|entry| entry.controller.clone())
            .ok_or(CalibrationError::SessionNotFound(id))
    }

    async fn state_of(&self, id: Uuid) -> Option<SessionState> {
        let controller = self.controller(id).await.ok()?;
        let state = controller.lock().await.state();
        Some(state)
    }

    async fn run(
        controller: &mut SessionController<H, L, S>,
        command: CalibrationCommand,
    ) -> Result<CommandOutcome, CalibrationError> {
        let state = controller.handle_command(command).await?;
        Ok(CommandOutcome { state, warnings: controller.last_warnings().to_vec() })
    }

    async fn reap_if_exited(&self, id: Uuid, result: &Result<CommandOutcome, CalibrationError>) {
        if let Ok(outcome) = result {
            if outcome.state.is_terminal() {
                if let Some(entry) = self.sessions.write().await.remove(&id) {
                    info!(session = %id, mount = %entry.mount, "session exited and released its mount");
                }
                if !outcome.warnings.is_empty() {
                    warn!(session = %id, warnings = ?outcome.warnings, "session exited with release warnings");
                }
            }
        }
    }
}
