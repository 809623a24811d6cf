//! Agent session lifecycle: start/stop commands and status reconciliation.
//!
//! [`AgentController`] owns all client-side state for one monitored job. It
//! is cheap to clone and safe to share between the poller task and the
//! front end. The state lock is never held across a backend call, so every
//! response is checked against the *current* session token before it is
//! applied.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::backend::AgentBackend;
use crate::client::HttpAgentBackend;
use crate::config::UnibotConfig;
use crate::credentials::{CredentialSink, HelperCredentialSink};
use crate::error::UnibotResult;
use crate::logs::{LogBuffer, LogSynchronizer};
use crate::models::{AgentStatus, SessionToken, StartMode, StartRequest};
use crate::store::SessionStore;
use crate::viewport::{LogViewport, DEFAULT_FOLLOW_THRESHOLD};

/// Upper bound on a credential hand-off before it is abandoned.
pub const CREDENTIAL_HANDOFF_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a start or stop command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// A precondition did not hold; nothing was sent.
    Skipped,
    Completed,
    /// The request was rejected; the message is also in the error slot.
    Failed(String),
}

/// Result of one reconciliation tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Applied { logs_synced: bool },
    /// The job was running when last seen and has now stopped.
    Finished { logs_synced: bool },
    /// The response belonged to an older session or an older tick.
    Stale,
    Failed(String),
}

/// Everything the client knows about the monitored job.
#[derive(Debug)]
pub struct SessionState {
    store: SessionStore,
    session: Option<SessionToken>,
    status: Option<AgentStatus>,
    logs: LogBuffer,
    viewport: LogViewport,
    busy: bool,
    error: Option<String>,
    was_running: bool,
    /// At least one status response came back, successful or not.
    reconciled: bool,
    issued_seq: u64,
    applied_status_seq: u64,
    applied_logs_seq: u64,
}

impl SessionState {
    fn new(store: SessionStore, follow_threshold: usize) -> Self {
        let session = store.current();
        Self {
            store,
            session,
            status: None,
            logs: LogBuffer::new(),
            viewport: LogViewport::new(follow_threshold),
            busy: false,
            error: None,
            was_running: false,
            reconciled: false,
            issued_seq: 0,
            applied_status_seq: 0,
            applied_logs_seq: 0,
        }
    }

    pub fn session(&self) -> Option<&SessionToken> {
        self.session.as_ref()
    }

    /// Last status fetched from the executor, if any.
    pub fn status(&self) -> Option<&AgentStatus> {
        self.status.as_ref()
    }

    /// Status for rendering: the idle snapshot stands in when nothing has
    /// been fetched yet.
    pub fn display_status(&self) -> AgentStatus {
        self.status.clone().unwrap_or_else(AgentStatus::idle)
    }

    pub fn logs(&self) -> &[String] {
        self.logs.lines()
    }

    pub fn viewport(&self) -> &LogViewport {
        &self.viewport
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn was_running(&self) -> bool {
        self.was_running
    }

    pub fn last_account(&self) -> Option<&str> {
        self.store.last_account()
    }

    fn reported_running(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.running)
    }

    /// Start controls are enabled (form contents aside). A null status or a
    /// failed poll counts as idle once the executor has been asked.
    pub fn start_enabled(&self) -> bool {
        !self.busy && self.reconciled && !self.reported_running()
    }

    pub fn can_start(&self, request: &StartRequest) -> bool {
        request.is_complete() && self.start_enabled()
    }

    pub fn can_stop(&self) -> bool {
        self.session.is_some() && !self.busy && self.reported_running()
    }

    fn adopt_session(&mut self, token: SessionToken) {
        if let Err(e) = self.store.set_current(&token) {
            warn!("Could not persist session {}: {}", token, e);
        }
        self.session = Some(token);
        self.was_running = true;
        self.logs.clear();
        self.viewport.clear();
    }
}

/// A consistent copy of the controller state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub session: Option<SessionToken>,
    pub status: Option<AgentStatus>,
    pub display_status: AgentStatus,
    pub logs: Vec<String>,
    pub busy: bool,
    pub error: Option<String>,
    pub was_running: bool,
    pub auto_follow: bool,
}

#[derive(Clone)]
pub struct AgentController {
    backend: Arc<dyn AgentBackend>,
    credentials: Option<Arc<dyn CredentialSink>>,
    state: Arc<Mutex<SessionState>>,
    epoch: Arc<watch::Sender<u64>>,
}

impl AgentController {
    /// Restores whatever session the store last saw. Whether that job is
    /// still alive is settled by the first status poll.
    pub fn new(backend: Arc<dyn AgentBackend>, store: SessionStore) -> Self {
        Self::with_follow_threshold(backend, store, DEFAULT_FOLLOW_THRESHOLD)
    }

    pub fn with_follow_threshold(
        backend: Arc<dyn AgentBackend>,
        store: SessionStore,
        follow_threshold: usize,
    ) -> Self {
        let (epoch, _) = watch::channel(0);
        Self {
            backend,
            credentials: None,
            state: Arc::new(Mutex::new(SessionState::new(store, follow_threshold))),
            epoch: Arc::new(epoch),
        }
    }

    /// Wire up the HTTP backend, the on-disk store and the optional
    /// credential helper described by `config`.
    pub fn from_config(config: &UnibotConfig, follow_threshold: usize) -> UnibotResult<Self> {
        let backend = Arc::new(HttpAgentBackend::from_config(config)?);
        let store = match config.state_file_path() {
            Some(path) => SessionStore::open(path),
            None => {
                warn!("No data directory available, session state will not persist");
                SessionStore::in_memory()
            }
        };

        let mut controller = Self::with_follow_threshold(backend, store, follow_threshold);
        if let Some(sink) = config
            .credential_helper()
            .and_then(HelperCredentialSink::from_command_line)
        {
            controller = controller.with_credential_sink(Arc::new(sink));
        }
        Ok(controller)
    }

    pub fn with_credential_sink(mut self, sink: Arc<dyn CredentialSink>) -> Self {
        self.credentials = Some(sink);
        self
    }

    pub fn backend(&self) -> &Arc<dyn AgentBackend> {
        &self.backend
    }

    /// Changes whenever the session token or the "was running" flag changes.
    /// The poller re-arms its timer on every change.
    pub fn subscribe_epoch(&self) -> watch::Receiver<u64> {
        self.epoch.subscribe()
    }

    fn bump_epoch(&self) {
        self.epoch.send_modify(|epoch| *epoch += 1);
    }

    pub async fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        let state = self.state.lock().await;
        f(&state)
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.read(|state| SessionSnapshot {
            session: state.session.clone(),
            status: state.status.clone(),
            display_status: state.display_status(),
            logs: state.logs.lines().to_vec(),
            busy: state.busy,
            error: state.error.clone(),
            was_running: state.was_running,
            auto_follow: state.viewport.auto_follow(),
        })
        .await
    }

    pub async fn start_single(&self, request: StartRequest) -> CommandOutcome {
        self.start(StartMode::Single, request).await
    }

    pub async fn start_batch(&self, request: StartRequest) -> CommandOutcome {
        self.start(StartMode::Batch, request).await
    }

    /// Runs on its own task so a caller that gives up waiting cannot leave
    /// `busy` set.
    pub async fn start(&self, mode: StartMode, request: StartRequest) -> CommandOutcome {
        let this = self.clone();
        match tokio::spawn(async move { this.run_start(mode, request).await }).await {
            Ok(outcome) => outcome,
            Err(e) => self.fail_command("Start", e.to_string()).await,
        }
    }

    async fn run_start(&self, mode: StartMode, request: StartRequest) -> CommandOutcome {
        {
            let mut state = self.state.lock().await;
            if !state.can_start(&request) {
                debug!(?mode, busy = state.busy, "Start preconditions not met");
                return CommandOutcome::Skipped;
            }
            state.busy = true;
            state.error = None;
            if let Err(e) = state.store.set_last_account(request.account.trim()) {
                warn!("Could not remember account: {}", e);
            }
        }

        info!(?mode, "Starting agent job");
        let result = match mode {
            StartMode::Single => self.backend.start_single(&request).await,
            StartMode::Batch => self.backend.start_batch(&request).await,
        };

        let token = match result {
            Ok(token) => token,
            Err(e) => return self.fail_command("Start", e.user_message()).await,
        };

        info!(session = %token, "Agent job started");
        self.state.lock().await.adopt_session(token);
        self.bump_epoch();

        self.hand_off_credentials(&request);
        self.refresh_status().await;

        self.state.lock().await.busy = false;
        CommandOutcome::Completed
    }

    pub async fn stop(&self) -> CommandOutcome {
        let this = self.clone();
        match tokio::spawn(async move { this.run_stop().await }).await {
            Ok(outcome) => outcome,
            Err(e) => self.fail_command("Stop", e.to_string()).await,
        }
    }

    async fn run_stop(&self) -> CommandOutcome {
        let token = {
            let mut state = self.state.lock().await;
            if !state.can_stop() {
                debug!(busy = state.busy, "Stop preconditions not met");
                return CommandOutcome::Skipped;
            }
            let Some(token) = state.session.clone() else {
                return CommandOutcome::Skipped;
            };
            state.busy = true;
            state.error = None;
            token
        };

        info!(session = %token, "Stopping agent job");
        if let Err(e) = self.backend.stop(&token).await {
            return self.fail_command("Stop", e.user_message()).await;
        }

        self.refresh_status().await;

        self.state.lock().await.busy = false;
        CommandOutcome::Completed
    }

    async fn fail_command(&self, action: &str, message: String) -> CommandOutcome {
        warn!("{} failed: {}", action, message);
        let mut state = self.state.lock().await;
        state.error = Some(message.clone());
        state.busy = false;
        CommandOutcome::Failed(message)
    }

    /// Detached: the start outcome never waits on the sink.
    fn hand_off_credentials(&self, request: &StartRequest) {
        let Some(sink) = self.credentials.clone() else {
            return;
        };
        let account = request.account.trim().to_string();
        let secret = request.secret.clone();
        tokio::spawn(async move {
            match tokio::time::timeout(CREDENTIAL_HANDOFF_TIMEOUT, sink.store(&account, &secret))
                .await
            {
                Ok(Ok(())) => debug!("Credentials handed to {}", sink.name()),
                Ok(Err(e)) => debug!("Credential hand-off to {} failed: {}", sink.name(), e),
                Err(_) => debug!("Credential hand-off to {} timed out", sink.name()),
            }
        });
    }

    /// One reconciliation tick: fetch status, replace it wholesale, and sync
    /// the logs when the session has anything to show.
    pub async fn refresh_status(&self) -> TickOutcome {
        let (token, seq) = {
            let mut state = self.state.lock().await;
            state.issued_seq += 1;
            (state.session.clone(), state.issued_seq)
        };

        let fetched = self.backend.get_status(token.as_ref()).await;

        let (wants_logs, finished) = {
            let mut state = self.state.lock().await;
            if state.session != token {
                debug!(seq, "Discarding status for a superseded session");
                return TickOutcome::Stale;
            }

            let status = match fetched {
                Ok(status) => status,
                Err(e) => {
                    state.reconciled = true;
                    let message = e.user_message();
                    debug!(seq, "Status fetch failed: {}", message);
                    state.error = Some(message.clone());
                    return TickOutcome::Failed(message);
                }
            };

            if seq <= state.applied_status_seq {
                debug!(seq, applied = state.applied_status_seq, "Discarding out-of-order status");
                return TickOutcome::Stale;
            }
            state.applied_status_seq = seq;
            state.reconciled = true;

            let wants_logs = token.is_some() && status.as_ref().is_some_and(AgentStatus::has_activity);
            let finished = state.was_running && status.as_ref().is_some_and(|s| !s.running);
            if finished {
                state.was_running = false;
            }
            state.status = status;
            (wants_logs, finished)
        };

        if finished {
            info!("Agent job finished");
            self.bump_epoch();
        }

        let logs_synced = if wants_logs {
            self.sync_logs(token.as_ref(), seq).await
        } else {
            false
        };

        if finished {
            TickOutcome::Finished { logs_synced }
        } else {
            TickOutcome::Applied { logs_synced }
        }
    }

    async fn sync_logs(&self, token: Option<&SessionToken>, seq: u64) -> bool {
        let fetched = LogSynchronizer::fetch(self.backend.as_ref(), token).await;

        let mut state = self.state.lock().await;
        if state.session.as_ref() != token {
            debug!(seq, "Discarding logs for a superseded session");
            return false;
        }

        match fetched {
            Ok(lines) => {
                if seq <= state.applied_logs_seq {
                    debug!(seq, "Discarding out-of-order logs");
                    return false;
                }
                state.applied_logs_seq = seq;
                let height = lines.len();
                state.logs.replace(lines);
                state.viewport.content_replaced(height);
                true
            }
            Err(e) => {
                state.error = Some(e.user_message());
                false
            }
        }
    }

    /// Empty the local log view. The executor's log store is untouched.
    pub async fn clear_logs(&self) {
        let mut state = self.state.lock().await;
        state.logs.clear();
        state.viewport.clear();
    }

    pub async fn scroll_logs(&self, delta: isize) {
        self.state.lock().await.viewport.scroll_by(delta);
    }

    pub async fn scroll_logs_to(&self, scroll_top: usize) {
        self.state.lock().await.viewport.user_scrolled(scroll_top);
    }

    pub async fn scroll_logs_to_bottom(&self) {
        self.state.lock().await.viewport.scroll_to_bottom();
    }

    pub async fn set_log_viewport_height(&self, height: usize) {
        let mut state = self.state.lock().await;
        if state.viewport.viewport_height() != height {
            state.viewport.set_viewport_height(height);
        }
    }

    pub async fn dismiss_error(&self) {
        self.state.lock().await.error = None;
    }
}
