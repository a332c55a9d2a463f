use crate::classifier::{classify, Effect};
use crate::session::{Session, SessionState};
use crate::slot::{CommitOutcome, ProfileSlot};
use crate::transcript::TranscriptRecorder;
use parley_channels::{ChannelEvent, LiveChannel};
use parley_core::{ParleyError, ParleyResult, ProfileRecord, SessionId, TranscriptTurn};
use parley_extract::strategy::record_from_envelope;
use parley_extract::{
    ExtractionContext, ExtractionOutcome, ExtractionPipeline, ExtractionReport, RetryAffordance,
};
use parley_remote::{SessionRegistration, SessionRegistry};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const START_FAILED: &str = "Failed to start conversation";
const END_FAILED: &str = "Failed to end conversation";
const VOLUME_FAILED: &str = "Failed to change volume";
const MIC_DENIED: &str = "Microphone access denied";
const RETRIEVE_FAILED: &str = "Failed to retrieve user data";

/// Outcome of the external microphone permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicrophoneAccess {
    Granted,
    Denied,
}

/// Everything the controller reacts to, in arrival order.
#[derive(Debug)]
pub enum ControllerEvent {
    /// A live-channel event, tagged with the session it was delivered for.
    Channel {
        session_id: SessionId,
        event: ChannelEvent,
    },
    /// The post-disconnect settle delay is over.
    SettleElapsed { session_id: SessionId },
    /// A pipeline run finished.
    ExtractionFinished {
        session_id: SessionId,
        report: ExtractionReport,
    },
}

/// Snapshot of a session once the controller has gone idle.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    pub session_id: Option<SessionId>,
    pub state: SessionState,
    pub transcript: Vec<TranscriptTurn>,
    pub profile: Option<ProfileRecord>,
    pub extraction: Option<ExtractionReport>,
    pub error_message: Option<String>,
    pub data_error: Option<String>,
}

/// Drives one live channel through the session lifecycle and resolves the
/// profile record the agent collects.
///
/// The controller is the single owner of session state. Channel events,
/// settle timers and pipeline results all arrive on one queue and are applied
/// by [`SessionController::handle`]; anything tagged with a session id that
/// is no longer current is discarded.
pub struct SessionController {
    agent_id: String,
    channel: Arc<dyn LiveChannel>,
    registry: Arc<dyn SessionRegistry>,
    pipeline: Arc<ExtractionPipeline>,
    slot: ProfileSlot,
    recorder: TranscriptRecorder,
    session: Option<Session>,
    muted: bool,
    pending_extraction: bool,
    error_message: Option<String>,
    data_error: Option<String>,
    last_report: Option<ExtractionReport>,
    events_tx: mpsc::UnboundedSender<ControllerEvent>,
    events_rx: mpsc::UnboundedReceiver<ControllerEvent>,
}

impl SessionController {
    pub fn new(
        agent_id: impl Into<String>,
        channel: Arc<dyn LiveChannel>,
        registry: Arc<dyn SessionRegistry>,
        pipeline: Arc<ExtractionPipeline>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            agent_id: agent_id.into(),
            channel,
            registry,
            pipeline,
            slot: ProfileSlot::new(),
            recorder: TranscriptRecorder::new(),
            session: None,
            muted: false,
            pending_extraction: false,
            error_message: None,
            data_error: None,
            last_report: None,
            events_tx,
            events_rx,
        }
    }

    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(SessionState::Idle)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session.as_ref().map(|s| &s.id)
    }

    pub fn transcript(&self) -> &[TranscriptTurn] {
        self.recorder.turns()
    }

    pub fn profile(&self) -> Option<ProfileRecord> {
        self.slot.current()
    }

    pub fn slot(&self) -> &ProfileSlot {
        &self.slot
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Dismissible channel error, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Extraction miss or manual retry failure, if any.
    pub fn data_error(&self) -> Option<&str> {
        self.data_error.as_deref()
    }

    pub fn last_report(&self) -> Option<&ExtractionReport> {
        self.last_report.as_ref()
    }

    pub fn is_awaiting_extraction(&self) -> bool {
        self.pending_extraction
    }

    /// What a manual retry would do right now.
    pub fn retry_affordance(&self) -> RetryAffordance {
        match self.session_id() {
            Some(id) => RetryAffordance::SessionFetch(id.clone()),
            None => RetryAffordance::Disabled,
        }
    }

    /// The session is over and nothing is outstanding.
    pub fn is_idle(&self) -> bool {
        !self.state().is_live() && !self.pending_extraction
    }

    /// Start a new session.
    ///
    /// Clears the transcript and any resolved record, allocates a fresh
    /// session id and opens the live channel. Registration with the session
    /// registry runs in the background and never affects the session.
    pub async fn start(&mut self, microphone: MicrophoneAccess) -> ParleyResult<SessionId> {
        if !self.state().can_start() {
            return Err(ParleyError::Session(format!(
                "cannot start while session is {}",
                self.state()
            )));
        }
        if microphone == MicrophoneAccess::Denied {
            self.error_message = Some(MIC_DENIED.to_string());
            return Err(ParleyError::PermissionDenied(MIC_DENIED.to_string()));
        }

        let id = SessionId::generate();
        self.recorder.clear();
        self.slot.reset(id.clone());
        self.session = Some(Session::new(id.clone()));
        self.muted = false;
        self.pending_extraction = false;
        self.error_message = None;
        self.data_error = None;
        self.last_report = None;
        info!(session_id = %id, channel = self.channel.name(), "Session starting");

        self.spawn_registration(id.clone());
        let sink = self.spawn_forwarder(id.clone());

        match self.channel.start(&self.agent_id, sink).await {
            Ok(handle) => {
                info!(session_id = %id, handle = %handle, "Conversation opened");
                if let Some(session) = self.session.as_mut() {
                    session.handle = Some(handle);
                }
                Ok(id)
            }
            Err(e) => {
                warn!(session_id = %id, error = %e, "Failed to start conversation");
                self.error_message = Some(START_FAILED.to_string());
                if let Some(session) = self.session.as_mut() {
                    session.transition(SessionState::Failed);
                }
                Err(e)
            }
        }
    }

    /// End the live session.
    ///
    /// A teardown failure is surfaced as a dismissible error; the session
    /// ends either way.
    pub async fn end(&mut self) -> ParleyResult<()> {
        if !self.state().is_live() {
            debug!(state = %self.state(), "End requested with no live session");
            return Ok(());
        }
        self.teardown().await;
        Ok(())
    }

    /// Flip mute by setting output volume to 0 or 1. Returns the new flag.
    pub async fn toggle_mute(&mut self) -> ParleyResult<bool> {
        if self.state() != SessionState::Active {
            return Err(ParleyError::Session("mute requires an active session".to_string()));
        }
        let level = if self.muted { 1.0 } else { 0.0 };
        match self.channel.set_volume(level).await {
            Ok(()) => {
                self.muted = !self.muted;
                debug!(muted = self.muted, "Volume changed");
                Ok(self.muted)
            }
            Err(e) => {
                warn!(error = %e, "Failed to change volume");
                self.error_message = Some(VOLUME_FAILED.to_string());
                Err(e)
            }
        }
    }

    /// Record a typed user turn. The dialogue engine only hears audio, so the
    /// text is kept locally.
    pub fn send_text(&mut self, text: &str) -> ParleyResult<()> {
        if self.state() != SessionState::Active {
            return Err(ParleyError::Session("typing requires an active session".to_string()));
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            self.recorder.append(TranscriptTurn::user(trimmed));
        }
        Ok(())
    }

    pub fn dismiss_error(&mut self) {
        self.error_message = None;
    }

    /// Re-run the session-keyed remote fetch after a miss.
    pub async fn retry_fetch(&mut self) -> ParleyResult<ProfileRecord> {
        let Some(id) = self.session_id().cloned() else {
            return Err(ParleyError::Session("no session to fetch for".to_string()));
        };
        info!(session_id = %id, "Manual fetch");

        let result = match self.registry.fetch_by_session(&id).await {
            Ok(envelope) => record_from_envelope(&envelope).ok_or(ParleyError::Envelope {
                message: envelope.message.clone(),
            }),
            Err(e) => Err(e),
        };

        match result {
            Ok(record) => {
                self.data_error = None;
                match self.slot.commit(&id, record.clone()) {
                    CommitOutcome::AlreadyResolved => Ok(self.slot.current().unwrap_or(record)),
                    _ => Ok(record),
                }
            }
            Err(e) => {
                warn!(session_id = %id, error = %e, "Manual fetch failed");
                let message = match &e {
                    ParleyError::Envelope { message } => {
                        message.clone().unwrap_or_else(|| RETRIEVE_FAILED.to_string())
                    }
                    other => other.user_facing(),
                };
                self.data_error = Some(message);
                Err(e)
            }
        }
    }

    /// Wait for the next queued event.
    pub async fn next_event(&mut self) -> Option<ControllerEvent> {
        self.events_rx.recv().await
    }

    /// Apply one event.
    pub async fn handle(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::Channel { session_id, event } => {
                if !self.is_current(&session_id) {
                    debug!(session_id = %session_id, "Dropping channel event for stale session");
                    return;
                }
                self.on_channel_event(session_id, event).await;
            }
            ControllerEvent::SettleElapsed { session_id } => {
                if !self.is_current(&session_id) || !self.pending_extraction {
                    return;
                }
                self.launch_pipeline(session_id);
            }
            ControllerEvent::ExtractionFinished { session_id, report } => {
                if !self.is_current(&session_id) {
                    debug!(session_id = %session_id, "Dropping extraction result for stale session");
                    return;
                }
                self.on_extraction_finished(session_id, report);
            }
        }
    }

    /// Process events until the session has ended and no extraction is
    /// outstanding.
    pub async fn run_until_idle(&mut self) -> SessionOutcome {
        while !self.is_idle() {
            match self.next_event().await {
                Some(event) => self.handle(event).await,
                None => break,
            }
        }
        self.outcome()
    }

    pub fn outcome(&self) -> SessionOutcome {
        SessionOutcome {
            session_id: self.session_id().cloned(),
            state: self.state(),
            transcript: self.recorder.snapshot(),
            profile: self.slot.current(),
            extraction: self.last_report.clone(),
            error_message: self.error_message.clone(),
            data_error: self.data_error.clone(),
        }
    }

    fn is_current(&self, session_id: &SessionId) -> bool {
        self.session_id() == Some(session_id)
    }

    async fn on_channel_event(&mut self, session_id: SessionId, event: ChannelEvent) {
        match event {
            ChannelEvent::Connected => {
                if self.state() == SessionState::Connecting {
                    self.set_state(SessionState::Active);
                    info!(session_id = %session_id, "Session active");
                }
            }
            ChannelEvent::Disconnected => {
                if self.state().is_live() {
                    info!(session_id = %session_id, "Channel disconnected");
                    self.finish();
                }
            }
            ChannelEvent::Error(message) => {
                warn!(session_id = %session_id, error = %message, "Channel error");
                self.error_message = Some(message);
                if self.state().is_live() {
                    self.set_state(SessionState::Failed);
                }
            }
            ChannelEvent::Message(inbound) => {
                let mut resolved = false;
                for effect in classify(&inbound) {
                    match effect {
                        Effect::AppendTurn(turn) => {
                            if self.state().is_live() {
                                self.recorder.append(turn);
                            }
                        }
                        Effect::ResolveProfile { record, via } => {
                            debug!(session_id = %session_id, ?via, "Profile candidate");
                            if self.slot.commit(&session_id, record) == CommitOutcome::Committed {
                                resolved = true;
                            }
                        }
                    }
                }
                if resolved && self.state().is_live() {
                    self.teardown().await;
                }
            }
        }
    }

    async fn teardown(&mut self) {
        if let Err(e) = self.channel.end().await {
            warn!(error = %e, "Failed to end conversation");
            self.error_message = Some(END_FAILED.to_string());
        }
        self.finish();
    }

    /// Move to `Ended` and, unless already resolved, schedule extraction.
    fn finish(&mut self) {
        self.set_state(SessionState::Ended);
        let Some(id) = self.session_id().cloned() else {
            return;
        };
        if self.slot.is_resolved() {
            info!(session_id = %id, "Session ended with profile resolved");
            return;
        }

        self.pending_extraction = true;
        let delay = self.pipeline.config().settle_delay();
        info!(session_id = %id, delay_ms = delay.as_millis() as u64, "Session ended, extraction scheduled");
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(ControllerEvent::SettleElapsed { session_id: id });
        });
    }

    fn launch_pipeline(&mut self, session_id: SessionId) {
        if self.slot.is_resolved() {
            info!(session_id = %session_id, "Resolved during settle delay, skipping extraction");
            self.pending_extraction = false;
            return;
        }
        let ctx = ExtractionContext {
            session_id: Some(session_id.clone()),
            transcript: self.recorder.snapshot(),
            cache: Arc::new(self.slot.clone()),
        };
        let pipeline = self.pipeline.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let report = pipeline.run(&ctx).await;
            let _ = tx.send(ControllerEvent::ExtractionFinished { session_id, report });
        });
    }

    fn on_extraction_finished(&mut self, session_id: SessionId, report: ExtractionReport) {
        self.pending_extraction = false;
        match &report.outcome {
            ExtractionOutcome::Found { strategy, record } => {
                let commit = self.slot.commit(&session_id, (**record).clone());
                info!(session_id = %session_id, strategy = %strategy, ?commit, "Extraction finished");
                self.data_error = None;
            }
            ExtractionOutcome::NotFound { message, .. } => {
                info!(session_id = %session_id, "Extraction finished without a record");
                if !self.slot.is_resolved() {
                    self.data_error = Some(message.clone());
                }
            }
        }
        self.last_report = Some(report);
    }

    fn set_state(&mut self, to: SessionState) {
        if let Some(session) = self.session.as_mut() {
            session.transition(to);
        }
    }

    fn spawn_registration(&self, session_id: SessionId) {
        let registry = self.registry.clone();
        tokio::spawn(async move {
            let registration = SessionRegistration::started(session_id);
            if let Err(e) = registry.register(&registration).await {
                warn!(session_id = %registration.session_id, error = %e, "Session registration failed");
            }
        });
    }

    /// Per-session task that tags channel events with `session_id`.
    fn spawn_forwarder(&self, session_id: SessionId) -> mpsc::UnboundedSender<ChannelEvent> {
        let (sink, mut rx) = mpsc::unbounded_channel::<ChannelEvent>();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let tagged = ControllerEvent::Channel {
                    session_id: session_id.clone(),
                    event,
                };
                if tx.send(tagged).is_err() {
                    break;
                }
            }
        });
        sink
    }
}
