//! Session controller and lifecycle.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use fw_capture::{CaptureDevice, FrameEncoder, FrameSource, JpegFrameEncoder};
use fw_client::{DetectClient, EventSource, StreamConnector};
use fw_models::{BatchInput, DetectionParameters, InboundEvent};

use crate::error::{SessionError, SessionResult};
use crate::event::SessionEvent;
use crate::sampler::{run_sampler, SamplerContext, DEFAULT_SAMPLE_PERIOD};
use crate::sink::{BatchDisplay, HandleRegistry, ResultSink};
use crate::state::SessionState;

/// Controller configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Period between sampling ticks.
    pub sample_period: Duration,
    /// Buffered consumer events before stream-frame notifications drop
    /// (the sink always holds the latest frame regardless).
    pub event_buffer: usize,
    /// How long `stop` waits for the sampler to wind down before aborting.
    pub shutdown_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_period: DEFAULT_SAMPLE_PERIOD,
            event_buffer: 32,
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

impl SessionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            sample_period: std::env::var("FIREWATCH_SAMPLE_PERIOD_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.sample_period),
            event_buffer: std::env::var("FIREWATCH_EVENT_BUFFER")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.event_buffer),
            shutdown_grace: defaults.shutdown_grace,
        }
    }
}

/// Owns the lifecycle of detection sessions and batch submissions.
///
/// At most one session is active per controller. All resource handles
/// (capture source, channel halves, sampler timer) are owned here and only
/// ever mutated by `start`, `stop` and the tasks they spawn.
pub struct SessionController {
    device: Arc<dyn CaptureDevice>,
    connector: Arc<dyn StreamConnector>,
    encoder: Arc<dyn FrameEncoder>,
    client: DetectClient,
    config: SessionConfig,
    sink: ResultSink,
    state_tx: watch::Sender<SessionState>,
    events_tx: mpsc::Sender<SessionEvent>,
    events_rx: mpsc::Receiver<SessionEvent>,
    active: Option<ActiveSession>,
}

struct ActiveSession {
    session_id: Uuid,
    params_tx: watch::Sender<DetectionParameters>,
    shutdown_tx: watch::Sender<bool>,
    sampler: JoinHandle<()>,
    reader: JoinHandle<()>,
    source: Arc<Mutex<Box<dyn FrameSource>>>,
}

impl SessionController {
    pub fn new(
        device: Arc<dyn CaptureDevice>,
        connector: Arc<dyn StreamConnector>,
        client: DetectClient,
        config: SessionConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Idle);
        let (events_tx, events_rx) = mpsc::channel(config.event_buffer.max(1));

        Self {
            device,
            connector,
            encoder: Arc::new(JpegFrameEncoder::default()),
            client,
            config,
            sink: ResultSink::default(),
            state_tx,
            events_tx,
            events_rx,
            active: None,
        }
    }

    /// Replace the frame encoder.
    pub fn with_encoder(mut self, encoder: Arc<dyn FrameEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Plug a display-handle registry into the sink.
    pub fn with_registry(mut self, registry: Arc<dyn HandleRegistry>) -> Self {
        self.sink = ResultSink::new(registry);
        self
    }

    /// Current state snapshot.
    pub fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    /// Watch state transitions.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// The observation point for all results.
    pub fn sink(&self) -> &ResultSink {
        &self.sink
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Start a live session.
    ///
    /// Valid only from `Idle`; fails fast with [`SessionError::AlreadyActive`]
    /// while a session is running. Acquires the capture device, opens the
    /// stream channel, and spawns the sampler (immediate first tick) and the
    /// inbound reader.
    pub async fn start(&mut self, params: DetectionParameters) -> SessionResult<()> {
        if self.active.is_some() {
            return Err(SessionError::AlreadyActive);
        }

        let session_id = Uuid::new_v4();
        info!(session_id = %session_id, "starting session");
        self.set_state(SessionState::Starting);

        let source = match self.device.acquire().await {
            Ok(source) => Arc::new(Mutex::new(source)),
            Err(e) => {
                error!(session_id = %session_id, error = %e, "capture device acquisition failed");
                self.set_state(SessionState::Error);
                self.set_state(SessionState::Idle);
                return Err(e.into());
            }
        };

        let (frame_sink, event_source) = match self.connector.connect().await {
            Ok(halves) => halves,
            Err(e) => {
                error!(session_id = %session_id, error = %e, "stream channel open failed");
                self.set_state(SessionState::Error);
                release_source(&source);
                self.set_state(SessionState::Idle);
                return Err(e.into());
            }
        };

        let (params_tx, params_rx) = watch::channel(params.clamped());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let sampler = tokio::spawn(run_sampler(SamplerContext {
            session_id,
            source: source.clone(),
            encoder: self.encoder.clone(),
            sink: frame_sink,
            params_rx,
            shutdown_rx,
            period: self.config.sample_period,
        }));
        let reader = tokio::spawn(run_reader(ReaderContext {
            session_id,
            events: event_source,
            sink: self.sink.clone(),
            tx: self.events_tx.clone(),
            state_tx: self.state_tx.clone(),
            shutdown_tx: shutdown_tx.clone(),
            source: source.clone(),
        }));

        self.active = Some(ActiveSession {
            session_id,
            params_tx,
            shutdown_tx,
            sampler,
            reader,
            source,
        });
        self.set_state(SessionState::Active);
        Ok(())
    }

    /// Update the parameters the sampler sends with each frame. The next
    /// tick picks them up; no-op when no session is active.
    pub fn set_parameters(&self, params: DetectionParameters) {
        if let Some(active) = &self.active {
            debug!(session_id = %active.session_id, "updating session parameters");
            let _ = active.params_tx.send(params.clamped());
        }
    }

    /// Stop the session.
    ///
    /// Idempotent: from `Idle`, or called twice, this is a no-op. Teardown
    /// order is fixed: cancel the sampler timer (the sampler closes the
    /// channel's outbound half on its way out), stop the reader, release
    /// the capture device. Every step is best-effort; the controller always
    /// ends `Idle`.
    pub async fn stop(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };

        self.set_state(SessionState::Stopping);
        let _ = active.shutdown_tx.send(true);

        if tokio::time::timeout(self.config.shutdown_grace, &mut active.sampler)
            .await
            .is_err()
        {
            warn!(session_id = %active.session_id, "sampler did not stop in time, aborting");
            active.sampler.abort();
        }

        active.reader.abort();
        let _ = (&mut active.reader).await;

        release_source(&active.source);
        self.set_state(SessionState::Idle);
        info!(session_id = %active.session_id, "session stopped");
    }

    /// Wait for the next session event.
    ///
    /// By the time a `Failed` event is observed, the reader has already
    /// driven `Error` and released the sampler, channel and capture tracks;
    /// this finishes the teardown so the controller ends `Idle`. A `Failed`
    /// event buffered from before a manual `stop()` is surfaced as-is and
    /// leaves the idle controller untouched.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        let event = self.events_rx.recv().await?;
        if matches!(event, SessionEvent::Failed { .. }) && self.active.is_some() {
            self.stop().await;
        }
        Some(event)
    }

    /// Submit a one-shot batch input.
    ///
    /// Independent of any live session: failures are request errors and no
    /// session state is touched on either path.
    pub async fn submit_batch(
        &self,
        input: &BatchInput,
        params: &DetectionParameters,
    ) -> SessionResult<BatchDisplay> {
        let result = self.client.submit(input, params).await?;
        Ok(self.sink.publish_batch(result))
    }

    fn set_state(&self, state: SessionState) {
        debug!(state = %state, "session state");
        // send_replace stores the transition even with no subscribers.
        self.state_tx.send_replace(state);
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        // Same teardown order as stop(), without awaiting: no resource may
        // outlive the controller.
        if let Some(active) = self.active.take() {
            let _ = active.shutdown_tx.send(true);
            active.sampler.abort();
            active.reader.abort();
            release_source(&active.source);
        }
    }
}

struct ReaderContext {
    session_id: Uuid,
    events: Box<dyn EventSource>,
    sink: ResultSink,
    tx: mpsc::Sender<SessionEvent>,
    state_tx: watch::Sender<SessionState>,
    shutdown_tx: watch::Sender<bool>,
    source: Arc<Mutex<Box<dyn FrameSource>>>,
}

/// Forward inbound channel events until the channel ends or faults.
///
/// A fatal fault drives `Error` and releases the sampler, channel and
/// capture tracks from here, so resources never depend on the consumer
/// polling `next_event`.
async fn run_reader(mut ctx: ReaderContext) {
    while let Some(event) = ctx.events.next_event().await {
        match event {
            Ok(InboundEvent::AnnotatedFrame(bytes)) => {
                let handle = ctx.sink.publish_stream_frame(bytes);
                // Latest wins: if the consumer lags, dropping the
                // notification is fine, the sink already holds the frame.
                let _ = ctx.tx.try_send(SessionEvent::StreamFrame(handle));
            }
            Ok(InboundEvent::Error { message }) => {
                error!(session_id = %ctx.session_id, message = %message, "server reported stream error");
                fail_session(&mut ctx, message).await;
                break;
            }
            Err(e) => {
                error!(session_id = %ctx.session_id, error = %e, "stream channel fault");
                fail_session(&mut ctx, e.to_string()).await;
                break;
            }
        }
    }
    debug!(session_id = %ctx.session_id, "inbound reader finished");
}

async fn fail_session(ctx: &mut ReaderContext, message: String) {
    ctx.state_tx.send_replace(SessionState::Error);
    // Stop the sampler timer first; the sampler closes the outbound half
    // on its way out. Then the tracks can go.
    let _ = ctx.shutdown_tx.send(true);
    release_source(&ctx.source);
    let _ = ctx.tx.send(SessionEvent::Failed { message }).await;
}

fn release_source(source: &Arc<Mutex<Box<dyn FrameSource>>>) {
    match source.lock() {
        Ok(mut source) => source.stop_tracks(),
        Err(poisoned) => poisoned.into_inner().stop_tracks(),
    }
}
