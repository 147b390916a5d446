//! ViewerSession: the watching side's state machine.
//!
//! A viewer connects to one host by share code, receives the host's stream,
//! and sends touch/key commands back over a reliable control leg.
//!
//! # States (for beginners)
//!
//! ```text
//!   Idle ──connect──► Connecting ──remote stream──► Connected
//!                        │   │                         │
//!                        │   └──── far end closed ─────┴──► Disconnected
//!                        │
//!                        └── timeout / transport error ───► Error
//! ```
//!
//! `Disconnected` and `Error` are terminal: only a new [`ViewerSession::connect`]
//! (or [`ViewerSession::disconnect`], which resets to `Idle`) leaves them.
//!
//! # Driving the session
//!
//! Like the host session, the viewer never installs callbacks.  The owner
//! feeds [`TransportEvent`]s into [`ViewerSession::handle_event`] and calls
//! [`ViewerSession::handle_connect_timeout`] when the connect deadline passes.
//! [`ViewerSession::run_until_settled`] does both until the attempt settles.
//!
//! ```text
//! let pending = viewer.connect("SHRABC1234567").await;
//! viewer.run_until_settled(&mut events).await;
//! let stream = pending.outcome().await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use cast_core::{
    serialize_command, ControlPayload, LegId, LegKind, MediaStream, PeerId,
    RemoteControlCommand, Rendezvous, ShareId, TransportError, TransportEvent,
};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// How long a connection attempt may take before it is abandoned.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection state of a viewer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerState {
    Idle,
    Connecting,
    Connected,
    Disconnected,
    Error,
}

/// Outward notifications emitted by the session.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerNotification {
    StateChanged(ViewerState),
    Failed(ViewerError),
}

/// Why a connection attempt failed or ended.
///
/// The messages are shown to the person watching, so they say what to do
/// rather than what went wrong internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewerError {
    #[error("invalid share code: {0}")]
    InvalidShareId(String),

    #[error("share not found; it may have stopped or the code is wrong")]
    NotFound,

    #[error("network connection failed")]
    Network,

    #[error("signaling server connection failed")]
    SignalingServer,

    #[error("connection timed out; check that the share code is correct")]
    Timeout,

    #[error("the host ended the broadcast")]
    HostClosed,

    /// The attempt was superseded by a newer `connect` or by `disconnect`.
    #[error("connection attempt cancelled")]
    Cancelled,

    #[error("{0}")]
    Transport(String),
}

impl From<TransportError> for ViewerError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::PeerUnavailable(_) => ViewerError::NotFound,
            TransportError::Network(_) => ViewerError::Network,
            TransportError::SignalingServer(_) => ViewerError::SignalingServer,
            other => ViewerError::Transport(other.to_string()),
        }
    }
}

/// The eventual result of one [`ViewerSession::connect`] call.
#[derive(Debug)]
pub struct ConnectPending {
    rx: oneshot::Receiver<Result<MediaStream, ViewerError>>,
}

impl ConnectPending {
    /// Waits for the attempt to settle.
    ///
    /// Resolves with the host's stream once connected.  An attempt abandoned
    /// without an outcome resolves to [`ViewerError::Cancelled`].
    pub async fn outcome(self) -> Result<MediaStream, ViewerError> {
        self.rx.await.unwrap_or(Err(ViewerError::Cancelled))
    }

    /// The outcome if the attempt has already settled.
    pub fn try_outcome(&mut self) -> Option<Result<MediaStream, ViewerError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(ViewerError::Cancelled)),
        }
    }
}

/// The viewer-side session.
pub struct ViewerSession {
    rendezvous: Arc<dyn Rendezvous>,
    connect_timeout: Duration,
    state: ViewerState,
    host: Option<PeerId>,
    registration_requested: bool,
    control: Option<LegId>,
    control_open: bool,
    media: Option<LegId>,
    placeholder: Option<MediaStream>,
    remote_stream: Option<MediaStream>,
    deadline: Option<Instant>,
    pending: Option<oneshot::Sender<Result<MediaStream, ViewerError>>>,
    last_error: Option<ViewerError>,
    notifications: mpsc::UnboundedSender<ViewerNotification>,
}

impl ViewerSession {
    /// Creates an idle session and the receiver for its notifications.
    pub fn new(
        rendezvous: Arc<dyn Rendezvous>,
        connect_timeout: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<ViewerNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                rendezvous,
                connect_timeout,
                state: ViewerState::Idle,
                host: None,
                registration_requested: false,
                control: None,
                control_open: false,
                media: None,
                placeholder: None,
                remote_stream: None,
                deadline: None,
                pending: None,
                last_error: None,
                notifications: tx,
            },
            rx,
        )
    }

    pub fn state(&self) -> ViewerState {
        self.state
    }

    pub fn host(&self) -> Option<&PeerId> {
        self.host.as_ref()
    }

    /// The host's stream while connected.
    pub fn remote_stream(&self) -> Option<&MediaStream> {
        self.remote_stream.as_ref()
    }

    pub fn last_error(&self) -> Option<&ViewerError> {
        self.last_error.as_ref()
    }

    /// Whether commands can currently be sent.
    pub fn is_control_open(&self) -> bool {
        self.control.is_some() && self.control_open
    }

    /// When the in-flight attempt times out, if one is in flight.
    pub fn connect_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Starts connecting to the host registered as `host_id`.
    ///
    /// Any previous attempt or connection is released first; its pending
    /// outcome resolves to [`ViewerError::Cancelled`].  This call returns
    /// once the legs have been requested.  The attempt itself settles when
    /// the host's stream arrives (see [`Self::handle_event`]), on a transport
    /// error, or at the deadline.
    pub async fn connect(&mut self, host_id: &str) -> ConnectPending {
        self.teardown(Err(ViewerError::Cancelled)).await;

        let (tx, rx) = oneshot::channel();
        self.pending = Some(tx);
        self.last_error = None;

        let host = match ShareId::parse(host_id) {
            Ok(id) => PeerId::new(id.to_string()),
            Err(e) => {
                self.fail(ViewerError::InvalidShareId(e.to_string())).await;
                return ConnectPending { rx };
            }
        };

        let deadline = Instant::now() + self.connect_timeout;
        self.deadline = Some(deadline);
        self.host = Some(host.clone());
        self.set_state(ViewerState::Connecting);
        info!(host = %host, timeout = ?self.connect_timeout, "connecting to host");

        match tokio::time::timeout_at(deadline, self.open_legs(&host)).await {
            Ok(Ok(())) => debug!(host = %host, "legs requested; waiting for the host's stream"),
            Ok(Err(e)) => self.fail(e).await,
            Err(_) => self.fail(ViewerError::Timeout).await,
        }
        ConnectPending { rx }
    }

    async fn open_legs(&mut self, host: &PeerId) -> Result<(), ViewerError> {
        self.registration_requested = true;
        let local = self.rendezvous.register(None).await?;
        debug!(local = %local, "viewer registered");

        self.control = Some(self.rendezvous.open_control_channel(host).await?);

        let placeholder = MediaStream::placeholder();
        self.placeholder = Some(placeholder.clone());
        self.media = Some(self.rendezvous.dial(host, placeholder).await?);
        Ok(())
    }

    /// Applies one transport event.
    pub async fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::RemoteStream { leg, stream, .. } => {
                self.on_remote_stream(leg, stream);
            }
            TransportEvent::ControlOpened { leg, .. } => {
                if self.control == Some(leg) {
                    debug!(%leg, "control channel open");
                    self.control_open = true;
                }
            }
            TransportEvent::ControlData { leg, .. } => {
                debug!(%leg, "ignoring data from host");
            }
            TransportEvent::IncomingMedia(request) => {
                debug!(peer = %request.peer, "viewers do not accept media; declining");
                self.rendezvous.decline(&request).await;
            }
            TransportEvent::LegClosed { leg, kind, .. } => self.on_leg_closed(leg, kind),
            TransportEvent::LegErrored { leg, kind, error, .. } => {
                self.on_leg_errored(leg, kind, error).await;
            }
            TransportEvent::SignalingError(e) => {
                if matches!(self.state, ViewerState::Connecting | ViewerState::Connected) {
                    error!(error = %e, "signaling error");
                    self.fail(e.into()).await;
                }
            }
            TransportEvent::Disconnected => {
                if self.state == ViewerState::Connected {
                    warn!("rendezvous connection lost");
                    self.set_state(ViewerState::Disconnected);
                }
            }
        }
    }

    fn on_remote_stream(&mut self, leg: LegId, stream: MediaStream) {
        if self.media != Some(leg) {
            debug!(%leg, "stream on an unknown leg; ignoring");
            return;
        }
        if stream.is_placeholder() {
            warn!(%leg, "host answered with a placeholder stream; ignoring");
            return;
        }
        if self.state != ViewerState::Connecting {
            return;
        }
        info!(stream = %stream.id(), "receiving host stream");
        self.deadline = None;
        self.remote_stream = Some(stream.clone());
        self.set_state(ViewerState::Connected);
        self.resolve(Ok(stream));
    }

    fn on_leg_closed(&mut self, leg: LegId, kind: LegKind) {
        match kind {
            LegKind::Media if self.media == Some(leg) => {
                info!(%leg, "host closed the media leg");
                self.media = None;
                self.remote_stream = None;
                if matches!(self.state, ViewerState::Connecting | ViewerState::Connected) {
                    self.deadline = None;
                    self.resolve(Err(ViewerError::HostClosed));
                    self.set_state(ViewerState::Disconnected);
                }
            }
            LegKind::Control if self.control == Some(leg) => {
                info!(%leg, "control channel closed");
                self.control = None;
                self.control_open = false;
            }
            _ => debug!(%leg, "close for a stale leg; ignoring"),
        }
    }

    async fn on_leg_errored(&mut self, leg: LegId, kind: LegKind, e: TransportError) {
        match kind {
            LegKind::Media if self.media == Some(leg) => {
                error!(%leg, error = %e, "media leg failed");
                self.media = None;
                self.fail(e.into()).await;
            }
            LegKind::Control if self.control == Some(leg) => {
                warn!(%leg, error = %e, "control channel failed");
                self.control = None;
                self.control_open = false;
            }
            _ => debug!(%leg, "error for a stale leg; ignoring"),
        }
    }

    /// Fails the attempt with [`ViewerError::Timeout`] if it is still
    /// connecting and its deadline has passed.  Returns whether it did.
    pub async fn handle_connect_timeout(&mut self) -> bool {
        match (self.state, self.deadline) {
            (ViewerState::Connecting, Some(deadline)) if Instant::now() >= deadline => {
                warn!(host = ?self.host, "connection attempt timed out");
                self.fail(ViewerError::Timeout).await;
                true
            }
            _ => false,
        }
    }

    /// Feeds events and the connect deadline into the session until it
    /// leaves `Connecting`.  Returns the settled state.
    pub async fn run_until_settled(
        &mut self,
        events: &mut mpsc::UnboundedReceiver<TransportEvent>,
    ) -> ViewerState {
        while self.state == ViewerState::Connecting {
            let deadline = self.deadline;
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        self.fail(ViewerError::Transport("transport event stream closed".to_string()))
                            .await;
                    }
                },
                _ = sleep_until(deadline) => {
                    self.handle_connect_timeout().await;
                }
            }
        }
        self.state
    }

    /// Applies every event already queued, without waiting.
    pub async fn pump(&mut self, events: &mut mpsc::UnboundedReceiver<TransportEvent>) -> usize {
        let mut handled = 0;
        while let Ok(event) = events.try_recv() {
            self.handle_event(event).await;
            handled += 1;
        }
        handled
    }

    /// Sends one command to the host.
    ///
    /// Delivery is at most once: nothing is queued, acknowledged, or retried.
    /// Returns `false` (with a warning) if the control channel is not open or
    /// the write failed.
    pub async fn send_command(&self, command: &RemoteControlCommand) -> bool {
        let Some(leg) = self.control.filter(|_| self.control_open) else {
            warn!(?command, "control channel not open; dropping command");
            return false;
        };
        let text = match serialize_command(command) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "refusing to send an unencodable command");
                return false;
            }
        };
        match self.rendezvous.send(leg, ControlPayload::Text(text)).await {
            Ok(()) => true,
            Err(e) => {
                warn!(%leg, error = %e, "failed to send command");
                false
            }
        }
    }

    /// Closes every leg, releases the registration, and returns to `Idle`.
    /// Safe to call in any state and any number of times.
    pub async fn disconnect(&mut self) {
        self.teardown(Err(ViewerError::Cancelled)).await;
        self.last_error = None;
        self.set_state(ViewerState::Idle);
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    async fn fail(&mut self, e: ViewerError) {
        error!(error = %e, "viewer connection failed");
        self.last_error = Some(e.clone());
        self.teardown(Err(e.clone())).await;
        self.set_state(ViewerState::Error);
        let _ = self.notifications.send(ViewerNotification::Failed(e));
    }

    async fn teardown(&mut self, outcome: Result<MediaStream, ViewerError>) {
        self.deadline = None;
        for leg in [self.control.take(), self.media.take()].into_iter().flatten() {
            self.rendezvous.close(leg).await;
        }
        self.control_open = false;
        if let Some(placeholder) = self.placeholder.take() {
            placeholder.stop_tracks();
        }
        self.remote_stream = None;
        if std::mem::take(&mut self.registration_requested) {
            self.rendezvous.release().await;
        }
        self.host = None;
        self.resolve(outcome);
    }

    fn resolve(&mut self, outcome: Result<MediaStream, ViewerError>) {
        if let Some(tx) = self.pending.take() {
            // The caller may have dropped its `ConnectPending`.
            let _ = tx.send(outcome);
        }
    }

    fn set_state(&mut self, state: ViewerState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "viewer state changed");
            self.state = state;
            let _ = self.notifications.send(ViewerNotification::StateChanged(state));
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use cast_core::transport::mock::{RendezvousCall, ScriptedRendezvous};
    use cast_core::{MediaRequest, TouchAction};

    const HOST: &str = "SHRABCDEF1234";

    fn viewer(
        rendezvous: &Arc<ScriptedRendezvous>,
    ) -> (ViewerSession, mpsc::UnboundedReceiver<ViewerNotification>) {
        ViewerSession::new(rendezvous.clone(), DEFAULT_CONNECT_TIMEOUT)
    }

    fn host_stream(leg: LegId) -> TransportEvent {
        TransportEvent::RemoteStream {
            peer: PeerId::from(HOST),
            leg,
            stream: MediaStream::received(&MediaStream::captured(30)),
        }
    }

    fn states(notes: &mut mpsc::UnboundedReceiver<ViewerNotification>) -> Vec<ViewerState> {
        std::iter::from_fn(|| notes.try_recv().ok())
            .filter_map(|n| match n {
                ViewerNotification::StateChanged(s) => Some(s),
                ViewerNotification::Failed(_) => None,
            })
            .collect()
    }

    /// Connects and opens the control leg; media is leg 2, control leg 1.
    async fn connected(rendezvous: &Arc<ScriptedRendezvous>) -> ViewerSession {
        let (mut session, _notes) = viewer(rendezvous);
        let _pending = session.connect(HOST).await;
        session
            .handle_event(TransportEvent::ControlOpened {
                peer: PeerId::from(HOST),
                leg: LegId(1),
            })
            .await;
        session.handle_event(host_stream(LegId(2))).await;
        session
    }

    #[tokio::test]
    async fn test_connect_requests_control_then_media_with_placeholder() {
        // Arrange
        let rendezvous = Arc::new(ScriptedRendezvous::new());
        let (mut session, mut notes) = viewer(&rendezvous);

        // Act
        let mut pending = session.connect(HOST).await;

        // Assert
        assert_eq!(session.state(), ViewerState::Connecting);
        assert!(session.connect_deadline().is_some());
        assert!(pending.try_outcome().is_none());
        assert_eq!(
            rendezvous.calls(),
            vec![
                RendezvousCall::Register(None),
                RendezvousCall::OpenControl(PeerId::from(HOST)),
                RendezvousCall::Dial(PeerId::from(HOST)),
            ]
        );
        assert_eq!(states(&mut notes), vec![ViewerState::Connecting]);
    }

    #[tokio::test]
    async fn test_remote_stream_connects_and_resolves_pending() {
        // Arrange
        let rendezvous = Arc::new(ScriptedRendezvous::new());
        let (mut session, _notes) = viewer(&rendezvous);
        let pending = session.connect(HOST).await;

        // Act
        session.handle_event(host_stream(LegId(2))).await;

        // Assert
        assert_eq!(session.state(), ViewerState::Connected);
        assert!(session.connect_deadline().is_none());
        let stream = tokio_test::assert_ok!(pending.outcome().await);
        assert_eq!(session.remote_stream().map(|s| s.id()), Some(stream.id()));
    }

    #[tokio::test]
    async fn test_placeholder_from_host_is_never_exposed() {
        let rendezvous = Arc::new(ScriptedRendezvous::new());
        let (mut session, _notes) = viewer(&rendezvous);
        let _pending = session.connect(HOST).await;

        session
            .handle_event(TransportEvent::RemoteStream {
                peer: PeerId::from(HOST),
                leg: LegId(2),
                stream: MediaStream::received(&MediaStream::placeholder()),
            })
            .await;

        assert_eq!(session.state(), ViewerState::Connecting);
        assert!(session.remote_stream().is_none());
    }

    #[tokio::test]
    async fn test_malformed_share_code_fails_without_touching_transport() {
        let rendezvous = Arc::new(ScriptedRendezvous::new());
        let (mut session, _notes) = viewer(&rendezvous);

        let pending = session.connect("shr-nope").await;

        assert_eq!(session.state(), ViewerState::Error);
        assert!(matches!(
            pending.outcome().await,
            Err(ViewerError::InvalidShareId(_))
        ));
        assert!(rendezvous.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_tears_down_every_partial_leg() {
        // Arrange
        let rendezvous = Arc::new(ScriptedRendezvous::new());
        let (mut session, _notes) = viewer(&rendezvous);
        let (_tx, mut events) = mpsc::unbounded_channel();
        let pending = session.connect(HOST).await;

        // Act
        let settled = session.run_until_settled(&mut events).await;

        // Assert
        assert_eq!(settled, ViewerState::Error);
        assert_eq!(session.last_error(), Some(&ViewerError::Timeout));
        assert!(matches!(pending.outcome().await, Err(ViewerError::Timeout)));
        let calls = rendezvous.calls();
        assert!(calls.contains(&RendezvousCall::Close(LegId(1))));
        assert!(calls.contains(&RendezvousCall::Close(LegId(2))));
        assert_eq!(rendezvous.count(|c| *c == RendezvousCall::Release), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_registration_times_out_inside_connect() {
        let rendezvous = Arc::new(ScriptedRendezvous::new());
        rendezvous.stall_register();
        let (mut session, _notes) = viewer(&rendezvous);

        let started = Instant::now();
        let mut pending = session.connect(HOST).await;

        assert!(started.elapsed() >= DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(session.state(), ViewerState::Error);
        assert!(matches!(pending.try_outcome(), Some(Err(ViewerError::Timeout))));
        assert_eq!(rendezvous.count(|c| *c == RendezvousCall::Release), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_ignored_once_connected() {
        let rendezvous = Arc::new(ScriptedRendezvous::new());
        let mut session = connected(&rendezvous).await;

        tokio::time::advance(DEFAULT_CONNECT_TIMEOUT * 2).await;
        let fired = session.handle_connect_timeout().await;

        assert!(!fired);
        assert_eq!(session.state(), ViewerState::Connected);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_reported_as_not_found() {
        let rendezvous = Arc::new(ScriptedRendezvous::new());
        rendezvous.fail_dial(TransportError::PeerUnavailable(PeerId::from(HOST)));
        let (mut session, _notes) = viewer(&rendezvous);

        let pending = session.connect(HOST).await;

        assert_eq!(session.state(), ViewerState::Error);
        let err = pending.outcome().await.unwrap_err();
        assert_eq!(err, ViewerError::NotFound);
        assert_eq!(
            err.to_string(),
            "share not found; it may have stopped or the code is wrong"
        );
        // The control leg opened before the dial failed is released.
        assert!(rendezvous.calls().contains(&RendezvousCall::Close(LegId(1))));
    }

    #[test]
    fn test_transport_errors_map_to_distinguishable_causes() {
        assert_eq!(
            ViewerError::from(TransportError::Network("ice".into())),
            ViewerError::Network
        );
        assert_eq!(
            ViewerError::from(TransportError::SignalingServer("503".into())),
            ViewerError::SignalingServer
        );
        assert_eq!(
            ViewerError::from(TransportError::Other("boom".into())),
            ViewerError::Transport("boom".into())
        );
        assert_eq!(ViewerError::Network.to_string(), "network connection failed");
        assert_eq!(
            ViewerError::SignalingServer.to_string(),
            "signaling server connection failed"
        );
    }

    #[tokio::test]
    async fn test_far_end_media_close_disconnects_and_clears_stream() {
        let rendezvous = Arc::new(ScriptedRendezvous::new());
        let mut session = connected(&rendezvous).await;

        session
            .handle_event(TransportEvent::LegClosed {
                peer: PeerId::from(HOST),
                leg: LegId(2),
                kind: LegKind::Media,
            })
            .await;

        assert_eq!(session.state(), ViewerState::Disconnected);
        assert!(session.remote_stream().is_none());
        assert!(session.last_error().is_none());
    }

    #[tokio::test]
    async fn test_media_close_after_rendezvous_drop_clears_stream() {
        // Arrange
        let rendezvous = Arc::new(ScriptedRendezvous::new());
        let mut session = connected(&rendezvous).await;
        session.handle_event(TransportEvent::Disconnected).await;
        assert!(session.remote_stream().is_some());

        // Act
        session
            .handle_event(TransportEvent::LegClosed {
                peer: PeerId::from(HOST),
                leg: LegId(2),
                kind: LegKind::Media,
            })
            .await;

        // Assert
        assert_eq!(session.state(), ViewerState::Disconnected);
        assert!(session.remote_stream().is_none());
        assert!(session.last_error().is_none());
    }

    #[tokio::test]
    async fn test_rendezvous_drop_while_connected_is_not_an_error() {
        let rendezvous = Arc::new(ScriptedRendezvous::new());
        let mut session = connected(&rendezvous).await;

        session.handle_event(TransportEvent::Disconnected).await;

        assert_eq!(session.state(), ViewerState::Disconnected);
        assert!(session.last_error().is_none());
    }

    #[tokio::test]
    async fn test_signaling_error_moves_to_error() {
        let rendezvous = Arc::new(ScriptedRendezvous::new());
        let mut session = connected(&rendezvous).await;

        session
            .handle_event(TransportEvent::SignalingError(TransportError::SignalingServer(
                "gone".into(),
            )))
            .await;

        assert_eq!(session.state(), ViewerState::Error);
        assert_eq!(session.last_error(), Some(&ViewerError::SignalingServer));
        assert!(!session.is_control_open());
    }

    #[tokio::test]
    async fn test_send_command_requires_open_control_channel() {
        // Arrange
        let rendezvous = Arc::new(ScriptedRendezvous::new());
        let (mut session, _notes) = viewer(&rendezvous);
        let _pending = session.connect(HOST).await;
        let cmd = RemoteControlCommand::touch(TouchAction::Down, 0.5, 0.5, 1);

        // Act: the leg exists but has not reported open yet.
        let early = session.send_command(&cmd).await;
        session
            .handle_event(TransportEvent::ControlOpened {
                peer: PeerId::from(HOST),
                leg: LegId(1),
            })
            .await;
        let sent = session.send_command(&cmd).await;

        // Assert
        assert!(!early);
        assert!(sent);
        let payloads = rendezvous.sent();
        assert_eq!(payloads.len(), 1);
        match &payloads[0] {
            ControlPayload::Text(text) => {
                assert_eq!(cast_core::deserialize_command(text), Some(cmd));
            }
            other => panic!("expected a text payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_control_leg_error_only_drops_control() {
        let rendezvous = Arc::new(ScriptedRendezvous::new());
        let mut session = connected(&rendezvous).await;

        session
            .handle_event(TransportEvent::LegErrored {
                peer: PeerId::from(HOST),
                leg: LegId(1),
                kind: LegKind::Control,
                error: TransportError::Network("reset".into()),
            })
            .await;

        assert_eq!(session.state(), ViewerState::Connected);
        assert!(!session.is_control_open());
        assert!(!session.send_command(&RemoteControlCommand::key(cast_core::RemoteKey::Home)).await);
    }

    #[tokio::test]
    async fn test_reconnect_cancels_the_previous_attempt() {
        let rendezvous = Arc::new(ScriptedRendezvous::new());
        let (mut session, _notes) = viewer(&rendezvous);
        let first = session.connect(HOST).await;

        let _second = session.connect("SHRZZZZZZ0000").await;

        assert_eq!(first.outcome().await.map(|s| s.id()), Err(ViewerError::Cancelled));
        assert_eq!(session.state(), ViewerState::Connecting);
        assert_eq!(session.host(), Some(&PeerId::from("SHRZZZZZZ0000")));
        assert_eq!(rendezvous.count(|c| *c == RendezvousCall::Release), 1);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        // Arrange
        let rendezvous = Arc::new(ScriptedRendezvous::new());
        let mut session = connected(&rendezvous).await;

        // Act
        session.disconnect().await;
        session.disconnect().await;

        // Assert
        assert_eq!(session.state(), ViewerState::Idle);
        assert_eq!(rendezvous.count(|c| *c == RendezvousCall::Release), 1);
        assert_eq!(rendezvous.count(|c| matches!(c, RendezvousCall::Close(_))), 2);
    }

    #[tokio::test]
    async fn test_incoming_media_is_declined() {
        let rendezvous = Arc::new(ScriptedRendezvous::new());
        let (mut session, _notes) = viewer(&rendezvous);

        session
            .handle_event(TransportEvent::IncomingMedia(MediaRequest {
                leg: LegId(9),
                peer: PeerId::from("SHRSTRANGER00"),
            }))
            .await;

        assert_eq!(rendezvous.calls(), vec![RendezvousCall::Decline(LegId(9))]);
    }
}
