//! HostSession: the broadcasting side's state machine.
//!
//! One host session broadcasts one captured stream to any number of viewers
//! and accepts control commands back from each of them.
//!
//! # States (for beginners)
//!
//! ```text
//!   Idle ──start_sharing──► Initializing ──registered──► Ready
//!    ▲                          │                          │
//!    │                          └────────► Error ◄─────────┘
//!    │                                       │
//!    └───────── teardown (stop_sharing / failure) ◄─┘
//! ```
//!
//! `Error` is transient: the session releases everything and settles in
//! `Idle`, keeping the failure message in [`HostSession::last_error`], so it
//! can be started again.
//!
//! # Event-driven design
//!
//! The session never registers callbacks on transport objects.  The owner
//! feeds every [`TransportEvent`] into [`HostSession::handle_event`], which
//! updates the roster, answers media requests, dispatches commands, and emits
//! [`HostNotification`]s.  Tests drive it with synthetic events.
//!
//! # Failure scoping
//!
//! A failing leg only affects its own viewer record.  Only registration and
//! service-level signaling errors move the whole session to `Error`.

use std::sync::Arc;

use cast_core::{
    decode_payload, ControlConstants, LegId, LegKind, MediaRequest, MediaStream, PeerId,
    RemoteControlCommand, Rendezvous, ShareId, TransportError, TransportEvent,
};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::application::capture::{CaptureError, MediaSource};
use crate::application::dispatch_command::{dispatch, DeviceContext};
use crate::application::viewer_roster::{Detached, ViewerRoster};

/// Connection state of a host session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Idle,
    Initializing,
    Ready,
    Error,
}

/// Outward notifications emitted by the session.
#[derive(Debug, Clone, PartialEq)]
pub enum HostNotification {
    StateChanged(HostState),
    ViewerJoined(PeerId),
    ViewerLeft(PeerId),
    CommandReceived {
        peer: PeerId,
        command: RemoteControlCommand,
    },
}

/// Error type for starting a host session.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("screen capture failed: {0}")]
    Capture(#[from] CaptureError),

    /// Both the self-chosen id and the service-assigned fallback were taken.
    #[error("share id {0} is taken and no fallback id is available")]
    IdentifierTaken(String),

    #[error("rendezvous registration failed: {0}")]
    Registration(TransportError),

    #[error("signaling failure: {0}")]
    Signaling(TransportError),
}

/// The host-side session.
pub struct HostSession {
    rendezvous: Arc<dyn Rendezvous>,
    constants: ControlConstants,
    state: HostState,
    share_id: Option<PeerId>,
    last_error: Option<String>,
    stream: Option<MediaStream>,
    roster: ViewerRoster,
    notifications: mpsc::UnboundedSender<HostNotification>,
}

impl HostSession {
    /// Creates an idle session and the receiver for its notifications.
    pub fn new(
        rendezvous: Arc<dyn Rendezvous>,
        constants: ControlConstants,
    ) -> (Self, mpsc::UnboundedReceiver<HostNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                rendezvous,
                constants,
                state: HostState::Idle,
                share_id: None,
                last_error: None,
                stream: None,
                roster: ViewerRoster::new(),
                notifications: tx,
            },
            rx,
        )
    }

    pub fn state(&self) -> HostState {
        self.state
    }

    /// The identifier viewers connect to, once `Ready`.
    pub fn share_id(&self) -> Option<&PeerId> {
        self.share_id.as_ref()
    }

    /// Human-readable message of the most recent failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The captured stream being broadcast.
    pub fn stream(&self) -> Option<&MediaStream> {
        self.stream.as_ref()
    }

    /// Read-only view of the connected viewers.
    pub fn roster(&self) -> &ViewerRoster {
        &self.roster
    }

    /// Captures the screen and registers with the rendezvous service.
    ///
    /// A call while already `Initializing` or `Ready` is a no-op.  If the
    /// self-chosen share id is taken, registration falls back once to a
    /// service-assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] after the session has torn down and returned to
    /// `Idle`.
    pub async fn start_sharing(&mut self, source: &dyn MediaSource, frame_rate: u32) -> Result<(), HostError> {
        if matches!(self.state, HostState::Initializing | HostState::Ready) {
            warn!(state = ?self.state, "start_sharing called while already sharing; ignoring");
            return Ok(());
        }

        self.last_error = None;
        self.set_state(HostState::Initializing);

        let stream = match source.capture_stream(frame_rate).await {
            Ok(stream) => stream,
            Err(e) => return Err(self.fail(HostError::Capture(e)).await),
        };
        info!(stream = %stream.id(), frame_rate, "screen capture started");
        self.stream = Some(stream);

        match self.register().await {
            Ok(id) => {
                info!(share_id = %id, "sharing ready");
                self.share_id = Some(id);
                self.set_state(HostState::Ready);
                Ok(())
            }
            Err(e) => Err(self.fail(e).await),
        }
    }

    async fn register(&self) -> Result<PeerId, HostError> {
        let preferred = ShareId::generate();
        match self.rendezvous.register(Some(preferred.as_str())).await {
            Ok(id) => Ok(id),
            Err(TransportError::IdentifierTaken(taken)) => {
                warn!(share_id = %taken, "share id taken; falling back to a service-assigned id");
                match self.rendezvous.register(None).await {
                    Ok(id) => Ok(id),
                    Err(TransportError::IdentifierTaken(again)) => Err(HostError::IdentifierTaken(again)),
                    Err(e) => Err(HostError::Registration(e)),
                }
            }
            Err(e) => Err(HostError::Registration(e)),
        }
    }

    /// Stops sharing: closes every leg, stops the captured stream, releases
    /// the registration, and returns to `Idle`.  Safe to call in any state and
    /// any number of times.
    pub async fn stop_sharing(&mut self) {
        self.teardown().await;
        self.set_state(HostState::Idle);
    }

    /// Feeds one transport event into the state machine.
    pub async fn handle_event(&mut self, event: TransportEvent, device: &DeviceContext) {
        match event {
            TransportEvent::IncomingMedia(request) => self.on_incoming_media(request).await,
            TransportEvent::RemoteStream { peer, stream, .. } => {
                // The viewer's dialing placeholder; hosts never render it.
                debug!(%peer, placeholder = stream.is_placeholder(), "ignoring stream offered by viewer");
            }
            TransportEvent::ControlOpened { peer, leg } => self.on_control_opened(peer, leg).await,
            TransportEvent::ControlData { peer, leg, payload } => {
                if !self.roster.is_current_control(&peer, leg) {
                    warn!(%peer, %leg, "data on a control leg not on record; dropping");
                    return;
                }
                match decode_payload(&payload) {
                    Ok(command) => self.on_command(peer, command, device),
                    Err(e) => warn!(%peer, error = %e, "dropping invalid command"),
                }
            }
            TransportEvent::LegClosed { peer, leg, kind } => {
                debug!(%peer, %leg, ?kind, "leg closed by viewer");
                self.detach(peer, kind, leg);
            }
            TransportEvent::LegErrored {
                peer,
                leg,
                kind,
                error,
            } => {
                warn!(%peer, %leg, ?kind, %error, "leg failed");
                self.detach(peer, kind, leg);
            }
            TransportEvent::SignalingError(e) => {
                if matches!(self.state, HostState::Ready | HostState::Initializing) {
                    let _ = self.fail(HostError::Signaling(e)).await;
                } else {
                    debug!(error = %e, "signaling error while not sharing");
                }
            }
            TransportEvent::Disconnected => {
                if self.state == HostState::Ready {
                    info!("signaling connection lost; reconnecting");
                    if let Err(e) = self.rendezvous.reconnect().await {
                        warn!(error = %e, "reconnect failed");
                    }
                }
            }
        }
    }

    /// Feeds every event already queued on `events` into the session.
    /// Returns the number handled.
    pub async fn pump(
        &mut self,
        events: &mut mpsc::UnboundedReceiver<TransportEvent>,
        device: &DeviceContext,
    ) -> usize {
        let mut handled = 0;
        while let Ok(event) = events.try_recv() {
            self.handle_event(event, device).await;
            handled += 1;
        }
        handled
    }

    // ── Event handlers ────────────────────────────────────────────────────────

    async fn on_incoming_media(&mut self, request: MediaRequest) {
        let stream = match (&self.state, &self.stream) {
            (HostState::Ready, Some(stream)) => stream.clone(),
            _ => {
                warn!(peer = %request.peer, state = ?self.state, "media request while not sharing; declining");
                self.rendezvous.decline(&request).await;
                return;
            }
        };

        match self.rendezvous.answer(&request, stream).await {
            Ok(leg) => {
                let (replaced, created) = self.roster.attach_media(request.peer.clone(), leg);
                if let Some(old) = replaced {
                    self.rendezvous.close(old).await;
                }
                info!(peer = %request.peer, %leg, viewers = self.roster.viewer_count(), "media leg answered");
                if created {
                    self.notify(HostNotification::ViewerJoined(request.peer));
                }
            }
            Err(e) => warn!(peer = %request.peer, error = %e, "answering media request failed"),
        }
    }

    async fn on_control_opened(&mut self, peer: PeerId, leg: LegId) {
        if self.state != HostState::Ready {
            warn!(%peer, %leg, "control leg opened while not sharing; closing");
            self.rendezvous.close(leg).await;
            return;
        }
        let (replaced, created) = self.roster.attach_control(peer.clone(), leg);
        if let Some(old) = replaced {
            self.rendezvous.close(old).await;
        }
        info!(%peer, %leg, "control leg attached");
        if created {
            self.notify(HostNotification::ViewerJoined(peer));
        }
    }

    fn on_command(&mut self, peer: PeerId, command: RemoteControlCommand, device: &DeviceContext) {
        self.notify(HostNotification::CommandReceived {
            peer: peer.clone(),
            command: command.clone(),
        });
        if let Err(e) = dispatch(&command, device, &self.constants) {
            error!(%peer, error = %e, "command dispatch failed");
        }
    }

    fn detach(&mut self, peer: PeerId, kind: LegKind, leg: LegId) {
        match self.roster.detach(&peer, kind, leg) {
            Detached::Unknown => debug!(%peer, %leg, "leg not on record"),
            Detached::LegRemoved => info!(%peer, ?kind, "viewer leg removed"),
            Detached::RecordRemoved(_) => {
                info!(%peer, viewers = self.roster.viewer_count(), "viewer left");
                self.notify(HostNotification::ViewerLeft(peer));
            }
        }
    }

    // ── Lifecycle helpers ─────────────────────────────────────────────────────

    /// Records `err`, passes through `Error`, tears down, and settles in `Idle`.
    async fn fail(&mut self, err: HostError) -> HostError {
        error!(error = %err, "host session failed");
        self.last_error = Some(err.to_string());
        self.set_state(HostState::Error);
        self.teardown().await;
        self.set_state(HostState::Idle);
        err
    }

    async fn teardown(&mut self) {
        for record in self.roster.clear() {
            for leg in [record.media, record.control].into_iter().flatten() {
                self.rendezvous.close(leg).await;
            }
            self.notify(HostNotification::ViewerLeft(record.id));
        }
        if let Some(stream) = self.stream.take() {
            stream.stop_tracks();
            debug!(stream = %stream.id(), "captured stream stopped");
        }
        self.rendezvous.release().await;
        if let Some(id) = self.share_id.take() {
            info!(share_id = %id, "sharing stopped");
        }
    }

    fn set_state(&mut self, state: HostState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "host state change");
            self.state = state;
            self.notify(HostNotification::StateChanged(state));
        }
    }

    fn notify(&self, notification: HostNotification) {
        // The owner may have dropped the receiver; notifications are advisory.
        let _ = self.notifications.send(notification);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
