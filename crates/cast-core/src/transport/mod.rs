//! Rendezvous/transport collaborator interface.
//!
//! The peer-to-peer transport, NAT traversal, and signaling service are
//! external.  Sessions see them only through the [`Rendezvous`] trait (the
//! requests a session can make) and the [`TransportEvent`] stream (everything
//! that happens asynchronously on the session's legs and its signaling
//! registration).
//!
//! # Legs (for beginners)
//!
//! A viewer reaches a host over two independent legs: a *media* leg carrying
//! the host's video, and a reliable, ordered *control* leg carrying commands
//! back.  Each leg has a [`LegId`] that both ends use to refer to it.  The two
//! legs of one viewer are correlated only by the viewer's [`PeerId`] and may
//! open in either order.
//!
//! Implementations:
//! - [`loopback::LoopbackHub`] – an in-process rendezvous service.
//! - [`mock::ScriptedRendezvous`] – a recording test double with scripted
//!   registration results.

pub mod loopback;
pub mod mock;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::media::MediaStream;
use crate::protocol::codec::ControlPayload;

/// Identifier a peer is registered under at the rendezvous service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifies one leg.  Both ends of a leg use the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LegId(pub u64);

impl fmt::Display for LegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "leg#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegKind {
    Media,
    Control,
}

/// An inbound media request waiting to be answered or declined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRequest {
    pub leg: LegId,
    /// The requesting peer.
    pub peer: PeerId,
}

/// Errors reported by the rendezvous service or the transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The requested identifier is already registered by someone else.
    #[error("identifier {0} is already taken")]
    IdentifierTaken(String),

    /// No peer is registered under the target identifier.
    #[error("peer {0} is not available")]
    PeerUnavailable(PeerId),

    #[error("network failure: {0}")]
    Network(String),

    #[error("signaling server failure: {0}")]
    SignalingServer(String),

    #[error("unknown leg {0}")]
    UnknownLeg(LegId),

    /// The operation needs a registration and there is none.
    #[error("not registered with the rendezvous service")]
    NotRegistered,

    #[error("{0}")]
    Other(String),
}

/// Something that happened on a session's legs or registration.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A peer asks for our media.  Answer or decline it.
    IncomingMedia(MediaRequest),
    /// The far end of a media leg we dialed answered with its stream.
    RemoteStream {
        peer: PeerId,
        leg: LegId,
        stream: MediaStream,
    },
    /// A control leg is open and ready for data.
    ControlOpened { peer: PeerId, leg: LegId },
    /// A message arrived on a control leg.
    ControlData {
        peer: PeerId,
        leg: LegId,
        payload: ControlPayload,
    },
    /// The far end closed a leg.
    LegClosed {
        peer: PeerId,
        leg: LegId,
        kind: LegKind,
    },
    /// A leg failed.  The leg is gone.
    LegErrored {
        peer: PeerId,
        leg: LegId,
        kind: LegKind,
        error: TransportError,
    },
    /// The rendezvous service reported an error for this registration.
    SignalingError(TransportError),
    /// The signaling connection dropped.  Open legs are unaffected; call
    /// [`Rendezvous::reconnect`] to restore it.
    Disconnected,
}

/// Requests a session can make of the rendezvous/transport layer.
///
/// Completion of the asynchronous parts (answers, opens, data, closes) is
/// reported through [`TransportEvent`]s, not through these return values.
#[async_trait]
pub trait Rendezvous: Send + Sync {
    /// Registers under `preferred`, or under a service-assigned identifier if
    /// `None`.  Returns the identifier actually registered.
    async fn register(&self, preferred: Option<&str>) -> Result<PeerId, TransportError>;

    /// Restores a dropped signaling connection under the same identifier.
    async fn reconnect(&self) -> Result<(), TransportError>;

    /// Closes every leg and drops the registration.  Idempotent.
    async fn release(&self);

    /// Requests `peer`'s media, offering `local` in return.
    async fn dial(&self, peer: &PeerId, local: MediaStream) -> Result<LegId, TransportError>;

    /// Accepts an inbound media request, sending `local`.
    async fn answer(&self, request: &MediaRequest, local: MediaStream) -> Result<LegId, TransportError>;

    /// Rejects an inbound media request.
    async fn decline(&self, request: &MediaRequest);

    /// Opens a reliable, ordered control leg to `peer`.
    async fn open_control_channel(&self, peer: &PeerId) -> Result<LegId, TransportError>;

    /// Writes one message to an open control leg.
    async fn send(&self, leg: LegId, payload: ControlPayload) -> Result<(), TransportError>;

    /// Closes a leg.  Unknown or already-closed legs are ignored.
    async fn close(&self, leg: LegId);
}
