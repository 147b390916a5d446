//! In-process rendezvous service.
//!
//! [`LoopbackHub`] plays the part of the signaling service and the
//! peer-to-peer transport for any number of endpoints living in one process.
//! It keeps an identifier registry and a table of legs, and delivers every
//! asynchronous outcome as a [`TransportEvent`] on the affected endpoint's
//! channel.  Delivery per endpoint is ordered, so control legs are reliable and
//! ordered as the real transport's are.
//!
//! The hub also exposes probes and fault hooks (`open_legs`, `drop_signaling`,
//! `fail_leg`, `emit_signaling_error`) used by integration tests and the demo.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::domain::media::MediaStream;
use crate::domain::share_id::ShareId;
use crate::protocol::codec::ControlPayload;
use crate::transport::{
    LegId, LegKind, MediaRequest, PeerId, Rendezvous, TransportError, TransportEvent,
};

type EndpointId = u64;

struct EndpointEntry {
    events: mpsc::UnboundedSender<TransportEvent>,
    registered: Option<PeerId>,
    signaling_up: bool,
}

struct LegEntry {
    kind: LegKind,
    dialer: EndpointId,
    target: EndpointId,
    /// Media legs stay pending until answered; control legs open at once.
    open: bool,
    offered: Option<MediaStream>,
}

impl LegEntry {
    fn far_end(&self, from: EndpointId) -> Option<EndpointId> {
        if from == self.dialer {
            Some(self.target)
        } else if from == self.target {
            Some(self.dialer)
        } else {
            None
        }
    }
}

#[derive(Default)]
struct HubState {
    next_endpoint: EndpointId,
    next_leg: u64,
    endpoints: HashMap<EndpointId, EndpointEntry>,
    ids: HashMap<PeerId, EndpointId>,
    legs: HashMap<LegId, LegEntry>,
}

impl HubState {
    fn emit(&self, to: EndpointId, event: TransportEvent) {
        if let Some(ep) = self.endpoints.get(&to) {
            // A dropped receiver means the endpoint's owner is gone.
            let _ = ep.events.send(event);
        }
    }

    fn peer_of(&self, endpoint: EndpointId) -> PeerId {
        self.endpoints
            .get(&endpoint)
            .and_then(|ep| ep.registered.clone())
            .unwrap_or_else(|| PeerId::new(format!("unregistered-{endpoint}")))
    }

    fn new_leg(&mut self) -> LegId {
        self.next_leg += 1;
        LegId(self.next_leg)
    }

    /// Caller's registered id, failing if it has none or its signaling is down.
    fn require_signaling(&self, endpoint: EndpointId) -> Result<PeerId, TransportError> {
        let ep = self
            .endpoints
            .get(&endpoint)
            .ok_or(TransportError::NotRegistered)?;
        let id = ep.registered.clone().ok_or(TransportError::NotRegistered)?;
        if !ep.signaling_up {
            return Err(TransportError::Network(
                "signaling connection lost".to_string(),
            ));
        }
        Ok(id)
    }

    /// Endpoint registered as `peer`, if it is currently reachable.
    fn resolve(&self, peer: &PeerId) -> Result<EndpointId, TransportError> {
        self.ids
            .get(peer)
            .copied()
            .filter(|ep| self.endpoints.get(ep).map_or(false, |e| e.signaling_up))
            .ok_or_else(|| TransportError::PeerUnavailable(peer.clone()))
    }

    /// Removes `leg` and tells the far end it closed.
    fn close_leg(&mut self, leg: LegId, from: EndpointId) -> bool {
        let Some(entry) = self.legs.get(&leg) else {
            return false;
        };
        let Some(far) = entry.far_end(from) else {
            return false;
        };
        let kind = entry.kind;
        self.legs.remove(&leg);
        let peer = self.peer_of(from);
        self.emit(far, TransportEvent::LegClosed { peer, leg, kind });
        true
    }

    fn unregister(&mut self, endpoint: EndpointId) {
        let owned: Vec<LegId> = self
            .legs
            .iter()
            .filter(|(_, l)| l.dialer == endpoint || l.target == endpoint)
            .map(|(id, _)| *id)
            .collect();
        for leg in owned {
            self.close_leg(leg, endpoint);
        }
        if let Some(ep) = self.endpoints.get_mut(&endpoint) {
            if let Some(id) = ep.registered.take() {
                self.ids.remove(&id);
            }
            ep.signaling_up = false;
        }
    }
}

/// An in-process rendezvous service and transport.
#[derive(Default)]
pub struct LoopbackHub {
    state: Mutex<HubState>,
}

impl LoopbackHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates a new endpoint and the receiver for its events.
    pub fn endpoint(self: &Arc<Self>) -> (LoopbackEndpoint, mpsc::UnboundedReceiver<TransportEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state();
        state.next_endpoint += 1;
        let id = state.next_endpoint;
        state.endpoints.insert(
            id,
            EndpointEntry {
                events: tx,
                registered: None,
                signaling_up: false,
            },
        );
        (
            LoopbackEndpoint {
                hub: Arc::clone(self),
                id,
            },
            rx,
        )
    }

    /// Number of legs currently pending or open, across all endpoints.
    pub fn open_legs(&self) -> usize {
        self.state().legs.len()
    }

    /// Number of legs `peer` is a party to.
    pub fn open_legs_of(&self, peer: &PeerId) -> usize {
        let state = self.state();
        let Some(&ep) = state.ids.get(peer) else {
            return 0;
        };
        state
            .legs
            .values()
            .filter(|l| l.dialer == ep || l.target == ep)
            .count()
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.state().ids.contains_key(&PeerId::from(id))
    }

    /// Simulates the signaling connection of `peer` dropping.  Legs stay open.
    pub fn drop_signaling(&self, peer: &PeerId) {
        let mut state = self.state();
        let Some(&ep) = state.ids.get(peer) else {
            return;
        };
        if let Some(entry) = state.endpoints.get_mut(&ep) {
            entry.signaling_up = false;
        }
        state.emit(ep, TransportEvent::Disconnected);
    }

    /// Simulates a transport failure on `leg`.  Both ends see `LegErrored`.
    pub fn fail_leg(&self, leg: LegId, error: TransportError) {
        let mut state = self.state();
        let Some(entry) = state.legs.remove(&leg) else {
            return;
        };
        let dialer_peer = state.peer_of(entry.dialer);
        let target_peer = state.peer_of(entry.target);
        state.emit(
            entry.dialer,
            TransportEvent::LegErrored {
                peer: target_peer,
                leg,
                kind: entry.kind,
                error: error.clone(),
            },
        );
        state.emit(
            entry.target,
            TransportEvent::LegErrored {
                peer: dialer_peer,
                leg,
                kind: entry.kind,
                error,
            },
        );
    }

    /// Delivers a service-level error to `peer`.
    pub fn emit_signaling_error(&self, peer: &PeerId, error: TransportError) {
        let state = self.state();
        if let Some(&ep) = state.ids.get(peer) {
            state.emit(ep, TransportEvent::SignalingError(error));
        }
    }

    fn state(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// One participant's handle on a [`LoopbackHub`].
pub struct LoopbackEndpoint {
    hub: Arc<LoopbackHub>,
    id: EndpointId,
}

impl LoopbackEndpoint {
    /// The identifier this endpoint is registered under, if any.
    pub fn peer_id(&self) -> Option<PeerId> {
        self.hub
            .state()
            .endpoints
            .get(&self.id)
            .and_then(|ep| ep.registered.clone())
    }
}

#[async_trait]
impl Rendezvous for LoopbackEndpoint {
    async fn register(&self, preferred: Option<&str>) -> Result<PeerId, TransportError> {
        let mut state = self.hub.state();
        state.unregister(self.id);

        let id = match preferred {
            Some(wanted) => {
                let wanted = PeerId::from(wanted);
                if state.ids.contains_key(&wanted) {
                    return Err(TransportError::IdentifierTaken(wanted.to_string()));
                }
                wanted
            }
            None => loop {
                let candidate = PeerId::new(ShareId::generate().to_string());
                if !state.ids.contains_key(&candidate) {
                    break candidate;
                }
            },
        };

        let ep = state
            .endpoints
            .get_mut(&self.id)
            .ok_or(TransportError::NotRegistered)?;
        ep.registered = Some(id.clone());
        ep.signaling_up = true;
        state.ids.insert(id.clone(), self.id);
        info!(peer = %id, "registered with loopback hub");
        Ok(id)
    }

    async fn reconnect(&self) -> Result<(), TransportError> {
        let mut state = self.hub.state();
        let ep = state
            .endpoints
            .get_mut(&self.id)
            .ok_or(TransportError::NotRegistered)?;
        if ep.registered.is_none() {
            return Err(TransportError::NotRegistered);
        }
        ep.signaling_up = true;
        debug!(endpoint = self.id, "signaling restored");
        Ok(())
    }

    async fn release(&self) {
        self.hub.state().unregister(self.id);
    }

    async fn dial(&self, peer: &PeerId, local: MediaStream) -> Result<LegId, TransportError> {
        let mut state = self.hub.state();
        let me = state.require_signaling(self.id)?;
        let target = state.resolve(peer)?;
        let leg = state.new_leg();
        state.legs.insert(
            leg,
            LegEntry {
                kind: LegKind::Media,
                dialer: self.id,
                target,
                open: false,
                offered: Some(local),
            },
        );
        state.emit(
            target,
            TransportEvent::IncomingMedia(MediaRequest { leg, peer: me }),
        );
        Ok(leg)
    }

    async fn answer(&self, request: &MediaRequest, local: MediaStream) -> Result<LegId, TransportError> {
        let mut state = self.hub.state();
        let me = state.peer_of(self.id);
        let entry = state
            .legs
            .get_mut(&request.leg)
            .filter(|l| l.target == self.id && l.kind == LegKind::Media && !l.open)
            .ok_or(TransportError::UnknownLeg(request.leg))?;
        entry.open = true;
        let offered = entry.offered.take();
        let dialer = entry.dialer;
        state.emit(
            dialer,
            TransportEvent::RemoteStream {
                peer: me,
                leg: request.leg,
                stream: MediaStream::received(&local),
            },
        );
        // The answering side receives whatever the dialer offered.
        if let Some(offered) = offered {
            state.emit(
                self.id,
                TransportEvent::RemoteStream {
                    peer: request.peer.clone(),
                    leg: request.leg,
                    stream: MediaStream::received(&offered),
                },
            );
        }
        Ok(request.leg)
    }

    async fn decline(&self, request: &MediaRequest) {
        self.hub.state().close_leg(request.leg, self.id);
    }

    async fn open_control_channel(&self, peer: &PeerId) -> Result<LegId, TransportError> {
        let mut state = self.hub.state();
        let me = state.require_signaling(self.id)?;
        let target = state.resolve(peer)?;
        let leg = state.new_leg();
        state.legs.insert(
            leg,
            LegEntry {
                kind: LegKind::Control,
                dialer: self.id,
                target,
                open: true,
                offered: None,
            },
        );
        state.emit(target, TransportEvent::ControlOpened { peer: me, leg });
        state.emit(
            self.id,
            TransportEvent::ControlOpened {
                peer: peer.clone(),
                leg,
            },
        );
        Ok(leg)
    }

    async fn send(&self, leg: LegId, payload: ControlPayload) -> Result<(), TransportError> {
        let state = self.hub.state();
        let entry = state
            .legs
            .get(&leg)
            .filter(|l| l.kind == LegKind::Control && l.open)
            .ok_or(TransportError::UnknownLeg(leg))?;
        let far = entry.far_end(self.id).ok_or(TransportError::UnknownLeg(leg))?;
        let peer = state.peer_of(self.id);
        state.emit(far, TransportEvent::ControlData { peer, leg, payload });
        Ok(())
    }

    async fn close(&self, leg: LegId) {
        self.hub.state().close_leg(leg, self.id);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
