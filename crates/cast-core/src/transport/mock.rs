//! Recording test double for the [`Rendezvous`] collaborator.
//!
//! Registration results are scripted; every request is recorded so tests can
//! assert on exactly what a session asked the transport to do.  No events are
//! produced: tests feed synthetic [`crate::TransportEvent`]s to the session
//! under test directly.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::media::MediaStream;
use crate::protocol::codec::ControlPayload;
use crate::transport::{LegId, MediaRequest, PeerId, Rendezvous, TransportError};

/// One request made of a [`ScriptedRendezvous`].
#[derive(Debug, Clone, PartialEq)]
pub enum RendezvousCall {
    Register(Option<String>),
    Reconnect,
    Release,
    Dial(PeerId),
    Answer(LegId),
    Decline(LegId),
    OpenControl(PeerId),
    Send(LegId, ControlPayload),
    Close(LegId),
}

/// A scripted, recording rendezvous.
#[derive(Default)]
pub struct ScriptedRendezvous {
    register_script: Mutex<VecDeque<Result<PeerId, TransportError>>>,
    dial_error: Mutex<Option<TransportError>>,
    stall_register: AtomicBool,
    next_leg: AtomicU64,
    calls: Mutex<Vec<RendezvousCall>>,
}

impl ScriptedRendezvous {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the result of the next `register` call.  With an empty queue,
    /// `register` succeeds with the preferred id, or `SHRASSIGNED01`.
    pub fn push_register(&self, result: Result<PeerId, TransportError>) {
        lock(&self.register_script).push_back(result);
    }

    /// Makes every `dial` fail with `error`.
    pub fn fail_dial(&self, error: TransportError) {
        *lock(&self.dial_error) = Some(error);
    }

    /// Makes `register` never complete.
    pub fn stall_register(&self) {
        self.stall_register.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<RendezvousCall> {
        lock(&self.calls).clone()
    }

    pub fn count(&self, pred: impl Fn(&RendezvousCall) -> bool) -> usize {
        lock(&self.calls).iter().filter(|c| pred(c)).count()
    }

    /// Payloads sent, in order.
    pub fn sent(&self) -> Vec<ControlPayload> {
        lock(&self.calls)
            .iter()
            .filter_map(|c| match c {
                RendezvousCall::Send(_, p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: RendezvousCall) {
        lock(&self.calls).push(call);
    }

    fn leg(&self) -> LegId {
        LegId(self.next_leg.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Rendezvous for ScriptedRendezvous {
    async fn register(&self, preferred: Option<&str>) -> Result<PeerId, TransportError> {
        self.record(RendezvousCall::Register(preferred.map(str::to_string)));
        if self.stall_register.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let scripted = lock(&self.register_script).pop_front();
        scripted.unwrap_or_else(|| Ok(PeerId::from(preferred.unwrap_or("SHRASSIGNED01"))))
    }

    async fn reconnect(&self) -> Result<(), TransportError> {
        self.record(RendezvousCall::Reconnect);
        Ok(())
    }

    async fn release(&self) {
        self.record(RendezvousCall::Release);
    }

    async fn dial(&self, peer: &PeerId, _local: MediaStream) -> Result<LegId, TransportError> {
        self.record(RendezvousCall::Dial(peer.clone()));
        if let Some(err) = lock(&self.dial_error).clone() {
            return Err(err);
        }
        Ok(self.leg())
    }

    async fn answer(&self, request: &MediaRequest, _local: MediaStream) -> Result<LegId, TransportError> {
        self.record(RendezvousCall::Answer(request.leg));
        Ok(request.leg)
    }

    async fn decline(&self, request: &MediaRequest) {
        self.record(RendezvousCall::Decline(request.leg));
    }

    async fn open_control_channel(&self, peer: &PeerId) -> Result<LegId, TransportError> {
        self.record(RendezvousCall::OpenControl(peer.clone()));
        Ok(self.leg())
    }

    async fn send(&self, leg: LegId, payload: ControlPayload) -> Result<(), TransportError> {
        self.record(RendezvousCall::Send(leg, payload));
        Ok(())
    }

    async fn close(&self, leg: LegId) {
        self.record(RendezvousCall::Close(leg));
    }
}
