//! ViewerRoster: the host's ordered collection of connected viewers.
//!
//! Each viewer reaches the host over up to two legs, media and control, that
//! arrive as separate transport events in no fixed order and are correlated
//! only by the viewer's peer id.
//!
//! # Partial records
//!
//! - A record is created by whichever leg arrives first.
//! - `connected_at` is the time the media leg was accepted.  A record opened
//!   by its control leg is re-stamped when media attaches.
//! - A record with only one live leg is valid and kept (the other leg may
//!   still be on its way, or may already have closed).
//! - A record is removed as soon as it has no live leg left.
//!
//! A viewer counts as *fully connected* only while both legs are attached.
//!
//! The roster is owned and mutated by the host session only; everyone else
//! gets a read-only view or a snapshot.

use std::time::SystemTime;

use cast_core::{LegId, LegKind, PeerId};

/// Runtime state for one viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerRecord {
    pub id: PeerId,
    pub media: Option<LegId>,
    pub control: Option<LegId>,
    pub connected_at: SystemTime,
}

impl ViewerRecord {
    fn new(id: PeerId) -> Self {
        Self {
            id,
            media: None,
            control: None,
            connected_at: SystemTime::now(),
        }
    }

    pub fn is_fully_connected(&self) -> bool {
        self.media.is_some() && self.control.is_some()
    }

    fn has_live_leg(&self) -> bool {
        self.media.is_some() || self.control.is_some()
    }

    fn leg_mut(&mut self, kind: LegKind) -> &mut Option<LegId> {
        match kind {
            LegKind::Media => &mut self.media,
            LegKind::Control => &mut self.control,
        }
    }
}

/// Result of [`ViewerRoster::detach`].
#[derive(Debug, Clone, PartialEq)]
pub enum Detached {
    /// No record for the peer, or the record holds a different leg of that kind.
    Unknown,
    /// The leg was removed and the record kept for its other live leg.
    LegRemoved,
    /// The leg was the record's last; the record is gone.
    RecordRemoved(ViewerRecord),
}

/// Ordered (by first arrival) collection of viewer records.
#[derive(Debug, Default)]
pub struct ViewerRoster {
    records: Vec<ViewerRecord>,
}

impl ViewerRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a media leg, creating the record if needed.
    ///
    /// Returns the leg it replaced, if any, and whether the record was
    /// created by this call.
    pub fn attach_media(&mut self, peer: PeerId, leg: LegId) -> (Option<LegId>, bool) {
        self.attach(peer, LegKind::Media, leg)
    }

    /// Attaches a control leg, creating the record if needed.  Same return
    /// value as [`ViewerRoster::attach_media`].
    pub fn attach_control(&mut self, peer: PeerId, leg: LegId) -> (Option<LegId>, bool) {
        self.attach(peer, LegKind::Control, leg)
    }

    fn attach(&mut self, peer: PeerId, kind: LegKind, leg: LegId) -> (Option<LegId>, bool) {
        let (record, created) = match self.records.iter().position(|r| r.id == peer) {
            Some(i) => (&mut self.records[i], false),
            None => {
                self.records.push(ViewerRecord::new(peer));
                let last = self.records.len() - 1;
                (&mut self.records[last], true)
            }
        };
        if kind == LegKind::Media && record.media.is_none() && !created {
            record.connected_at = SystemTime::now();
        }
        let replaced = record.leg_mut(kind).replace(leg).filter(|old| *old != leg);
        (replaced, created)
    }

    /// Removes `leg` of `kind` from `peer`'s record, and the record itself if
    /// it has no live leg left.
    ///
    /// A `leg` that does not match the one on record is ignored, so a late
    /// close for a replaced leg cannot tear down its successor.
    pub fn detach(&mut self, peer: &PeerId, kind: LegKind, leg: LegId) -> Detached {
        let Some(i) = self.records.iter().position(|r| &r.id == peer) else {
            return Detached::Unknown;
        };
        let slot = self.records[i].leg_mut(kind);
        if *slot != Some(leg) {
            return Detached::Unknown;
        }
        *slot = None;
        if self.records[i].has_live_leg() {
            Detached::LegRemoved
        } else {
            Detached::RecordRemoved(self.records.remove(i))
        }
    }

    pub fn get(&self, peer: &PeerId) -> Option<&ViewerRecord> {
        self.records.iter().find(|r| &r.id == peer)
    }

    /// `true` if `leg` is the control leg on record for `peer`.
    pub fn is_current_control(&self, peer: &PeerId, leg: LegId) -> bool {
        self.get(peer).map_or(false, |r| r.control == Some(leg))
    }

    /// Removes every record, returning them in order.
    pub fn clear(&mut self) -> Vec<ViewerRecord> {
        std::mem::take(&mut self.records)
    }

    /// Number of records, including partial ones.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of viewers currently receiving media.
    pub fn viewer_count(&self) -> usize {
        self.records.iter().filter(|r| r.media.is_some()).count()
    }

    /// Viewers with both legs attached, in arrival order.
    pub fn fully_connected(&self) -> Vec<&ViewerRecord> {
        self.records.iter().filter(|r| r.is_fully_connected()).collect()
    }

    /// Total number of legs on record.
    pub fn open_legs(&self) -> usize {
        self.records
            .iter()
            .map(|r| usize::from(r.media.is_some()) + usize::from(r.control.is_some()))
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViewerRecord> {
        self.records.iter()
    }

    pub fn snapshot(&self) -> Vec<ViewerRecord> {
        self.records.clone()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
