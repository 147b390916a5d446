//! Media stream handles.
//!
//! Capture and rendering are out of scope for this workspace, so a
//! [`MediaStream`] is a handle rather than a pixel pipeline: it carries an id,
//! where it came from, its nominal frame rate, and whether its tracks are still
//! live.  Clones share the liveness flag, so stopping one clone stops them all,
//! which is what lets a session guarantee its captured stream is released on
//! every teardown path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use uuid::Uuid;

/// Where a stream originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOrigin {
    /// Captured from a local screen source.
    Captured,
    /// The synthetic stream a viewer offers while dialing.  Never content.
    Placeholder,
    /// Received from a remote peer.
    Remote,
}

/// Shape of the single frame a placeholder stream carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderFrame {
    pub width: u32,
    pub height: u32,
    /// Packed RGB fill colour.
    pub rgb: u32,
    pub frame_rate: u32,
}

/// 640 × 480 solid black, one frame per second.
pub const PLACEHOLDER_FRAME: PlaceholderFrame = PlaceholderFrame {
    width: 640,
    height: 480,
    rgb: 0x000000,
    frame_rate: 1,
};

/// A handle to a media stream.
#[derive(Debug, Clone)]
pub struct MediaStream {
    id: Uuid,
    origin: StreamOrigin,
    frame_rate: u32,
    live: Arc<AtomicBool>,
}

impl MediaStream {
    fn with_origin(origin: StreamOrigin, frame_rate: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            origin,
            frame_rate,
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    /// A stream captured locally at `frame_rate`.
    pub fn captured(frame_rate: u32) -> Self {
        Self::with_origin(StreamOrigin::Captured, frame_rate)
    }

    /// The minimal stream a viewer supplies when dialing a host.
    pub fn placeholder() -> Self {
        Self::with_origin(StreamOrigin::Placeholder, PLACEHOLDER_FRAME.frame_rate)
    }

    /// Wraps a stream received from a peer, keeping the sender's origin so a
    /// placeholder is still recognisable after crossing the transport.
    pub fn received(from: &MediaStream) -> Self {
        let origin = match from.origin {
            StreamOrigin::Placeholder => StreamOrigin::Placeholder,
            StreamOrigin::Captured | StreamOrigin::Remote => StreamOrigin::Remote,
        };
        Self {
            id: from.id,
            origin,
            frame_rate: from.frame_rate,
            live: Arc::clone(&from.live),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn origin(&self) -> StreamOrigin {
        self.origin
    }

    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    /// `true` for the synthetic dialing stream; consumers must not render it.
    pub fn is_placeholder(&self) -> bool {
        self.origin == StreamOrigin::Placeholder
    }

    /// Returns `false` once [`MediaStream::stop_tracks`] has been called on
    /// this handle or any clone of it.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Stops every track of the stream.  Idempotent.
    pub fn stop_tracks(&self) {
        self.live.store(false, Ordering::Release);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
