//! # cast-core
//!
//! Shared library for the screen-cast host and viewer.  It contains the
//! remote-control command protocol, the coordinate mapping between a viewer's
//! input surface and the host device, share identifiers, media stream handles,
//! and the rendezvous/transport collaborator interface.
//!
//! This crate is used by both the host and the viewer.  It has no dependency
//! on screen capture, video rendering, or OS input injection.
//!
//! # Architecture overview (for beginners)
//!
//! A *host* broadcasts its screen to one or more *viewers*.  Each viewer opens
//! two independent channels ("legs") to the host: a media leg carrying the
//! video and a control leg carrying touch and key commands back to the host.
//!
//! - **`domain`** – Pure value types: the `SHR…` share identifier, the
//!   client → normalized → device coordinate transform, and the media stream
//!   handle the sessions pass around.
//!
//! - **`protocol`** – The JSON control-channel wire format.  The control
//!   channel carries untrusted bytes, so decoding never panics.
//!
//! - **`keymap`** – Translation from the wire key names (`back`, `home`,
//!   `recents`) to the key names the device input backend understands.
//!
//! - **`transport`** – The rendezvous/transport collaborator the sessions talk
//!   to, the events it produces, an in-process implementation (`loopback`),
//!   and a scripted test double (`mock`).

pub mod domain;
pub mod keymap;
pub mod protocol;
pub mod transport;

// Re-export the most-used types at the crate root so callers can write
// `cast_core::ShareId` instead of `cast_core::domain::share_id::ShareId`.
pub use domain::coords::{
    client_to_normalized, is_valid_normalized_coord, normalized_to_device, DevicePoint,
    ElementBounds, NormalizedPoint, Rotation,
};
pub use domain::media::{MediaStream, StreamOrigin};
pub use domain::share_id::{is_valid_share_id, ShareId, ShareIdError};
pub use protocol::codec::{
    decode_payload, deserialize_command, serialize_command, CommandError, ControlPayload,
};
pub use protocol::command::{KeyCommand, RemoteControlCommand, RemoteKey, TouchAction, TouchCommand};
pub use protocol::constants::ControlConstants;
pub use transport::{LegId, LegKind, MediaRequest, PeerId, Rendezvous, TransportError, TransportEvent};
