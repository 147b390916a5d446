//! Application layer for the viewer.
//!
//! # Sub-modules
//!
//! - **`viewer_session`** – The viewer state machine.  Opens the control and
//!   media legs to a host, bounds the attempt with a deadline, and sends
//!   commands.
//!
//! - **`touch_input`** – Turns pointer events on the video element into
//!   normalized touch commands, tracking which pointers are down.
//!
//! Like the host, nothing here touches the network or the file system
//! directly; all transport goes through `cast_core::Rendezvous`.

pub mod touch_input;
pub mod viewer_session;
