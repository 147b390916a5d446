//! Domain entities for screen casting.
//!
//! This module contains pure value types with no I/O:
//!
//! - [`share_id`] – the human-shareable `SHR…` rendezvous identifier.
//! - [`coords`] – client → normalized → device coordinate mapping with
//!   rotation handling.
//! - [`media`] – the media stream handle owned by the sessions.

pub mod coords;
pub mod media;
pub mod share_id;
