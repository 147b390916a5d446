//! Input injection backends.
//!
//! The real on-device backend lives outside this workspace.  Two portable
//! implementations are provided:
//!
//! - [`logging::LoggingInjector`] – writes each event to the `tracing` log.
//! - [`recording::RecordingInjector`] – records each event in memory.

pub mod logging;
pub mod recording;

pub use logging::LoggingInjector;
pub use recording::{InjectedEvent, RecordingInjector};
