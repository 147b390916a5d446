//! cast-host library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the demo binary share the same module tree.

pub mod application;
pub mod infrastructure;

pub use application::capture::{CaptureError, MediaSource};
pub use application::dispatch_command::{
    dispatch, DeviceContext, DispatchError, DispatchOutcome, InjectionError, InputInjector,
    TouchInjection,
};
pub use application::host_session::{HostError, HostNotification, HostSession, HostState};
pub use application::viewer_roster::{Detached, ViewerRecord, ViewerRoster};
