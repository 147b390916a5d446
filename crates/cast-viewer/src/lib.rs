//! cast-viewer library entry point.
//!
//! The viewer connects to a host by share code, receives the broadcast, and
//! sends touch and key commands back over the control leg.

pub mod application;
pub mod infrastructure;

pub use application::touch_input::TouchController;
pub use application::viewer_session::{
    ConnectPending, ViewerError, ViewerNotification, ViewerSession, ViewerState,
    DEFAULT_CONNECT_TIMEOUT,
};
