//! Application layer for the host.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure value types in `cast_core`) and the infrastructure (capture backends,
//! input backends, files).  Code here:
//!
//! - **Orchestrates** domain objects to fulfil a goal ("broadcast my screen
//!   and let viewers drive it").
//! - **Depends on abstractions** (`Rendezvous`, `MediaSource`,
//!   `InputInjector`) rather than concrete implementations.
//! - **Contains no OS calls and no file system access**.
//!
//! # Sub-modules
//!
//! - **`host_session`** – The host state machine.  Owns the captured stream,
//!   the registration, and the viewer roster, and consumes transport events.
//!
//! - **`viewer_roster`** – The ordered collection of connected viewers and
//!   their media/control legs.
//!
//! - **`dispatch_command`** – Turns a decoded command into device input via
//!   the injector, with explicit device geometry.
//!
//! - **`capture`** – The screen-capture collaborator interface.

pub mod capture;
pub mod dispatch_command;
pub mod host_session;
pub mod viewer_roster;
