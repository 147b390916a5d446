//! Infrastructure layer for the host.
//!
//! Contains the adapters behind the application's collaborator traits:
//! input injection backends, capture sources, and configuration storage.
//!
//! **Dependency rule**: this layer may depend on `application` and `cast_core`,
//! but MUST NOT be imported by the `application` layer.

pub mod capture;
pub mod input_injection;
pub mod storage;
