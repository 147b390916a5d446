//! Infrastructure layer for the viewer: configuration storage.

pub mod config;
