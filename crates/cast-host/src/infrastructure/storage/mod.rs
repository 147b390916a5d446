//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads and writes the host's TOML configuration and
//! supplies defaults when the file does not exist yet.

pub mod config;
