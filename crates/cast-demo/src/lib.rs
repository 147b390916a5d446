//! cast-demo library: the scripted host/viewer scenario behind the binary.
//!
//! Kept separate from `main.rs` so the end-to-end tests in `tests/` run the
//! same code the binary does.

pub mod scenario;
