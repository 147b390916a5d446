//! Capture sources.
//!
//! Real screen capture is platform-specific and lives outside this workspace.
//! [`test_pattern::TestPatternSource`] stands in for it in tests and the demo.

pub mod test_pattern;

pub use test_pattern::TestPatternSource;
