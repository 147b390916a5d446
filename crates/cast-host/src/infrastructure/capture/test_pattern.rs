//! Synthetic capture source.

use async_trait::async_trait;
use cast_core::MediaStream;
use tracing::debug;

use crate::application::capture::{CaptureError, MediaSource};

/// Highest frame rate a capture backend is asked for.
pub const MAX_FRAME_RATE: u32 = 60;

/// A capture source that produces a stream handle without touching the screen.
#[derive(Debug, Clone, Default)]
pub struct TestPatternSource {
    /// When set, every capture fails as if the user denied permission.
    pub deny: bool,
}

impl TestPatternSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose captures always fail.
    pub fn denied() -> Self {
        Self { deny: true }
    }
}

#[async_trait]
impl MediaSource for TestPatternSource {
    async fn capture_stream(&self, frame_rate: u32) -> Result<MediaStream, CaptureError> {
        if self.deny {
            return Err(CaptureError::PermissionDenied);
        }
        if frame_rate == 0 || frame_rate > MAX_FRAME_RATE {
            return Err(CaptureError::InvalidFrameRate(frame_rate));
        }
        let stream = MediaStream::captured(frame_rate);
        debug!(stream = %stream.id(), frame_rate, "test pattern capture started");
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_valid_frame_rate_yields_live_stream() {
        let stream = TestPatternSource::new().capture_stream(30).await.unwrap();
        assert!(stream.is_live());
        assert_eq!(stream.frame_rate(), 30);
        assert!(!stream.is_placeholder());
    }

    #[tokio::test]
    async fn test_out_of_range_frame_rate_is_rejected() {
        let source = TestPatternSource::new();
        assert!(matches!(
            source.capture_stream(0).await,
            Err(CaptureError::InvalidFrameRate(0))
        ));
        assert!(matches!(
            source.capture_stream(240).await,
            Err(CaptureError::InvalidFrameRate(240))
        ));
    }

    #[tokio::test]
    async fn test_denied_source_fails() {
        let result = TestPatternSource::denied().capture_stream(30).await;
        assert!(matches!(result, Err(CaptureError::PermissionDenied)));
    }
}
