//! Screen-capture collaborator interface.

use async_trait::async_trait;
use cast_core::MediaStream;
use thiserror::Error;

/// Error type for screen capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("unsupported frame rate: {0} fps")]
    InvalidFrameRate(u32),
    #[error("capture source unavailable: {0}")]
    Unavailable(String),
    #[error("capture permission denied")]
    PermissionDenied,
}

/// A source of screen media.
///
/// Infrastructure implementations wrap a real capture API; tests use a
/// synthetic source.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Starts capturing at `frame_rate` frames per second.
    async fn capture_stream(&self, frame_rate: u32) -> Result<MediaStream, CaptureError>;
}
