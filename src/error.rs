use thiserror::Error;

/// User-facing failures of the viewer core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewerError {
    #[error("{0}")]
    CameraUnavailable(String),

    #[error("Failed to capture frame")]
    CaptureUnavailable,

    #[error("Failed to copy frame: {0}")]
    ClipboardWriteFailed(String),

    #[error("Fullscreen request failed: {0}")]
    FullscreenRequestFailed(String),

    #[error("Capture scheduler is not running")]
    SchedulerClosed,
}

/// Where a failure is shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Persistent error panel in place of the video.
    Banner,
    /// Transient notification.
    Toast,
    /// Logged only; the UI keeps the last requested state.
    Log,
}

impl ViewerError {
    pub fn surface(&self) -> Surface {
        match self {
            ViewerError::CameraUnavailable(_) => Surface::Banner,
            ViewerError::CaptureUnavailable
            | ViewerError::ClipboardWriteFailed(_)
            | ViewerError::SchedulerClosed => Surface::Toast,
            ViewerError::FullscreenRequestFailed(_) => Surface::Log,
        }
    }
}

/// Errors from the camera subsystem.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    #[error("Camera permission denied")]
    PermissionDenied,
    #[error("No camera device found")]
    NoDevice,
    #[error("Camera backend error: {0}")]
    Backend(String),
}

/// Errors from a clipboard write.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClipboardError {
    /// The image payload never produced data.
    #[error("{0}")]
    PayloadRejected(String),
    #[error("Failed to access clipboard: {0}")]
    Platform(String),
}
