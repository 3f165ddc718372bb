pub mod frame;
pub mod scheduler;
pub mod state;

pub use frame::{FrameCapturer, FrameSource, ImageBlob, LiveFrameSource, VideoSurface};
pub use scheduler::{CaptureCoordinator, SchedulerHandle, DEFAULT_DELAY_SECS};
pub use state::{CaptureMode, CaptureOutcome, CaptureState, JobId, Notice};
