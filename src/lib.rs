//! Core of a webcam viewer: window geometry, dragging, frame capture and the
//! delayed clipboard capture scheduler.
//!
//! Platform concerns sit behind small traits ([`camera::CameraBackend`],
//! [`capture::VideoSurface`], [`clipboard::ClipboardSink`],
//! [`controller::FullscreenHost`]) so the host shell supplies them.

pub mod camera;
pub mod capture;
pub mod clipboard;
pub mod controller;
pub mod drag;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod paths;
pub mod settings;
pub mod shortcuts;
pub mod toast;
pub mod types;

pub use controller::{FullscreenHost, Presentation, ViewerController};
pub use error::ViewerError;
pub use settings::{load_settings, ViewerSettings};
