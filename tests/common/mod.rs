//! Fakes shared by the integration tests.

#![allow(dead_code)]

use camview_lib::camera::{CameraBackend, CameraDevice, CameraStream};
use camview_lib::capture::{FrameSource, ImageBlob, VideoSurface};
use camview_lib::clipboard::{ClipboardSink, ImagePayload};
use camview_lib::error::{CameraError, ClipboardError};
use camview_lib::FullscreenHost;
use chrono::Utc;
use image::{Rgba, RgbaImage};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

// =============================================================================
// Frames
// =============================================================================

/// Surface that always shows the same image.
pub struct StillSurface(pub RgbaImage);

impl StillSurface {
    /// 2x1 frame: red on the left, blue on the right.
    pub fn red_blue() -> Self {
        let mut frame = RgbaImage::new(2, 1);
        frame.put_pixel(0, 0, RED);
        frame.put_pixel(1, 0, BLUE);
        Self(frame)
    }
}

impl VideoSurface for StillSurface {
    fn native_size(&self) -> Option<(u32, u32)> {
        Some(self.0.dimensions())
    }

    fn current_frame(&self) -> Option<RgbaImage> {
        Some(self.0.clone())
    }
}

pub fn sample_blob() -> ImageBlob {
    ImageBlob {
        bytes: vec![0x89, b'P', b'N', b'G'],
        width: 4,
        height: 3,
        captured_at: Utc::now(),
    }
}

/// Frame source that counts how often it was asked for a frame.
#[derive(Default)]
pub struct CountingSource {
    captures: AtomicUsize,
    empty: bool,
}

impl CountingSource {
    pub fn with_frame() -> Self {
        Self::default()
    }

    pub fn empty() -> Self {
        Self {
            empty: true,
            ..Default::default()
        }
    }

    pub fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }
}

impl FrameSource for CountingSource {
    fn capture(&self) -> Option<ImageBlob> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        (!self.empty).then(sample_blob)
    }
}

// =============================================================================
// Clipboard
// =============================================================================

/// Clipboard that records every write attempt and every delivered image.
#[derive(Default)]
pub struct RecordingClipboard {
    calls: AtomicUsize,
    delivered: Mutex<Vec<ImageBlob>>,
    reject: Option<String>,
    hold_first: bool,
}

impl RecordingClipboard {
    pub fn rejecting(reason: &str) -> Self {
        Self {
            reject: Some(reason.to_string()),
            ..Default::default()
        }
    }

    /// The first write resolves its payload, then never completes.
    pub fn holding_first() -> Self {
        Self {
            hold_first: true,
            ..Default::default()
        }
    }

    /// Number of `write_image` calls, delivered or not.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn delivered(&self) -> Vec<ImageBlob> {
        self.delivered.lock().unwrap().clone()
    }
}

impl ClipboardSink for RecordingClipboard {
    async fn write_image(&self, payload: ImagePayload) -> Result<(), ClipboardError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let blob = payload.resolve().await?;
        if self.hold_first && call == 0 {
            std::future::pending::<()>().await;
        }
        if let Some(reason) = &self.reject {
            return Err(ClipboardError::Platform(reason.clone()));
        }
        self.delivered.lock().unwrap().push(blob);
        Ok(())
    }
}

// =============================================================================
// Camera
// =============================================================================

pub struct FakeStream;

impl CameraStream for FakeStream {
    fn surface(&self) -> Arc<dyn VideoSurface> {
        Arc::new(StillSurface::red_blue())
    }

    fn stop(&self) {}
}

#[derive(Default)]
pub struct FakeBackend {
    pub deny: bool,
}

impl CameraBackend for FakeBackend {
    type Stream = FakeStream;

    async fn enumerate_cameras(&self) -> Result<Vec<CameraDevice>, CameraError> {
        Ok(vec![CameraDevice {
            id: "cam0".into(),
            label: "Integrated Camera".into(),
        }])
    }

    async fn acquire_stream(&self, _device_id: Option<&str>) -> Result<FakeStream, CameraError> {
        if self.deny {
            return Err(CameraError::PermissionDenied);
        }
        Ok(FakeStream)
    }
}

// =============================================================================
// Fullscreen
// =============================================================================

#[derive(Default)]
pub struct FullscreenLog {
    pub active: AtomicBool,
    pub requests: AtomicUsize,
    pub exits: AtomicUsize,
    pub fail: AtomicBool,
}

/// Fullscreen host whose state the test keeps a handle to.
pub struct FakeFullscreen(pub Arc<FullscreenLog>);

impl FullscreenHost for FakeFullscreen {
    fn is_fullscreen(&self) -> bool {
        self.0.active.load(Ordering::SeqCst)
    }

    fn request_fullscreen(&mut self) -> Result<(), String> {
        self.0.requests.fetch_add(1, Ordering::SeqCst);
        if self.0.fail.load(Ordering::SeqCst) {
            return Err("not allowed".to_string());
        }
        self.0.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<(), String> {
        self.0.exits.fetch_add(1, Ordering::SeqCst);
        self.0.active.store(false, Ordering::SeqCst);
        Ok(())
    }
}
