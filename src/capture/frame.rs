//! Single-frame capture from a live video surface.

use chrono::{DateTime, Utc};
use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::sync::{Arc, RwLock};

use crate::types::FlipState;

pub const PNG_MIME: &str = "image/png";

/// A decoded video element.
pub trait VideoSurface: Send + Sync {
    /// Native pixel dimensions of the source, not its displayed size.
    /// `None` until stream metadata is known.
    fn native_size(&self) -> Option<(u32, u32)>;

    /// The frame currently decoded, if any.
    fn current_frame(&self) -> Option<RgbaImage>;
}

/// An encoded PNG image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBlob {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Utc>,
}

impl ImageBlob {
    pub fn mime_type(&self) -> &'static str {
        PNG_MIME
    }
}

pub struct FrameCapturer;

impl FrameCapturer {
    /// Renders the current frame at native resolution, mirrored to match what is
    /// on screen, and encodes it as PNG.
    ///
    /// Returns `None` when no surface is attached, metadata is not known yet, no
    /// frame is decoded, or encoding fails.
    pub fn capture(surface: Option<&dyn VideoSurface>, flip: FlipState) -> Option<ImageBlob> {
        let Some(surface) = surface else {
            tracing::debug!(target: "capture", "No video surface attached");
            return None;
        };

        let (width, height) = match surface.native_size() {
            Some((w, h)) if w > 0 && h > 0 => (w, h),
            _ => {
                tracing::debug!(target: "capture", "Video surface has no dimensions yet");
                return None;
            }
        };

        let frame = surface.current_frame()?;
        let mut canvas = if frame.dimensions() == (width, height) {
            frame
        } else {
            imageops::resize(&frame, width, height, FilterType::Triangle)
        };

        if flip.horizontal {
            imageops::flip_horizontal_in_place(&mut canvas);
        }
        if flip.vertical {
            imageops::flip_vertical_in_place(&mut canvas);
        }

        let mut bytes = Vec::new();
        if let Err(e) = canvas.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png) {
            tracing::warn!(target: "capture", "Failed to encode frame: {}", e);
            return None;
        }

        Some(ImageBlob {
            bytes,
            width,
            height,
            captured_at: Utc::now(),
        })
    }
}

/// Where the capture scheduler gets its frames.
pub trait FrameSource: Send + Sync + 'static {
    fn capture(&self) -> Option<ImageBlob>;
}

/// The live surface plus the flip flags the user currently sees.
///
/// The controller swaps the surface when the stream changes and updates the flip
/// flags on toggle; captures always read the values at capture time.
#[derive(Default)]
pub struct LiveFrameSource {
    surface: RwLock<Option<Arc<dyn VideoSurface>>>,
    flip: RwLock<FlipState>,
}

impl LiveFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_surface(&self, surface: Option<Arc<dyn VideoSurface>>) {
        if let Ok(mut slot) = self.surface.write() {
            *slot = surface;
        }
    }

    pub fn has_surface(&self) -> bool {
        self.surface.read().map(|s| s.is_some()).unwrap_or(false)
    }

    pub fn set_flip(&self, flip: FlipState) {
        if let Ok(mut slot) = self.flip.write() {
            *slot = flip;
        }
    }

    pub fn flip(&self) -> FlipState {
        self.flip.read().map(|f| *f).unwrap_or_default()
    }
}

impl FrameSource for LiveFrameSource {
    fn capture(&self) -> Option<ImageBlob> {
        let surface = self.surface.read().ok()?.clone();
        FrameCapturer::capture(surface.as_deref(), self.flip())
    }
}
