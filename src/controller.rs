//! Single owner of the viewer's UI state.
//!
//! The host forwards platform events (keys, pointer, resize, stream metadata,
//! fullscreen changes) to the controller and renders whatever
//! [`ViewerController::presentation`] returns. Geometry is recomputed whenever
//! style, requested size, aspect ratio or viewport changes.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, oneshot};
use tokio::time::Instant;

use crate::camera::{CameraBackend, CameraSession, CameraStream};
use crate::capture::{
    CaptureCoordinator, CaptureOutcome, LiveFrameSource, Notice, SchedulerHandle,
};
use crate::clipboard::ClipboardSink;
use crate::drag::DragController;
use crate::error::{Surface, ViewerError};
use crate::geometry;
use crate::settings::ViewerSettings;
use crate::shortcuts::{Action, KeyInput, Keymap};
use crate::toast::ToastSlot;
use crate::types::{
    AspectRatio, ClipMask, CursorHint, FlipState, Geometry, PictureMode, Point, Viewport,
    WindowStyle, OPACITY_MAX, OPACITY_MIN, OPACITY_STEP, WINDOW_SIZE_MIN, WINDOW_SIZE_STEP,
    ZOOM_MAX, ZOOM_MIN, ZOOM_STEP,
};

/// Platform fullscreen API.
pub trait FullscreenHost: Send {
    fn is_fullscreen(&self) -> bool;
    fn request_fullscreen(&mut self) -> Result<(), String>;
    fn exit_fullscreen(&mut self) -> Result<(), String>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoTransform {
    pub zoom: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub object_fit: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FloatingWindow {
    pub geometry: Geometry,
    pub clip: ClipMask,
    pub cursor: CursorHint,
}

/// Everything the host needs to draw one frame of UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    pub opacity: f64,
    /// `None` means the window fills the viewport.
    pub floating: Option<FloatingWindow>,
    pub video: VideoTransform,
    pub countdown: Option<u32>,
    pub toast: Option<String>,
    /// Camera-level error shown in place of the video.
    pub error: Option<String>,
}

fn round_step(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct ViewerController<S: CameraStream + 'static, F: FullscreenHost> {
    settings: ViewerSettings,
    keymap: Keymap,
    style: WindowStyle,
    picture_mode: PictureMode,
    flip: FlipState,
    zoom: f64,
    opacity: f64,
    window_size: f64,
    aspect_ratio: AspectRatio,
    viewport: Viewport,
    geometry: Geometry,
    /// Position set by dragging; cleared whenever the reset position changes.
    dragged_to: Option<Point>,
    drag: DragController,
    shortcuts_enabled: bool,
    toast: ToastSlot,
    notices: broadcast::Receiver<Notice>,
    frames: Arc<LiveFrameSource>,
    scheduler: SchedulerHandle,
    camera: CameraSession<S>,
    fullscreen: F,
}

impl<S: CameraStream + 'static, F: FullscreenHost> ViewerController<S, F> {
    pub fn new(
        settings: ViewerSettings,
        viewport: Viewport,
        fullscreen: F,
        frames: Arc<LiveFrameSource>,
        scheduler: SchedulerHandle,
    ) -> Self {
        let settings = settings.sanitized();
        let mut controller = Self {
            keymap: settings.keymap(),
            style: WindowStyle::default(),
            picture_mode: PictureMode::default(),
            flip: FlipState::default(),
            zoom: 1.0,
            opacity: OPACITY_MAX,
            window_size: settings.initial_window_size,
            aspect_ratio: AspectRatio::DEFAULT,
            viewport,
            geometry: Geometry::default(),
            dragged_to: None,
            drag: DragController::new(),
            shortcuts_enabled: settings.shortcuts_enabled,
            toast: ToastSlot::new(settings.toast_duration()),
            notices: scheduler.subscribe_notices(),
            frames,
            scheduler,
            camera: CameraSession::new(),
            fullscreen,
            settings,
        };
        controller.reset_geometry();
        controller
    }

    /// Creates the frame source and capture scheduler on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn spawn<C: ClipboardSink>(
        settings: ViewerSettings,
        viewport: Viewport,
        fullscreen: F,
        clipboard: Arc<C>,
    ) -> Self {
        let frames = Arc::new(LiveFrameSource::new());
        let scheduler = CaptureCoordinator::spawn(frames.clone(), clipboard);
        Self::new(settings, viewport, fullscreen, frames, scheduler)
    }

    // --- geometry ---

    fn compute_geometry(&self) -> Geometry {
        geometry::compute(
            self.style,
            self.window_size,
            self.aspect_ratio,
            self.viewport,
            self.settings.window_margin,
        )
    }

    /// Style, size or aspect ratio changed: recompute and return to the centered position.
    fn reset_geometry(&mut self) {
        self.geometry = self.compute_geometry();
        self.dragged_to = None;
    }

    /// Effective window rectangle, including any dragged position.
    pub fn window_geometry(&self) -> Geometry {
        match (self.style.is_floating(), self.dragged_to) {
            (true, Some(position)) => self.geometry.with_position(position),
            _ => self.geometry,
        }
    }

    pub fn on_viewport_resized(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        self.geometry = self.compute_geometry();
    }

    /// Stream metadata arrived with the native video dimensions.
    pub fn on_video_metadata(&mut self, width: u32, height: u32) {
        let Some(ratio) = AspectRatio::from_dimensions(width, height) else {
            return;
        };
        if ratio != self.aspect_ratio {
            self.aspect_ratio = ratio;
            self.reset_geometry();
        }
    }

    // --- window style ---

    pub fn set_window_style(&mut self, style: WindowStyle) {
        if style == WindowStyle::Fullscreen {
            if !self.fullscreen.is_fullscreen() {
                if let Err(e) = self.fullscreen.request_fullscreen() {
                    self.report(&ViewerError::FullscreenRequestFailed(e));
                }
            }
        } else if self.style == WindowStyle::Fullscreen && self.fullscreen.is_fullscreen() {
            if let Err(e) = self.fullscreen.exit_fullscreen() {
                tracing::error!(target: "viewer", "Exit fullscreen failed: {}", e);
            }
        }

        if !style.is_floating() {
            self.drag.end();
        }
        if style != self.style {
            tracing::debug!(target: "viewer", "Window style: {:?} -> {:?}", self.style, style);
            self.style = style;
            self.reset_geometry();
        }
    }

    pub fn toggle_fullscreen(&mut self) {
        if self.style == WindowStyle::Fullscreen {
            self.set_window_style(WindowStyle::Normal);
        } else {
            self.set_window_style(WindowStyle::Fullscreen);
        }
    }

    /// The platform left or entered fullscreen on its own (e.g. its own UI).
    pub fn on_fullscreen_changed(&mut self, is_fullscreen: bool) {
        if !is_fullscreen && self.style == WindowStyle::Fullscreen {
            self.style = WindowStyle::Normal;
            self.reset_geometry();
        }
    }

    // --- dragging ---

    /// Pointer pressed over the window. Returns true if a drag started, in which
    /// case the host should listen for move/up/leave until `pointer_up`.
    pub fn pointer_down(&mut self, pointer: Point) -> bool {
        let position = self.window_geometry().position();
        self.drag.begin(self.style, pointer, position)
    }

    pub fn pointer_move(&mut self, pointer: Point) -> Option<Point> {
        let position = self.drag.update(pointer)?;
        self.dragged_to = Some(position);
        Some(position)
    }

    /// Pointer released or left the viewport.
    pub fn pointer_up(&mut self) {
        self.drag.end();
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    // --- picture ---

    pub fn set_picture_mode(&mut self, mode: PictureMode) {
        self.picture_mode = mode;
    }

    pub fn toggle_flip_horizontal(&mut self) {
        self.flip.horizontal = !self.flip.horizontal;
        self.frames.set_flip(self.flip);
    }

    pub fn toggle_flip_vertical(&mut self) {
        self.flip.vertical = !self.flip.vertical;
        self.frames.set_flip(self.flip);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = round_step(self.zoom + ZOOM_STEP).min(ZOOM_MAX);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = round_step(self.zoom - ZOOM_STEP).max(ZOOM_MIN);
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        if opacity.is_finite() {
            self.opacity = opacity.clamp(OPACITY_MIN, OPACITY_MAX);
        }
    }

    pub fn increase_opacity(&mut self) {
        self.set_opacity(round_step(self.opacity + OPACITY_STEP));
    }

    pub fn decrease_opacity(&mut self) {
        self.set_opacity(round_step(self.opacity - OPACITY_STEP));
    }

    pub fn increase_window_size(&mut self) {
        self.window_size += WINDOW_SIZE_STEP;
        self.reset_geometry();
    }

    pub fn decrease_window_size(&mut self) {
        let size = (self.window_size - WINDOW_SIZE_STEP).max(WINDOW_SIZE_MIN);
        if size != self.window_size {
            self.window_size = size;
            self.reset_geometry();
        }
    }

    // --- capture ---

    /// Starts an immediate capture. Progress arrives as notices; the receiver
    /// resolves with the final outcome.
    pub fn capture_now(&mut self) -> Option<oneshot::Receiver<CaptureOutcome>> {
        match self.scheduler.request_capture_now() {
            Ok(rx) => Some(rx),
            Err(e) => {
                self.report(&e);
                None
            }
        }
    }

    /// Starts a delayed capture using the configured delay.
    pub fn capture_after_delay(&mut self) -> Option<oneshot::Receiver<CaptureOutcome>> {
        match self
            .scheduler
            .request_capture_after_delay(self.settings.capture_delay_secs)
        {
            Ok(rx) => Some(rx),
            Err(e) => {
                self.report(&e);
                None
            }
        }
    }

    pub fn scheduler(&self) -> &SchedulerHandle {
        &self.scheduler
    }

    // --- camera ---

    /// Opens a camera, stopping the current stream first, and attaches its
    /// surface for capture.
    pub async fn open_camera<B>(&mut self, backend: &B, device_id: Option<&str>)
    where
        B: CameraBackend<Stream = S>,
    {
        self.frames.set_surface(None);
        if let Ok(surface) = self.camera.open(backend, device_id).await {
            self.frames.set_surface(Some(surface));
        }
    }

    /// Platform reported a device being added or removed.
    pub async fn on_devices_changed<B>(&mut self, backend: &B)
    where
        B: CameraBackend<Stream = S>,
    {
        self.camera.refresh_devices(backend).await;
    }

    pub fn camera(&self) -> &CameraSession<S> {
        &self.camera
    }

    // --- shortcuts ---

    pub fn toggle_shortcuts(&mut self) {
        self.shortcuts_enabled = !self.shortcuts_enabled;
        tracing::debug!(target: "viewer", "Shortcuts enabled: {}", self.shortcuts_enabled);
    }

    /// Routes a key press. Returns the action that ran, if any.
    pub fn handle_key(&mut self, input: &KeyInput) -> Option<Action> {
        let action = self.keymap.route(input, self.shortcuts_enabled)?;
        self.apply(action);
        Some(action)
    }

    pub fn apply(&mut self, action: Action) {
        if let Some(mode) = action.picture_mode() {
            self.set_picture_mode(mode);
            return;
        }
        if let Some(style) = action.window_style() {
            self.set_window_style(style);
            return;
        }

        match action {
            Action::ToggleFullscreen => self.toggle_fullscreen(),
            Action::FlipHorizontal => self.toggle_flip_horizontal(),
            Action::FlipVertical => self.toggle_flip_vertical(),
            Action::OpacityUp => self.increase_opacity(),
            Action::OpacityDown => self.decrease_opacity(),
            Action::OpacityMax => self.set_opacity(OPACITY_MAX),
            Action::OpacityMin => self.set_opacity(OPACITY_MIN),
            Action::SizeUp => self.increase_window_size(),
            Action::SizeDown => self.decrease_window_size(),
            Action::ZoomIn => self.zoom_in(),
            Action::ZoomOut => self.zoom_out(),
            Action::CaptureNow => {
                self.capture_now();
            }
            Action::CaptureDelayed => {
                self.capture_after_delay();
            }
            Action::ToggleShortcuts => self.toggle_shortcuts(),
            _ => {}
        }
    }

    // --- notifications ---

    /// Banner errors are held by the camera session, so only toasts need a slot here.
    fn report(&mut self, err: &ViewerError) {
        match err.surface() {
            Surface::Toast => {
                tracing::warn!(target: "viewer", "{}", err);
                self.toast.show(err.to_string(), Instant::now());
            }
            Surface::Banner | Surface::Log => {
                tracing::error!(target: "viewer", "{}", err);
            }
        }
    }

    /// Moves pending scheduler notices into the toast slot. A toast expires
    /// relative to when its notice was emitted, not when it is drained.
    pub fn drain_notices(&mut self) {
        loop {
            match self.notices.try_recv() {
                Ok(notice) => {
                    let shown_at = notice.emitted_at.unwrap_or_else(Instant::now);
                    self.toast.show(notice.message, shown_at);
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(target: "viewer", "Skipped {} stale notices", skipped);
                }
                Err(_) => break,
            }
        }
    }

    pub fn toast(&self) -> Option<&str> {
        self.toast.message(Instant::now())
    }

    // --- accessors ---

    pub fn style(&self) -> WindowStyle {
        self.style
    }

    pub fn picture_mode(&self) -> PictureMode {
        self.picture_mode
    }

    pub fn flip(&self) -> FlipState {
        self.flip
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn window_size(&self) -> f64 {
        self.window_size
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    pub fn shortcuts_enabled(&self) -> bool {
        self.shortcuts_enabled
    }

    pub fn presentation(&mut self) -> Presentation {
        self.drain_notices();

        let floating = self.style.is_floating().then(|| FloatingWindow {
            geometry: self.window_geometry(),
            clip: self.style.clip_mask(),
            cursor: self.drag.cursor(self.style),
        });
        let (scale_x, scale_y) = self.flip.scale();

        Presentation {
            opacity: self.opacity,
            floating,
            video: VideoTransform {
                zoom: self.zoom,
                scale_x,
                scale_y,
                object_fit: self.picture_mode.object_fit(),
            },
            countdown: self.scheduler.countdown(),
            toast: self.toast().map(str::to_string),
            error: self.camera.error().map(|e| e.to_string()),
        }
    }
}
