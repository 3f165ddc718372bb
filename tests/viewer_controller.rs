//! Integration tests for the viewer controller: keyboard routing, geometry
//! recompute rules, dragging, fullscreen sync and capture feedback.

mod common;

use camview_lib::camera::MSG_ACCESS_FAILED;
use camview_lib::capture::{CaptureCoordinator, CaptureOutcome, CaptureState, LiveFrameSource};
use camview_lib::error::ViewerError;
use camview_lib::shortcuts::{Action, KeyInput};
use camview_lib::types::{ClipMask, CursorHint, PictureMode, Point, Viewport, WindowStyle};
use camview_lib::{ViewerController, ViewerSettings};
use common::{FakeBackend, FakeFullscreen, FakeStream, FullscreenLog, RecordingClipboard};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

type TestController = ViewerController<FakeStream, FakeFullscreen>;

struct Harness {
    controller: TestController,
    frames: Arc<LiveFrameSource>,
    fullscreen: Arc<FullscreenLog>,
    clipboard: Arc<RecordingClipboard>,
}

fn harness_with(settings: ViewerSettings, viewport: Viewport) -> Harness {
    let frames = Arc::new(LiveFrameSource::new());
    let clipboard = Arc::new(RecordingClipboard::default());
    let scheduler = CaptureCoordinator::spawn(frames.clone(), clipboard.clone());
    let fullscreen = Arc::new(FullscreenLog::default());
    let controller = ViewerController::new(
        settings,
        viewport,
        FakeFullscreen(fullscreen.clone()),
        frames.clone(),
        scheduler,
    );
    Harness {
        controller,
        frames,
        fullscreen,
        clipboard,
    }
}

fn harness() -> Harness {
    harness_with(ViewerSettings::default(), Viewport::new(1200.0, 800.0))
}

fn press(controller: &mut TestController, key: &str) -> Option<Action> {
    controller.handle_key(&KeyInput::plain(key))
}

// =============================================================================
// Geometry
// =============================================================================

#[tokio::test]
async fn test_normal_style_has_no_floating_window() {
    let mut h = harness();

    let presentation = h.controller.presentation();

    assert!(presentation.floating.is_none());
    assert_eq!(presentation.opacity, 1.0);
    assert_eq!(presentation.video.object_fit, "cover");
}

#[tokio::test]
async fn test_ellipse_is_clamped_and_centered() {
    let settings = ViewerSettings {
        initial_window_size: 900.0,
        ..Default::default()
    };
    let mut h = harness_with(settings, Viewport::new(1000.0, 800.0));

    press(&mut h.controller, "e");
    let floating = h.controller.presentation().floating.unwrap();

    assert_eq!(floating.geometry.width, 760.0);
    assert_eq!(floating.geometry.height, 760.0);
    assert_eq!(floating.geometry.x, 120.0);
    assert_eq!(floating.geometry.y, 20.0);
    assert_eq!(floating.clip, ClipMask::Circle);
    assert_eq!(floating.cursor, CursorHint::Grab);
}

#[tokio::test]
async fn test_video_metadata_updates_aspect_ratio() {
    let mut h = harness();
    h.controller.set_window_style(WindowStyle::Rectangle);

    h.controller.on_video_metadata(0, 480);
    assert!((h.controller.window_geometry().height - 281.25).abs() < 1e-9);

    h.controller.on_video_metadata(640, 480);
    assert_eq!(h.controller.window_geometry().height, 375.0);
}

#[tokio::test]
async fn test_size_keys_step_and_floor() {
    let mut h = harness();

    press(&mut h.controller, "+");
    assert_eq!(h.controller.window_size(), 550.0);

    for _ in 0..20 {
        press(&mut h.controller, "-");
    }
    assert_eq!(h.controller.window_size(), 150.0);
}

// =============================================================================
// Dragging
// =============================================================================

#[tokio::test]
async fn test_drag_moves_window_by_pointer_delta() {
    let mut h = harness();
    h.controller.set_window_style(WindowStyle::Rounded);
    let start = h.controller.window_geometry().position();

    assert!(h.controller.pointer_down(start + Point::new(10.0, 10.0)));
    assert_eq!(
        h.controller.presentation().floating.unwrap().cursor,
        CursorHint::Grabbing
    );

    h.controller.pointer_move(start + Point::new(60.0, 40.0));
    h.controller.pointer_up();

    assert_eq!(
        h.controller.window_geometry().position(),
        start + Point::new(50.0, 30.0)
    );
    assert!(!h.controller.is_dragging());
}

#[tokio::test]
async fn test_drag_ignored_in_fill_styles() {
    let mut h = harness();

    assert!(!h.controller.pointer_down(Point::new(5.0, 5.0)));
    assert_eq!(h.controller.pointer_move(Point::new(50.0, 50.0)), None);
}

#[tokio::test]
async fn test_viewport_resize_keeps_dragged_position() {
    let mut h = harness();
    h.controller.set_window_style(WindowStyle::Rectangle);
    h.controller.pointer_down(Point::new(400.0, 300.0));
    h.controller.pointer_move(Point::new(300.0, 200.0));
    h.controller.pointer_up();
    let dragged = h.controller.window_geometry().position();

    h.controller.on_viewport_resized(Viewport::new(1400.0, 900.0));
    assert_eq!(h.controller.window_geometry().position(), dragged);

    // A size change re-centers
    press(&mut h.controller, "+");
    let geometry = h.controller.window_geometry();
    assert_eq!(geometry.x, (1400.0 - geometry.width) / 2.0);
}

// =============================================================================
// Fullscreen
// =============================================================================

#[tokio::test]
async fn test_fullscreen_toggle_requests_and_exits() {
    let mut h = harness();

    press(&mut h.controller, "f");
    assert_eq!(h.controller.style(), WindowStyle::Fullscreen);
    assert_eq!(h.fullscreen.requests.load(Ordering::SeqCst), 1);

    press(&mut h.controller, "f");
    assert_eq!(h.controller.style(), WindowStyle::Normal);
    assert_eq!(h.fullscreen.exits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_platform_exit_reverts_to_normal() {
    let mut h = harness();
    h.controller.set_window_style(WindowStyle::Fullscreen);

    h.fullscreen.active.store(false, Ordering::SeqCst);
    h.controller.on_fullscreen_changed(false);

    assert_eq!(h.controller.style(), WindowStyle::Normal);
    assert_eq!(h.fullscreen.exits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_fullscreen_request_failure_keeps_requested_style() {
    let mut h = harness();
    h.fullscreen.fail.store(true, Ordering::SeqCst);

    h.controller.set_window_style(WindowStyle::Fullscreen);

    assert_eq!(h.controller.style(), WindowStyle::Fullscreen);
    assert!(h.controller.presentation().toast.is_none());
}

#[tokio::test]
async fn test_leaving_fullscreen_for_floating_style_exits() {
    let mut h = harness();
    h.controller.set_window_style(WindowStyle::Fullscreen);

    press(&mut h.controller, "w");

    assert_eq!(h.controller.style(), WindowStyle::Rounded);
    assert_eq!(h.fullscreen.exits.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Picture controls
// =============================================================================

#[tokio::test]
async fn test_opacity_is_clamped() {
    let mut h = harness();

    press(&mut h.controller, "ArrowLeft");
    press(&mut h.controller, "ArrowDown");
    assert_eq!(h.controller.opacity(), 0.2);

    press(&mut h.controller, "ArrowUp");
    assert_eq!(h.controller.opacity(), 0.3);

    press(&mut h.controller, "ArrowRight");
    press(&mut h.controller, "ArrowUp");
    assert_eq!(h.controller.opacity(), 1.0);
}

#[tokio::test]
async fn test_zoom_is_clamped() {
    let mut h = harness();

    press(&mut h.controller, "PageUp");
    assert_eq!(h.controller.zoom(), 1.1);

    for _ in 0..30 {
        press(&mut h.controller, "PageDown");
    }
    assert_eq!(h.controller.zoom(), 0.1);

    for _ in 0..100 {
        press(&mut h.controller, "PageUp");
    }
    assert_eq!(h.controller.zoom(), 5.0);
}

#[tokio::test]
async fn test_flip_keys_sync_frame_source() {
    let mut h = harness();

    press(&mut h.controller, "h");
    press(&mut h.controller, "v");

    assert_eq!(h.frames.flip(), h.controller.flip());
    let video = h.controller.presentation().video;
    assert_eq!((video.scale_x, video.scale_y), (-1.0, -1.0));

    press(&mut h.controller, "h");
    assert!(!h.frames.flip().horizontal);
}

#[tokio::test]
async fn test_picture_mode_keys() {
    let mut h = harness();

    press(&mut h.controller, "z");
    assert_eq!(h.controller.picture_mode(), PictureMode::Contain);
    press(&mut h.controller, "c");
    assert_eq!(h.controller.presentation().video.object_fit, "none");
}

// =============================================================================
// Shortcuts
// =============================================================================

#[tokio::test]
async fn test_disabled_shortcuts_ignore_keys() {
    let mut h = harness();
    h.controller.apply(Action::ToggleShortcuts);

    assert_eq!(press(&mut h.controller, "h"), None);
    assert_eq!(press(&mut h.controller, "e"), None);
    assert!(!h.controller.flip().horizontal);
    assert_eq!(h.controller.style(), WindowStyle::Normal);
}

#[tokio::test]
async fn test_bound_toggle_works_while_disabled() {
    let mut settings = ViewerSettings {
        shortcuts_enabled: false,
        ..Default::default()
    };
    settings.keymap.insert("k".into(), Action::ToggleShortcuts);
    let mut h = harness_with(settings, Viewport::default());

    assert_eq!(press(&mut h.controller, "k"), Some(Action::ToggleShortcuts));
    assert!(h.controller.shortcuts_enabled());
    assert_eq!(press(&mut h.controller, "h"), Some(Action::FlipHorizontal));
}

// =============================================================================
// Capture feedback
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_toast_expires_from_when_notice_was_emitted() {
    let mut h = harness();
    h.controller.open_camera(&FakeBackend::default(), None).await;

    let outcome = h.controller.capture_now().unwrap().await.unwrap();
    assert_eq!(outcome, CaptureOutcome::Copied);

    // Not drained until well after the copy
    tokio::time::sleep(Duration::from_millis(3300)).await;
    assert_eq!(h.controller.presentation().toast, None);
}

#[tokio::test(start_paused = true)]
async fn test_late_drain_keeps_remaining_toast_time() {
    let mut h = harness();
    h.controller.open_camera(&FakeBackend::default(), None).await;
    h.controller.capture_now().unwrap().await.unwrap();

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(
        h.controller.presentation().toast.as_deref(),
        Some("Frame copied to clipboard")
    );

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(h.controller.presentation().toast, None);
}

#[tokio::test]
async fn test_capture_without_camera_shows_toast() {
    let mut h = harness();

    let outcome = h.controller.capture_now().unwrap().await.unwrap();

    assert_eq!(outcome, CaptureOutcome::Failed(ViewerError::CaptureUnavailable));
    assert_eq!(
        h.controller.presentation().toast.as_deref(),
        Some("Failed to capture frame")
    );
    assert_eq!(h.clipboard.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_delayed_key_shows_countdown_then_copies() {
    let mut h = harness();
    h.controller.open_camera(&FakeBackend::default(), None).await;

    press(&mut h.controller, "d");
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(h.controller.presentation().countdown, Some(5));

    tokio::time::sleep(Duration::from_secs(6)).await;
    let presentation = h.controller.presentation();
    assert_eq!(presentation.countdown, None);
    assert_eq!(presentation.toast.as_deref(), Some("Frame copied to clipboard"));
    assert_eq!(h.clipboard.delivered().len(), 1);
}

#[tokio::test]
async fn test_ctrl_c_captures_immediately() {
    let mut h = harness();
    h.controller.open_camera(&FakeBackend::default(), None).await;

    assert_eq!(
        h.controller.handle_key(&KeyInput::ctrl("c")),
        Some(Action::CaptureNow)
    );

    let mut state = h.controller.scheduler().watch_state();
    state
        .wait_for(|s| matches!(s, CaptureState::Delivered { .. }))
        .await
        .unwrap();
    assert_eq!(h.clipboard.delivered().len(), 1);
}

#[tokio::test]
async fn test_other_ctrl_chords_are_ignored() {
    let mut h = harness();

    assert_eq!(h.controller.handle_key(&KeyInput::ctrl("h")), None);
    assert!(!h.controller.flip().horizontal);
}

// =============================================================================
// Camera
// =============================================================================

#[tokio::test]
async fn test_open_camera_attaches_surface() {
    let mut h = harness();

    h.controller.open_camera(&FakeBackend::default(), None).await;

    assert!(h.frames.has_surface());
    assert_eq!(h.controller.camera().current_device_id(), Some("cam0"));
    assert!(h.controller.presentation().error.is_none());
}

#[tokio::test]
async fn test_denied_camera_shows_banner() {
    let mut h = harness();

    h.controller
        .open_camera(&FakeBackend { deny: true }, Some("cam0"))
        .await;

    assert!(!h.frames.has_surface());
    assert_eq!(
        h.controller.presentation().error.as_deref(),
        Some(MSG_ACCESS_FAILED)
    );
}
