//! Pointer-drag tracking for floating windows.

use crate::types::{CursorHint, Point, WindowStyle};

/// Exists only while a pointer button is held over a floating window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    grab_offset: Point,
}

impl DragSession {
    pub fn grab_offset(&self) -> Point {
        self.grab_offset
    }
}

#[derive(Debug, Default)]
pub struct DragController {
    session: Option<DragSession>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a drag. Returns false (and does nothing) for non-floating styles.
    pub fn begin(&mut self, style: WindowStyle, pointer: Point, window_position: Point) -> bool {
        if !style.is_floating() {
            return false;
        }

        let session = DragSession {
            grab_offset: pointer - window_position,
        };
        tracing::debug!(
            target: "viewer",
            dx = session.grab_offset.x,
            dy = session.grab_offset.y,
            "Drag started"
        );
        self.session = Some(session);
        true
    }

    /// New window position for a pointer move, or `None` when no drag is active.
    pub fn update(&self, pointer: Point) -> Option<Point> {
        self.session.map(|s| pointer - s.grab_offset)
    }

    /// Pointer-up or pointer-leave. Safe to call when idle.
    pub fn end(&mut self) {
        if self.session.take().is_some() {
            tracing::debug!(target: "viewer", "Drag ended");
        }
    }

    /// Move/up/leave listeners should only be attached while this is true.
    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn cursor(&self, style: WindowStyle) -> CursorHint {
        match (style.is_floating(), self.is_dragging()) {
            (false, _) => CursorHint::Default,
            (true, true) => CursorHint::Grabbing,
            (true, false) => CursorHint::Grab,
        }
    }
}
