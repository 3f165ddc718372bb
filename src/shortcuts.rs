//! Keyboard shortcut table.
//!
//! Keys use DOM `KeyboardEvent.key` names, compared case-insensitively
//! ("h", "PageUp", "Escape", "+").

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{PictureMode, WindowStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    PictureCover,
    PictureContain,
    PictureFill,
    PictureNone,
    StyleNormal,
    StyleEllipse,
    StyleRectangle,
    StyleRounded,
    ToggleFullscreen,
    FlipHorizontal,
    FlipVertical,
    OpacityUp,
    OpacityDown,
    OpacityMax,
    OpacityMin,
    SizeUp,
    SizeDown,
    ZoomIn,
    ZoomOut,
    CaptureNow,
    CaptureDelayed,
    ToggleShortcuts,
}

impl Action {
    pub fn picture_mode(&self) -> Option<PictureMode> {
        match self {
            Action::PictureCover => Some(PictureMode::Cover),
            Action::PictureContain => Some(PictureMode::Contain),
            Action::PictureFill => Some(PictureMode::Fill),
            Action::PictureNone => Some(PictureMode::None),
            _ => None,
        }
    }

    pub fn window_style(&self) -> Option<WindowStyle> {
        match self {
            Action::StyleNormal => Some(WindowStyle::Normal),
            Action::StyleEllipse => Some(WindowStyle::Ellipse),
            Action::StyleRectangle => Some(WindowStyle::Rectangle),
            Action::StyleRounded => Some(WindowStyle::Rounded),
            _ => None,
        }
    }
}

/// A key press as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub key: String,
    pub ctrl: bool,
}

impl KeyInput {
    pub fn plain(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
        }
    }

    pub fn ctrl(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: true,
        }
    }
}

fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}

const DEFAULT_BINDINGS: &[(&str, Action)] = &[
    ("a", Action::PictureCover),
    ("z", Action::PictureContain),
    ("x", Action::PictureFill),
    ("c", Action::PictureNone),
    ("n", Action::StyleNormal),
    ("escape", Action::StyleNormal),
    ("e", Action::StyleEllipse),
    ("r", Action::StyleRectangle),
    ("w", Action::StyleRounded),
    ("f", Action::ToggleFullscreen),
    ("h", Action::FlipHorizontal),
    ("v", Action::FlipVertical),
    ("arrowup", Action::OpacityUp),
    ("arrowdown", Action::OpacityDown),
    ("arrowright", Action::OpacityMax),
    ("arrowleft", Action::OpacityMin),
    ("+", Action::SizeUp),
    ("-", Action::SizeDown),
    ("i", Action::CaptureNow),
    ("d", Action::CaptureDelayed),
    ("pageup", Action::ZoomIn),
    ("pagedown", Action::ZoomOut),
];

/// Ctrl chords. Any other key pressed with Ctrl is ignored.
const CTRL_BINDINGS: &[(&str, Action)] = &[("c", Action::CaptureNow)];

#[derive(Debug, Clone)]
pub struct Keymap {
    plain: HashMap<String, Action>,
    ctrl: HashMap<String, Action>,
}

fn table(bindings: &[(&str, Action)]) -> HashMap<String, Action> {
    bindings
        .iter()
        .map(|(key, action)| (key.to_string(), *action))
        .collect()
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            plain: table(DEFAULT_BINDINGS),
            ctrl: table(CTRL_BINDINGS),
        }
    }
}

impl Keymap {
    /// Default table with `overrides` (key name -> action) applied on top.
    pub fn with_overrides(overrides: &HashMap<String, Action>) -> Self {
        let mut keymap = Self::default();
        for (key, action) in overrides {
            keymap.bind(key, *action);
        }
        keymap
    }

    pub fn bind(&mut self, key: &str, action: Action) {
        self.plain.insert(normalize(key), action);
    }

    pub fn lookup(&self, input: &KeyInput) -> Option<Action> {
        let key = normalize(&input.key);
        if input.ctrl {
            self.ctrl.get(&key).copied()
        } else {
            self.plain.get(&key).copied()
        }
    }

    /// Resolves a key press, honouring the shortcuts-enabled flag. The toggle
    /// itself stays reachable while shortcuts are disabled.
    pub fn route(&self, input: &KeyInput, enabled: bool) -> Option<Action> {
        let action = self.lookup(input)?;
        if enabled || action == Action::ToggleShortcuts {
            Some(action)
        } else {
            None
        }
    }
}
