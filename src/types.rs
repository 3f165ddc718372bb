use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

pub const ZOOM_STEP: f64 = 0.1;
pub const ZOOM_MIN: f64 = 0.1;
pub const ZOOM_MAX: f64 = 5.0;

pub const OPACITY_STEP: f64 = 0.1;
pub const OPACITY_MIN: f64 = 0.2;
pub const OPACITY_MAX: f64 = 1.0;

pub const WINDOW_SIZE_STEP: f64 = 50.0;
pub const WINDOW_SIZE_MIN: f64 = 150.0;
pub const DEFAULT_WINDOW_SIZE: f64 = 500.0;

/// Shape and placement of the on-screen camera window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WindowStyle {
    /// Fills the viewport.
    #[default]
    Normal,
    /// Floating circle; width and height are always equal.
    Ellipse,
    Rectangle,
    Rounded,
    /// Fills the viewport and holds the platform fullscreen state.
    Fullscreen,
}

impl WindowStyle {
    /// Floating styles are sized by the geometry calculator and can be dragged.
    pub fn is_floating(&self) -> bool {
        !matches!(self, WindowStyle::Normal | WindowStyle::Fullscreen)
    }

    pub fn is_circular(&self) -> bool {
        matches!(self, WindowStyle::Ellipse)
    }

    pub fn clip_mask(&self) -> ClipMask {
        match self {
            WindowStyle::Ellipse => ClipMask::Circle,
            WindowStyle::Rounded => ClipMask::RoundedCorners,
            _ => ClipMask::None,
        }
    }
}

/// How the video is fitted inside the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PictureMode {
    #[default]
    Cover,
    Contain,
    Fill,
    None,
}

impl PictureMode {
    /// CSS `object-fit` keyword for this mode.
    pub fn object_fit(&self) -> &'static str {
        match self {
            PictureMode::Cover => "cover",
            PictureMode::Contain => "contain",
            PictureMode::Fill => "fill",
            PictureMode::None => "none",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ClipMask {
    #[default]
    None,
    Circle,
    /// 2rem corner radius.
    RoundedCorners,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum CursorHint {
    #[default]
    Default,
    Grab,
    Grabbing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FlipState {
    pub horizontal: bool,
    pub vertical: bool,
}

impl FlipState {
    pub fn any(&self) -> bool {
        self.horizontal || self.vertical
    }

    /// (scale_x, scale_y) factors matching the mirror applied on screen.
    pub fn scale(&self) -> (f64, f64) {
        (
            if self.horizontal { -1.0 } else { 1.0 },
            if self.vertical { -1.0 } else { 1.0 },
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// Effective window rectangle in viewport coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Geometry {
    pub width: f64,
    pub height: f64,
    pub x: f64,
    pub y: f64,
}

impl Geometry {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn with_position(self, position: Point) -> Self {
        Self {
            x: position.x,
            y: position.y,
            ..self
        }
    }
}

/// Width / height of the current video source.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AspectRatio(f64);

impl AspectRatio {
    /// Used until the first stream metadata arrives.
    pub const DEFAULT: AspectRatio = AspectRatio(16.0 / 9.0);

    /// Returns `None` unless both dimensions are positive.
    pub fn from_dimensions(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self(width as f64 / height as f64))
    }

    pub fn new(ratio: f64) -> Option<Self> {
        (ratio.is_finite() && ratio > 0.0).then_some(Self(ratio))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::DEFAULT
    }
}
