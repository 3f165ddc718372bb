//! Effective window geometry from style, requested size and aspect ratio.
//!
//! This is a pure function of its inputs. Callers recompute it whenever the
//! style, requested size, aspect ratio or viewport changes.

use crate::types::{AspectRatio, Geometry, Viewport, WindowStyle};

/// Gap kept between a floating window and the viewport edges (sum of both sides).
pub const DEFAULT_MARGIN: f64 = 40.0;

/// Computes the window rectangle.
///
/// `Normal` and `Fullscreen` fill the viewport at the origin. Floating styles are
/// bounded by `viewport - margin` on each axis and centered; the returned position
/// is the reset position, which an active drag may later override.
pub fn compute(
    style: WindowStyle,
    requested_size: f64,
    aspect_ratio: AspectRatio,
    viewport: Viewport,
    margin: f64,
) -> Geometry {
    if !style.is_floating() {
        return Geometry {
            width: viewport.width,
            height: viewport.height,
            x: 0.0,
            y: 0.0,
        };
    }

    let max_w = (viewport.width - margin).max(0.0);
    let max_h = (viewport.height - margin).max(0.0);
    let requested = requested_size.max(0.0);

    let (width, height) = if style.is_circular() {
        let size = requested.min(max_w).min(max_h);
        (size, size)
    } else {
        let ratio = aspect_ratio.value();
        let width = requested.min(max_w);
        let height = width / ratio;

        if height > max_h {
            (max_h * ratio, max_h)
        } else {
            (width, height)
        }
    };

    Geometry {
        width,
        height,
        x: (viewport.width - width) / 2.0,
        y: (viewport.height - height) / 2.0,
    }
}
