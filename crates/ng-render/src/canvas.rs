//! Canvas bounds: client pixel coordinates ↔ normalized device coordinates.

use glam::Vec2;
use kurbo::{Point, Rect};

/// Where the canvas sits on the page, in client pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasBounds {
    pub rect: Rect,
}

impl CanvasBounds {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            rect: Rect::new(left, top, left + width, top + height),
        }
    }

    pub fn width(&self) -> f64 {
        self.rect.width()
    }

    pub fn height(&self) -> f64 {
        self.rect.height()
    }

    pub fn aspect(&self) -> Option<f32> {
        (self.height() > 0.0).then(|| (self.width() / self.height()) as f32)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.rect.contains(Point::new(x, y))
    }

    /// Map a client point into NDC. `None` when the canvas has no area.
    pub fn to_ndc(&self, x: f64, y: f64) -> Option<Vec2> {
        let (w, h) = (self.width(), self.height());
        if w <= 0.0 || h <= 0.0 {
            return None;
        }
        let nx = (x - self.rect.x0) / w * 2.0 - 1.0;
        let ny = -((y - self.rect.y0) / h) * 2.0 + 1.0;
        Some(Vec2::new(nx as f32, ny as f32))
    }

    /// Map an NDC point back to client pixels.
    pub fn from_ndc(&self, ndc: Vec2) -> Point {
        Point::new(
            self.rect.x0 + (f64::from(ndc.x) + 1.0) * 0.5 * self.width(),
            self.rect.y0 + (1.0 - f64::from(ndc.y)) * 0.5 * self.height(),
        )
    }
}
