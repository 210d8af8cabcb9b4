use super::{Point, Viewport};

/// Scale and translation of the displayed item, relative to the viewport
/// center. A content point `q` (measured from the center) is drawn at
/// `translate + scale * q`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerTransform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for ViewerTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewerTransform {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
    };

    pub fn new(scale: f64, translate_x: f64, translate_y: f64) -> Self {
        Self {
            scale,
            translate_x,
            translate_y,
        }
    }

    pub fn is_identity(&self) -> bool {
        (self.scale - 1.0).abs() < 1e-9 && self.translate_x.abs() < 1e-9 && self.translate_y.abs() < 1e-9
    }

    /// Largest allowed |translation| on each axis at `scale`.
    pub fn max_translation(viewport: Viewport, scale: f64) -> (f64, f64) {
        let max_x = (viewport.width * (scale - 1.0) / 2.0).max(0.0);
        let max_y = (viewport.height * (scale - 1.0) / 2.0).max(0.0);
        (max_x, max_y)
    }

    /// Same scale, translation pulled back inside the bounds.
    pub fn clamped(&self, viewport: Viewport) -> Self {
        let (max_x, max_y) = Self::max_translation(viewport, self.scale);
        Self {
            scale: self.scale,
            translate_x: self.translate_x.clamp(-max_x, max_x),
            translate_y: self.translate_y.clamp(-max_y, max_y),
        }
    }

    pub fn is_within(&self, viewport: Viewport) -> bool {
        let (max_x, max_y) = Self::max_translation(viewport, self.scale);
        self.translate_x.abs() <= max_x + 1e-9 && self.translate_y.abs() <= max_y + 1e-9
    }

    /// Rescales to `scale` keeping `focal` (offset from the viewport center)
    /// fixed on screen.
    pub fn zoom_about(&self, focal: Point, scale: f64) -> Self {
        let ratio = scale / self.scale;
        Self {
            scale,
            translate_x: focal.x - (focal.x - self.translate_x) * ratio,
            translate_y: focal.y - (focal.y - self.translate_y) * ratio,
        }
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            scale: self.scale,
            translate_x: self.translate_x + dx,
            translate_y: self.translate_y + dy,
        }
    }

    /// Screen position (from center) of content point `q` (from center).
    pub fn apply(&self, q: Point) -> Point {
        Point::new(
            self.translate_x + self.scale * q.x,
            self.translate_y + self.scale * q.y,
        )
    }
}
