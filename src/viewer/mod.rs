//! Full-screen viewer: open/close/navigation state, pinch and pan transforms,
//! tap arbitration and prefetch of further feed pages.

pub mod animation;
pub mod gestures;
pub mod state;
pub mod transform;

pub use animation::{Easing, TransformAnimation, Tween};
pub use gestures::{GestureEvent, Point, TapKind, TapRecognizer};
pub use state::{Viewer, ViewerState};
pub use transform::ViewerTransform;

/// Area the current item is centered in, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Offset of `point` from the viewport center.
    pub fn from_center(&self, point: Point) -> Point {
        let center = self.center();
        Point::new(point.x - center.x, point.y - center.y)
    }
}

/// Receives fire-and-forget requests for more feed items.
pub trait MoreItems: Send + Sync {
    fn request_more(&self);

    /// Drops any request still in flight.
    fn cancel_pending(&self) {}
}

impl<T: MoreItems + ?Sized> MoreItems for std::sync::Arc<T> {
    fn request_more(&self) {
        (**self).request_more()
    }

    fn cancel_pending(&self) {
        (**self).cancel_pending()
    }
}
