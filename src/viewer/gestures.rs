//! Raw gesture input and tap arbitration.
//!
//! Pinch and pan report cumulative values since their `Begin` event. Taps are
//! held back for the double-tap window so a second tap can claim them.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Input delivered to the viewer. Positions are in viewport coordinates
/// with the origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    PinchBegin,
    /// `factor` is the scale relative to the pinch start.
    PinchUpdate { factor: f64, focal: Point },
    PinchEnd,
    PanBegin,
    /// Translation since the pan started.
    PanUpdate { dx: f64, dy: f64 },
    /// Final translation and release velocity in px/s.
    PanEnd { dx: f64, dy: f64, vx: f64, vy: f64 },
    Tap { at: Point },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TapKind {
    Single(Point),
    Double(Point),
}

#[derive(Debug, Clone, Copy)]
struct PendingTap {
    at: Point,
    time: Instant,
}

/// Tells single taps from double taps. A tap becomes a single tap only once
/// its window has passed without a second tap nearby.
#[derive(Debug, Clone)]
pub struct TapRecognizer {
    window: Duration,
    slop: f64,
    pending: Option<PendingTap>,
}

impl TapRecognizer {
    pub fn new(window: Duration, slop: f64) -> Self {
        Self {
            window,
            slop,
            pending: None,
        }
    }

    /// Feeds a tap. Returns a double tap when it pairs with the pending one,
    /// or the previous pending tap as a single when it cannot.
    pub fn tap(&mut self, at: Point, now: Instant) -> Option<TapKind> {
        match self.pending.take() {
            Some(prev) if self.pairs_with(&prev, at, now) => Some(TapKind::Double(at)),
            prev => {
                self.pending = Some(PendingTap { at, time: now });
                prev.map(|p| TapKind::Single(p.at))
            }
        }
    }

    /// Resolves the pending tap as a single once its window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<TapKind> {
        let pending = self.pending?;
        if now.saturating_duration_since(pending.time) >= self.window {
            self.pending = None;
            Some(TapKind::Single(pending.at))
        } else {
            None
        }
    }

    /// Drops the pending tap, e.g. when a pinch or pan takes over.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn pairs_with(&self, prev: &PendingTap, at: Point, now: Instant) -> bool {
        now.saturating_duration_since(prev.time) < self.window && prev.at.distance(at) <= self.slop
    }
}
