//! Time-based tweens for settling the viewer transform.
//!
//! Values are sampled with an explicit `now` so the caller's frame clock
//! drives them. A finished tween always reports its exact end value.

use std::time::{Duration, Instant};

use super::ViewerTransform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    /// Cubic ease-out.
    #[default]
    EaseOut,
}

impl Easing {
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseOut => 1.0 - (1.0 - t).powi(3),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Tween {
    pub start: f64,
    pub end: f64,
    pub duration: Duration,
    pub start_time: Instant,
    pub easing: Easing,
}

impl Tween {
    pub fn new(start: f64, end: f64, duration: Duration, start_time: Instant) -> Self {
        Self {
            start,
            end,
            duration,
            start_time,
            easing: Easing::default(),
        }
    }

    pub fn value_at(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.start_time);
        if elapsed >= self.duration || self.duration.is_zero() {
            return self.end;
        }
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        self.start + (self.end - self.start) * self.easing.apply(t)
    }

    pub fn is_complete(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.start_time) >= self.duration
    }
}

/// Moves a transform from its current value to a target.
#[derive(Debug, Clone, Copy)]
pub struct TransformAnimation {
    scale: Tween,
    x: Tween,
    y: Tween,
}

impl TransformAnimation {
    pub fn new(
        from: ViewerTransform,
        to: ViewerTransform,
        duration: Duration,
        start_time: Instant,
    ) -> Self {
        Self {
            scale: Tween::new(from.scale, to.scale, duration, start_time),
            x: Tween::new(from.translate_x, to.translate_x, duration, start_time),
            y: Tween::new(from.translate_y, to.translate_y, duration, start_time),
        }
    }

    pub fn value_at(&self, now: Instant) -> ViewerTransform {
        ViewerTransform::new(
            self.scale.value_at(now),
            self.x.value_at(now),
            self.y.value_at(now),
        )
    }

    pub fn target(&self) -> ViewerTransform {
        ViewerTransform::new(self.scale.end, self.x.end, self.y.end)
    }

    pub fn is_complete(&self, now: Instant) -> bool {
        self.scale.is_complete(now)
    }
}
