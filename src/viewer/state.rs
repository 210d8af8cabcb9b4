//! Viewer state machine.
//!
//! The viewer is either closed or showing one item. All gesture input goes
//! through [`Viewer::handle`], which is the only writer of the transform;
//! [`Viewer::tick`] advances settle animations and resolves single taps once
//! the double-tap window has passed.

use std::ops::Range;
use std::time::Instant;

use tracing::{debug, trace};

use super::animation::{TransformAnimation, Tween};
use super::gestures::{GestureEvent, Point, TapKind, TapRecognizer};
use super::transform::ViewerTransform;
use super::MoreItems;
use crate::config::ViewerConfig;

const SCALE_EPSILON: f64 = 1e-6;

/// Observable viewer state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerState {
    Closed,
    Open {
        index: usize,
        transform: ViewerTransform,
        ui_visible: bool,
    },
}

#[derive(Debug, Clone, Copy)]
struct PanGesture {
    reference: ViewerTransform,
    /// Set once the pan overlaps a pinch or a zoomed transform; from then on
    /// it moves the content and can no longer navigate.
    zoomed: bool,
}

#[derive(Debug)]
struct Session {
    index: usize,
    transform: ViewerTransform,
    ui_visible: bool,
    pinch: Option<ViewerTransform>,
    pan: Option<PanGesture>,
    /// Damped horizontal offset shown while swiping an unzoomed item.
    swipe_offset: f64,
    settle: Option<TransformAnimation>,
    swipe_settle: Option<Tween>,
}

impl Session {
    fn new(index: usize) -> Self {
        Self {
            index,
            transform: ViewerTransform::IDENTITY,
            ui_visible: true,
            pinch: None,
            pan: None,
            swipe_offset: 0.0,
            settle: None,
            swipe_settle: None,
        }
    }

    /// Moves to `index` with a fresh transform and visible chrome.
    fn show(&mut self, index: usize) {
        *self = Self::new(index);
    }

    fn stop_animations(&mut self) {
        self.settle = None;
        self.swipe_settle = None;
    }
}

pub struct Viewer<R: MoreItems> {
    config: ViewerConfig,
    more: R,
    item_count: usize,
    session: Option<Session>,
    taps: TapRecognizer,
}

impl<R: MoreItems> Viewer<R> {
    pub fn new(config: ViewerConfig, more: R) -> Self {
        let taps = TapRecognizer::new(config.double_tap_window, config.double_tap_slop);
        Self {
            config,
            more,
            item_count: 0,
            session: None,
            taps,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn state(&self) -> ViewerState {
        match &self.session {
            None => ViewerState::Closed,
            Some(session) => ViewerState::Open {
                index: session.index,
                transform: session.transform,
                ui_visible: session.ui_visible,
            },
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn index(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.index)
    }

    pub fn transform(&self) -> ViewerTransform {
        self.session
            .as_ref()
            .map_or(ViewerTransform::IDENTITY, |s| s.transform)
    }

    pub fn swipe_offset(&self) -> f64 {
        self.session.as_ref().map_or(0.0, |s| s.swipe_offset)
    }

    pub fn ui_visible(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.ui_visible)
    }

    pub fn is_zoomed(&self) -> bool {
        self.transform().scale > self.config.min_scale + SCALE_EPSILON
    }

    pub fn is_animating(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.settle.is_some() || s.swipe_settle.is_some())
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Follows growth or replacement of the loaded list. An open viewer whose
    /// item disappeared moves to the last item, or closes when none remain.
    pub fn set_item_count(&mut self, count: usize) {
        self.item_count = count;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if count == 0 {
            debug!("Item list emptied, closing viewer");
            self.close();
        } else if session.index >= count {
            session.show(count - 1);
        }
    }

    /// Opens the item at `index`. Returns false if it does not exist.
    pub fn open(&mut self, index: usize) -> bool {
        if index >= self.item_count {
            return false;
        }
        self.taps.cancel();
        self.session = Some(Session::new(index));
        debug!(index, "Opened viewer");
        self.maybe_prefetch();
        true
    }

    /// Closes the viewer, dropping animations and any pending page request.
    pub fn close(&mut self) {
        if self.session.take().is_some() {
            self.taps.cancel();
            self.more.cancel_pending();
            debug!("Closed viewer");
        }
    }

    pub fn next(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.index + 1 >= self.item_count {
            return false;
        }
        session.show(session.index + 1);
        self.maybe_prefetch();
        true
    }

    pub fn prev(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.index == 0 {
            return false;
        }
        session.show(session.index - 1);
        true
    }

    pub fn toggle_ui(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.ui_visible = !session.ui_visible;
        }
    }

    /// Steps one item at a time towards `target`, stopping at either end.
    /// Returns the index reached.
    pub fn jump_to(&mut self, target: usize) -> Option<usize> {
        let mut current = self.index()?;
        while current != target {
            let moved = if target > current {
                self.next()
            } else {
                self.prev()
            };
            if !moved {
                break;
            }
            current = self.index()?;
        }
        Some(current)
    }

    /// Absolute indices shown in the thumbnail strip around the current item.
    pub fn thumbnail_window(&self) -> Range<usize> {
        let Some(index) = self.index() else {
            return 0..0;
        };
        let radius = self.config.thumbnail_radius;
        index.saturating_sub(radius)..(index + radius).min(self.item_count)
    }

    /// Animates back to the unzoomed transform.
    pub fn reset_zoom(&mut self, now: Instant) {
        self.settle_to(ViewerTransform::IDENTITY, now);
    }

    pub fn handle(&mut self, event: GestureEvent, now: Instant) {
        if self.session.is_none() {
            return;
        }
        trace!(?event, "Viewer gesture");

        match event {
            GestureEvent::PinchBegin => self.pinch_begin(),
            GestureEvent::PinchUpdate { factor, focal } => self.pinch_update(factor, focal),
            GestureEvent::PinchEnd => self.pinch_end(now),
            GestureEvent::PanBegin => self.pan_begin(),
            GestureEvent::PanUpdate { dx, dy } => self.pan_update(dx, dy),
            GestureEvent::PanEnd { dx, vx, .. } => self.pan_end(dx, vx, now),
            GestureEvent::Tap { at } => {
                if let Some(kind) = self.taps.tap(at, now) {
                    self.recognized_tap(kind, now);
                }
            }
        }
    }

    /// Advances animations to `now` and fires single taps whose window has passed.
    pub fn tick(&mut self, now: Instant) {
        if let Some(kind) = self.taps.poll(now) {
            self.recognized_tap(kind, now);
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some(anim) = session.settle {
            session.transform = anim.value_at(now);
            if anim.is_complete(now) {
                session.settle = None;
            }
        }
        if let Some(tween) = session.swipe_settle {
            session.swipe_offset = tween.value_at(now);
            if tween.is_complete(now) {
                session.swipe_settle = None;
            }
        }
    }

    fn pinch_begin(&mut self) {
        self.taps.cancel();
        if let Some(session) = self.session.as_mut() {
            session.stop_animations();
            session.pinch = Some(session.transform);
            if let Some(pan) = session.pan.as_mut() {
                pan.zoomed = true;
                session.swipe_offset = 0.0;
            }
        }
    }

    fn pinch_update(&mut self, factor: f64, focal: Point) {
        let viewport = self.config.viewport;
        let (min, max) = (self.config.min_scale, self.config.max_scale);
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(reference) = session.pinch else {
            return;
        };

        let scale = (reference.scale * factor).clamp(min, max);
        // Scales about the focal point (t1 = f - (f - t0) * s1 / s0) so the
        // content under the fingers stays put.
        session.transform = reference
            .zoom_about(viewport.from_center(focal), scale)
            .clamped(viewport);
    }

    fn pinch_end(&mut self, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.pinch.take().is_none() {
            return;
        }
        if session.pan.is_some() {
            // The running pan settles the transform when it ends.
            return;
        }
        let target = if session.transform.scale <= self.config.min_scale + SCALE_EPSILON {
            ViewerTransform::IDENTITY
        } else {
            session.transform.clamped(self.config.viewport)
        };
        self.settle_to(target, now);
    }

    fn pan_begin(&mut self) {
        self.taps.cancel();
        let zoomed = self.is_zoomed();
        if let Some(session) = self.session.as_mut() {
            session.stop_animations();
            session.pan = Some(PanGesture {
                reference: session.transform,
                zoomed: zoomed || session.pinch.is_some(),
            });
        }
    }

    fn pan_update(&mut self, dx: f64, dy: f64) {
        let viewport = self.config.viewport;
        let damping = self.config.pan_damping;
        let zoomed = self.is_zoomed();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let pinching = session.pinch.is_some();
        let Some(pan) = session.pan.as_mut() else {
            return;
        };

        if !pan.zoomed && (zoomed || pinching) {
            pan.zoomed = true;
            session.swipe_offset = 0.0;
        }

        if !pan.zoomed {
            if dy.abs() < dx.abs() {
                session.swipe_offset = dx * damping;
            }
        } else if pinching {
            // The pinch owns the translation through its focal point; rebase
            // so the pan carries on from here once the pinch ends.
            pan.reference = session.transform.translated(-dx, -dy);
        } else {
            session.transform = pan.reference.translated(dx, dy).clamped(viewport);
        }
    }

    fn pan_end(&mut self, dx: f64, vx: f64, now: Instant) {
        let zoomed = self.is_zoomed();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(pan) = session.pan.take() else {
            return;
        };

        if pan.zoomed || zoomed || session.pinch.is_some() {
            session.swipe_offset = 0.0;
            if session.pinch.is_none() {
                let target = session.transform.clamped(self.config.viewport);
                self.settle_to(target, now);
            }
            return;
        }

        let committed = dx.abs() > self.config.swipe_distance || vx.abs() > self.config.swipe_velocity;
        let direction = if dx != 0.0 { dx } else { vx };
        let navigated = committed
            && if direction > 0.0 {
                self.prev()
            } else if direction < 0.0 {
                self.next()
            } else {
                false
            };

        if !navigated {
            self.spring_back(now);
        }
    }

    fn recognized_tap(&mut self, kind: TapKind, now: Instant) {
        match kind {
            TapKind::Double(at) => self.double_tap(at, now),
            TapKind::Single(at) => self.single_tap(at),
        }
    }

    fn double_tap(&mut self, at: Point, now: Instant) {
        if self.session.is_none() {
            return;
        }
        let target = if self.is_zoomed() {
            ViewerTransform::IDENTITY
        } else {
            let viewport = self.config.viewport;
            ViewerTransform::IDENTITY
                .zoom_about(viewport.from_center(at), self.config.double_tap_scale)
                .clamped(viewport)
        };
        self.settle_to(target, now);
    }

    fn single_tap(&mut self, at: Point) {
        let Some(index) = self.index() else {
            return;
        };
        if self.is_zoomed() {
            self.toggle_ui();
            return;
        }

        let width = self.config.viewport.width;
        let zone = self.config.tap_zone * width;
        if at.x < zone && index > 0 {
            self.prev();
        } else if at.x > width - zone && index + 1 < self.item_count {
            self.next();
        } else {
            self.toggle_ui();
        }
    }

    fn settle_to(&mut self, target: ViewerTransform, now: Instant) {
        let duration = self.config.animation_duration;
        if let Some(session) = self.session.as_mut() {
            session.settle = if session.transform == target {
                None
            } else {
                Some(TransformAnimation::new(session.transform, target, duration, now))
            };
        }
    }

    fn spring_back(&mut self, now: Instant) {
        let duration = self.config.animation_duration;
        if let Some(session) = self.session.as_mut() {
            if session.swipe_offset != 0.0 {
                session.swipe_settle = Some(Tween::new(session.swipe_offset, 0.0, duration, now));
            }
        }
    }

    fn maybe_prefetch(&self) {
        let Some(index) = self.index() else {
            return;
        };
        let remaining = self.item_count.saturating_sub(index + 1);
        if remaining < self.config.prefetch_threshold {
            debug!(index, remaining, "Requesting more items for viewer");
            self.more.request_more();
        }
    }
}
