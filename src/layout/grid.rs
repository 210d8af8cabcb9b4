use std::ops::Range;

use crate::models::{clamp_columns, ViewMode};

/// Horizontal padding around the feed, split evenly between both sides.
pub const PADDING: f32 = 32.0;
/// Gap between cards in a grid row.
pub const GAP: f32 = 8.0;
/// Vertical margin below every card.
pub const ROW_MARGIN: f32 = 8.0;
pub const LIST_CARD_HEIGHT: f32 = 100.0;
/// Scroll offset beyond which the scroll-to-top button shows.
pub const SCROLL_TOP_OFFSET: f32 = 300.0;
/// Remaining distance, in viewport heights, that counts as reaching the end.
pub const END_REACHED_THRESHOLD: f32 = 0.5;

/// Sizing and virtualization math for the feed in grid or list mode.
///
/// Cards are square in grid mode and fixed-height rows in list mode. All
/// rows share one stride, so visibility is a pure function of the offset.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub mode: ViewMode,
    columns: u8,
    /// Extra viewports rendered above and below the visible area.
    pub overscan: f32,
}

/// Indices of items to render for a scroll position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleRange {
    /// Items actually on screen.
    pub visible: Range<usize>,
    /// Items to keep mounted, including overscan.
    pub rendered: Range<usize>,
}

impl GridLayout {
    pub fn new(viewport_width: f32, viewport_height: f32, mode: ViewMode, columns: u8) -> Self {
        Self {
            viewport_width: viewport_width.max(1.0),
            viewport_height: viewport_height.max(1.0),
            mode,
            columns: clamp_columns(columns as i64),
            overscan: 2.0,
        }
    }

    pub fn with_overscan(mut self, viewports: f32) -> Self {
        self.overscan = viewports.max(0.0);
        self
    }

    /// Cards per row: the configured column count in grid mode, one in list mode.
    pub fn columns(&self) -> usize {
        match self.mode {
            ViewMode::Grid => self.columns as usize,
            ViewMode::List => 1,
        }
    }

    pub fn card_size(&self) -> (f32, f32) {
        match self.mode {
            ViewMode::Grid => {
                let columns = self.columns as f32;
                let gaps = GAP * (columns - 1.0);
                let width = ((self.viewport_width - PADDING - gaps) / columns).max(1.0);
                (width, width)
            }
            ViewMode::List => ((self.viewport_width - PADDING).max(1.0), LIST_CARD_HEIGHT),
        }
    }

    pub fn row_stride(&self) -> f32 {
        self.card_size().1 + ROW_MARGIN
    }

    pub fn row_count(&self, item_count: usize) -> usize {
        item_count.div_ceil(self.columns())
    }

    pub fn content_height(&self, item_count: usize) -> f32 {
        self.row_count(item_count) as f32 * self.row_stride()
    }

    /// Top-left corner of the card at `index`, relative to the content origin.
    pub fn item_origin(&self, index: usize) -> (f32, f32) {
        let columns = self.columns();
        let (width, _) = self.card_size();
        let row = index / columns;
        let column = index % columns;
        let x = PADDING / 2.0 + column as f32 * (width + GAP);
        (x, row as f32 * self.row_stride())
    }

    pub fn visible_range(&self, scroll_offset: f32, item_count: usize) -> VisibleRange {
        if item_count == 0 {
            return VisibleRange {
                visible: 0..0,
                rendered: 0..0,
            };
        }

        let stride = self.row_stride();
        let offset = scroll_offset.max(0.0);
        let rows = self.row_count(item_count);

        let to_items = |first_row: usize, last_row: usize| {
            let start = (first_row * self.columns()).min(item_count);
            let end = (last_row * self.columns()).min(item_count);
            start..end
        };

        let first = ((offset / stride).floor() as usize).min(rows);
        let last = (((offset + self.viewport_height) / stride).ceil() as usize).min(rows);

        let margin = self.overscan * self.viewport_height;
        let first_rendered = (((offset - margin).max(0.0) / stride).floor() as usize).min(rows);
        let last_rendered =
            (((offset + self.viewport_height + margin) / stride).ceil() as usize).min(rows);

        VisibleRange {
            visible: to_items(first, last),
            rendered: to_items(first_rendered, last_rendered),
        }
    }

    pub fn shows_scroll_to_top(&self, scroll_offset: f32) -> bool {
        scroll_offset > SCROLL_TOP_OFFSET
    }

    /// True once the unseen content below the viewport is shorter than half a
    /// viewport; the caller should then request the next page.
    pub fn end_reached(&self, scroll_offset: f32, item_count: usize) -> bool {
        let remaining = self.content_height(item_count) - (scroll_offset.max(0.0) + self.viewport_height);
        remaining < END_REACHED_THRESHOLD * self.viewport_height
    }
}
