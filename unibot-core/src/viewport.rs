use std::ops::Range;

/// Distance from the bottom, in display units, under which the viewport
/// keeps following new log lines.
pub const DEFAULT_FOLLOW_THRESHOLD: usize = 24;

/// Scroll state of the log view.
///
/// Geometry is in whatever display unit the front end uses (rows for the
/// terminal UI). The only decision made here is whether a buffer
/// replacement should pin the view to the bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogViewport {
    auto_follow: bool,
    scroll_top: usize,
    content_height: usize,
    viewport_height: usize,
    threshold: usize,
}

impl Default for LogViewport {
    fn default() -> Self {
        Self::new(DEFAULT_FOLLOW_THRESHOLD)
    }
}

impl LogViewport {
    pub fn new(threshold: usize) -> Self {
        Self {
            auto_follow: true,
            scroll_top: 0,
            content_height: 0,
            viewport_height: 0,
            threshold,
        }
    }

    pub fn auto_follow(&self) -> bool {
        self.auto_follow
    }

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub fn content_height(&self) -> usize {
        self.content_height
    }

    pub fn viewport_height(&self) -> usize {
        self.viewport_height
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    fn max_scroll(&self) -> usize {
        self.content_height.saturating_sub(self.viewport_height)
    }

    pub fn distance_to_bottom(&self) -> usize {
        self.content_height
            .saturating_sub(self.scroll_top)
            .saturating_sub(self.viewport_height)
    }

    /// The view was resized. Keeps the bottom pinned while following.
    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height;
        if self.auto_follow {
            self.scroll_top = self.max_scroll();
        } else {
            self.scroll_top = self.scroll_top.min(self.max_scroll());
        }
    }

    /// The log buffer was replaced and now occupies `height` units.
    pub fn content_replaced(&mut self, height: usize) {
        self.content_height = height;
        if self.auto_follow {
            self.scroll_top = self.max_scroll();
        } else {
            self.scroll_top = self.scroll_top.min(self.max_scroll());
        }
    }

    /// The user scrolled to `scroll_top`. Re-evaluates auto-follow.
    pub fn user_scrolled(&mut self, scroll_top: usize) {
        self.scroll_top = scroll_top.min(self.max_scroll());
        self.auto_follow = self.distance_to_bottom() < self.threshold;
    }

    pub fn scroll_by(&mut self, delta: isize) {
        let target = if delta.is_negative() {
            self.scroll_top.saturating_sub(delta.unsigned_abs())
        } else {
            self.scroll_top.saturating_add(delta as usize)
        };
        self.user_scrolled(target);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.user_scrolled(self.max_scroll());
    }

    /// Turn following back on, e.g. when a new job starts.
    pub fn follow(&mut self) {
        self.auto_follow = true;
        self.scroll_top = self.max_scroll();
    }

    /// The buffer was cleared locally.
    pub fn clear(&mut self) {
        self.content_height = 0;
        self.scroll_top = 0;
        self.auto_follow = true;
    }

    /// Indices of the lines currently on screen.
    pub fn visible_range(&self) -> Range<usize> {
        let start = self.scroll_top.min(self.content_height);
        let end = (start + self.viewport_height).min(self.content_height);
        start..end
    }
}
