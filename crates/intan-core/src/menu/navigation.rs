//! Cursor and scroll-window arithmetic for paginated lists.
//!
//! Kept free of drawing and input so the wrap-around rules can be checked in
//! isolation. After every step the window invariant
//! `offset <= cursor < offset + visible_rows` holds for any non-empty list
//! with `visible_rows >= 1`.

/// Highlighted row plus the first visible row of a list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    /// Index of the highlighted item.
    pub cursor: usize,
    /// Index of the first visible item.
    pub offset: usize,
}

impl Viewport {
    pub const fn new() -> Self {
        Self {
            cursor: 0,
            offset: 0,
        }
    }

    /// Back to the first item.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Move one row down, wrapping from the last item to the first.
    pub fn step_down(&mut self, len: usize, visible_rows: usize) {
        if len == 0 {
            return;
        }
        if self.cursor < len - 1 {
            self.cursor += 1;
            if self.cursor >= self.offset + visible_rows {
                self.offset += 1;
            }
        } else {
            self.reset();
        }
    }

    /// Move one row up, wrapping from the first item to the last.
    pub fn step_up(&mut self, len: usize, visible_rows: usize) {
        if len == 0 {
            return;
        }
        if self.cursor > 0 {
            self.cursor -= 1;
            if self.cursor < self.offset {
                self.offset -= 1;
            }
        } else {
            self.cursor = len - 1;
            self.offset = len - visible_rows.min(len);
        }
    }

    /// Highlight `index`, scrolling the window only as far as needed to show it.
    pub fn reveal(&mut self, index: usize, visible_rows: usize) {
        self.cursor = index;
        if index < self.offset {
            self.offset = index;
        } else if index >= self.offset + visible_rows {
            self.offset = index + 1 - visible_rows.max(1);
        }
    }

    /// Number of rows drawn for a list of `len` items.
    pub fn visible_count(&self, len: usize, visible_rows: usize) -> usize {
        visible_rows.min(len.saturating_sub(self.offset))
    }

    /// Whether items are hidden above the window.
    pub fn has_more_above(&self) -> bool {
        self.offset > 0
    }

    /// Whether items are hidden below the window.
    pub fn has_more_below(&self, len: usize, visible_rows: usize) -> bool {
        self.offset + visible_rows < len
    }

    /// Whether the window invariant holds for the given list geometry.
    pub fn is_consistent(&self, len: usize, visible_rows: usize) -> bool {
        len == 0
            || (self.offset <= self.cursor
                && self.cursor < self.offset + visible_rows
                && self.cursor < len)
    }
}
