//! Edge-triggered navigation input shared between the button poller and menus.

/// One poll cycle's worth of navigation edges.
///
/// The input poller raises `up`/`down` for exactly one cycle per press and
/// latches `select`/`back` until a menu consumes them with
/// [`take_select`](Self::take_select) / [`take_back`](Self::take_back).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuCursor {
    pub up: bool,
    pub down: bool,
    pub select: bool,
    pub back: bool,
    /// Whether pagination arrows are drawn next to the list.
    pub visible: bool,
}

impl Default for MenuCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl MenuCursor {
    /// A cursor with no pending edges and pagination arrows shown.
    pub const fn new() -> Self {
        Self {
            up: false,
            down: false,
            select: false,
            back: false,
            visible: true,
        }
    }

    /// Consume a pending select edge.
    pub fn take_select(&mut self) -> bool {
        core::mem::take(&mut self.select)
    }

    /// Consume a pending back edge.
    pub fn take_back(&mut self) -> bool {
        core::mem::take(&mut self.back)
    }

    /// Drop every pending edge. Arrow visibility is left alone.
    pub fn clear_edges(&mut self) {
        self.up = false;
        self.down = false;
        self.select = false;
        self.back = false;
    }

    /// Show or hide the pagination arrows.
    pub fn show(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn any_edge(&self) -> bool {
        self.up || self.down || self.select || self.back
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_new() {
        assert_eq!(MenuCursor::default(), MenuCursor::new());
        assert!(MenuCursor::default().visible);
        assert!(!MenuCursor::default().any_edge());
    }
}
