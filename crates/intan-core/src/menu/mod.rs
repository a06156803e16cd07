//! Paginated selection menus for the OLED.
//!
//! A [`Menu`] is an ordered list of [`Label`]s with a highlighted row, a scroll
//! window and an optional action bound to each row. The [`MenuEngine`] draws it
//! and feeds it [`MenuCursor`] edges once per loop tick.
//!
//! # Activation
//!
//! Selecting a row that is marked as activatable stores its label as the
//! menu's *selected option*. While an option is selected the list is not drawn;
//! the owner renders that option's screen body through [`Menu::on_select`]
//! until the user presses back.
//!
//! ```ignore
//! let mut root = MenuBuilder::new()
//!     .item("Timbang", Some(RootAction::StartWeighing))
//!     .item("Admin", Some(RootAction::OpenAdmin))
//!     .build();
//!
//! loop {
//!     let outcome = engine.render(&mut surface, &mut root, &mut cursor, false, 250)?;
//!     if let Some(action) = outcome.activated {
//!         handle(action);
//!     }
//!     root.on_select(&mut cursor, "Timbang", None, |cursor| draw_weighing(cursor));
//! }
//! ```

pub mod cursor;
pub mod engine;
pub mod navigation;

pub use cursor::MenuCursor;
pub use engine::{DisplayParams, MenuEngine, RenderOutcome};
pub use navigation::Viewport;

use alloc::vec::Vec;
use core::fmt;

use log::debug;

use crate::ui::Label;

/// Text given to rows created without an explicit label.
pub const DEFAULT_LABEL: &str = "default";

/// One row of a [`Menu`].
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem<A> {
    pub label: Label,
    /// Selecting this row activates it.
    pub activatable: bool,
    /// Action reported when the row is activated.
    pub action: Option<A>,
}

impl<A> MenuItem<A> {
    pub fn new(label: &str) -> Self {
        Self {
            label: Label::truncated(label),
            activatable: false,
            action: None,
        }
    }
}

/// Ordered list of selectable rows plus navigation state.
///
/// `A` is the action type rows report when activated; it is usually a small
/// `Copy` enum owned by the screen that builds the menu.
#[derive(Debug, Clone)]
pub struct Menu<A> {
    items: Vec<MenuItem<A>>,
    viewport: Viewport,
    selected: Label,
}

impl<A: Copy> Menu<A> {
    /// Create `count` rows, taking labels from `labels` in order.
    ///
    /// Rows without a corresponding label read `"default"`.
    pub fn with_labels(count: usize, labels: &[&str]) -> Self {
        let items = (0..count)
            .map(|i| MenuItem::new(labels.get(i).copied().unwrap_or(DEFAULT_LABEL)))
            .collect();
        Self::from_items(items)
    }

    /// Create `count` rows that all read `label`.
    ///
    /// Used for lists whose text is formatted in place later, such as a
    /// roster fetched from the cloud.
    pub fn filled(count: usize, label: &str) -> Self {
        Self::from_items((0..count).map(|_| MenuItem::new(label)).collect())
    }

    fn from_items(items: Vec<MenuItem<A>>) -> Self {
        Self {
            items,
            viewport: Viewport::new(),
            selected: Label::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[MenuItem<A>] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&MenuItem<A>> {
        self.items.get(index)
    }

    /// Highlighted row index.
    pub fn cursor(&self) -> usize {
        self.viewport.cursor
    }

    /// First visible row index.
    pub fn window_offset(&self) -> usize {
        self.viewport.offset
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Label of the active option, empty when the list is showing.
    pub fn selected(&self) -> &str {
        self.selected.as_str()
    }

    /// Whether an option is active and the list is hidden.
    pub fn has_selection(&self) -> bool {
        !self.selected.is_empty()
    }

    /// Text of the highlighted row.
    pub fn highlighted(&self) -> Option<&Label> {
        self.items.get(self.viewport.cursor).map(|item| &item.label)
    }

    /// Overwrite the label at `index`, truncating to capacity.
    ///
    /// Out-of-range indices are ignored.
    pub fn set_label(&mut self, index: usize, text: &str) {
        if let Some(item) = self.items.get_mut(index) {
            item.label.set(text);
        }
    }

    /// Format into the label at `index`, truncating to capacity.
    ///
    /// ```ignore
    /// roster.format_label(2, format_args!("{}. {}", 3, name));
    /// ```
    pub fn format_label(&mut self, index: usize, args: fmt::Arguments<'_>) {
        if let Some(item) = self.items.get_mut(index) {
            item.label = Label::format(args);
        }
    }

    /// Mark every row reading `label` as activatable, binding `action` if given.
    ///
    /// Returns the number of rows that matched.
    pub fn bind(&mut self, label: &str, action: Option<A>) -> usize {
        let mut matched = 0;
        for item in self.items.iter_mut().filter(|item| item.label == label) {
            item.activatable = true;
            if let Some(action) = action {
                item.action = Some(action);
            }
            matched += 1;
        }
        matched
    }

    /// Apply one cycle of cursor edges.
    ///
    /// Moves the highlight for `down`/`up`, then consumes `select`: if the
    /// highlighted row is activatable its label becomes the selected option
    /// and its bound action (if any) is returned. `back` is left for
    /// [`on_select`](Self::on_select).
    pub fn update_cursor(&mut self, cursor: &mut MenuCursor, visible_rows: usize) -> Option<A> {
        let len = self.items.len();
        if cursor.down {
            self.viewport.step_down(len, visible_rows);
        }
        if cursor.up {
            self.viewport.step_up(len, visible_rows);
        }

        if !cursor.take_select() {
            return None;
        }
        let item = self.items.get(self.viewport.cursor)?;
        if !item.activatable {
            return None;
        }
        debug!("menu: activated '{}'", item.label);
        self.selected = item.label.clone();
        item.action
    }

    /// Register and run the option reading `label`.
    ///
    /// Must be called every frame for every option the screen offers: it is
    /// what marks the row activatable (and binds `on_open`). When `label` is
    /// the active option, `body` runs with the cursor so it can draw the
    /// option's screen and read raw edges for its own navigation. A pending
    /// back edge then closes the option and returns the list to its first row.
    ///
    /// Returns what `body` returned, or `None` if the option is not active.
    pub fn on_select<R>(
        &mut self,
        cursor: &mut MenuCursor,
        label: &str,
        on_open: Option<A>,
        body: impl FnOnce(&mut MenuCursor) -> R,
    ) -> Option<R> {
        self.bind(label, on_open);

        if self.selected != label {
            return None;
        }
        let result = body(cursor);
        if cursor.take_back() {
            debug!("menu: closed '{}'", label);
            self.reset();
        }
        Some(result)
    }

    /// Make `label` the active option without going through the cursor.
    ///
    /// The window keeps its position unless the row lies outside it. Returns
    /// `false` if no row reads `label`.
    pub fn activate(&mut self, label: &str, visible_rows: usize) -> bool {
        match self.items.iter().position(|item| item.label == label) {
            Some(index) => {
                self.viewport.reveal(index, visible_rows);
                self.selected.set(label);
                true
            }
            None => false,
        }
    }

    /// Drop the active option and return to the first row.
    pub fn reset(&mut self) {
        self.selected.clear();
        self.viewport.reset();
    }
}

/// Builder taking rows as `(label, optional action)` pairs.
///
/// Rows with an action are activatable from the start; rows without one can
/// be made activatable later with [`Menu::bind`] or [`Menu::on_select`].
pub struct MenuBuilder<A> {
    items: Vec<MenuItem<A>>,
}

impl<A: Copy> Default for MenuBuilder<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Copy> MenuBuilder<A> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append a row.
    pub fn item(mut self, label: &str, action: Option<A>) -> Self {
        let mut item = MenuItem::new(label);
        item.activatable = action.is_some();
        item.action = action;
        self.items.push(item);
        self
    }

    /// Append one row per `(label, action)` pair.
    pub fn items<'l>(mut self, rows: impl IntoIterator<Item = (&'l str, Option<A>)>) -> Self {
        for (label, action) in rows {
            self = self.item(label, action);
        }
        self
    }

    pub fn build(self) -> Menu<A> {
        Menu::from_items(self.items)
    }
}

/// Navigation state that can be dropped when switching top-level screens.
pub trait MenuReset {
    fn reset(&mut self);
}

impl<A: Copy> MenuReset for Menu<A> {
    fn reset(&mut self) {
        Menu::reset(self);
    }
}

/// Clear every pending edge and reset each listed menu to its first row with
/// no active option.
///
/// Used when moving between top-level screens so that no stale activation
/// carries over.
pub fn reset_all(cursor: &mut MenuCursor, menus: &mut [&mut dyn MenuReset]) {
    cursor.clear_edges();
    for menu in menus.iter_mut() {
        menu.reset();
    }
}
