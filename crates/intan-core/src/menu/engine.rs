//! Menu renderer and per-frame cursor dispatch.

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, StrokeAlignment, Triangle,
};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use embedded_hal::delay::DelayNs;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{Menu, MenuCursor};
use crate::clock::Clock;
use crate::ui::{
    DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX, LABEL_INSET_PX, MENU_FONT, MENU_FONT_HEIGHT_PX, Surface,
};

/// How long the start-up splash stays on screen.
const SPLASH_MS: u32 = 500;

/// Row geometry used when drawing menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayParams {
    /// Height of one menu row in pixels.
    pub row_height: u32,
    /// Y coordinate of the first row.
    pub top_margin: u32,
    /// Width reserved for a cursor glyph.
    pub cursor_width: u32,
    /// Rows visible at once.
    pub visible_rows: usize,
    pub width: u32,
    pub height: u32,
}

impl Default for DisplayParams {
    fn default() -> Self {
        Self {
            row_height: 12,
            top_margin: 14,
            cursor_width: 8,
            visible_rows: 3,
            width: DISPLAY_WIDTH_PX as u32,
            height: DISPLAY_HEIGHT_PX as u32,
        }
    }
}

impl DisplayParams {
    /// Layout used by the kiosk: four 16 px rows filling the panel.
    pub const fn kiosk() -> Self {
        Self {
            row_height: 16,
            top_margin: 0,
            cursor_width: 8,
            visible_rows: 4,
            width: DISPLAY_WIDTH_PX as u32,
            height: DISPLAY_HEIGHT_PX as u32,
        }
    }
}

/// What a call to [`MenuEngine::render`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOutcome<A> {
    /// A frame was drawn and presented.
    pub drawn: bool,
    /// Action bound to a row activated during this frame.
    pub activated: Option<A>,
}

impl<A> RenderOutcome<A> {
    const fn idle() -> Self {
        Self {
            drawn: false,
            activated: None,
        }
    }
}

/// Draws [`Menu`]s onto a [`Surface`] and applies cursor input to them.
///
/// The engine owns the display geometry and the redraw debounce timer; menus
/// and the cursor are borrowed per call so several menus can share one engine.
pub struct MenuEngine<C> {
    clock: C,
    params: DisplayParams,
    last_draw_ms: Option<u64>,
}

impl<C: Clock> MenuEngine<C> {
    pub fn new(clock: C, params: DisplayParams) -> Self {
        Self {
            clock,
            params,
            last_draw_ms: None,
        }
    }

    pub fn params(&self) -> &DisplayParams {
        &self.params
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Change the row layout. Panel width and height are kept.
    pub fn set_display_params(
        &mut self,
        row_height: u32,
        top_margin: u32,
        cursor_width: u32,
        visible_rows: usize,
    ) {
        self.params = DisplayParams {
            row_height,
            top_margin,
            cursor_width,
            visible_rows,
            ..self.params
        };
    }

    /// Show the start-up splash, hold it briefly, then blank the panel.
    pub fn initialize<S, D>(&mut self, surface: &mut S, delay: &mut D) -> Result<(), S::Error>
    where
        S: Surface,
        D: DelayNs,
    {
        surface.clear(BinaryColor::Off)?;
        Rectangle::new(Point::zero(), Size::new(self.params.width, self.params.height))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(surface)?;
        Text::with_baseline(
            "INTAN INIT",
            Point::new(5, 5),
            MonoTextStyle::new(MENU_FONT, BinaryColor::On),
            Baseline::Top,
        )
        .draw(surface)?;
        surface.present()?;

        delay.delay_ms(SPLASH_MS);

        surface.clear(BinaryColor::Off)?;
        surface.present()?;
        self.last_draw_ms = None;
        info!(
            "Menu engine ready: {}x{}, {} rows of {} px",
            self.params.width, self.params.height, self.params.visible_rows, self.params.row_height
        );
        Ok(())
    }

    /// Draw `menu` and apply this frame's cursor edges to it.
    ///
    /// - Does nothing while the menu has an active option, unless `force` is set.
    /// - Redraws when `force` is set or at least `min_interval_ms` passed since
    ///   the previous redraw.
    /// - Unforced calls apply the cursor exactly once, drawn or not, and report
    ///   the action of any row activated by a select edge.
    pub fn render<A, S>(
        &mut self,
        surface: &mut S,
        menu: &mut Menu<A>,
        cursor: &mut MenuCursor,
        force: bool,
        min_interval_ms: u64,
    ) -> Result<RenderOutcome<A>, S::Error>
    where
        A: Copy,
        S: Surface,
    {
        if menu.has_selection() && !force {
            return Ok(RenderOutcome::idle());
        }

        let now = self.clock.now_ms();
        let due = force
            || self
                .last_draw_ms
                .is_none_or(|last| now.saturating_sub(last) >= min_interval_ms);

        if due {
            self.draw_list(surface, menu, cursor.visible && !force)?;
            surface.present()?;
            self.last_draw_ms = Some(now);
        }

        if force {
            return Ok(RenderOutcome {
                drawn: due,
                activated: None,
            });
        }

        let activated = self.update_cursor(menu, cursor);
        Ok(RenderOutcome {
            drawn: due,
            activated,
        })
    }

    /// Apply one frame of cursor edges using the engine's row count.
    pub fn update_cursor<A: Copy>(&self, menu: &mut Menu<A>, cursor: &mut MenuCursor) -> Option<A> {
        let before = menu.viewport();
        let activated = menu.update_cursor(cursor, self.params.visible_rows);
        let after = menu.viewport();
        if before != after {
            debug!(
                "menu: cursor {} -> {}, window {} -> {}",
                before.cursor, after.cursor, before.offset, after.offset
            );
        }
        activated
    }

    fn draw_list<A, S>(&self, surface: &mut S, menu: &Menu<A>, arrows: bool) -> Result<(), S::Error>
    where
        A: Copy,
        S: Surface,
    {
        let params = &self.params;
        let viewport = menu.viewport();
        let rows = viewport.visible_count(menu.len(), params.visible_rows);

        surface.clear(BinaryColor::Off)?;

        let text_style = TextStyleBuilder::new()
            .alignment(Alignment::Left)
            .baseline(Baseline::Top)
            .build();
        let outline = PrimitiveStyleBuilder::new()
            .fill_color(BinaryColor::Off)
            .stroke_color(BinaryColor::On)
            .stroke_width(1)
            .stroke_alignment(StrokeAlignment::Inside)
            .build();
        let label_dy = (params.row_height.saturating_sub(MENU_FONT_HEIGHT_PX) / 2) as i32;

        let mut y = params.top_margin as i32;
        for (index, item) in menu
            .items()
            .iter()
            .enumerate()
            .skip(viewport.offset)
            .take(rows)
        {
            let row = Rectangle::new(Point::new(0, y), Size::new(params.width, params.row_height));
            let text_color = if index == viewport.cursor {
                row.into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
                    .draw(surface)?;
                BinaryColor::Off
            } else {
                row.into_styled(outline).draw(surface)?;
                BinaryColor::On
            };

            Text::with_text_style(
                item.label.as_str(),
                Point::new(LABEL_INSET_PX, y + label_dy),
                MonoTextStyle::new(MENU_FONT, text_color),
                text_style,
            )
            .draw(surface)?;

            y += params.row_height as i32;
        }

        if arrows {
            let w = params.width as i32;
            let h = params.height as i32;
            let fill = PrimitiveStyle::with_fill(BinaryColor::On);
            if viewport.has_more_above() {
                Triangle::new(
                    Point::new(w - 10, 5),
                    Point::new(w - 5, 5),
                    Point::new(w - 7, 2),
                )
                .into_styled(fill)
                .draw(surface)?;
            }
            if viewport.has_more_below(menu.len(), params.visible_rows) {
                Triangle::new(
                    Point::new(w - 10, h - 5),
                    Point::new(w - 5, h - 5),
                    Point::new(w - 7, h - 2),
                )
                .into_styled(fill)
                .draw(surface)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testing::ManualClock;
    use crate::menu::MenuBuilder;
    use crate::ui::surface::testing::RecordingSurface;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Act {
        Weigh,
    }

    fn five_items() -> Menu<Act> {
        MenuBuilder::new()
            .items([
                ("A", None),
                ("B", None),
                ("C", Some(Act::Weigh)),
                ("D", None),
                ("E", None),
            ])
            .build()
    }

    fn engine(clock: &ManualClock) -> MenuEngine<&ManualClock> {
        MenuEngine::new(clock, DisplayParams::default())
    }

    #[test]
    fn first_render_draws_and_presents() {
        let clock = ManualClock::at(0);
        let mut engine = engine(&clock);
        let mut surface = RecordingSurface::default();
        let mut menu = five_items();
        let mut cursor = MenuCursor::new();

        let outcome = engine
            .render(&mut surface, &mut menu, &mut cursor, false, 250)
            .unwrap();

        assert!(outcome.drawn);
        assert_eq!(surface.presents, 1);
        // highlighted first row spans y = 14..26
        assert!(surface.is_on(127, 15));
        // second row is an outline with a dark interior
        assert!(surface.is_on(0, 26));
        assert!(surface.is_on(127, 30));
        assert!(!surface.is_on(120, 30));
    }

    #[test]
    fn redraws_are_debounced() {
        let clock = ManualClock::at(1_000);
        let mut engine = engine(&clock);
        let mut surface = RecordingSurface::default();
        let mut menu = five_items();
        let mut cursor = MenuCursor::new();

        engine
            .render(&mut surface, &mut menu, &mut cursor, false, 250)
            .unwrap();
        clock.advance(100);
        let outcome = engine
            .render(&mut surface, &mut menu, &mut cursor, false, 250)
            .unwrap();
        assert!(!outcome.drawn);
        assert_eq!(surface.presents, 1);

        clock.advance(150);
        let outcome = engine
            .render(&mut surface, &mut menu, &mut cursor, false, 250)
            .unwrap();
        assert!(outcome.drawn);
        assert_eq!(surface.presents, 2);

        let outcome = engine
            .render(&mut surface, &mut menu, &mut cursor, true, 250)
            .unwrap();
        assert!(outcome.drawn, "forced renders skip the debounce");
    }

    #[test]
    fn cursor_moves_even_when_draw_is_debounced() {
        let clock = ManualClock::at(0);
        let mut engine = engine(&clock);
        let mut surface = RecordingSurface::default();
        let mut menu = five_items();
        let mut cursor = MenuCursor::new();

        engine
            .render(&mut surface, &mut menu, &mut cursor, false, 250)
            .unwrap();
        cursor.down = true;
        engine
            .render(&mut surface, &mut menu, &mut cursor, false, 250)
            .unwrap();
        assert_eq!(menu.cursor(), 1);
    }

    #[test]
    fn scenario_five_items_three_rows() {
        let clock = ManualClock::at(0);
        let mut engine = engine(&clock);
        let mut surface = RecordingSurface::default();
        let mut menu = five_items();
        let mut cursor = MenuCursor::new();
        cursor.down = true;

        let mut positions = Vec::new();
        for _ in 0..5 {
            engine
                .render(&mut surface, &mut menu, &mut cursor, false, 0)
                .unwrap();
            positions.push((menu.cursor(), menu.window_offset()));
        }
        assert_eq!(positions, [(1, 0), (2, 0), (3, 1), (4, 2), (0, 0)]);
    }

    #[test]
    fn activation_reports_action_once_and_suppresses_redraw() {
        let clock = ManualClock::at(0);
        let mut engine = engine(&clock);
        let mut surface = RecordingSurface::default();
        let mut menu = five_items();
        let mut cursor = MenuCursor::new();

        for _ in 0..2 {
            cursor.down = true;
            engine.update_cursor(&mut menu, &mut cursor);
        }
        cursor.down = false;
        cursor.select = true;

        let outcome = engine
            .render(&mut surface, &mut menu, &mut cursor, false, 0)
            .unwrap();
        assert_eq!(outcome.activated, Some(Act::Weigh));
        assert_eq!(menu.selected(), "C");
        assert!(!cursor.select);

        let presents = surface.presents;
        let clears = surface.clears;
        clock.advance(1_000);
        cursor.down = true;
        let outcome = engine
            .render(&mut surface, &mut menu, &mut cursor, false, 0)
            .unwrap();
        assert_eq!(outcome, RenderOutcome { drawn: false, activated: None });
        assert_eq!((surface.presents, surface.clears), (presents, clears));
        assert_eq!(menu.cursor(), 2, "input is not applied while an option is active");
    }

    #[test]
    fn forced_render_draws_over_active_option_without_input() {
        let clock = ManualClock::at(0);
        let mut engine = engine(&clock);
        let mut surface = RecordingSurface::default();
        let mut menu = five_items();
        let mut cursor = MenuCursor::new();
        menu.activate("C", engine.params().visible_rows);

        cursor.down = true;
        let outcome = engine
            .render(&mut surface, &mut menu, &mut cursor, true, 250)
            .unwrap();
        assert!(outcome.drawn);
        assert_eq!(menu.cursor(), 2);
        assert_eq!(menu.window_offset(), 0, "the active row is already on screen");
    }

    #[test]
    fn pagination_arrows_follow_window() {
        let clock = ManualClock::at(0);
        let mut engine = engine(&clock);
        let mut surface = RecordingSurface::default();
        let mut menu = five_items();
        let mut cursor = MenuCursor::new();

        engine
            .render(&mut surface, &mut menu, &mut cursor, false, 0)
            .unwrap();
        assert!(!surface.is_on(120, 4), "no up arrow on the first page");
        assert!(surface.is_on(120, 60), "down arrow while rows remain below");

        for _ in 0..4 {
            cursor.down = true;
            engine.update_cursor(&mut menu, &mut cursor);
        }
        cursor.down = false;
        engine
            .render(&mut surface, &mut menu, &mut cursor, false, 0)
            .unwrap();
        assert_eq!(menu.window_offset(), 2);
        assert!(surface.is_on(120, 4));
        assert!(!surface.is_on(120, 60));
    }

    #[test]
    fn hidden_cursor_draws_no_arrows() {
        let clock = ManualClock::at(0);
        let mut engine = engine(&clock);
        let mut surface = RecordingSurface::default();
        let mut menu = five_items();
        let mut cursor = MenuCursor::new();
        cursor.show(false);

        engine
            .render(&mut surface, &mut menu, &mut cursor, false, 0)
            .unwrap();
        assert!(!surface.is_on(120, 60));
    }

    #[test]
    fn short_list_draws_only_its_rows() {
        let clock = ManualClock::at(0);
        let mut engine = MenuEngine::new(&clock, DisplayParams::kiosk());
        let mut surface = RecordingSurface::default();
        let mut menu: Menu<Act> = Menu::with_labels(2, &["A", "B"]);
        let mut cursor = MenuCursor::new();

        engine
            .render(&mut surface, &mut menu, &mut cursor, false, 0)
            .unwrap();
        assert!(surface.is_on(127, 1));
        assert!(surface.is_on(0, 31));
        assert!(!surface.is_on(0, 40), "third row slot stays blank");
    }

    #[test]
    fn set_display_params_keeps_panel_size() {
        let clock = ManualClock::at(0);
        let mut engine = engine(&clock);
        engine.set_display_params(16, 0, 8, 4);
        assert_eq!(*engine.params(), DisplayParams::kiosk());
    }
}
