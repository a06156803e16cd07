//! Full-screen status views drawn outside of menus.
//!
//! These are used for option bodies (measurement read-outs, device info) and
//! for blocking progress feedback while the firmware waits on the network.

use core::fmt::Write;

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, PrimitiveStyle, Rectangle, Triangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

use super::{LABEL_INSET_PX, MENU_FONT, Surface};

/// Height of the inverted title bar on info screens.
const TITLE_BAR_HEIGHT_PX: u32 = 15;

/// Progress bar geometry: 1 px of fill per percent.
const PROGRESS_ORIGIN: Point = Point::new(14, 30);
const PROGRESS_SIZE: Size = Size::new(100, 15);

/// Spinner geometry.
const SPINNER_CENTER: Point = Point::new(64, 42);
const SPINNER_DOT_DIAMETER: u32 = 5;
/// Dot positions around a 12 px radius circle, starting at 3 o'clock and
/// running clockwise in screen coordinates.
const SPINNER_OFFSETS: [(i32, i32); 8] = [
    (12, 0),
    (8, 8),
    (0, 12),
    (-8, 8),
    (-12, 0),
    (-8, -8),
    (0, -12),
    (8, -8),
];

/// Direction of a navigation hint arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowDirection {
    Up,
    Down,
}

fn text_style(alignment: Alignment) -> embedded_graphics::text::TextStyle {
    TextStyleBuilder::new()
        .alignment(alignment)
        .baseline(Baseline::Top)
        .build()
}

/// Draw `text` with its top edge at `y`, centred horizontally on the panel.
fn centered<S: Surface>(surface: &mut S, text: &str, y: i32, color: BinaryColor) -> Result<(), S::Error> {
    let x = surface.size().width as i32 / 2;
    Text::with_text_style(
        text,
        Point::new(x, y),
        MonoTextStyle::new(MENU_FONT, color),
        text_style(Alignment::Center),
    )
    .draw(surface)?;
    Ok(())
}

/// Title bar plus a boxed body holding three left-aligned lines.
pub fn render_info_screen<S: Surface>(
    surface: &mut S,
    title: &str,
    line1: &str,
    line2: &str,
    line3: &str,
) -> Result<(), S::Error> {
    let size = surface.size();
    surface.clear(BinaryColor::Off)?;

    Rectangle::new(Point::zero(), Size::new(size.width, TITLE_BAR_HEIGHT_PX))
        .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
        .draw(surface)?;
    centered(surface, title, 3, BinaryColor::Off)?;

    Rectangle::new(
        Point::new(0, TITLE_BAR_HEIGHT_PX as i32),
        Size::new(size.width, size.height - TITLE_BAR_HEIGHT_PX),
    )
    .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
    .draw(surface)?;

    let style = MonoTextStyle::new(MENU_FONT, BinaryColor::On);
    for (line, y) in [(line1, 20), (line2, 32), (line3, 44)] {
        Text::with_text_style(
            line,
            Point::new(LABEL_INSET_PX, y),
            style,
            text_style(Alignment::Left),
        )
        .draw(surface)?;
    }

    surface.present()
}

/// Titled progress bar with a percentage caption. `percent` is clamped to 0..=100.
pub fn render_progress<S: Surface>(surface: &mut S, title: &str, percent: i32) -> Result<(), S::Error> {
    let percent = percent.clamp(0, 100);
    surface.clear(BinaryColor::Off)?;

    centered(surface, title, 10, BinaryColor::On)?;

    Rectangle::new(PROGRESS_ORIGIN, PROGRESS_SIZE)
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(surface)?;
    if percent > 0 {
        Rectangle::new(
            PROGRESS_ORIGIN,
            Size::new(percent as u32, PROGRESS_SIZE.height),
        )
        .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
        .draw(surface)?;
    }

    let mut caption: heapless::String<8> = heapless::String::new();
    let _ = write!(caption, "{}%", percent);
    centered(surface, &caption, 50, BinaryColor::On)?;

    surface.present()
}

/// Eight-dot busy indicator under a title; `frame` selects the filled dot.
pub fn render_spinner<S: Surface>(surface: &mut S, title: &str, frame: usize) -> Result<(), S::Error> {
    let dots = SPINNER_OFFSETS.len();
    let active = frame % dots;

    surface.clear(BinaryColor::Off)?;
    centered(surface, title, 5, BinaryColor::On)?;

    for (i, (dx, dy)) in SPINNER_OFFSETS.iter().enumerate() {
        let center = SPINNER_CENTER + Point::new(*dx, *dy);
        if i == active {
            Circle::with_center(center, SPINNER_DOT_DIAMETER)
                .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
                .draw(surface)?;
            continue;
        }

        Circle::with_center(center, SPINNER_DOT_DIAMETER)
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(surface)?;

        // dots just behind the active one get a heavier ring
        let trailing = (i + dots - active) % dots;
        if trailing < dots / 2 {
            Circle::with_center(center, SPINNER_DOT_DIAMETER - 2)
                .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
                .draw(surface)?;
        }
    }

    surface.present()
}

/// Small centred arrow hinting that more content lies above or below.
///
/// Only draws; the caller presents the frame.
pub fn draw_cursor_arrow<S: Surface>(surface: &mut S, y: i32, direction: ArrowDirection) -> Result<(), S::Error> {
    let mid = surface.size().width as i32 / 2;
    let tip = match direction {
        ArrowDirection::Up => y - 5,
        ArrowDirection::Down => y + 5,
    };
    Triangle::new(Point::new(mid - 5, y), Point::new(mid + 5, y), Point::new(mid, tip))
        .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
        .draw(surface)?;
    Ok(())
}
