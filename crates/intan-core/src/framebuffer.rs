//! RAM framebuffer for the SH1106 with per-pixel change detection.
//!
//! All menu and screen drawing targets this buffer instead of the I2C panel.
//! When a frame is presented, only the rectangular region containing changed
//! pixels is pushed to the hardware display, which keeps the shared I2C bus
//! free for the sensors between redraws.

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;
use core::convert::Infallible;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;

use crate::ui::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};

/// Total number of pixels in the framebuffer (128 x 64 = 8,192).
const PIXEL_COUNT: usize = DISPLAY_WIDTH_PX as usize * DISPLAY_HEIGHT_PX as usize;

/// Bounding box of pixels that have changed since the last flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DirtyRect {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
}

impl DirtyRect {
    fn expand(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    fn from_point(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn to_rectangle(self) -> Rectangle {
        Rectangle::new(
            Point::new(self.min_x as i32, self.min_y as i32),
            Size::new(
                (self.max_x - self.min_x + 1) as u32,
                (self.max_y - self.min_y + 1) as u32,
            ),
        )
    }
}

/// Monochrome framebuffer implementing `DrawTarget<Color = BinaryColor>`.
///
/// Tracks a dirty bounding box so that only changed pixels are flushed to the
/// panel. Drawing outside the panel is silently clipped.
pub struct MonoFrameBuffer {
    pixels: Vec<BinaryColor>,
    dirty: Option<DirtyRect>,
}

impl Default for MonoFrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl MonoFrameBuffer {
    /// Allocate a new framebuffer with every pixel off.
    pub fn new() -> Self {
        Self {
            pixels: vec![BinaryColor::Off; PIXEL_COUNT],
            dirty: None,
        }
    }

    /// Colour of the pixel at `point`, or `None` outside the panel.
    pub fn pixel(&self, point: Point) -> Option<BinaryColor> {
        let (x, y) = Self::index_of(point)?;
        Some(self.pixels[y * DISPLAY_WIDTH_PX as usize + x])
    }

    /// Region that would be sent by the next [`flush`](Self::flush).
    pub fn dirty_area(&self) -> Option<Rectangle> {
        self.dirty.map(DirtyRect::to_rectangle)
    }

    fn index_of(point: Point) -> Option<(usize, usize)> {
        let w = DISPLAY_WIDTH_PX as i32;
        let h = DISPLAY_HEIGHT_PX as i32;
        if point.x >= 0 && point.y >= 0 && point.x < w && point.y < h {
            Some((point.x as usize, point.y as usize))
        } else {
            None
        }
    }

    /// Write a single pixel, expanding the dirty rect only if the colour changed.
    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: BinaryColor) {
        let idx = y * DISPLAY_WIDTH_PX as usize + x;
        if self.pixels[idx] != color {
            self.pixels[idx] = color;
            match &mut self.dirty {
                Some(rect) => rect.expand(x, y),
                None => self.dirty = Some(DirtyRect::from_point(x, y)),
            }
        }
    }

    /// Flush the dirty region to the panel, then reset the dirty state.
    ///
    /// If nothing changed since the last flush this is a no-op and the panel
    /// is not touched at all.
    pub fn flush<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let Some(rect) = self.dirty.take() else {
            return Ok(());
        };

        let area = rect.to_rectangle();
        debug!(
            "Flushing {}x{} dirty region at ({}, {})",
            area.size.width, area.size.height, rect.min_x, rect.min_y
        );

        let pixels = &self.pixels;
        let stride = DISPLAY_WIDTH_PX as usize;
        let width = area.size.width as usize;
        let pixel_iter = (rect.min_y..=rect.max_y).flat_map(move |y| {
            let row_start = y * stride + rect.min_x;
            pixels[row_start..row_start + width].iter().copied()
        });

        display.fill_contiguous(&area, pixel_iter)
    }
}

impl OriginDimensions for MonoFrameBuffer {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH_PX as u32, DISPLAY_HEIGHT_PX as u32)
    }
}

impl DrawTarget for MonoFrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            if let Some((x, y)) = Self::index_of(coord) {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let w = DISPLAY_WIDTH_PX as i32;
        let h = DISPLAY_HEIGHT_PX as i32;

        let x_start = area.top_left.x.clamp(0, w);
        let y_start = area.top_left.y.clamp(0, h);
        let x_end = area
            .top_left
            .x
            .saturating_add(area.size.width as i32)
            .clamp(0, w);
        let y_end = area
            .top_left
            .y
            .saturating_add(area.size.height as i32)
            .clamp(0, h);

        for y in y_start..y_end {
            for x in x_start..x_end {
                self.set_pixel(x as usize, y as usize, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        for y in 0..DISPLAY_HEIGHT_PX as usize {
            for x in 0..DISPLAY_WIDTH_PX as usize {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::PrimitiveStyle;

    /// Panel stand-in that records the areas it was asked to fill.
    #[derive(Default)]
    struct RecordingPanel {
        fills: Vec<Rectangle>,
        lit: usize,
    }

    impl OriginDimensions for RecordingPanel {
        fn size(&self) -> Size {
            Size::new(DISPLAY_WIDTH_PX as u32, DISPLAY_HEIGHT_PX as u32)
        }
    }

    impl DrawTarget for RecordingPanel {
        type Color = BinaryColor;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            self.lit += pixels
                .into_iter()
                .filter(|Pixel(_, c)| c.is_on())
                .count();
            Ok(())
        }

        fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Self::Color>,
        {
            self.fills.push(*area);
            self.lit += colors.into_iter().filter(|c| c.is_on()).count();
            Ok(())
        }
    }

    #[test]
    fn flush_sends_only_changed_region() {
        let mut fb = MonoFrameBuffer::new();
        let mut panel = RecordingPanel::default();

        Rectangle::new(Point::new(10, 5), Size::new(4, 3))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut fb)
            .unwrap();

        assert_eq!(
            fb.dirty_area(),
            Some(Rectangle::new(Point::new(10, 5), Size::new(4, 3)))
        );
        fb.flush(&mut panel).unwrap();

        assert_eq!(panel.fills.len(), 1);
        assert_eq!(panel.lit, 12);
        assert_eq!(fb.dirty_area(), None);
    }

    #[test]
    fn redrawing_identical_content_flushes_nothing() {
        let mut fb = MonoFrameBuffer::new();
        let mut panel = RecordingPanel::default();
        let rect = Rectangle::new(Point::new(0, 0), Size::new(8, 8))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On));

        rect.draw(&mut fb).unwrap();
        fb.flush(&mut panel).unwrap();
        rect.draw(&mut fb).unwrap();
        fb.flush(&mut panel).unwrap();

        assert_eq!(panel.fills.len(), 1);
    }

    #[test]
    fn drawing_off_panel_is_clipped() {
        let mut fb = MonoFrameBuffer::new();
        Rectangle::new(Point::new(120, 60), Size::new(20, 20))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut fb)
            .unwrap();

        assert_eq!(fb.pixel(Point::new(127, 63)), Some(BinaryColor::On));
        assert_eq!(fb.pixel(Point::new(128, 63)), None);
        assert_eq!(
            fb.dirty_area(),
            Some(Rectangle::new(Point::new(120, 60), Size::new(8, 4)))
        );
    }
}
