//! Drawing surface consumed by the menu engine and status screens.

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::framebuffer::MonoFrameBuffer;

/// A monochrome draw target that can push a finished frame to the panel.
///
/// Drawing primitives (clear, filled/outlined rectangles, triangles, text)
/// come from `embedded-graphics`; `present` makes the frame visible.
pub trait Surface: DrawTarget<Color = BinaryColor> + OriginDimensions {
    /// Make everything drawn since the previous call visible.
    fn present(&mut self) -> Result<(), Self::Error>;
}

/// A [`MonoFrameBuffer`] in front of a hardware (or simulated) panel.
///
/// Drawing lands in RAM; [`present`](Surface::present) flushes the changed
/// region to the panel.
pub struct BufferedSurface<D> {
    buffer: MonoFrameBuffer,
    panel: D,
}

impl<D> BufferedSurface<D>
where
    D: DrawTarget<Color = BinaryColor>,
{
    pub fn new(panel: D) -> Self {
        Self {
            buffer: MonoFrameBuffer::new(),
            panel,
        }
    }

    /// The panel frames are presented to.
    pub fn panel(&self) -> &D {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut D {
        &mut self.panel
    }

    pub fn buffer(&self) -> &MonoFrameBuffer {
        &self.buffer
    }
}

impl<D> OriginDimensions for BufferedSurface<D> {
    fn size(&self) -> Size {
        self.buffer.size()
    }
}

impl<D> DrawTarget for BufferedSurface<D>
where
    D: DrawTarget<Color = BinaryColor>,
{
    type Color = BinaryColor;
    type Error = D::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let Ok(()) = self.buffer.draw_iter(pixels);
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let Ok(()) = self.buffer.fill_solid(area, color);
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let Ok(()) = self.buffer.clear(color);
        Ok(())
    }
}

impl<D> Surface for BufferedSurface<D>
where
    D: DrawTarget<Color = BinaryColor>,
{
    fn present(&mut self) -> Result<(), Self::Error> {
        self.buffer.flush(&mut self.panel)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use core::convert::Infallible;

    /// Surface that keeps a framebuffer and counts what happens to it.
    #[derive(Default)]
    pub struct RecordingSurface {
        pub frame: MonoFrameBuffer,
        pub clears: usize,
        pub presents: usize,
    }

    impl RecordingSurface {
        pub fn is_on(&self, x: i32, y: i32) -> bool {
            self.frame.pixel(Point::new(x, y)) == Some(BinaryColor::On)
        }
    }

    impl OriginDimensions for RecordingSurface {
        fn size(&self) -> Size {
            self.frame.size()
        }
    }

    impl DrawTarget for RecordingSurface {
        type Color = BinaryColor;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            self.frame.draw_iter(pixels)
        }

        fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
            self.frame.fill_solid(area, color)
        }

        fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
            self.clears += 1;
            self.frame.clear(color)
        }
    }

    impl Surface for RecordingSurface {
        fn present(&mut self) -> Result<(), Self::Error> {
            self.presents += 1;
            Ok(())
        }
    }
}
