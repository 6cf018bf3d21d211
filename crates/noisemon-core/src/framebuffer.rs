//! RAM framebuffer for the 128x64 monochrome OLED with change detection.
//!
//! Pages draw into this buffer instead of the panel. Afterwards only the
//! rectangle containing changed pixels is pushed to the hardware, and hosts
//! without a panel can read the pixels back directly.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;

/// Panel width in pixels
pub const OLED_WIDTH_PX: usize = 128;

/// Panel height in pixels
pub const OLED_HEIGHT_PX: usize = 64;

/// Packed size, one bit per pixel (1 KiB)
const BUFFER_BYTES: usize = OLED_WIDTH_PX * OLED_HEIGHT_PX / 8;

/// Smallest rectangle covering every pixel touched since the last flush.
#[derive(Debug, Clone, Copy)]
struct DirtyRect {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
}

impl DirtyRect {
    /// Grow to cover `(x, y)`.
    fn expand(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Rectangle of one pixel.
    fn from_point(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }
}

/// 1-bit framebuffer implementing `DrawTarget<Color = BinaryColor>`.
///
/// Pixels are packed row-major, 8 per byte, MSB first.
pub struct MonoFrameBuffer {
    bits: [u8; BUFFER_BYTES],
    dirty: Option<DirtyRect>,
}

impl Default for MonoFrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl MonoFrameBuffer {
    /// Create a blank (all off) framebuffer.
    pub const fn new() -> Self {
        Self {
            bits: [0; BUFFER_BYTES],
            dirty: None,
        }
    }

    /// Colour of one pixel. Out-of-range coordinates read as off.
    pub fn pixel(&self, x: usize, y: usize) -> BinaryColor {
        if x >= OLED_WIDTH_PX || y >= OLED_HEIGHT_PX {
            return BinaryColor::Off;
        }
        let (byte, mask) = Self::locate(x, y);
        BinaryColor::from(self.bits[byte] & mask != 0)
    }

    /// Whether any pixel changed since the last flush or [`Self::mark_clean`].
    pub fn is_dirty(&self) -> bool {
        self.dirty.is_some()
    }

    /// Forget pending changes without pushing them anywhere.
    pub fn mark_clean(&mut self) {
        self.dirty = None;
    }

    #[inline]
    fn locate(x: usize, y: usize) -> (usize, u8) {
        let index = y * OLED_WIDTH_PX + x;
        (index / 8, 0x80 >> (index % 8))
    }

    // Unchanged pixels leave the dirty rect alone.
    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: BinaryColor) {
        let (byte, mask) = Self::locate(x, y);
        let was_on = self.bits[byte] & mask != 0;
        if was_on == color.is_on() {
            return;
        }

        self.bits[byte] ^= mask;
        match &mut self.dirty {
            Some(rect) => rect.expand(x, y),
            None => self.dirty = Some(DirtyRect::from_point(x, y)),
        }
    }

    /// Push the changed region to a panel and reset the dirty state.
    ///
    /// If nothing changed, this is a no-op.
    pub fn flush<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let Some(rect) = self.dirty.take() else {
            return Ok(());
        };

        let width = rect.max_x - rect.min_x + 1;
        let height = rect.max_y - rect.min_y + 1;

        debug!(
            "Flushing {}x{} dirty region at ({}, {})",
            width, height, rect.min_x, rect.min_y
        );

        let area = Rectangle::new(
            Point::new(rect.min_x as i32, rect.min_y as i32),
            Size::new(width as u32, height as u32),
        );

        let this = &*self;
        let pixel_iter = (rect.min_y..=rect.max_y)
            .flat_map(move |y| (rect.min_x..=rect.max_x).map(move |x| this.pixel(x, y)));

        display.fill_contiguous(&area, pixel_iter)
    }
}

impl OriginDimensions for MonoFrameBuffer {
    fn size(&self) -> Size {
        Size::new(OLED_WIDTH_PX as u32, OLED_HEIGHT_PX as u32)
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
            let x = coord.x;
            let y = coord.y;
            if x >= 0 && y >= 0 && (x as usize) < OLED_WIDTH_PX && (y as usize) < OLED_HEIGHT_PX {
                self.set_pixel(x as usize, y as usize, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        for y in 0..OLED_HEIGHT_PX {
            for x in 0..OLED_WIDTH_PX {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }
}
