use embedded_graphics::{
    Pixel,
    pixelcolor::Rgb565,
    prelude::{DrawTarget, OriginDimensions, Size},
};

use crate::palette::raw;
use crate::panel::Panel;

/// A panel kept entirely in RAM, row major rgb565. Used by the simulator
/// and the tests.
pub struct FrameBuffer<'a> {
    data: &'a mut [u16],
    width: usize,
    height: usize,
    background: u16,
}

impl<'a> FrameBuffer<'a> {
    /// Height is whatever fits in `data`.
    pub fn new(data: &'a mut [u16], width: usize) -> Self {
        let height = if width == 0 { 0 } else { data.len() / width };
        FrameBuffer {
            data,
            width,
            height,
            background: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[u16] {
        &self.data[..self.width * self.height]
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u16> {
        (x < self.width && y < self.height).then(|| self.data[y * self.width + x])
    }

    /// Row spans of a rectangle clipped to the buffer, as
    /// `(buffer offset, source offset, len)`.
    fn spans(
        &self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
    ) -> impl Iterator<Item = (usize, usize, usize)> + use<> {
        let (x, y, w, h) = (x as usize, y as usize, w as usize, h as usize);
        let (width, height) = (self.width, self.height);
        let len = w.min(width.saturating_sub(x));
        (0..h)
            .filter(move |r| y + r < height && len > 0)
            .map(move |r| ((y + r) * width + x, r * w, len))
    }
}

impl Panel for FrameBuffer<'_> {
    type Error = core::convert::Infallible;

    fn set_background(&mut self, colour: Rgb565) {
        self.background = raw(colour);
    }

    fn fill(&mut self, x: u16, y: u16, w: u16, h: u16) -> Result<(), Self::Error> {
        let bg = self.background;
        for (dst, _, len) in self.spans(x, y, w, h) {
            self.data[dst..dst + len].fill(bg);
        }
        Ok(())
    }

    fn bulk_blit(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        pixels: &[u16],
    ) -> Result<(), Self::Error> {
        for (dst, src, len) in self.spans(x, y, w, h) {
            let Some(row) = pixels.get(src..src + len) else {
                break;
            };
            self.data[dst..dst + len].copy_from_slice(row);
        }
        Ok(())
    }

    fn read_back(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        out: &mut [u16],
    ) -> Result<(), Self::Error> {
        for (src, dst, len) in self.spans(x, y, w, h) {
            let Some(row) = out.get_mut(dst..dst + len) else {
                break;
            };
            row.copy_from_slice(&self.data[src..src + len]);
        }
        Ok(())
    }
}

impl OriginDimensions for FrameBuffer<'_> {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl DrawTarget for FrameBuffer<'_> {
    type Color = Rgb565;

    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels.into_iter() {
            if coord.x >= 0
                && coord.y >= 0
                && (coord.x as usize) < self.width
                && (coord.y as usize) < self.height
            {
                self.data[coord.y as usize * self.width + coord.x as usize] = raw(color);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::prelude::RgbColor;

    #[test]
    fn blit_then_read_back() {
        let mut data = [0u16; 8 * 4];
        let mut fb = FrameBuffer::new(&mut data, 8);
        assert_eq!(fb.height(), 4);
        let block = [1, 2, 3, 4, 5, 6];
        let Ok(()) = fb.bulk_blit(6, 1, 3, 2, &block);
        // third column falls off the right edge
        assert_eq!(fb.pixel(6, 1), Some(1));
        assert_eq!(fb.pixel(7, 1), Some(2));
        assert_eq!(fb.pixel(6, 2), Some(4));
        let mut out = [0u16; 4];
        let Ok(()) = fb.read_back(6, 1, 2, 2, &mut out);
        assert_eq!(out, [1, 2, 4, 5]);
    }

    #[test]
    fn fill_uses_background() {
        let mut data = [0u16; 4 * 4];
        let mut fb = FrameBuffer::new(&mut data, 4);
        fb.set_background(Rgb565::WHITE);
        let Ok(()) = fb.fill(1, 3, 10, 10);
        assert_eq!(fb.pixel(0, 3), Some(0));
        assert_eq!(fb.pixel(3, 3), Some(0xffff));
        assert_eq!(fb.data().iter().filter(|&&p| p != 0).count(), 3);
    }
}
