use embedded_graphics::pixelcolor::Rgb565;

/// The LCD as seen by the renderer: rectangle fills, rgb565 block writes
/// and block reads. Coordinates are absolute panel pixels.
///
/// Implementations may queue transfers (DMA). `finish` waits until every
/// queued write has reached the panel, and is called before a buffer
/// handed to `bulk_blit` is reused.
pub trait Panel {
    type Error;

    /// Colour used by subsequent `fill` calls.
    fn set_background(&mut self, colour: Rgb565);

    fn fill(&mut self, x: u16, y: u16, w: u16, h: u16) -> Result<(), Self::Error>;

    /// Write `w * h` pixels, row major.
    fn bulk_blit(&mut self, x: u16, y: u16, w: u16, h: u16, pixels: &[u16])
    -> Result<(), Self::Error>;

    /// Read `w * h` pixels back, row major.
    fn read_back(&mut self, x: u16, y: u16, w: u16, h: u16, out: &mut [u16])
    -> Result<(), Self::Error>;

    fn finish(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<P: Panel + ?Sized> Panel for &mut P {
    type Error = P::Error;

    fn set_background(&mut self, colour: Rgb565) {
        (**self).set_background(colour)
    }

    fn fill(&mut self, x: u16, y: u16, w: u16, h: u16) -> Result<(), Self::Error> {
        (**self).fill(x, y, w, h)
    }

    fn bulk_blit(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        pixels: &[u16],
    ) -> Result<(), Self::Error> {
        (**self).bulk_blit(x, y, w, h, pixels)
    }

    fn read_back(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        out: &mut [u16],
    ) -> Result<(), Self::Error> {
        (**self).read_back(x, y, w, h, out)
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        (**self).finish()
    }
}
