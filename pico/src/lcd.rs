//! ILI9341 over blocking SPI, landscape 320x240, rgb565.

use embassy_rp::gpio::Output;
use embassy_rp::spi::{self, Blocking, Instance, Spi};
use embassy_time::Timer;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::IntoStorage;
use sweep_plot::Panel;

mod cmd {
    pub const SWRESET: u8 = 0x01;
    pub const SLPOUT: u8 = 0x11;
    pub const DISPON: u8 = 0x29;
    pub const CASET: u8 = 0x2a;
    pub const PASET: u8 = 0x2b;
    pub const RAMWR: u8 = 0x2c;
    pub const RAMRD: u8 = 0x2e;
    pub const MADCTL: u8 = 0x36;
    pub const PIXFMT: u8 = 0x3a;
}

/// Row/column exchange plus BGR order gives landscape with the
/// connector on the left.
const MADCTL_LANDSCAPE: u8 = 0x28;
/// 16 bits per pixel on the interface.
const PIXFMT_RGB565: u8 = 0x55;

pub const WRITE_HZ: u32 = 62_500_000;
/// The controller only reads back reliably at a much lower clock.
pub const READ_HZ: u32 = 20_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum LcdError {
    Spi,
}

impl From<spi::Error> for LcdError {
    fn from(_: spi::Error) -> Self {
        LcdError::Spi
    }
}

pub struct Ili9341<'d, T: Instance> {
    spi: Spi<'d, T, Blocking>,
    cs: Output<'d>,
    dc: Output<'d>,
    rst: Output<'d>,
    backlight: Output<'d>,
    background: u16,
    /// Staging buffer for pixel bytes, one panel row of rgb565 or a
    /// little over half a row of read back rgb666.
    bytes: [u8; 2 * 320],
}

impl<'d, T: Instance> Ili9341<'d, T> {
    pub fn new(
        spi: Spi<'d, T, Blocking>,
        cs: Output<'d>,
        dc: Output<'d>,
        rst: Output<'d>,
        backlight: Output<'d>,
    ) -> Self {
        Ili9341 {
            spi,
            cs,
            dc,
            rst,
            backlight,
            background: 0,
            bytes: [0; 2 * 320],
        }
    }

    pub async fn init(&mut self) -> Result<(), LcdError> {
        self.rst.set_low();
        Timer::after_millis(10).await;
        self.rst.set_high();
        Timer::after_millis(120).await;

        self.command(cmd::SWRESET, &[])?;
        Timer::after_millis(120).await;
        self.command(cmd::SLPOUT, &[])?;
        Timer::after_millis(120).await;
        self.command(cmd::PIXFMT, &[PIXFMT_RGB565])?;
        self.command(cmd::MADCTL, &[MADCTL_LANDSCAPE])?;
        self.command(cmd::DISPON, &[])?;
        self.backlight.set_high();
        defmt::info!("lcd ready");
        Ok(())
    }

    fn command(&mut self, command: u8, params: &[u8]) -> Result<(), LcdError> {
        self.cs.set_low();
        let res = self.send(command, params);
        self.cs.set_high();
        res
    }

    /// Command byte then parameters, with chip select already low.
    fn send(&mut self, command: u8, params: &[u8]) -> Result<(), LcdError> {
        self.dc.set_low();
        self.spi.blocking_write(&[command])?;
        self.dc.set_high();
        if !params.is_empty() {
            self.spi.blocking_write(params)?;
        }
        Ok(())
    }

    fn set_window(&mut self, x: u16, y: u16, w: u16, h: u16) -> Result<(), LcdError> {
        let (x1, y1) = (x + w - 1, y + h - 1);
        let [xh, xl] = x.to_be_bytes();
        let [x1h, x1l] = x1.to_be_bytes();
        self.command(cmd::CASET, &[xh, xl, x1h, x1l])?;
        let [yh, yl] = y.to_be_bytes();
        let [y1h, y1l] = y1.to_be_bytes();
        self.command(cmd::PASET, &[yh, yl, y1h, y1l])
    }

    fn write_pixels(&mut self, pixels: impl Iterator<Item = u16>) -> Result<(), LcdError> {
        self.cs.set_low();
        let res = (|| -> Result<(), LcdError> {
            self.send(cmd::RAMWR, &[])?;
            let mut n = 0;
            for p in pixels {
                self.bytes[n..n + 2].copy_from_slice(&p.to_be_bytes());
                n += 2;
                if n == self.bytes.len() {
                    self.spi.blocking_write(&self.bytes)?;
                    n = 0;
                }
            }
            if n > 0 {
                self.spi.blocking_write(&self.bytes[..n])?;
            }
            Ok(())
        })();
        self.cs.set_high();
        res
    }

    fn read_pixels(&mut self, out: &mut [u16]) -> Result<(), LcdError> {
        self.spi.set_frequency(READ_HZ);
        self.cs.set_low();
        let res = (|| -> Result<(), LcdError> {
            self.send(cmd::RAMRD, &[])?;
            // first byte out is a dummy
            self.spi.blocking_read(&mut self.bytes[..1])?;
            for chunk in out.chunks_mut(self.bytes.len() / 3) {
                let raw = &mut self.bytes[..chunk.len() * 3];
                self.spi.blocking_read(raw)?;
                for (px, rgb) in chunk.iter_mut().zip(raw.chunks_exact(3)) {
                    *px = Rgb565::new(rgb[0] >> 3, rgb[1] >> 2, rgb[2] >> 3).into_storage();
                }
            }
            Ok(())
        })();
        self.cs.set_high();
        self.spi.set_frequency(WRITE_HZ);
        res
    }
}

impl<T: Instance> Panel for Ili9341<'_, T> {
    type Error = LcdError;

    fn set_background(&mut self, colour: Rgb565) {
        self.background = colour.into_storage();
    }

    fn fill(&mut self, x: u16, y: u16, w: u16, h: u16) -> Result<(), Self::Error> {
        if w == 0 || h == 0 {
            return Ok(());
        }
        self.set_window(x, y, w, h)?;
        let bg = self.background;
        self.write_pixels(core::iter::repeat_n(bg, w as usize * h as usize))
    }

    fn bulk_blit(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        pixels: &[u16],
    ) -> Result<(), Self::Error> {
        if w == 0 || h == 0 {
            return Ok(());
        }
        self.set_window(x, y, w, h)?;
        let n = (w as usize * h as usize).min(pixels.len());
        self.write_pixels(pixels[..n].iter().copied())
    }

    fn read_back(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        out: &mut [u16],
    ) -> Result<(), Self::Error> {
        if w == 0 || h == 0 {
            return Ok(());
        }
        self.set_window(x, y, w, h)?;
        let n = (w as usize * h as usize).min(out.len());
        self.read_pixels(&mut out[..n])
    }
}
