use image::{ImageBuffer, Rgb, RgbImage, Rgba, RgbaImage};

use crate::error::{FrameError, Result};

/// A single rendered frame
///
/// This is a thin wrapper around an RGBA image buffer. Texture stages read a
/// `&Frame` and hand back a freshly allocated `Frame`, so two frames produced
/// by different stages never share storage. Alpha is carried through every
/// stage untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    buffer: RgbaImage,
}

impl Frame {
    /// Create a new frame from an RGBA image buffer
    pub fn new(buffer: RgbaImage) -> Self {
        Self { buffer }
    }

    /// Create an opaque frame from an RGB image buffer
    pub fn from_rgb(buffer: &RgbImage) -> Self {
        let buffer = ImageBuffer::from_fn(buffer.width(), buffer.height(), |x, y| {
            let Rgb([r, g, b]) = *buffer.get_pixel(x, y);
            Rgba([r, g, b, 255])
        });
        Self { buffer }
    }

    /// Create a new opaque frame with the given dimensions filled with black
    pub fn new_black(width: u32, height: u32) -> Self {
        Self::new_filled(width, height, [0, 0, 0])
    }

    /// Create a new opaque frame filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let [r, g, b] = color;
        let buffer = ImageBuffer::from_pixel(width, height, Rgba([r, g, b, 255]));
        Self { buffer }
    }

    /// Create a frame from a per-pixel generator
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> [u8; 4],
    {
        let buffer = ImageBuffer::from_fn(width, height, |x, y| Rgba(f(x, y)));
        Self { buffer }
    }

    /// Create a frame from raw, row-major RGBA bytes
    pub fn from_rgba_bytes(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or(FrameError::DimensionsOverflow { width, height })?;
        if data.len() != expected {
            return Err(FrameError::BufferSizeMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            }
            .into());
        }

        let buffer = ImageBuffer::from_raw(width, height, data)
            .ok_or(FrameError::DimensionsOverflow { width, height })?;
        Ok(Self { buffer })
    }

    /// Get the width of the frame
    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    /// Get the height of the frame
    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// `(width, height)`
    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    /// True when the frame holds no pixels
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Get a pixel at the given coordinates (returns RGBA array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.buffer.get_pixel(x, y).0
    }

    /// Set a pixel at the given coordinates
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 4]) {
        self.buffer.put_pixel(x, y, Rgba(color));
    }

    /// Row-major RGBA samples
    pub fn as_raw(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Mutable row-major RGBA samples
    pub(crate) fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Get the underlying image buffer
    pub fn as_image(&self) -> &RgbaImage {
        &self.buffer
    }

    /// Consume the frame, returning the underlying image buffer
    pub fn into_image(self) -> RgbaImage {
        self.buffer
    }

    /// Drop the alpha channel
    pub fn to_rgb_image(&self) -> RgbImage {
        ImageBuffer::from_fn(self.width(), self.height(), |x, y| {
            let [r, g, b, _] = self.get_pixel(x, y);
            Rgb([r, g, b])
        })
    }

    /// Mean RGB over the pixel rectangle `[x0, x1) × [y0, y1)`, clipped to the frame
    ///
    /// Returns `None` when the clipped rectangle contains no pixel.
    pub fn mean_rgb(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> Option<[u8; 3]> {
        let x1 = x1.min(self.width());
        let y1 = y1.min(self.height());
        if x0 >= x1 || y0 >= y1 {
            return None;
        }

        let mut sums = [0u64; 3];
        for y in y0..y1 {
            for x in x0..x1 {
                let p = self.get_pixel(x, y);
                sums[0] += u64::from(p[0]);
                sums[1] += u64::from(p[1]);
                sums[2] += u64::from(p[2]);
            }
        }
        let count = u64::from(x1 - x0) * u64::from(y1 - y0);
        let mean = |s: u64| ((s + count / 2) / count) as u8;
        Some([mean(sums[0]), mean(sums[1]), mean(sums[2])])
    }
}

impl From<RgbaImage> for Frame {
    fn from(buffer: RgbaImage) -> Self {
        Self::new(buffer)
    }
}

impl From<&RgbImage> for Frame {
    fn from(buffer: &RgbImage) -> Self {
        Self::from_rgb(buffer)
    }
}
