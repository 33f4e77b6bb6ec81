//! Shared RGBA pixel buffer.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use image::{ImageFormat, RgbaImage};
use marcher_math::Color;

use crate::error::RenderResult;

/// RGBA raster written concurrently by render workers.
///
/// Each pixel is one packed `u32`, so a store is a single atomic write and a
/// reader never observes half of a pixel. Workers write disjoint coordinates,
/// which makes `Relaxed` ordering sufficient; the join at the end of a pass
/// publishes everything. Unwritten pixels are fully transparent.
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Box<[AtomicU32]>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        let pixels = (0..len)
            .map(|_| AtomicU32::new(Color::TRANSPARENT.to_bits()))
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y as usize * self.width as usize + x as usize
    }

    /// Store a pixel. Out-of-range coordinates are ignored.
    #[inline]
    pub fn set(&self, x: u32, y: u32, color: Color) {
        if x < self.width && y < self.height {
            self.pixels[self.index(x, y)].store(color.to_bits(), Ordering::Relaxed);
        }
    }

    /// Load a pixel, or transparent for out-of-range coordinates.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Color {
        if x < self.width && y < self.height {
            Color::from_bits(self.pixels[self.index(x, y)].load(Ordering::Relaxed))
        } else {
            Color::TRANSPARENT
        }
    }

    /// Reset every pixel to transparent.
    pub fn clear(&self) {
        let empty = Color::TRANSPARENT.to_bits();
        for pixel in self.pixels.iter() {
            pixel.store(empty, Ordering::Relaxed);
        }
    }

    /// Number of pixels with non-zero alpha.
    pub fn written_count(&self) -> usize {
        self.pixels
            .iter()
            .filter(|p| Color::from_bits(p.load(Ordering::Relaxed)).a != 0)
            .count()
    }

    /// Copy of all pixels in row-major order.
    pub fn snapshot(&self) -> Vec<Color> {
        self.pixels
            .iter()
            .map(|p| Color::from_bits(p.load(Ordering::Relaxed)))
            .collect()
    }

    /// Raw RGBA8 bytes in row-major order, for display upload.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        let snapshot = self.snapshot();
        bytemuck::cast_slice::<Color, u8>(&snapshot).to_vec()
    }

    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            image::Rgba(self.get(x, y).to_array())
        })
    }

    /// Encode the buffer as a PNG file.
    pub fn save_png(&self, path: &Path) -> RenderResult<()> {
        self.to_image().save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}
