//! Image primitives.
//!
//! Captures are kept as a compact owned RGB buffer (`OwnedImage`). Most code
//! works on borrowed views (`Image<'a>`) so cropping never copies pixels.

use anyhow::{Context, Result};

/// Owned RGB image (no alpha).
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedImage {
    width: u32,
    height: u32,
    data: Vec<Color>,
}

impl OwnedImage {
    pub fn new(width: u32, height: u32, fill: Color) -> Self {
        Self {
            width,
            height,
            data: vec![fill; (width * height) as usize],
        }
    }

    /// Build an `OwnedImage` from tightly packed RGBA bytes (alpha is discarded).
    pub fn from_rgba(width: usize, bytes: &[u8]) -> Self {
        let height = if width == 0 { 0 } else { bytes.len() / width / 4 };
        let data = bytes
            .chunks_exact(4)
            .take(width * height)
            .map(|v| Color::new(v[0], v[1], v[2]))
            .collect::<Vec<_>>();

        Self {
            width: width as u32,
            height: height as u32,
            data,
        }
    }

    /// Create an RGB image from a grayscale one (each luma value repeated into RGB).
    pub fn from_gray_as_rgb(gray: &image::GrayImage) -> Self {
        let (width, height) = gray.dimensions();
        let data = gray
            .pixels()
            .map(|p| Color::new(p.0[0], p.0[0], p.0[0]))
            .collect();
        Self { width, height, data }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if x < self.width && y < self.height {
            self.data[(x + y * self.width) as usize] = color;
        }
    }

    /// Resize to the given height, preserving aspect ratio.
    ///
    /// Uses `fast_image_resize` (SIMD-optimized) and keeps output in `Vec<Color>`.
    pub fn resize_h(&mut self, height: u32) {
        if self.height == height || self.width == 0 || self.height == 0 {
            return;
        }

        let height = height.max(1);
        let width = ((self.width as u64 * height as u64) / self.height as u64).max(1) as u32;

        // SAFETY: `Color` is `#[repr(C)]` with 3 x `u8`, so it is layout-compatible
        // with `fast_image_resize::pixels::U8x3` (alignment 1).
        let src_pixels = unsafe {
            std::slice::from_raw_parts(
                self.data.as_ptr() as *const fast_image_resize::pixels::U8x3,
                self.data.len(),
            )
        };

        let resized = (|| -> Result<Vec<u8>> {
            let src = fast_image_resize::images::ImageRef::from_pixels(self.width, self.height, src_pixels)
                .context("wrap source pixels")?;
            let mut dst = fast_image_resize::images::Image::new(width, height, fast_image_resize::PixelType::U8x3);
            let options = fast_image_resize::ResizeOptions::new().resize_alg(
                fast_image_resize::ResizeAlg::Convolution(fast_image_resize::FilterType::Bilinear),
            );
            fast_image_resize::Resizer::new()
                .resize(&src, &mut dst, &Some(options))
                .context("resize")?;
            Ok(dst.into_vec())
        })();

        match resized {
            Ok(bytes) => {
                self.data = bytes
                    .chunks_exact(3)
                    .map(|px| Color::new(px[0], px[1], px[2]))
                    .collect();
                self.width = width;
                self.height = height;
            }
            Err(err) => tracing::warn!("image resize failed: {err:#}"),
        }
    }

    #[inline]
    pub fn resized_h(mut self, height: u32) -> Self {
        self.resize_h(height);
        self
    }

    /// Create a borrowed view of this entire image.
    pub fn as_image(&self) -> Image<'_> {
        Image {
            x1: 0,
            y1: 0,
            x2: self.width,
            y2: self.height,
            true_width: self.width,
            data: &self.data,
        }
    }
}

// ----------

/// Borrowed image view into an `OwnedImage`.
#[derive(Clone, Copy)]
pub struct Image<'a> {
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
    true_width: u32,
    data: &'a [Color],
}

impl<'a> Image<'a> {
    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    /// Row-major iterator over the pixels of this view.
    pub fn pixels(self) -> impl Iterator<Item = Color> + 'a {
        let Self { x1, y1, x2, y2, true_width, data } = self;
        (y1..y2).flat_map(move |y| (x1..x2).map(move |x| data[(x + y * true_width) as usize]))
    }

    /// Create an arbitrary subimage (relative coordinates, clamped to this view).
    pub fn sub_image(&self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let x = x.min(self.width());
        let y = y.min(self.height());
        let width = width.min(self.width() - x);
        let height = height.min(self.height() - y);

        Self {
            x1: self.x1 + x,
            y1: self.y1 + y,
            x2: self.x1 + x + width,
            y2: self.y1 + y + height,
            true_width: self.true_width,
            data: self.data,
        }
    }

    pub fn to_owned_image(self) -> OwnedImage {
        OwnedImage {
            width: self.width(),
            height: self.height(),
            data: self.pixels().collect(),
        }
    }

    /// Convert to a grayscale `GrayImage` (luma).
    pub fn to_gray_image(&self) -> image::GrayImage {
        let mut out = image::GrayImage::new(self.width(), self.height());
        for (dst, src) in out.pixels_mut().zip(self.pixels()) {
            dst.0[0] = src.luma();
        }
        out
    }

    /// Packed RGB bytes, row-major.
    pub fn get_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity((self.width() * self.height() * 3) as usize);
        for clr in self.pixels() {
            bytes.extend_from_slice(&[clr.r, clr.g, clr.b]);
        }
        bytes
    }
}

// ----------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[repr(C)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Sum of absolute per-channel differences.
    #[inline]
    pub fn abs_diff(&self, other: Color) -> u32 {
        self.r.abs_diff(other.r) as u32 + self.g.abs_diff(other.g) as u32 + self.b.abs_diff(other.b) as u32
    }

    /// Compute luma (grayscale intensity).
    pub fn luma(&self) -> u8 {
        let r = self.r as u32;
        let g = self.g as u32;
        let b = self.b as u32;
        ((299 * r + 587 * g + 114 * b) / 1000) as u8
    }
}
