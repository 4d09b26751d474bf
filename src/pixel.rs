//! Per-LED colour state.

use crate::colors::OFF;
use palette::Srgb;

/// Colour of one LED in the string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pixel {
    /// Position in the string, `0..N`.
    pub index: usize,

    /// Requested colour.
    pub color: Srgb<u8>,

    /// True once a colour has been written since the last reset.
    pub set: bool,
}

impl Pixel {
    /// Creates an unset, black pixel at `index`.
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            color: OFF,
            set: false,
        }
    }
}

/// Colour values for a string of `N` LEDs.
#[derive(Debug, Clone)]
pub struct PixelBuffer<const N: usize> {
    pixels: [Pixel; N],
}

impl<const N: usize> PixelBuffer<N> {
    /// Creates a buffer with every pixel black and unset.
    pub fn new() -> Self {
        Self {
            pixels: core::array::from_fn(Pixel::new),
        }
    }

    /// Number of pixels.
    #[inline]
    pub const fn len(&self) -> usize {
        N
    }

    /// Always false; a string holds at least one LED.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Returns the pixel at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Pixel> {
        self.pixels.get(index)
    }

    /// Iterates pixels in string order.
    pub fn iter(&self) -> impl Iterator<Item = &Pixel> {
        self.pixels.iter()
    }

    /// Records `color` for `index`. Returns false if `index` is out of range.
    pub(crate) fn set(&mut self, index: usize, color: Srgb<u8>) -> bool {
        match self.pixels.get_mut(index) {
            Some(pixel) => {
                pixel.color = color;
                pixel.set = true;
                true
            }
            None => false,
        }
    }

    /// Returns every pixel to black and unset.
    pub(crate) fn reset(&mut self) {
        for pixel in &mut self.pixels {
            pixel.color = OFF;
            pixel.set = false;
        }
    }
}

impl<const N: usize> Default for PixelBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
