//! Bit encoder: expands pixel colours into the symbolic waveform replayed by
//! the data channel.
//!
//! Each protocol bit becomes one [`Symbol`]. Colour bytes are emitted in
//! [`CHANNEL_ORDER`] (green, red, blue), most significant bit first. The buffer
//! ends with a single [`Symbol::Idle`] word so the final bit is always
//! terminated, even if teardown races the clock.

use crate::types::LedError;
use crate::{BITS_PER_PIXEL, CHANNEL_ORDER, waveform_len};
use palette::Srgb;

/// One protocol bit, before timing is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Symbol {
    /// Logical 1: long high pulse.
    Mark,
    /// Logical 0: short high pulse.
    Space,
    /// Line idle marker terminating the buffer.
    Idle,
}

impl Symbol {
    /// Symbol for a single bit value.
    #[inline]
    pub const fn from_bit(bit: bool) -> Self {
        if bit { Symbol::Mark } else { Symbol::Space }
    }

    /// Bit value carried by this symbol, `None` for [`Symbol::Idle`].
    #[inline]
    pub const fn bit(self) -> Option<bool> {
        match self {
            Symbol::Mark => Some(true),
            Symbol::Space => Some(false),
            Symbol::Idle => None,
        }
    }
}

/// Encodes one colour into its 24 wire symbols.
pub fn encode(color: Srgb<u8>) -> [Symbol; BITS_PER_PIXEL] {
    let mut symbols = [Symbol::Space; BITS_PER_PIXEL];
    let mut word = symbols.iter_mut();

    for channel in CHANNEL_ORDER {
        let byte = channel.of(color);
        for bit in (0..8).rev() {
            if let Some(slot) = word.next() {
                *slot = Symbol::from_bit((byte >> bit) & 0x01 == 1);
            }
        }
    }

    symbols
}

/// Decodes 24 wire symbols back into a colour.
///
/// Returns `None` unless `symbols` is exactly 24 `Mark`/`Space` words.
pub fn decode(symbols: &[Symbol]) -> Option<Srgb<u8>> {
    if symbols.len() != BITS_PER_PIXEL {
        return None;
    }

    let mut bytes = [0u8; 3];
    for (byte, chunk) in bytes.iter_mut().zip(symbols.chunks(8)) {
        for symbol in chunk {
            *byte = (*byte << 1) | u8::from(symbol.bit()?);
        }
    }

    let mut color = Srgb::new(0u8, 0, 0);
    for (channel, byte) in CHANNEL_ORDER.iter().zip(bytes) {
        match channel {
            crate::ColorChannel::Red => color.red = byte,
            crate::ColorChannel::Green => color.green = byte,
            crate::ColorChannel::Blue => color.blue = byte,
        }
    }
    Some(color)
}

/// Waveform for a string of `N` LEDs: `N * 24` bit words and one idle tail.
///
/// The length is fixed by `N` and never changes at runtime.
#[derive(Debug, Clone)]
pub struct WaveformBuffer<const N: usize> {
    bits: [[Symbol; BITS_PER_PIXEL]; N],
    tail: Symbol,
}

impl<const N: usize> WaveformBuffer<N> {
    /// Total number of words, `N * 24 + 1`.
    pub const LEN: usize = waveform_len(N);

    /// Creates a buffer encoding every pixel as black.
    pub fn new() -> Self {
        const {
            assert!(N > 0, "an LED string needs at least one pixel");
            assert!(
                waveform_len(N) <= u16::MAX as usize,
                "waveform must fit a 16-bit transfer counter"
            );
        }

        Self {
            bits: [[Symbol::Space; BITS_PER_PIXEL]; N],
            tail: Symbol::Idle,
        }
    }

    /// Number of words, including the idle tail.
    #[inline]
    pub const fn len(&self) -> usize {
        Self::LEN
    }

    /// Always false; the idle tail is always present.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Returns the word at flat position `word`.
    #[inline]
    pub fn get(&self, word: usize) -> Option<Symbol> {
        let pixel = word / BITS_PER_PIXEL;
        match self.bits.get(pixel) {
            Some(symbols) => symbols.get(word % BITS_PER_PIXEL).copied(),
            None if word == N * BITS_PER_PIXEL => Some(self.tail),
            None => None,
        }
    }

    /// Iterates every word in transmit order.
    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.bits
            .iter()
            .flat_map(|symbols| symbols.iter().copied())
            .chain(core::iter::once(self.tail))
    }

    /// The 24 words encoding pixel `index`.
    #[inline]
    pub fn pixel_symbols(&self, index: usize) -> Option<&[Symbol; BITS_PER_PIXEL]> {
        self.bits.get(index)
    }

    /// Decodes the colour currently encoded for pixel `index`.
    pub fn decode_pixel(&self, index: usize) -> Option<Srgb<u8>> {
        self.pixel_symbols(index).and_then(|symbols| decode(symbols))
    }

    /// Writes the 24 words for pixel `index`.
    ///
    /// Fails without writing anything if `index >= N`.
    pub fn write_pixel(&mut self, index: usize, color: Srgb<u8>) -> Result<(), LedError> {
        let slot = self
            .bits
            .get_mut(index)
            .ok_or(LedError::IndexOutOfRange { index, len: N })?;
        *slot = encode(color);
        Ok(())
    }

    /// Encodes every pixel as black.
    pub(crate) fn clear(&mut self) {
        self.bits = [[Symbol::Space; BITS_PER_PIXEL]; N];
        self.tail = Symbol::Idle;
    }
}

impl<const N: usize> Default for WaveformBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
