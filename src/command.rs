//! Command-based control for LED strips.

use palette::Srgb;

/// Actions for controlling a strip, e.g. sent over a channel from the
/// application task to the task that owns the strip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StripAction {
    /// Set one LED.
    SetPixel {
        /// Pixel index.
        index: usize,
        /// New colour.
        color: Srgb<u8>,
    },
    /// Set every LED.
    Fill(Srgb<u8>),
    /// Transmit the whole buffer.
    Transmit,
    /// Cancel the transfer in flight.
    Abort,
    /// Return every LED to black.
    Reset,
}
