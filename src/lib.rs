#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`LedStrip`**: Owns the pixel and waveform buffers, the transfer channels, the data pin and the bit clock
//! - **`WaveformBuffer`**: `N * 24 + 1` symbolic bit words (`Mark`, `Space`, trailing `Idle`)
//! - **`ChannelSet`**: The three channels (mark, data, forced space) replayed at fixed phases of each bit period
//! - **`BitClock`**: Trait to implement for your timer
//! - **`BitTiming`**: Validated period and phase offsets for a given timer clock
//! - **`SharedLedStrip`**: Interrupt-safe wrapper with a one-shot completion signal
//! - **`StripAction`**: Commands that can be sent to control a strip
//!
//! Colours are `Srgb<u8>`; the [`colors`] module converts from HSV and
//! floating-point `Srgb`.

// Re-export Srgb from palette for user convenience
pub use palette::Srgb;

pub mod channel;
pub mod clock;
pub mod colors;
pub mod command;
pub mod pixel;
pub mod shared;
pub mod strip;
pub mod types;
pub mod waveform;

pub use channel::{ChannelFlags, ChannelSet, PinCommand};
pub use clock::{BitClock, BitTiming};
pub use command::StripAction;
pub use pixel::{Pixel, PixelBuffer};
pub use shared::SharedLedStrip;
pub use strip::LedStrip;
pub use types::{ChannelId, ColorChannel, FaultSource, LedError, TransferOutcome, TransferState};
pub use waveform::{Symbol, WaveformBuffer, decode, encode};

/// Protocol bits per LED.
pub const BITS_PER_PIXEL: usize = 24;

/// WS2812 data rate.
pub const DATA_RATE_HZ: u32 = 800_000;

/// Duration of one protocol bit.
pub const BIT_TIME_NS: u32 = 1_250;

/// Order in which colour bytes are shifted out.
pub const CHANNEL_ORDER: [ColorChannel; 3] = [ColorChannel::Green, ColorChannel::Red, ColorChannel::Blue];

/// String length of the reference board.
pub const DEFAULT_LED_COUNT: usize = 5;

/// Margin added to the expected transfer time before a blocking wait gives up.
pub const SETTLE_DELAY_MS: u32 = 2;

/// Waveform words for a string of `leds` LEDs, including the idle tail.
pub const fn waveform_len(leds: usize) -> usize {
    leds * BITS_PER_PIXEL + 1
}
