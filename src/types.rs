//! Core types shared by the encoder, the channel set and the controller.

use palette::Srgb;

/// Result reported by the completion handler for one transfer.
pub type TransferOutcome = Result<(), LedError>;

/// One colour byte of a pixel, in the order it is shifted onto the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColorChannel {
    /// Red intensity.
    Red,
    /// Green intensity.
    Green,
    /// Blue intensity.
    Blue,
}

impl ColorChannel {
    /// Returns this channel's byte of `color`.
    #[inline]
    pub fn of(self, color: Srgb<u8>) -> u8 {
        match self {
            ColorChannel::Red => color.red,
            ColorChannel::Green => color.green,
            ColorChannel::Blue => color.blue,
        }
    }
}

/// Identifies one of the three transfer channels.
///
/// All three drain into the same output pin, each at its own phase of the
/// shared bit clock period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelId {
    /// Channel A: fires at period start and drives the line high.
    Mark,
    /// Channel B: fires about 1/3 into the period and replays the waveform.
    Data,
    /// Channel C: fires about 2/3 into the period and drives the line low.
    ///
    /// Its completion event marks the end of a transfer.
    ForcedSpace,
}

impl ChannelId {
    /// All channels, in the order they fire within one period.
    pub const ALL: [ChannelId; 3] = [ChannelId::Mark, ChannelId::Data, ChannelId::ForcedSpace];

    /// Position of this channel within [`ChannelId::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            ChannelId::Mark => 0,
            ChannelId::Data => 1,
            ChannelId::ForcedSpace => 2,
        }
    }
}

/// Lifecycle of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferState {
    /// No clock triggering enabled. Buffers may be modified.
    Idle,
    /// Channels loaded and enabled, clock not yet started.
    Armed,
    /// Clock running, channels consuming their buffers.
    Active,
}

/// Hardware component that reported a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultSource {
    /// A transfer channel raised its error flag.
    Channel(ChannelId),
    /// The bit clock reported a fault.
    Clock,
    /// The output pin could not be driven.
    Pin,
}

/// Errors reported by the LED driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedError {
    /// Pixel index is not below the string length.
    IndexOutOfRange {
        /// Requested pixel index.
        index: usize,
        /// Number of pixels in the string.
        len: usize,
    },

    /// A transfer is in flight; buffers cannot be modified or re-armed.
    TransferAlreadyActive,

    /// The clock, a channel or the pin reported an error during a transfer.
    ///
    /// Reported after the line has been forced idle.
    HardwareFault(FaultSource),

    /// Requested transfer length is zero or longer than the waveform buffer.
    LengthOutOfRange {
        /// Requested number of words.
        length: usize,
        /// Waveform buffer length.
        max: usize,
    },

    /// Timer clock cannot produce WS28xx-compatible phases.
    InvalidTiming,

    /// `init` has not been called.
    NotInitialized,

    /// Transfer was cancelled by `abort`.
    Aborted,

    /// Transfer did not complete within its expected duration.
    Timeout,
}

impl core::fmt::Display for LedError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LedError::IndexOutOfRange { index, len } => {
                write!(f, "pixel index {} out of range for string of {} LEDs", index, len)
            }
            LedError::TransferAlreadyActive => {
                write!(f, "a transfer is already active")
            }
            LedError::HardwareFault(FaultSource::Channel(channel)) => {
                write!(f, "hardware fault on transfer channel {:?}", channel)
            }
            LedError::HardwareFault(FaultSource::Clock) => {
                write!(f, "hardware fault on bit clock")
            }
            LedError::HardwareFault(FaultSource::Pin) => {
                write!(f, "hardware fault driving output pin")
            }
            LedError::LengthOutOfRange { length, max } => {
                write!(f, "transfer length {} must be between 1 and {}", length, max)
            }
            LedError::InvalidTiming => {
                write!(f, "timer clock cannot produce WS28xx bit timing")
            }
            LedError::NotInitialized => {
                write!(f, "driver not initialized")
            }
            LedError::Aborted => {
                write!(f, "transfer aborted")
            }
            LedError::Timeout => {
                write!(f, "transfer did not complete in time")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LedError {}

#[cfg(test)]
mod tests {
    use super::*;
    extern crate std;
    use std::format;

    #[test]
    fn channel_order_matches_index() {
        for (position, channel) in ChannelId::ALL.iter().enumerate() {
            assert_eq!(channel.index(), position);
        }
    }

    #[test]
    fn color_channel_selects_byte() {
        let color = Srgb::new(1u8, 2, 3);
        assert_eq!(ColorChannel::Red.of(color), 1);
        assert_eq!(ColorChannel::Green.of(color), 2);
        assert_eq!(ColorChannel::Blue.of(color), 3);
    }

    #[test]
    fn error_messages_name_the_problem() {
        let err = LedError::IndexOutOfRange { index: 7, len: 5 };
        assert_eq!(format!("{}", err), "pixel index 7 out of range for string of 5 LEDs");

        let err = LedError::HardwareFault(FaultSource::Channel(ChannelId::Data));
        assert_eq!(format!("{}", err), "hardware fault on transfer channel Data");
    }
}
