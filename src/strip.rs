//! LED string driver: transfer controller, completion handler and lifecycle.
//!
//! Provides [`LedStrip`], which owns the pixel and waveform buffers, the
//! transfer channel set, the data pin and the bit clock. Foreground code
//! encodes colours and arms transfers; the board's interrupt glue forwards
//! clock triggers through [`LedStrip::on_trigger`].

use crate::channel::{ChannelSet, PinCommand};
use crate::clock::{BitClock, BitTiming};
use crate::command::StripAction;
use crate::pixel::{Pixel, PixelBuffer};
use crate::types::{ChannelId, FaultSource, LedError, TransferOutcome, TransferState};
use crate::waveform::WaveformBuffer;
use embedded_hal::digital::OutputPin;
use palette::Srgb;

/// Active transfer bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TransferSession {
    state: TransferState,
    length: u16,
}

/// Drives a string of `N` WS28xx LEDs from three clock-triggered channels.
///
/// # Type Parameters
/// * `N` - Number of LEDs in the string
/// * `P` - Data output pin
/// * `C` - Bit clock
pub struct LedStrip<const N: usize, P: OutputPin, C: BitClock> {
    pixels: PixelBuffer<N>,
    waveform: WaveformBuffer<N>,
    channels: ChannelSet,
    pin: P,
    clock: C,
    session: TransferSession,
    timing: Option<BitTiming>,
    pin_fault: bool,
    last_outcome: Option<TransferOutcome>,
}

impl<const N: usize, P: OutputPin, C: BitClock> LedStrip<N, P, C> {
    /// Number of LEDs.
    pub const LEN: usize = N;

    /// Waveform words for a full-string transfer.
    pub const WAVEFORM_LEN: usize = WaveformBuffer::<N>::LEN;

    /// Creates an idle, uninitialized strip with every pixel black.
    pub fn new(pin: P, clock: C) -> Self {
        Self {
            pixels: PixelBuffer::new(),
            waveform: WaveformBuffer::new(),
            channels: ChannelSet::new(),
            pin,
            clock,
            session: TransferSession {
                state: TransferState::Idle,
                length: 0,
            },
            timing: None,
            pin_fault: false,
            last_outcome: None,
        }
    }

    /// One-time hardware setup.
    ///
    /// Configures the clock, routes channel C's completion event to the
    /// completion handler, pre-arms the channels disabled, drives the line low
    /// and starts the clock with all triggering disabled.
    pub fn init(&mut self, timing: &BitTiming) -> Result<(), LedError> {
        if self.is_active() {
            return Err(LedError::TransferAlreadyActive);
        }

        for channel in ChannelId::ALL {
            self.clock.disable_trigger(channel);
        }
        self.clock.configure(timing);

        self.channels.listen_complete(ChannelId::ForcedSpace);
        self.channels.arm(Self::transfer_len(Self::WAVEFORM_LEN));
        self.channels.disable_all();

        self.pin.set_low().map_err(|_| LedError::HardwareFault(FaultSource::Pin))?;

        self.clock.start();
        self.timing = Some(*timing);

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "ws28xx: init {} LEDs, period {} ticks, phases {}/{}",
            N,
            timing.period_ticks(),
            timing.early_ticks(),
            timing.late_ticks()
        );

        Ok(())
    }

    /// Sets LED `index` to (`red`, `green`, `blue`).
    ///
    /// Rejected while a transfer is active. Nothing is written on error.
    pub fn set_pixel(&mut self, index: usize, red: u8, green: u8, blue: u8) -> Result<(), LedError> {
        self.set_color(index, Srgb::new(red, green, blue))
    }

    /// Sets LED `index` to `color`.
    pub fn set_color(&mut self, index: usize, color: Srgb<u8>) -> Result<(), LedError> {
        self.ensure_idle()?;
        if index >= N {
            return Err(LedError::IndexOutOfRange { index, len: N });
        }

        self.waveform.write_pixel(index, color)?;
        self.pixels.set(index, color);
        Ok(())
    }

    /// Sets every LED to the same colour.
    pub fn fill(&mut self, red: u8, green: u8, blue: u8) -> Result<(), LedError> {
        self.ensure_idle()?;
        let color = Srgb::new(red, green, blue);
        for index in 0..N {
            self.set_color(index, color)?;
        }
        Ok(())
    }

    /// Returns pixel and waveform state to black and unset (power-off).
    pub fn reset(&mut self) -> Result<(), LedError> {
        self.ensure_idle()?;
        self.pixels.reset();
        self.waveform.clear();
        Ok(())
    }

    /// Arms all three channels for `length` words and starts the clock.
    ///
    /// # Errors
    /// * `NotInitialized` - `init` has not been called
    /// * `TransferAlreadyActive` - a transfer is in flight
    /// * `LengthOutOfRange` - `length` is zero or exceeds the waveform buffer
    pub fn trigger_transmit(&mut self, length: usize) -> Result<(), LedError> {
        if self.timing.is_none() {
            return Err(LedError::NotInitialized);
        }
        self.ensure_idle()?;
        if length == 0 || length > Self::WAVEFORM_LEN {
            return Err(LedError::LengthOutOfRange {
                length,
                max: Self::WAVEFORM_LEN,
            });
        }
        let length = Self::transfer_len(length);

        // Channel sources, stale flags and counters.
        self.channels.arm(length);
        self.pin_fault = false;
        self.session = TransferSession {
            state: TransferState::Armed,
            length,
        };

        self.clock.reset_counter();
        self.clock.clear_pending();
        self.clock.clear_fault();

        // Channels before clock triggering, triggering before the clock runs.
        self.channels.enable_all();
        for channel in ChannelId::ALL {
            self.clock.enable_trigger(channel);
        }
        self.clock.start();
        self.session.state = TransferState::Active;

        #[cfg(feature = "defmt")]
        defmt::trace!("ws28xx: transfer of {} words armed", length);

        Ok(())
    }

    /// Transmits the whole waveform buffer.
    pub fn transmit(&mut self) -> Result<(), LedError> {
        self.trigger_transmit(Self::WAVEFORM_LEN)
    }

    /// Handles one clock trigger for `channel`. Call from interrupt context.
    ///
    /// Applies the channel's next command to the line. Returns the outcome
    /// once the forced-space channel has consumed its last trigger.
    pub fn on_trigger(&mut self, channel: ChannelId) -> Option<TransferOutcome> {
        if self.session.state != TransferState::Active || !self.clock.is_trigger_enabled(channel) {
            return None;
        }

        if let Some(command) = self.channels.trigger(channel, &self.waveform) {
            self.apply(command);
        }

        if self.channels.get(channel).flags().error {
            return Some(self.complete());
        }
        if self.channels.completion_pending(ChannelId::ForcedSpace) {
            return Some(self.complete());
        }
        None
    }

    /// Handles a transfer error reported by `channel`.
    ///
    /// Tears the transfer down and returns the fault. Ignored while idle.
    pub fn on_channel_error(&mut self, channel: ChannelId) -> Option<TransferOutcome> {
        if self.session.state == TransferState::Idle {
            return None;
        }
        self.channels.raise_error(channel);
        Some(self.complete())
    }

    /// Cancels an in-flight transfer.
    ///
    /// Returns true if a transfer was cancelled. The line is left low and the
    /// recorded outcome is `Err(Aborted)`.
    pub fn abort(&mut self) -> bool {
        if self.session.state == TransferState::Idle {
            return false;
        }

        self.teardown();
        self.last_outcome = Some(Err(LedError::Aborted));

        #[cfg(feature = "defmt")]
        defmt::debug!("ws28xx: transfer aborted");

        true
    }

    /// Dispatches a command.
    pub fn handle_action(&mut self, action: StripAction) -> Result<(), LedError> {
        match action {
            StripAction::SetPixel { index, color } => self.set_color(index, color),
            StripAction::Fill(color) => self.fill(color.red, color.green, color.blue),
            StripAction::Transmit => self.transmit(),
            StripAction::Abort => {
                self.abort();
                Ok(())
            }
            StripAction::Reset => self.reset(),
        }
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> TransferState {
        self.session.state
    }

    /// Returns true while a transfer is armed or running.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.session.state != TransferState::Idle
    }

    /// Word count of the current or most recent transfer.
    #[inline]
    pub fn transfer_length(&self) -> usize {
        usize::from(self.session.length)
    }

    /// Returns the pixel at `index`.
    #[inline]
    pub fn pixel(&self, index: usize) -> Option<&Pixel> {
        self.pixels.get(index)
    }

    /// All pixels.
    #[inline]
    pub fn pixels(&self) -> &PixelBuffer<N> {
        &self.pixels
    }

    /// Encoded waveform.
    #[inline]
    pub fn waveform(&self) -> &WaveformBuffer<N> {
        &self.waveform
    }

    /// Channel state.
    #[inline]
    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    /// Outcome of the most recent transfer, `None` before the first one ends.
    #[inline]
    pub fn last_outcome(&self) -> Option<TransferOutcome> {
        self.last_outcome
    }

    /// Timing passed to `init`.
    #[inline]
    pub fn timing(&self) -> Option<&BitTiming> {
        self.timing.as_ref()
    }

    /// Upper bound for a full-string transfer, in microseconds.
    pub fn max_transfer_us(&self) -> Option<u32> {
        self.timing
            .map(|timing| timing.transfer_duration_us(Self::WAVEFORM_LEN))
    }

    /// Data pin.
    #[inline]
    pub fn pin(&self) -> &P {
        &self.pin
    }

    /// Bit clock.
    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Releases the pin and clock.
    pub fn release(self) -> (P, C) {
        (self.pin, self.clock)
    }

    fn ensure_idle(&self) -> Result<(), LedError> {
        if self.is_active() {
            Err(LedError::TransferAlreadyActive)
        } else {
            Ok(())
        }
    }

    fn transfer_len(length: usize) -> u16 {
        u16::try_from(length).unwrap_or(u16::MAX)
    }

    fn apply(&mut self, command: PinCommand) {
        let result = match command {
            PinCommand::High => self.pin.set_high(),
            PinCommand::Low => self.pin.set_low(),
            PinCommand::Hold => Ok(()),
        };
        if result.is_err() {
            self.pin_fault = true;
        }
    }

    /// Stops clock triggering, disables the channels and forces the line low.
    fn teardown(&mut self) {
        for channel in ChannelId::ALL {
            self.clock.disable_trigger(channel);
        }
        self.channels.disable_all();

        if self.pin.set_low().is_err() {
            self.pin_fault = true;
        }
        self.session.state = TransferState::Idle;
    }

    /// Completion handler: tears the transfer down, then reports any fault.
    fn complete(&mut self) -> TransferOutcome {
        self.teardown();

        let fault = if let Some(channel) = self.channels.first_error() {
            Some(FaultSource::Channel(channel))
        } else if self.clock.has_fault() {
            Some(FaultSource::Clock)
        } else if self.pin_fault {
            Some(FaultSource::Pin)
        } else {
            None
        };

        let outcome = match fault {
            Some(source) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("ws28xx: transfer ended with fault {}", source);
                Err(LedError::HardwareFault(source))
            }
            None => {
                #[cfg(feature = "defmt")]
                defmt::trace!("ws28xx: transfer complete");
                Ok(())
            }
        };

        self.last_outcome = Some(outcome);
        outcome
    }
}

impl<const N: usize, P: OutputPin, C: BitClock> smart_leds::SmartLedsWrite for LedStrip<N, P, C> {
    type Error = LedError;
    type Color = smart_leds::RGB8;

    /// Encodes up to `N` colours from `iterator` and starts a full transfer.
    fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        self.ensure_idle()?;
        for (index, item) in iterator.into_iter().take(N).enumerate() {
            let color: smart_leds::RGB8 = item.into();
            self.set_pixel(index, color.r, color.g, color.b)?;
        }
        self.transmit()
    }
}
